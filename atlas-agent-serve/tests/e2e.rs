#[path = "e2e/common.rs"]
mod common;
#[path = "e2e/invalid_json.rs"]
mod invalid_json;
#[path = "e2e/ping.rs"]
mod ping;
#[path = "e2e/run_turn.rs"]
mod run_turn;
