//! GraphQL pipeline: classify → extract entities → resolve ids → execute →
//! format (spec §4.7). Talks to the Atlas GraphQL API over `reqwest`, the same
//! HTTP client crate the teacher already depends on.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::graph::{Next, Node, RunContext};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::stream_data::StreamData;
use crate::timing::NodeTimer;
use crate::turn_state::{AtlasLink, TurnState};
use crate::usage::usage_record_from_llm_usage;

use super::shared::{parse_tool_args, rejected_parallel_tool_messages};

pub const EXTRACT_GRAPHQL_QUESTION: &str = "extract_graphql_question";
const CLASSIFY_QUERY: &str = "classify_query";
const EXTRACT_ENTITIES: &str = "extract_entities";
const RESOLVE_IDS: &str = "resolve_ids";
const BUILD_AND_EXECUTE_GRAPHQL: &str = "build_and_execute_graphql";
const FORMAT_GRAPHQL_RESULTS: &str = "format_graphql_results";

fn graphql_pipeline_tag() -> &'static str {
    "graphql"
}

/// Process-wide GraphQL call budget. Shared via `Arc` across turns; `used`
/// only ever increases for the lifetime of the process (spec §5/§9: the
/// external API's own rate limit, not the per-turn `max_uses` counter).
#[derive(Debug, Default)]
pub struct GraphqlBudget {
    used: AtomicU32,
    max_requests: u32,
}

impl GraphqlBudget {
    pub fn new(max_requests: u32) -> Self {
        Self {
            used: AtomicU32::new(0),
            max_requests,
        }
    }

    pub fn available(&self) -> bool {
        self.used.load(Ordering::SeqCst) < self.max_requests
    }

    pub fn used(&self) -> u32 {
        self.used.load(Ordering::SeqCst)
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Consumes one unit of budget; returns `false` if none was available.
    fn try_consume(&self) -> bool {
        self.used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |u| {
                (u < self.max_requests).then_some(u + 1)
            })
            .is_ok()
    }
}

pub struct ExtractGraphqlQuestionNode;

#[async_trait]
impl Node<TurnState> for ExtractGraphqlQuestionNode {
    fn id(&self) -> &str {
        EXTRACT_GRAPHQL_QUESTION
    }

    async fn run_with_context(
        &self,
        mut state: TurnState,
        ctx: &RunContext<TurnState>,
    ) -> Result<(TurnState, Next), AgentError> {
        StreamData::node_start(self.id(), "Extract question")
            .emit(&ctx.stream_writer())
            .await;
        let (question, context) = state
            .pending_tool_call()
            .map(|c| parse_tool_args(&c.args))
            .unwrap_or_default();
        state.graphql = Default::default();
        state.graphql.question = question;
        state.graphql.context = context;
        Ok((state, Next::Continue))
    }

    async fn run(&self, state: TurnState) -> Result<(TurnState, Next), AgentError> {
        self.run_with_context(state, &RunContext::new(Default::default())).await
    }
}

#[derive(Deserialize, Default)]
struct Classification {
    #[serde(default)]
    query_type: String,
    #[serde(default)]
    in_scope: bool,
    #[serde(default)]
    rejection_reason: String,
}

pub struct ClassifyQueryNode {
    pub llm: Arc<dyn LlmClient>,
    pub budget: Arc<GraphqlBudget>,
}

#[async_trait]
impl Node<TurnState> for ClassifyQueryNode {
    fn id(&self) -> &str {
        CLASSIFY_QUERY
    }

    async fn run_with_context(
        &self,
        mut state: TurnState,
        ctx: &RunContext<TurnState>,
    ) -> Result<(TurnState, Next), AgentError> {
        StreamData::node_start(self.id(), "Classify query")
            .emit(&ctx.stream_writer())
            .await;

        if !self.budget.available() {
            state.graphql.is_rejected = true;
            state.graphql.rejection_reason =
                "The GraphQL API's request budget for this process has been exhausted.".to_string();
            return Ok((state, Next::Node(FORMAT_GRAPHQL_RESULTS.to_string())));
        }

        let mut timer = NodeTimer::start(self.id(), graphql_pipeline_tag());
        let schema = serde_json::json!({
            "type": "object",
            "properties": {
                "query_type": {"type": "string"},
                "in_scope": {"type": "boolean"},
                "rejection_reason": {"type": "string"},
            },
        });
        let prompt = format!(
            "Question: {}\n\nClassify this question into exactly one of the Atlas trade-data GraphQL API's supported query types: country_profile (a general overview of one country's trade), treemap_products (breakdown of a country's trade by product), treemap_partners (breakdown of a country's trade by partner country), new_products (products a country has newly started exporting), country_growth (trade growth over time for a country), product_space_rca (comparative advantage / product space position), out_of_scope (anything else, e.g. causal explanations, policy recommendations, data outside product/country trade statistics). Set query_type to one of those seven values. If it is out_of_scope, also set in_scope to false and explain why in rejection_reason; otherwise set in_scope to true.",
            state.graphql.question
        );
        let llm_start = std::time::Instant::now();
        let parsed: Classification = self
            .llm
            .with_structured_output(&[Message::human(prompt)], &schema)
            .await
            .and_then(|v| serde_json::from_value(v).map_err(|e| AgentError::Llm(e.to_string())))
            .unwrap_or_default();
        timer.add_llm_ms(llm_start.elapsed().as_millis() as u64);

        state.graphql.query_type = parsed.query_type;
        state.graphql.is_rejected = !parsed.in_scope;
        state.graphql.rejection_reason = parsed.rejection_reason;
        state.record_timing(timer.finish());

        if state.graphql.is_rejected {
            return Ok((state, Next::Node(FORMAT_GRAPHQL_RESULTS.to_string())));
        }
        Ok((state, Next::Continue))
    }

    async fn run(&self, state: TurnState) -> Result<(TurnState, Next), AgentError> {
        self.run_with_context(state, &RunContext::new(Default::default())).await
    }
}

#[derive(Deserialize, Default)]
struct ExtractedEntities {
    #[serde(default)]
    entities: serde_json::Map<String, serde_json::Value>,
}

pub struct ExtractEntitiesNode {
    pub llm: Arc<dyn LlmClient>,
}

#[async_trait]
impl Node<TurnState> for ExtractEntitiesNode {
    fn id(&self) -> &str {
        EXTRACT_ENTITIES
    }

    async fn run_with_context(
        &self,
        mut state: TurnState,
        ctx: &RunContext<TurnState>,
    ) -> Result<(TurnState, Next), AgentError> {
        StreamData::node_start(self.id(), "Extract entities")
            .emit(&ctx.stream_writer())
            .await;
        let mut timer = NodeTimer::start(self.id(), graphql_pipeline_tag());
        let schema = serde_json::json!({
            "type": "object",
            "properties": {
                "entities": {
                    "type": "object",
                    "description": "map of entity role (e.g. 'origin_country', 'destination_country', 'product') to the mentioned name",
                },
            },
        });
        let prompt = format!(
            "Question: {}\n\nExtract the countries and products mentioned, labeled by role.",
            state.graphql.question
        );
        let llm_start = std::time::Instant::now();
        let parsed: ExtractedEntities = self
            .llm
            .with_structured_output(&[Message::human(prompt)], &schema)
            .await
            .and_then(|v| serde_json::from_value(v).map_err(|e| AgentError::Llm(e.to_string())))
            .unwrap_or_default();
        timer.add_llm_ms(llm_start.elapsed().as_millis() as u64);

        state.graphql.entities = parsed.entities;
        state.record_timing(timer.finish());
        Ok((state, Next::Continue))
    }

    async fn run(&self, state: TurnState) -> Result<(TurnState, Next), AgentError> {
        self.run_with_context(state, &RunContext::new(Default::default())).await
    }
}

/// How close a fuzzy match must be (normalized Levenshtein similarity, 0..1)
/// to be offered as a candidate at all.
const FUZZY_MATCH_THRESHOLD: f64 = 0.6;
/// How many of the closest fuzzy candidates the disambiguation LLM sees.
const FUZZY_CANDIDATE_LIMIT: usize = 5;

#[derive(Deserialize, Default)]
struct Disambiguation {
    #[serde(default)]
    chosen_name: String,
}

/// Resolves extracted entity names to the internal ids the GraphQL API
/// expects, via a preloaded name→id lookup table. Spec §4.7 step 4: exact
/// match first, then fuzzy full-text match, then lightweight-LLM
/// disambiguation among the remaining candidates.
pub struct ResolveIdsNode {
    pub lookup: Arc<std::collections::HashMap<String, String>>,
    pub llm: Arc<dyn LlmClient>,
}

impl ResolveIdsNode {
    /// Keys of `self.lookup` ranked by similarity to `name`, closest first,
    /// restricted to candidates above [`FUZZY_MATCH_THRESHOLD`].
    fn fuzzy_candidates(&self, name: &str) -> Vec<String> {
        let needle = name.to_lowercase();
        let mut scored: Vec<(f64, &String)> = self
            .lookup
            .keys()
            .map(|key| (strsim::normalized_levenshtein(&needle, key), key))
            .filter(|(score, _)| *score >= FUZZY_MATCH_THRESHOLD)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored
            .into_iter()
            .take(FUZZY_CANDIDATE_LIMIT)
            .map(|(_, key)| key.clone())
            .collect()
    }

    /// Asks the lightweight model to pick the intended entity among several
    /// fuzzy candidates that are too close to call mechanically.
    async fn disambiguate(&self, name: &str, candidates: &[String]) -> Option<String> {
        let schema = serde_json::json!({
            "type": "object",
            "properties": {
                "chosen_name": {
                    "type": "string",
                    "description": "The one candidate name that best matches the mentioned entity, verbatim.",
                },
            },
        });
        let prompt = format!(
            "The question mentioned \"{name}\". Which of these known entity names is it most likely referring to?\n{}",
            candidates.join("\n")
        );
        let parsed: Disambiguation = self
            .llm
            .with_structured_output(&[Message::human(prompt)], &schema)
            .await
            .and_then(|v| serde_json::from_value(v).map_err(|e| AgentError::Llm(e.to_string())))
            .unwrap_or_default();
        candidates
            .iter()
            .find(|c| c.eq_ignore_ascii_case(&parsed.chosen_name))
            .cloned()
    }
}

#[async_trait]
impl Node<TurnState> for ResolveIdsNode {
    fn id(&self) -> &str {
        RESOLVE_IDS
    }

    async fn run_with_context(
        &self,
        mut state: TurnState,
        ctx: &RunContext<TurnState>,
    ) -> Result<(TurnState, Next), AgentError> {
        StreamData::node_start(self.id(), "Resolve ids")
            .emit(&ctx.stream_writer())
            .await;
        let mut resolved = serde_json::Map::new();
        for (role, value) in &state.graphql.entities {
            let Some(name) = value.as_str() else { continue };
            let key = name.to_lowercase();

            if let Some(id) = self.lookup.get(&key) {
                resolved.insert(role.clone(), serde_json::Value::String(id.clone()));
                continue;
            }

            let candidates = self.fuzzy_candidates(name);
            let matched_key = match candidates.len() {
                0 => None,
                1 => candidates.into_iter().next(),
                _ => self.disambiguate(name, &candidates).await,
            };
            if let Some(matched_key) = matched_key {
                if let Some(id) = self.lookup.get(&matched_key) {
                    resolved.insert(role.clone(), serde_json::Value::String(id.clone()));
                }
            }
        }
        state.graphql.resolved_ids = resolved;
        Ok((state, Next::Continue))
    }

    async fn run(&self, state: TurnState) -> Result<(TurnState, Next), AgentError> {
        self.run_with_context(state, &RunContext::new(Default::default())).await
    }
}

#[derive(Serialize)]
struct GraphqlRequestBody<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

pub struct BuildAndExecuteGraphqlNode {
    pub http: reqwest::Client,
    pub endpoint: String,
    pub budget: Arc<GraphqlBudget>,
    pub rate_limiter: Arc<tokio::sync::Semaphore>,
}

impl BuildAndExecuteGraphqlNode {
    fn query_document(query_type: &str) -> &'static str {
        match query_type {
            "country_profile" => {
                "query($origin: String) { countryProfile(origin: $origin) { year totalExports totalImports topProducts topPartners } }"
            }
            "treemap_products" => {
                "query($origin: String, $dest: String) { productTreemap(origin: $origin, destination: $dest) { code name value share } }"
            }
            "treemap_partners" => {
                "query($origin: String, $product: String) { partnerTreemap(origin: $origin, product: $product) { code name value share } }"
            }
            "new_products" => {
                "query($origin: String) { newProducts(origin: $origin) { code name firstYear value } }"
            }
            "country_growth" => {
                "query($origin: String, $dest: String, $product: String) { tradeGrowth(origin: $origin, destination: $dest, product: $product) { year value growthRate } }"
            }
            "product_space_rca" => {
                "query($origin: String, $product: String) { productSpaceRca(origin: $origin, product: $product) { code name rca proximity } }"
            }
            _ => {
                "query($origin: String, $dest: String, $product: String) { tradeFlow(origin: $origin, destination: $dest, product: $product) { year exportValue importValue } }"
            }
        }
    }

    /// Spec §4.7 step 5: the Atlas frontend exposes this data through two
    /// distinct sub-APIs, chosen by query type.
    fn api_target(query_type: &str) -> &'static str {
        match query_type {
            "country_profile" => "Country Pages",
            _ => "Explore",
        }
    }
}

#[async_trait]
impl Node<TurnState> for BuildAndExecuteGraphqlNode {
    fn id(&self) -> &str {
        BUILD_AND_EXECUTE_GRAPHQL
    }

    async fn run_with_context(
        &self,
        mut state: TurnState,
        ctx: &RunContext<TurnState>,
    ) -> Result<(TurnState, Next), AgentError> {
        StreamData::node_start(self.id(), "Query Atlas GraphQL API")
            .emit(&ctx.stream_writer())
            .await;

        if !self.budget.try_consume() {
            state.graphql.success = false;
            state.last_error = "GraphQL request budget exhausted".to_string();
            return Ok((state, Next::Node(FORMAT_GRAPHQL_RESULTS.to_string())));
        }

        let mut timer = NodeTimer::start(self.id(), graphql_pipeline_tag());
        state.graphql.api_target = Self::api_target(&state.graphql.query_type).to_string();
        let query = Self::query_document(&state.graphql.query_type);
        let variables = serde_json::Value::Object(state.graphql.resolved_ids.clone());
        let body = GraphqlRequestBody { query, variables };

        // Process-wide rate limit on the external API: at most two GraphQL
        // calls in flight at once, each request's permit held for at least
        // half a second.
        let _permit = match self.rate_limiter.acquire().await {
            Ok(permit) => permit,
            Err(_) => return Err(AgentError::node(self.id(), "rate limiter semaphore closed")),
        };
        let io_start = std::time::Instant::now();
        let outcome = self
            .http
            .post(&self.endpoint)
            .header("X-Client-Name", "ask-atlas")
            .json(&body)
            .timeout(std::time::Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| AgentError::node(self.id(), e.to_string()))?
            .json::<serde_json::Value>()
            .await
            .map_err(|e| AgentError::node(self.id(), e.to_string()));
        timer.add_io_ms(io_start.elapsed().as_millis() as u64);
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        drop(_permit);

        match outcome {
            Ok(value) => {
                state.graphql.success = value.get("errors").is_none();
                state.graphql.response = Some(value);
            }
            Err(e) => {
                state.graphql.success = false;
                state.last_error = e.to_string();
            }
        }
        state.graphql.execution_time_ms = io_start.elapsed().as_millis() as u64;
        state.record_timing(timer.finish());
        Ok((state, Next::Continue))
    }

    async fn run(&self, state: TurnState) -> Result<(TurnState, Next), AgentError> {
        self.run_with_context(state, &RunContext::new(Default::default())).await
    }
}

pub struct FormatGraphqlResultsNode {
    pub visualization_base_url: String,
}

/// The GraphQL field under `data` that each query type's response is
/// nested in, matching the operation names in [`BuildAndExecuteGraphqlNode::query_document`].
fn response_field(query_type: &str) -> &'static str {
    match query_type {
        "country_profile" => "countryProfile",
        "treemap_products" => "productTreemap",
        "treemap_partners" => "partnerTreemap",
        "new_products" => "newProducts",
        "country_growth" => "tradeGrowth",
        "product_space_rca" => "productSpaceRca",
        _ => "tradeFlow",
    }
}

/// USD magnitude suffixing per spec §4.7 step 6 (trillion/billion/million).
fn format_usd(value: f64) -> String {
    let (scaled, suffix) = if value.abs() >= 1e12 {
        (value / 1e12, "trillion")
    } else if value.abs() >= 1e9 {
        (value / 1e9, "billion")
    } else if value.abs() >= 1e6 {
        (value / 1e6, "million")
    } else {
        return format!("${value:.0}");
    };
    format!("${scaled:.1} {suffix}")
}

fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

/// "N of TOTAL" rank string for the item at zero-based `index` of `total`.
fn ordinal_rank(index: usize, total: usize) -> String {
    format!("{} of {}", index + 1, total)
}

fn as_f64(row: &serde_json::Map<String, serde_json::Value>, key: &str) -> Option<f64> {
    row.get(key).and_then(|v| v.as_f64())
}

fn as_str<'a>(row: &'a serde_json::Map<String, serde_json::Value>, key: &str) -> &'a str {
    row.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

impl FormatGraphqlResultsNode {
    fn atlas_links(&self, state: &TurnState) -> Vec<AtlasLink> {
        if !state.graphql.success {
            return Vec::new();
        }
        vec![AtlasLink {
            url: format!(
                "{}/explore/{}",
                self.visualization_base_url.trim_end_matches('/'),
                state.graphql.query_type
            ),
            label: "View this on the Atlas visualization site".to_string(),
            link_type: state.graphql.query_type.clone(),
        }]
    }

    /// Extracts the response's row list (the GraphQL field may hold either
    /// an array, for treemap/listing query types, or a single object, for
    /// `country_profile`) as a uniform `Vec` of JSON objects.
    fn rows(&self, state: &TurnState) -> Vec<serde_json::Map<String, serde_json::Value>> {
        let Some(response) = state.graphql.response.as_ref() else {
            return Vec::new();
        };
        let field = response_field(&state.graphql.query_type);
        let Some(data) = response.get("data").and_then(|d| d.get(field)) else {
            return Vec::new();
        };
        match data {
            serde_json::Value::Array(items) => items
                .iter()
                .filter_map(|v| v.as_object().cloned())
                .collect(),
            serde_json::Value::Object(obj) => vec![obj.clone()],
            _ => Vec::new(),
        }
    }

    /// Query-type-specific formatting (spec §4.7 step 6): treemap results
    /// sort descending by value and gain ordinal ranks, monetary figures get
    /// USD magnitude suffixes, and rates/shares render as one-decimal percentages.
    fn format_rows(&self, query_type: &str, mut rows: Vec<serde_json::Map<String, serde_json::Value>>) -> String {
        if rows.is_empty() {
            return "No data was returned for this query.".to_string();
        }
        match query_type {
            "treemap_products" | "treemap_partners" | "new_products" => {
                rows.sort_by(|a, b| {
                    as_f64(b, "value")
                        .unwrap_or(0.0)
                        .partial_cmp(&as_f64(a, "value").unwrap_or(0.0))
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                let total = rows.len();
                rows.iter()
                    .enumerate()
                    .map(|(i, row)| {
                        let name = as_str(row, "name");
                        let value = format_usd(as_f64(row, "value").unwrap_or(0.0));
                        let rank = ordinal_rank(i, total);
                        match as_f64(row, "share") {
                            Some(share) => format!(
                                "{rank}: {name} - {value} ({} of total)",
                                format_percent(share * 100.0)
                            ),
                            None => format!("{rank}: {name} - {value}"),
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            "country_growth" => rows
                .iter()
                .map(|row| {
                    let year = row.get("year").map(|v| v.to_string()).unwrap_or_default();
                    let value = format_usd(as_f64(row, "value").unwrap_or(0.0));
                    let growth = format_percent(as_f64(row, "growthRate").unwrap_or(0.0) * 100.0);
                    format!("{year}: {value} ({growth} growth)")
                })
                .collect::<Vec<_>>()
                .join("\n"),
            "product_space_rca" => rows
                .iter()
                .map(|row| {
                    let name = as_str(row, "name");
                    let rca = as_f64(row, "rca").unwrap_or(0.0);
                    format!("{name}: RCA {rca:.2}")
                })
                .collect::<Vec<_>>()
                .join("\n"),
            "country_profile" => {
                let row = &rows[0];
                format!(
                    "Total exports: {}\nTotal imports: {}",
                    format_usd(as_f64(row, "totalExports").unwrap_or(0.0)),
                    format_usd(as_f64(row, "totalImports").unwrap_or(0.0)),
                )
            }
            _ => rows
                .iter()
                .map(|row| serde_json::to_string(row).unwrap_or_default())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

#[async_trait]
impl Node<TurnState> for FormatGraphqlResultsNode {
    fn id(&self) -> &str {
        FORMAT_GRAPHQL_RESULTS
    }

    async fn run_with_context(
        &self,
        mut state: TurnState,
        ctx: &RunContext<TurnState>,
    ) -> Result<(TurnState, Next), AgentError> {
        StreamData::node_start(self.id(), "Format results")
            .emit(&ctx.stream_writer())
            .await;

        let content = if state.graphql.is_rejected {
            format!(
                "The Atlas GraphQL API cannot answer this directly: {}",
                state.graphql.rejection_reason
            )
        } else if !state.graphql.success {
            format!("The GraphQL request failed: {}", state.last_error)
        } else {
            let rows = self.rows(&state);
            let body = self.format_rows(&state.graphql.query_type, rows);
            format!("Query type: {}\n\n{}", state.graphql.query_type, body)
        };
        state.graphql.formatted = content.clone();
        state.graphql.atlas_links = self.atlas_links(&state);

        if let Some(call) = state.pending_tool_call().cloned() {
            state.messages.push(Message::tool(content, call.id, call.name));
            if !state.graphql.is_rejected {
                state.queries_executed += 1;
            }
        }
        for extra in rejected_parallel_tool_messages(&state) {
            state.messages.push(extra);
        }
        StreamData::tool_output(state.graphql.formatted.clone())
            .emit(&ctx.stream_writer())
            .await;
        Ok((state, Next::Node(crate::agent_node::AGENT_NODE_ID.to_string())))
    }

    async fn run(&self, state: TurnState) -> Result<(TurnState, Next), AgentError> {
        self.run_with_context(state, &RunContext::new(Default::default())).await
    }
}

#[allow(clippy::too_many_arguments)]
pub fn graphql_pipeline_nodes(
    llm_lightweight: Arc<dyn LlmClient>,
    budget: Arc<GraphqlBudget>,
    entity_lookup: Arc<std::collections::HashMap<String, String>>,
    http: reqwest::Client,
    endpoint: String,
    visualization_base_url: String,
    rate_limiter: Arc<tokio::sync::Semaphore>,
) -> Vec<Arc<dyn Node<TurnState>>> {
    vec![
        Arc::new(ExtractGraphqlQuestionNode),
        Arc::new(ClassifyQueryNode {
            llm: llm_lightweight.clone(),
            budget: budget.clone(),
        }),
        Arc::new(ExtractEntitiesNode {
            llm: llm_lightweight.clone(),
        }),
        Arc::new(ResolveIdsNode {
            lookup: entity_lookup,
            llm: llm_lightweight,
        }),
        Arc::new(BuildAndExecuteGraphqlNode {
            http,
            endpoint,
            budget,
            rate_limiter,
        }),
        Arc::new(FormatGraphqlResultsNode {
            visualization_base_url,
        }),
    ]
}

pub const GRAPHQL_NODE_IDS: [&str; 6] = [
    EXTRACT_GRAPHQL_QUESTION,
    CLASSIFY_QUERY,
    EXTRACT_ENTITIES,
    RESOLVE_IDS,
    BUILD_AND_EXECUTE_GRAPHQL,
    FORMAT_GRAPHQL_RESULTS,
];
