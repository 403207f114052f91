//! SQL pipeline: schema/product resolution → table selection → SQL
//! generation → execution → formatting (spec §4.6).
//!
//! The warehouse is modeled as a read-only `rusqlite::Connection`, the same
//! crate the checkpoint store already depends on, rather than introducing a
//! separate Postgres driver the original implementation used — see DESIGN.md.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;

use crate::error::AgentError;
use crate::graph::{Next, Node, RunContext};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::stream_data::StreamData;
use crate::timing::NodeTimer;
use crate::turn_state::{ResolvedProduct, SqlScratchpad, TurnState};
use crate::usage::usage_record_from_llm_usage;

use super::shared::{parse_tool_args, rejected_parallel_tool_messages};

pub const EXTRACT_TOOL_QUESTION: &str = "extract_tool_question";
const EXTRACT_PRODUCTS: &str = "extract_products";
const LOOKUP_CODES: &str = "lookup_codes";
const GET_TABLE_INFO: &str = "get_table_info";
const GENERATE_SQL: &str = "generate_sql";
const EXECUTE_SQL: &str = "execute_sql";
const FORMAT_RESULTS: &str = "format_results";

/// One table's human-readable description and DDL-style column listing,
/// preloaded from a configuration artifact at startup.
#[derive(Clone, Debug)]
pub struct TableDescriptor {
    pub name: String,
    pub description: String,
    pub columns: Vec<(String, String)>,
}

/// Tables grouped by classification schema (HS92, HS12, SITC, ...).
#[derive(Clone, Debug, Default)]
pub struct TableCatalog {
    schemas: HashMap<String, Vec<TableDescriptor>>,
}

impl TableCatalog {
    pub fn new(schemas: HashMap<String, Vec<TableDescriptor>>) -> Self {
        Self { schemas }
    }

    pub fn describe(&self, schema: &str) -> String {
        let Some(tables) = self.schemas.get(schema) else {
            return format!("(no table catalog entry for schema {schema})");
        };
        let mut out = format!("Schema: {schema}\n");
        for table in tables {
            out.push_str(&format!("  Table {}: {}\n", table.name, table.description));
            for (col, ty) in &table.columns {
                out.push_str(&format!("    {col} {ty}\n"));
            }
        }
        out
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct SchemasAndProducts {
    #[serde(default)]
    classification_schemas: Vec<String>,
    #[serde(default)]
    products: Vec<ProductMention>,
    #[serde(default)]
    requires_product_lookup: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct ProductMention {
    name: String,
    classification_schema: String,
    #[serde(default)]
    candidate_codes: Vec<String>,
}

const METADATA_SCHEMA: &str = "classification_metadata";

fn sql_pipeline_tag() -> &'static str {
    "sql"
}

pub struct ExtractToolQuestionNode;

#[async_trait]
impl Node<TurnState> for ExtractToolQuestionNode {
    fn id(&self) -> &str {
        EXTRACT_TOOL_QUESTION
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
        state.sql = SqlScratchpad {
            question,
            context,
            ..Default::default()
        };
        StreamData::pipeline_state(self.id(), serde_json::json!({"question": state.sql.question}))
            .emit(&ctx.stream_writer())
            .await;
        Ok((state, Next::Continue))
    }

    async fn run(&self, state: TurnState) -> Result<(TurnState, Next), AgentError> {
        self.run_with_context(state, &RunContext::new(Default::default())).await
    }
}

pub struct ExtractProductsNode {
    pub llm: Arc<dyn LlmClient>,
}

#[async_trait]
impl Node<TurnState> for ExtractProductsNode {
    fn id(&self) -> &str {
        EXTRACT_PRODUCTS
    }

    async fn run_with_context(
        &self,
        mut state: TurnState,
        ctx: &RunContext<TurnState>,
    ) -> Result<(TurnState, Next), AgentError> {
        StreamData::node_start(self.id(), "Classify products")
            .emit(&ctx.stream_writer())
            .await;
        let mut timer = NodeTimer::start(self.id(), sql_pipeline_tag());
        let schema = serde_json::json!({
            "type": "object",
            "properties": {
                "classification_schemas": {"type": "array", "items": {"type": "string"}},
                "products": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "name": {"type": "string"},
                            "classification_schema": {"type": "string"},
                            "candidate_codes": {"type": "array", "items": {"type": "string"}},
                        },
                    },
                },
                "requires_product_lookup": {"type": "boolean"},
            },
        });
        let prompt = format!(
            "Question: {}\n\nIdentify which classification schemas (HS92, HS12, SITC, services_unilateral, services_bilateral) this question implies. Default to HS92 for goods questions when unspecified. Include both a goods and a services schema only when the question clearly asks for both; never return more than two non-classification schemas. Also identify whether specific product names are mentioned without explicit codes.",
            state.sql.question
        );
        let llm_start = std::time::Instant::now();
        let parsed: SchemasAndProducts = self
            .llm
            .with_structured_output(&[Message::human(prompt)], &schema)
            .await
            .and_then(|v| serde_json::from_value(v).map_err(|e| AgentError::Llm(e.to_string())))
            .unwrap_or_default();
        timer.add_llm_ms(llm_start.elapsed().as_millis() as u64);

        let mut schemas = parsed.classification_schemas;
        if schemas.is_empty() {
            schemas.push("HS92".to_string());
        }
        if !schemas.contains(&METADATA_SCHEMA.to_string()) {
            schemas.push(METADATA_SCHEMA.to_string());
        }
        state.sql.classification_schemas = schemas;
        state.sql.products = parsed
            .products
            .into_iter()
            .map(|p| ResolvedProduct {
                product_name: p.name,
                classification_schema: p.classification_schema,
                codes: p.candidate_codes,
            })
            .collect();

        state.record_timing(timer.finish());
        StreamData::pipeline_state(
            self.id(),
            serde_json::json!({"classification_schemas": state.sql.classification_schemas}),
        )
        .emit(&ctx.stream_writer())
        .await;
        Ok((state, Next::Continue))
    }

    async fn run(&self, state: TurnState) -> Result<(TurnState, Next), AgentError> {
        self.run_with_context(state, &RunContext::new(Default::default())).await
    }
}

/// Looks up product codes against the classification table: exact match,
/// then a substring search over `name_short_en` as a stand-in for full-text
/// ranking (the original's Postgres tsvector/pg_trgm search has no SQLite
/// equivalent in this dependency stack — see DESIGN.md).
pub struct LookupCodesNode {
    pub llm: Arc<dyn LlmClient>,
    pub warehouse: Arc<AsyncMutex<rusqlite::Connection>>,
}

impl LookupCodesNode {
    fn candidates_for(conn: &rusqlite::Connection, schema: &str, mention: &ProductMention) -> Vec<String> {
        let mut candidates = Vec::new();
        for code in &mention.candidate_codes {
            let exists: bool = conn
                .query_row(
                    "SELECT 1 FROM classification_codes WHERE schema = ?1 AND code = ?2",
                    rusqlite::params![schema, code],
                    |_| Ok(true),
                )
                .unwrap_or(false);
            if exists {
                candidates.push(code.clone());
            }
        }
        let like_pattern = format!("%{}%", mention.name.to_lowercase());
        if let Ok(mut stmt) = conn.prepare(
            "SELECT code FROM classification_codes WHERE schema = ?1 AND lower(name_short_en) LIKE ?2 LIMIT 10",
        ) {
            if let Ok(rows) = stmt.query_map(rusqlite::params![schema, like_pattern], |row| row.get::<_, String>(0)) {
                for row in rows.flatten() {
                    if !candidates.contains(&row) {
                        candidates.push(row);
                    }
                }
            }
        }
        candidates
    }
}

#[async_trait]
impl Node<TurnState> for LookupCodesNode {
    fn id(&self) -> &str {
        LOOKUP_CODES
    }

    async fn run_with_context(
        &self,
        mut state: TurnState,
        ctx: &RunContext<TurnState>,
    ) -> Result<(TurnState, Next), AgentError> {
        StreamData::node_start(self.id(), "Resolve product codes")
            .emit(&ctx.stream_writer())
            .await;
        if state.sql.products.is_empty() {
            return Ok((state, Next::Continue));
        }
        let mut timer = NodeTimer::start(self.id(), sql_pipeline_tag());
        let io_start = std::time::Instant::now();
        let candidate_sets: Vec<(ResolvedProduct, Vec<String>)> = {
            let conn = self.warehouse.lock().await;
            state
                .sql
                .products
                .iter()
                .map(|p| {
                    let mention = ProductMention {
                        name: p.product_name.clone(),
                        classification_schema: p.classification_schema.clone(),
                        candidate_codes: p.codes.clone(),
                    };
                    let codes = Self::candidates_for(&conn, &p.classification_schema, &mention);
                    (p.clone(), codes)
                })
                .collect()
        };
        timer.add_io_ms(io_start.elapsed().as_millis() as u64);

        let listing: Vec<serde_json::Value> = candidate_sets
            .iter()
            .map(|(p, codes)| {
                serde_json::json!({
                    "product_name": p.product_name,
                    "classification_schema": p.classification_schema,
                    "candidate_codes": codes,
                })
            })
            .collect();
        let schema = serde_json::json!({
            "type": "object",
            "properties": {
                "selections": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "product_name": {"type": "string"},
                            "classification_schema": {"type": "string"},
                            "codes": {"type": "array", "items": {"type": "string"}},
                        },
                    },
                },
            },
        });
        let prompt = format!(
            "Question: {}\n\nGiven these candidate codes per product, pick the final code list for each product:\n{}",
            state.sql.question,
            serde_json::to_string_pretty(&listing).unwrap_or_default()
        );
        let llm_start = std::time::Instant::now();
        #[derive(Deserialize, Default)]
        struct Selections {
            #[serde(default)]
            selections: Vec<ResolvedProductJson>,
        }
        #[derive(Deserialize)]
        struct ResolvedProductJson {
            product_name: String,
            classification_schema: String,
            #[serde(default)]
            codes: Vec<String>,
        }
        let selections: Selections = self
            .llm
            .with_structured_output(&[Message::human(prompt)], &schema)
            .await
            .and_then(|v| serde_json::from_value(v).map_err(|e| AgentError::Llm(e.to_string())))
            .unwrap_or_default();
        timer.add_llm_ms(llm_start.elapsed().as_millis() as u64);

        state.sql.products = if selections.selections.is_empty() {
            candidate_sets
                .into_iter()
                .map(|(mut p, codes)| {
                    p.codes = codes;
                    p
                })
                .collect()
        } else {
            selections
                .selections
                .into_iter()
                .map(|s| ResolvedProduct {
                    product_name: s.product_name,
                    classification_schema: s.classification_schema,
                    codes: s.codes,
                })
                .collect()
        };

        state.record_timing(timer.finish());
        Ok((state, Next::Continue))
    }

    async fn run(&self, state: TurnState) -> Result<(TurnState, Next), AgentError> {
        self.run_with_context(state, &RunContext::new(Default::default())).await
    }
}

pub struct GetTableInfoNode {
    pub catalog: Arc<TableCatalog>,
}

#[async_trait]
impl Node<TurnState> for GetTableInfoNode {
    fn id(&self) -> &str {
        GET_TABLE_INFO
    }

    async fn run_with_context(
        &self,
        mut state: TurnState,
        ctx: &RunContext<TurnState>,
    ) -> Result<(TurnState, Next), AgentError> {
        StreamData::node_start(self.id(), "Assemble table info")
            .emit(&ctx.stream_writer())
            .await;
        let info = state
            .sql
            .classification_schemas
            .iter()
            .map(|s| self.catalog.describe(s))
            .collect::<Vec<_>>()
            .join("\n");
        state.sql.table_info = info;
        Ok((state, Next::Continue))
    }

    async fn run(&self, state: TurnState) -> Result<(TurnState, Next), AgentError> {
        self.run_with_context(state, &RunContext::new(Default::default())).await
    }
}

pub struct GenerateSqlNode {
    pub llm: Arc<dyn LlmClient>,
    pub max_rows: u32,
    pub sql_max_year: u32,
}

#[async_trait]
impl Node<TurnState> for GenerateSqlNode {
    fn id(&self) -> &str {
        GENERATE_SQL
    }

    async fn run_with_context(
        &self,
        mut state: TurnState,
        ctx: &RunContext<TurnState>,
    ) -> Result<(TurnState, Next), AgentError> {
        StreamData::node_start(self.id(), "Generate SQL")
            .emit(&ctx.stream_writer())
            .await;
        let mut timer = NodeTimer::start(self.id(), sql_pipeline_tag());

        let product_code_block = if state.sql.products.is_empty() {
            String::new()
        } else {
            format!(
                "Resolved product codes:\n{}",
                state
                    .sql
                    .products
                    .iter()
                    .map(|p| format!("- {} ({}): {}", p.product_name, p.classification_schema, p.codes.join(", ")))
                    .collect::<Vec<_>>()
                    .join("\n")
            )
        };
        let direction_block = state
            .override_direction
            .map(|d| format!("Trade direction is pinned to: {:?}", d))
            .unwrap_or_default();
        let mode_block = state
            .override_mode
            .map(|m| format!("Goods/services mode is pinned to: {:?}", m))
            .unwrap_or_default();
        let technical_context_block = if state.sql.context.is_empty() {
            String::new()
        } else {
            format!("Additional context: {}", state.sql.context)
        };

        let prompt = crate::prompts::SQL_GENERATION_TEMPLATE
            .replace("{max_rows}", &self.max_rows.to_string())
            .replace("{question}", &state.sql.question)
            .replace("{table_info}", &state.sql.table_info)
            .replace("{product_code_block}", &product_code_block)
            .replace("{direction_block}", &direction_block)
            .replace("{mode_block}", &mode_block)
            .replace("{technical_context_block}", &technical_context_block)
            + &format!("\n\nData is available only through {}.", self.sql_max_year);

        let llm_start = std::time::Instant::now();
        let response = self.llm.invoke(&[Message::human(prompt)], &[]).await?;
        timer.add_llm_ms(llm_start.elapsed().as_millis() as u64);
        if let Some(usage) = &response.usage {
            state.record_usage(usage_record_from_llm_usage(
                self.id(),
                sql_pipeline_tag(),
                "frontier",
                usage,
            ));
        }

        state.sql.sql = strip_sql_fence(&response.content);
        state.record_timing(timer.finish());
        StreamData::pipeline_state(self.id(), serde_json::json!({"sql": state.sql.sql}))
            .emit(&ctx.stream_writer())
            .await;
        Ok((state, Next::Continue))
    }

    async fn run(&self, state: TurnState) -> Result<(TurnState, Next), AgentError> {
        self.run_with_context(state, &RunContext::new(Default::default())).await
    }
}

fn strip_sql_fence(text: &str) -> String {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```sql")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed)
        .trim_end_matches("```")
        .trim()
        .to_string()
}

const EXECUTE_SQL_TIMEOUT: Duration = Duration::from_secs(30);
const RETRY_BASE_DELAY: Duration = Duration::from_secs(2);
const RETRY_MAX_DELAY: Duration = Duration::from_secs(10);
const RETRY_MAX_ATTEMPTS: u32 = 3;

pub struct ExecuteSqlNode {
    pub warehouse: Arc<AsyncMutex<rusqlite::Connection>>,
}

fn table_names_from_sql(sql: &str) -> Vec<String> {
    let re = Regex::new(r"(?i)\bfrom\s+([a-zA-Z0-9_\.]+)|\bjoin\s+([a-zA-Z0-9_\.]+)").unwrap();
    let mut tables = Vec::new();
    for cap in re.captures_iter(sql) {
        if let Some(m) = cap.get(1).or_else(|| cap.get(2)) {
            let name = m.as_str().to_string();
            if !tables.contains(&name) {
                tables.push(name);
            }
        }
    }
    tables
}

fn is_transient(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("timeout") || lower.contains("timed out") || lower.contains("connection")
}

#[async_trait]
impl Node<TurnState> for ExecuteSqlNode {
    fn id(&self) -> &str {
        EXECUTE_SQL
    }

    async fn run_with_context(
        &self,
        mut state: TurnState,
        ctx: &RunContext<TurnState>,
    ) -> Result<(TurnState, Next), AgentError> {
        StreamData::node_start(self.id(), "Execute SQL")
            .emit(&ctx.stream_writer())
            .await;
        let mut timer = NodeTimer::start(self.id(), sql_pipeline_tag());
        let sql = state.sql.sql.clone();
        let io_start = std::time::Instant::now();

        let mut attempt = 0;
        let mut last_error = String::new();
        let mut outcome: Option<(Vec<String>, Vec<Vec<String>>)> = None;
        while attempt < RETRY_MAX_ATTEMPTS {
            attempt += 1;
            let warehouse = self.warehouse.clone();
            let sql_owned = sql.clone();
            let result = tokio::time::timeout(
                EXECUTE_SQL_TIMEOUT,
                tokio::task::spawn_blocking(move || run_select(&warehouse, &sql_owned)),
            )
            .await;
            match result {
                Ok(Ok(Ok(rows))) => {
                    outcome = Some(rows);
                    break;
                }
                Ok(Ok(Err(e))) => {
                    last_error = e;
                    if !is_transient(&last_error) || attempt >= RETRY_MAX_ATTEMPTS {
                        break;
                    }
                }
                Ok(Err(join_err)) => {
                    last_error = join_err.to_string();
                    break;
                }
                Err(_elapsed) => {
                    last_error = "SQL execution timed out".to_string();
                    if attempt >= RETRY_MAX_ATTEMPTS {
                        break;
                    }
                }
            }
            let delay = (RETRY_BASE_DELAY * 2u32.pow(attempt - 1)).min(RETRY_MAX_DELAY);
            tokio::time::sleep(delay).await;
        }
        timer.add_io_ms(io_start.elapsed().as_millis() as u64);

        match outcome {
            Some((columns, rows)) => {
                state.sql.result_columns = columns;
                state.sql.result = if rows.is_empty() {
                    "SQL query returned no results.".to_string()
                } else {
                    format!("{} row(s) returned.", rows.len())
                };
                state.sql.result_rows = rows;
                state.sql.tables_referenced = table_names_from_sql(&sql);
                state.last_error.clear();
            }
            None => {
                state.last_error = format!("QueryExecutionError: {last_error}");
            }
        }
        state.sql.execution_time_ms = io_start.elapsed().as_millis() as u64;
        state.record_timing(timer.finish());
        StreamData::pipeline_state(
            self.id(),
            serde_json::json!({
                "row_count": state.sql.result_rows.len(),
                "execution_time_ms": state.sql.execution_time_ms,
                "tables": state.sql.tables_referenced,
                "success": state.last_error.is_empty(),
            }),
        )
        .emit(&ctx.stream_writer())
        .await;
        Ok((state, Next::Continue))
    }

    async fn run(&self, state: TurnState) -> Result<(TurnState, Next), AgentError> {
        self.run_with_context(state, &RunContext::new(Default::default())).await
    }
}

fn run_select(
    warehouse: &Arc<AsyncMutex<rusqlite::Connection>>,
    sql: &str,
) -> Result<(Vec<String>, Vec<Vec<String>>), String> {
    let conn = warehouse.blocking_lock();
    let mut stmt = conn.prepare(sql).map_err(|e| e.to_string())?;
    let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
    let column_count = columns.len();
    let rows = stmt
        .query_map([], |row| {
            (0..column_count)
                .map(|i| {
                    row.get_ref(i)
                        .map(|v| match v {
                            rusqlite::types::ValueRef::Null => String::new(),
                            rusqlite::types::ValueRef::Integer(n) => n.to_string(),
                            rusqlite::types::ValueRef::Real(f) => f.to_string(),
                            rusqlite::types::ValueRef::Text(t) => String::from_utf8_lossy(t).to_string(),
                            rusqlite::types::ValueRef::Blob(_) => "<blob>".to_string(),
                        })
                        .unwrap_or_default()
                })
                .collect::<Vec<String>>()
        })
        .map_err(|e| e.to_string())?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row.map_err(|e| e.to_string())?);
    }
    Ok((columns, out))
}

pub struct FormatResultsNode;

#[async_trait]
impl Node<TurnState> for FormatResultsNode {
    fn id(&self) -> &str {
        FORMAT_RESULTS
    }

    async fn run_with_context(
        &self,
        mut state: TurnState,
        ctx: &RunContext<TurnState>,
    ) -> Result<(TurnState, Next), AgentError> {
        StreamData::node_start(self.id(), "Format results")
            .emit(&ctx.stream_writer())
            .await;
        if let Some(call) = state.pending_tool_call().cloned() {
            let content = if state.last_error.is_empty() {
                let mut body = format!("{}\n", state.sql.result);
                if !state.sql.result_rows.is_empty() {
                    body.push_str(&format!("Columns: {}\n", state.sql.result_columns.join(", ")));
                    for row in state.sql.result_rows.iter().take(50) {
                        body.push_str(&format!("{}\n", row.join(" | ")));
                    }
                }
                body
            } else {
                format!("The query failed: {}", state.last_error)
            };
            state.messages.push(Message::tool(content, call.id, call.name));
            state.queries_executed += 1;
        }
        for extra in rejected_parallel_tool_messages(&state) {
            state.messages.push(extra);
        }
        StreamData::tool_output(state.sql.result.clone())
            .emit(&ctx.stream_writer())
            .await;
        Ok((state, Next::Node(crate::agent_node::AGENT_NODE_ID.to_string())))
    }

    async fn run(&self, state: TurnState) -> Result<(TurnState, Next), AgentError> {
        self.run_with_context(state, &RunContext::new(Default::default())).await
    }
}

/// Full ordered SQL pipeline, wired by the graph builder.
pub fn sql_pipeline_nodes(
    llm_frontier: Arc<dyn LlmClient>,
    llm_lightweight: Arc<dyn LlmClient>,
    catalog: Arc<TableCatalog>,
    warehouse: Arc<AsyncMutex<rusqlite::Connection>>,
    max_rows: u32,
    sql_max_year: u32,
) -> Vec<Arc<dyn Node<TurnState>>> {
    vec![
        Arc::new(ExtractToolQuestionNode),
        Arc::new(ExtractProductsNode {
            llm: llm_lightweight.clone(),
        }),
        Arc::new(LookupCodesNode {
            llm: llm_lightweight,
            warehouse: warehouse.clone(),
        }),
        Arc::new(GetTableInfoNode { catalog }),
        Arc::new(GenerateSqlNode {
            llm: llm_frontier,
            max_rows,
            sql_max_year,
        }),
        Arc::new(ExecuteSqlNode { warehouse }),
        Arc::new(FormatResultsNode),
    ]
}

/// Node ids in pipeline order, for wiring unconditional edges in the graph builder.
pub const SQL_NODE_IDS: [&str; 7] = [
    EXTRACT_TOOL_QUESTION,
    EXTRACT_PRODUCTS,
    LOOKUP_CODES,
    GET_TABLE_INFO,
    GENERATE_SQL,
    EXECUTE_SQL,
    FORMAT_RESULTS,
];
