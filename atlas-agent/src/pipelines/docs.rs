//! Docs pipeline: select relevant methodology documents, synthesize an
//! answer from them (spec §4.8). Documents are markdown files with a YAML
//! frontmatter manifest (spec §6.4), preloaded once at startup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AgentError;
use crate::graph::{Next, Node, RunContext};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::stream_data::StreamData;
use crate::timing::NodeTimer;
use crate::turn_state::TurnState;
use crate::usage::usage_record_from_llm_usage;

use super::shared::{parse_tool_args, rejected_parallel_tool_messages};

pub const EXTRACT_DOCS_QUESTION: &str = "extract_docs_question";
const SELECT_DOCS: &str = "select_docs";
const SYNTHESIZE_DOCS: &str = "synthesize_docs";
const FORMAT_DOCS_RESULTS: &str = "format_docs_results";

const MAX_DOCS_PER_SELECTION: usize = 2;

fn docs_pipeline_tag() -> &'static str {
    "docs"
}

/// One methodology document's frontmatter plus its preloaded body.
#[derive(Clone, Debug, Deserialize)]
pub struct DocEntry {
    pub filename: String,
    pub title: String,
    pub purpose: String,
    #[serde(default)]
    pub when_to_load: Vec<String>,
    #[serde(default)]
    pub when_not_to_load: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub related_docs: Vec<String>,
    #[serde(skip)]
    pub body: String,
}

#[derive(Deserialize)]
struct Frontmatter {
    title: String,
    purpose: String,
    #[serde(default)]
    when_to_load: Vec<String>,
    #[serde(default)]
    when_not_to_load: Vec<String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    related_docs: Vec<String>,
}

/// All methodology documents, loaded once from a directory at startup.
/// Files are kept sorted by filename (spec §6.4's deterministic ordering).
#[derive(Clone, Debug, Default)]
pub struct DocManifest {
    entries: Vec<DocEntry>,
    dir: PathBuf,
}

impl DocManifest {
    pub fn entries(&self) -> &[DocEntry] {
        &self.entries
    }

    /// Re-reads one document's body straight from disk, bypassing the
    /// preloaded cache. Used when a cached body turns up unexpectedly empty.
    pub fn reload_body(&self, filename: &str) -> Option<String> {
        let raw = std::fs::read_to_string(self.dir.join(filename)).ok()?;
        Self::parse_document(filename, &raw).ok().map(|d| d.body)
    }

    /// Parses a single document's `---`-delimited YAML frontmatter followed
    /// by its markdown body.
    pub fn parse_document(filename: &str, raw: &str) -> Result<DocEntry, AgentError> {
        let mut parts = raw.splitn(3, "---\n");
        let _leading = parts.next();
        let frontmatter_src = parts
            .next()
            .ok_or_else(|| AgentError::node("docs_manifest", format!("{filename}: missing frontmatter")))?;
        let body = parts.next().unwrap_or_default().trim().to_string();
        let fm: Frontmatter = serde_yaml::from_str(frontmatter_src)
            .map_err(|e| AgentError::node("docs_manifest", format!("{filename}: {e}")))?;
        Ok(DocEntry {
            filename: filename.to_string(),
            title: fm.title,
            purpose: fm.purpose,
            when_to_load: fm.when_to_load,
            when_not_to_load: fm.when_not_to_load,
            keywords: fm.keywords,
            related_docs: fm.related_docs,
            body,
        })
    }

    /// Loads every `.md` file directly under `dir`, sorted by filename.
    pub fn load_from_dir(dir: &Path) -> Result<Self, AgentError> {
        let mut filenames = Vec::new();
        let read_dir = std::fs::read_dir(dir)
            .map_err(|e| AgentError::node("docs_manifest", format!("{}: {e}", dir.display())))?;
        for entry in read_dir {
            let entry = entry.map_err(|e| AgentError::node("docs_manifest", e.to_string()))?;
            if entry.path().extension().and_then(|e| e.to_str()) == Some("md") {
                filenames.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        filenames.sort();

        let mut entries = Vec::new();
        for filename in filenames {
            let raw = std::fs::read_to_string(dir.join(&filename))
                .map_err(|e| AgentError::node("docs_manifest", format!("{filename}: {e}")))?;
            entries.push(Self::parse_document(&filename, &raw)?);
        }
        Ok(Self {
            entries,
            dir: dir.to_path_buf(),
        })
    }

    /// Index listing shown to the LLM: title, purpose, and load triggers,
    /// never full bodies (kept out of context until a doc is selected).
    pub fn index_listing(&self) -> String {
        self.entries
            .iter()
            .map(|d| {
                format!(
                    "- {} ({}): {}\n  when to use: {}\n  when not to use: {}",
                    d.filename,
                    d.title,
                    d.purpose,
                    d.when_to_load.join("; "),
                    d.when_not_to_load.join("; ")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn get(&self, filename: &str) -> Option<&DocEntry> {
        self.entries.iter().find(|d| d.filename == filename)
    }
}

pub struct ExtractDocsQuestionNode;

#[async_trait]
impl Node<TurnState> for ExtractDocsQuestionNode {
    fn id(&self) -> &str {
        EXTRACT_DOCS_QUESTION
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
        state.docs = Default::default();
        state.docs.question = question;
        state.docs.context = context;
        Ok((state, Next::Continue))
    }

    async fn run(&self, state: TurnState) -> Result<(TurnState, Next), AgentError> {
        self.run_with_context(state, &RunContext::new(Default::default())).await
    }
}

#[derive(Deserialize, Serialize, Default)]
struct DocSelection {
    #[serde(default)]
    filenames: Vec<String>,
}

pub struct SelectDocsNode {
    pub llm: Arc<dyn LlmClient>,
    pub manifest: Arc<DocManifest>,
}

#[async_trait]
impl Node<TurnState> for SelectDocsNode {
    fn id(&self) -> &str {
        SELECT_DOCS
    }

    async fn run_with_context(
        &self,
        mut state: TurnState,
        ctx: &RunContext<TurnState>,
    ) -> Result<(TurnState, Next), AgentError> {
        StreamData::node_start(self.id(), "Select documents")
            .emit(&ctx.stream_writer())
            .await;
        let mut timer = NodeTimer::start(self.id(), docs_pipeline_tag());
        let schema = serde_json::json!({
            "type": "object",
            "properties": {
                "filenames": {
                    "type": "array",
                    "items": {"type": "string"},
                    "maxItems": MAX_DOCS_PER_SELECTION,
                },
            },
        });
        let prompt = format!(
            "Question: {}\n\nAvailable documents:\n{}\n\nSelect at most {} filenames of the documents most relevant to answering this question. Return an empty list if none apply.",
            state.docs.question,
            self.manifest.index_listing(),
            MAX_DOCS_PER_SELECTION
        );
        let llm_start = std::time::Instant::now();
        let outcome = self
            .llm
            .with_structured_output(&[Message::human(prompt)], &schema)
            .await
            .and_then(|v| serde_json::from_value::<DocSelection>(v).map_err(|e| AgentError::Llm(e.to_string())));
        timer.add_llm_ms(llm_start.elapsed().as_millis() as u64);

        // Spec §4.8 step 2: an LLM error, or a selection that names no real
        // document, falls back to every document rather than none.
        let valid_selection = outcome.ok().map(|s| {
            s.filenames
                .into_iter()
                .filter(|f| self.manifest.get(f).is_some())
                .take(MAX_DOCS_PER_SELECTION)
                .collect::<Vec<_>>()
        });
        state.docs.selected_files = match valid_selection {
            Some(files) if !files.is_empty() => files,
            _ => self.manifest.entries().iter().map(|d| d.filename.clone()).collect(),
        };
        state.record_timing(timer.finish());
        StreamData::pipeline_state(self.id(), serde_json::json!({"selected_files": state.docs.selected_files}))
            .emit(&ctx.stream_writer())
            .await;
        Ok((state, Next::Continue))
    }

    async fn run(&self, state: TurnState) -> Result<(TurnState, Next), AgentError> {
        self.run_with_context(state, &RunContext::new(Default::default())).await
    }
}

pub struct SynthesizeDocsNode {
    pub llm: Arc<dyn LlmClient>,
    pub manifest: Arc<DocManifest>,
}

#[async_trait]
impl Node<TurnState> for SynthesizeDocsNode {
    fn id(&self) -> &str {
        SYNTHESIZE_DOCS
    }

    async fn run_with_context(
        &self,
        mut state: TurnState,
        ctx: &RunContext<TurnState>,
    ) -> Result<(TurnState, Next), AgentError> {
        StreamData::node_start(self.id(), "Synthesize answer")
            .emit(&ctx.stream_writer())
            .await;

        if state.docs.selected_files.is_empty() {
            state.docs.synthesis = "No documentation files could be loaded.".to_string();
            return Ok((state, Next::Continue));
        }

        let mut timer = NodeTimer::start(self.id(), docs_pipeline_tag());
        let bodies = state
            .docs
            .selected_files
            .iter()
            .filter_map(|f| self.manifest.get(f).map(|d| (f, d)))
            .map(|(f, d)| {
                let body = if d.body.is_empty() {
                    self.manifest.reload_body(f).unwrap_or_default()
                } else {
                    d.body.clone()
                };
                format!("## {}\n\n{}", d.title, body)
            })
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");

        if bodies.trim().is_empty() {
            state.docs.synthesis = "No documentation files could be loaded.".to_string();
            return Ok((state, Next::Continue));
        }

        let prompt = format!(
            "Question: {}\n\nUsing only the documentation below, answer the question. If the documents do not contain an answer, say so plainly.\n\n{}",
            state.docs.question, bodies
        );
        let llm_start = std::time::Instant::now();
        let result = self.llm.invoke(&[Message::human(prompt)], &[]).await;
        timer.add_llm_ms(llm_start.elapsed().as_millis() as u64);

        state.docs.synthesis = match result {
            Ok(response) => {
                if let Some(usage) = &response.usage {
                    state.record_usage(usage_record_from_llm_usage(
                        self.id(),
                        docs_pipeline_tag(),
                        "lightweight",
                        usage,
                    ));
                }
                response.content
            }
            Err(e) => {
                // Spec §4.8 step 3: if synthesis itself raises, fall back to
                // the raw concatenated document bodies rather than failing the turn.
                warn!(error = %e, "doc synthesis call failed, falling back to raw document bodies");
                bodies
            }
        };
        state.record_timing(timer.finish());
        Ok((state, Next::Continue))
    }

    async fn run(&self, state: TurnState) -> Result<(TurnState, Next), AgentError> {
        self.run_with_context(state, &RunContext::new(Default::default())).await
    }
}

pub struct FormatDocsResultsNode;

#[async_trait]
impl Node<TurnState> for FormatDocsResultsNode {
    fn id(&self) -> &str {
        FORMAT_DOCS_RESULTS
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
            state
                .messages
                .push(Message::tool(state.docs.synthesis.clone(), call.id, call.name));
        }
        for extra in rejected_parallel_tool_messages(&state) {
            state.messages.push(extra);
        }
        StreamData::tool_output(state.docs.synthesis.clone())
            .emit(&ctx.stream_writer())
            .await;
        Ok((state, Next::Node(crate::agent_node::AGENT_NODE_ID.to_string())))
    }

    async fn run(&self, state: TurnState) -> Result<(TurnState, Next), AgentError> {
        self.run_with_context(state, &RunContext::new(Default::default())).await
    }
}

pub fn docs_pipeline_nodes(
    llm_lightweight: Arc<dyn LlmClient>,
    manifest: Arc<DocManifest>,
) -> Vec<Arc<dyn Node<TurnState>>> {
    vec![
        Arc::new(ExtractDocsQuestionNode),
        Arc::new(SelectDocsNode {
            llm: llm_lightweight.clone(),
            manifest: manifest.clone(),
        }),
        Arc::new(SynthesizeDocsNode {
            llm: llm_lightweight,
            manifest,
        }),
        Arc::new(FormatDocsResultsNode),
    ]
}

pub const DOCS_NODE_IDS: [&str; 4] = [
    EXTRACT_DOCS_QUESTION,
    SELECT_DOCS,
    SYNTHESIZE_DOCS,
    FORMAT_DOCS_RESULTS,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_document_reads_frontmatter_and_body() {
        let raw = "---\ntitle: Trade Value Definitions\npurpose: defines export/import value conventions\nwhen_to_load:\n  - \"what does export value mean\"\nwhen_not_to_load:\n  - \"how do I cite this data\"\nkeywords:\n  - fob\n  - cif\nrelated_docs: []\n---\nExport values are reported FOB.\n";
        let entry = DocManifest::parse_document("trade_value.md", raw).unwrap();
        assert_eq!(entry.title, "Trade Value Definitions");
        assert!(entry.body.contains("FOB"));
        assert_eq!(entry.keywords, vec!["fob", "cif"]);
    }

    #[test]
    fn index_listing_includes_every_entry() {
        let manifest = DocManifest {
            entries: vec![DocEntry {
                filename: "a.md".into(),
                title: "A".into(),
                purpose: "p".into(),
                when_to_load: vec![],
                when_not_to_load: vec![],
                keywords: vec![],
                related_docs: vec![],
                body: String::new(),
            }],
            dir: PathBuf::new(),
        };
        assert!(manifest.index_listing().contains("a.md"));
    }
}
