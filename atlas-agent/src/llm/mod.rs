//! Provider-agnostic LLM adapter layer (spec §4.4).
//!
//! `LlmClient` is the capability every pipeline and the agent node invoke
//! through; `anthropic`/`google`/`openai` are the three concrete providers
//! configuration can select by string key, and `mock` is the fixed-response
//! stand-in used in tests (teacher's `MockLlm` pattern).

mod anthropic;
mod google;
mod mock;
mod openai;
mod provider;

pub use anthropic::AnthropicClient;
pub use google::GoogleClient;
pub use mock::MockLlm;
pub use openai::OpenAiClient;
pub use provider::{ModelTier, Provider, ProviderConfig};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AgentError;
use crate::message::{Message, ToolCallRequest};

/// Token usage for one LLM call (prompt + completion).
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A tool definition offered to the model, in provider-neutral shape.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's arguments.
    pub parameters: Value,
}

/// Response from an LLM completion.
#[derive(Clone, Debug, Default)]
pub struct LlmResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCallRequest>,
    pub usage: Option<LlmUsage>,
    pub response_metadata: crate::message::ResponseMetadata,
}

/// Provider-agnostic capability: invoke with optional tools, or request a
/// value matching a declared JSON schema.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// One call; if `tools` is non-empty the model may emit tool calls instead
    /// of (or alongside) text content.
    async fn invoke(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
    ) -> Result<LlmResponse, AgentError>;

    /// Instructs the provider to return a value matching `schema`, then parses
    /// the response content as JSON. Default implementation appends a
    /// schema-following instruction to the prompt's last message and calls
    /// `invoke` with no tools; providers with native structured-output support
    /// override this.
    async fn with_structured_output(
        &self,
        messages: &[Message],
        schema: &Value,
    ) -> Result<Value, AgentError> {
        let mut augmented: Vec<Message> = messages.to_vec();
        let instruction = format!(
            "Respond with a single JSON value matching this schema, and nothing else:\n{}",
            serde_json::to_string(schema).unwrap_or_default()
        );
        augmented.push(Message::human(instruction));
        let response = self.invoke(&augmented, &[]).await?;
        extract_json(&response.content)
            .ok_or_else(|| AgentError::Llm(format!("structured output was not valid JSON: {}", response.content)))
    }
}

/// Normalizes a provider's raw response content (plain string or a list of
/// content blocks `[{"type": "text", "text": "..."}]`) into a single string.
pub fn extract_text(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(blocks) => blocks
            .iter()
            .filter_map(|b| b.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(""),
        other => other.to_string(),
    }
}

/// Best-effort extraction of a JSON value from LLM text output, tolerating a
/// fenced ```json code block around the payload.
fn extract_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }
    let stripped = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed)
        .trim_end_matches("```")
        .trim();
    serde_json::from_str(stripped).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_text_joins_content_blocks() {
        let value = serde_json::json!([{"type": "text", "text": "hello "}, {"type": "text", "text": "world"}]);
        assert_eq!(extract_text(&value), "hello world");
    }

    #[test]
    fn extract_text_passes_through_plain_string() {
        assert_eq!(extract_text(&Value::String("hi".into())), "hi");
    }

    #[test]
    fn extract_json_strips_fenced_code_block() {
        let text = "```json\n{\"a\": 1}\n```";
        assert_eq!(extract_json(text), Some(serde_json::json!({"a": 1})));
    }
}
