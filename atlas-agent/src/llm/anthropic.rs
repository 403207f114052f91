//! Anthropic adapter, via raw `reqwest` calls to the Messages API.
//!
//! No first-party Anthropic SDK is in the teacher's dependency stack;
//! `reqwest` (already pulled in for the GraphQL pipeline, §4.7) covers this
//! without introducing a new crate family.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::instrument;

use super::{extract_text, LlmClient, LlmResponse, LlmUsage, ToolSchema};
use crate::error::AgentError;
use crate::message::{Message, ToolCallRequest};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn to_anthropic_messages(messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .filter_map(|m| match m {
                Message::Human { content } => Some(json!({"role": "user", "content": content})),
                Message::Ai { content, .. } if !content.is_empty() => {
                    Some(json!({"role": "assistant", "content": content}))
                }
                Message::Ai { .. } => None,
                Message::Tool {
                    content,
                    tool_call_id,
                    ..
                } => Some(json!({
                    "role": "user",
                    "content": [{"type": "tool_result", "tool_use_id": tool_call_id, "content": content}],
                })),
            })
            .collect()
    }

    fn to_anthropic_tools(tools: &[ToolSchema]) -> Vec<Value> {
        tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "input_schema": t.parameters,
                })
            })
            .collect()
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    #[instrument(skip(self, messages, tools), fields(model = %self.model))]
    async fn invoke(&self, messages: &[Message], tools: &[ToolSchema]) -> Result<LlmResponse, AgentError> {
        let mut body = json!({
            "model": self.model,
            "max_tokens": 4096,
            "messages": Self::to_anthropic_messages(messages),
        });
        if !tools.is_empty() {
            body["tools"] = json!(Self::to_anthropic_tools(tools));
        }

        let response = self
            .http
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Llm(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::Llm(format!("Anthropic returned {status}: {text}")));
        }

        let payload: Value = response.json().await.map_err(|e| AgentError::Llm(e.to_string()))?;
        let content_blocks = payload
            .get("content")
            .cloned()
            .unwrap_or(Value::Array(vec![]));

        let mut text = String::new();
        let mut tool_calls = Vec::new();
        if let Value::Array(blocks) = &content_blocks {
            for block in blocks {
                match block.get("type").and_then(Value::as_str) {
                    Some("text") => text.push_str(&extract_text(&block["text"])),
                    Some("tool_use") => tool_calls.push(ToolCallRequest {
                        id: block["id"].as_str().unwrap_or_default().to_string(),
                        name: block["name"].as_str().unwrap_or_default().to_string(),
                        args: block["input"].to_string(),
                    }),
                    _ => {}
                }
            }
        }

        let usage = payload.get("usage").map(|u| {
            let prompt = u["input_tokens"].as_u64().unwrap_or(0) as u32;
            let completion = u["output_tokens"].as_u64().unwrap_or(0) as u32;
            LlmUsage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt + completion,
            }
        });

        Ok(LlmResponse {
            content: text,
            tool_calls,
            usage,
            response_metadata: crate::message::ResponseMetadata::new(),
        })
    }
}
