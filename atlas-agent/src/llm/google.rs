//! Google (Gemini) adapter, via raw `reqwest` calls to the generateContent API.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::instrument;

use super::{extract_text, LlmClient, LlmResponse, LlmUsage, ToolSchema};
use crate::error::AgentError;
use crate::message::{Message, ToolCallRequest};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GoogleClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GoogleClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn to_gemini_contents(messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .map(|m| match m {
                Message::Human { content } => {
                    json!({"role": "user", "parts": [{"text": content}]})
                }
                Message::Ai { content, .. } => {
                    json!({"role": "model", "parts": [{"text": content}]})
                }
                Message::Tool { content, name, .. } => json!({
                    "role": "user",
                    "parts": [{"functionResponse": {"name": name, "response": {"content": content}}}],
                }),
            })
            .collect()
    }

    fn to_gemini_tools(tools: &[ToolSchema]) -> Value {
        json!([{
            "functionDeclarations": tools.iter().map(|t| json!({
                "name": t.name,
                "description": t.description,
                "parameters": t.parameters,
            })).collect::<Vec<_>>(),
        }])
    }
}

#[async_trait]
impl LlmClient for GoogleClient {
    #[instrument(skip(self, messages, tools), fields(model = %self.model))]
    async fn invoke(&self, messages: &[Message], tools: &[ToolSchema]) -> Result<LlmResponse, AgentError> {
        let mut body = json!({ "contents": Self::to_gemini_contents(messages) });
        if !tools.is_empty() {
            body["tools"] = Self::to_gemini_tools(tools);
        }

        let url = format!("{API_BASE}/{}:generateContent?key={}", self.model, self.api_key);
        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Llm(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::Llm(format!("Google returned {status}: {text}")));
        }

        let payload: Value = response.json().await.map_err(|e| AgentError::Llm(e.to_string()))?;
        let parts = payload["candidates"][0]["content"]["parts"]
            .as_array()
            .cloned()
            .unwrap_or_default();

        let mut text = String::new();
        let mut tool_calls = Vec::new();
        for part in &parts {
            if let Some(t) = part.get("text") {
                text.push_str(&extract_text(t));
            }
            if let Some(call) = part.get("functionCall") {
                tool_calls.push(ToolCallRequest {
                    id: format!("call_{}", tool_calls.len()),
                    name: call["name"].as_str().unwrap_or_default().to_string(),
                    args: call["args"].to_string(),
                });
            }
        }

        let usage = payload.get("usageMetadata").map(|u| {
            let prompt = u["promptTokenCount"].as_u64().unwrap_or(0) as u32;
            let completion = u["candidatesTokenCount"].as_u64().unwrap_or(0) as u32;
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
