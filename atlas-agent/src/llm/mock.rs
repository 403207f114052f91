//! Fixed-response `LlmClient` for tests.

use async_trait::async_trait;
use std::sync::Mutex;

use super::{LlmClient, LlmResponse, ToolSchema};
use crate::error::AgentError;
use crate::message::Message;

/// Returns a fixed sequence of responses, one per call, cycling the last
/// response once the queue is exhausted.
pub struct MockLlm {
    responses: Mutex<Vec<LlmResponse>>,
}

impl MockLlm {
    pub fn new(responses: Vec<LlmResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
        }
    }

    pub fn fixed_text(content: impl Into<String>) -> Self {
        Self::new(vec![LlmResponse {
            content: content.into(),
            ..Default::default()
        }])
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, _messages: &[Message], _tools: &[ToolSchema]) -> Result<LlmResponse, AgentError> {
        let mut queue = self.responses.lock().unwrap();
        if queue.len() > 1 {
            Ok(queue.remove(0))
        } else {
            Ok(queue.first().cloned().unwrap_or_default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_text_always_returns_same_content() {
        let llm = MockLlm::fixed_text("hi");
        let r1 = llm.invoke(&[], &[]).await.unwrap();
        let r2 = llm.invoke(&[], &[]).await.unwrap();
        assert_eq!(r1.content, "hi");
        assert_eq!(r2.content, "hi");
    }

    #[tokio::test]
    async fn queued_responses_are_consumed_in_order() {
        let llm = MockLlm::new(vec![
            LlmResponse {
                content: "first".into(),
                ..Default::default()
            },
            LlmResponse {
                content: "second".into(),
                ..Default::default()
            },
        ]);
        assert_eq!(llm.invoke(&[], &[]).await.unwrap().content, "first");
        assert_eq!(llm.invoke(&[], &[]).await.unwrap().content, "second");
    }
}
