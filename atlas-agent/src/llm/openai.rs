//! OpenAI adapter, via `async-openai`.

use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionToolArgs, ChatCompletionToolType, CreateChatCompletionRequestArgs,
    FunctionObjectArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::instrument;

use super::{LlmClient, LlmResponse, LlmUsage, ToolSchema};
use crate::error::AgentError;
use crate::message::{Message, ToolCallRequest};

pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key.into());
        Self {
            client: Client::with_config(config),
            model: model.into(),
        }
    }

    fn to_openai_messages(messages: &[Message]) -> Vec<ChatCompletionRequestMessage> {
        messages
            .iter()
            .map(|m| match m {
                Message::Human { content } => ChatCompletionRequestUserMessageArgs::default()
                    .content(content.clone())
                    .build()
                    .expect("user message build")
                    .into(),
                Message::Ai { content, .. } => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(content.clone())
                    .build()
                    .expect("assistant message build")
                    .into(),
                Message::Tool {
                    content,
                    tool_call_id,
                    ..
                } => ChatCompletionRequestToolMessageArgs::default()
                    .content(content.clone())
                    .tool_call_id(tool_call_id.clone())
                    .build()
                    .expect("tool message build")
                    .into(),
            })
            .collect()
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    #[instrument(skip(self, messages, tools), fields(model = %self.model))]
    async fn invoke(&self, messages: &[Message], tools: &[ToolSchema]) -> Result<LlmResponse, AgentError> {
        let oa_tools = tools
            .iter()
            .map(|t| {
                ChatCompletionToolArgs::default()
                    .r#type(ChatCompletionToolType::Function)
                    .function(
                        FunctionObjectArgs::default()
                            .name(t.name.clone())
                            .description(t.description.clone())
                            .parameters(t.parameters.clone())
                            .build()
                            .expect("function build"),
                    )
                    .build()
                    .expect("tool build")
            })
            .collect::<Vec<_>>();

        let mut request = CreateChatCompletionRequestArgs::default();
        request.model(self.model.clone()).messages(Self::to_openai_messages(messages));
        if !oa_tools.is_empty() {
            request.tools(oa_tools);
        }
        let request = request.build().map_err(|e| AgentError::Llm(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| AgentError::Llm(e.to_string()))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Llm("OpenAI returned no choices".into()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCallRequest {
                id: tc.id,
                name: tc.function.name,
                args: tc.function.arguments,
            })
            .collect();

        let usage = response.usage.map(|u| LlmUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            usage,
            response_metadata: crate::message::ResponseMetadata::new(),
        })
    }
}
