//! Chat completions over the OpenAI wire protocol (async-openai).
//!
//! Also used for Gemini through its `/v1beta/openai` endpoint, which is how
//! the default configuration talks to Google.

pub mod config;
pub mod streaming;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, ChatCompletionStreamOptions,
    CreateChatCompletionRequest, FinishReason,
};
use async_openai::error::{ApiError, OpenAIError};
use futures_util::StreamExt;
use secrecy::ExposeSecret;

use askdb_core::llm::provider::{EventStream, LlmProvider};
use askdb_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, Message, MessageRole, ProviderCapabilities,
    StopReason, Usage,
};

use self::config::OpenAiCompatConfig;
use self::streaming::map_openai_stream;

/// Provider for any OpenAI chat-completions endpoint.
///
/// No Debug derive: the client config carries the API key.
pub struct OpenAiCompatibleProvider {
    client: Client<OpenAIConfig>,
    provider_name: String,
    model: String,
    capabilities: ProviderCapabilities,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: OpenAiCompatConfig) -> Self {
        let client = Client::with_config(
            OpenAIConfig::new()
                .with_api_base(&config.base_url)
                .with_api_key(config.api_key.expose_secret()),
        );
        Self {
            client,
            provider_name: config.provider_name,
            model: config.model,
            capabilities: config.capabilities,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(
        &self,
        request: &CompletionRequest,
        stream: bool,
    ) -> CreateChatCompletionRequest {
        let system = request.system.as_deref().map(system_message);
        let messages = system
            .into_iter()
            .chain(request.messages.iter().map(chat_message))
            .collect();

        let model = match request.model.as_str() {
            "" => self.model.clone(),
            m => m.to_string(),
        };

        CreateChatCompletionRequest {
            model,
            messages,
            max_completion_tokens: Some(request.max_tokens),
            temperature: request.temperature.map(|t| t as f32),
            stream: stream.then_some(true),
            stream_options: stream.then_some(ChatCompletionStreamOptions {
                include_usage: Some(true),
                include_obfuscation: None,
            }),
            ..Default::default()
        }
    }
}

fn system_message(content: &str) -> ChatCompletionRequestMessage {
    ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
        content: ChatCompletionRequestSystemMessageContent::Text(content.to_string()),
        name: None,
    })
}

/// One history turn in OpenAI shape. System turns inside the history
/// (the chat session's leading schema turn) stay system messages.
fn chat_message(message: &Message) -> ChatCompletionRequestMessage {
    let text = message.content.clone();
    match message.role {
        MessageRole::System => system_message(&text),
        MessageRole::User => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(text),
            name: None,
        }),
        #[allow(deprecated)]
        MessageRole::Assistant => {
            ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                content: Some(ChatCompletionRequestAssistantMessageContent::Text(text)),
                refusal: None,
                name: None,
                audio: None,
                tool_calls: None,
                function_call: None,
            })
        }
    }
}

pub(crate) fn map_finish_reason(reason: &FinishReason) -> StopReason {
    match reason {
        FinishReason::Length => StopReason::MaxTokens,
        FinishReason::ContentFilter => StopReason::ContentFilter,
        FinishReason::Stop | FinishReason::ToolCalls | FinishReason::FunctionCall => {
            StopReason::EndTurn
        }
    }
}

impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let response = self
            .client
            .chat()
            .create(self.build_request(request, false))
            .await
            .map_err(map_openai_error)?;

        let Some(choice) = response.choices.into_iter().next() else {
            return Err(LlmError::EmptyResponse);
        };
        let stop_reason = choice
            .finish_reason
            .as_ref()
            .map_or(StopReason::EndTurn, map_finish_reason);
        let usage = response.usage.map_or_else(Usage::default, |u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });

        tracing::debug!(
            provider = %self.provider_name,
            model = %response.model,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            %stop_reason,
            "completion received"
        );

        Ok(CompletionResponse {
            id: response.id,
            content: choice.message.content.unwrap_or_default(),
            model: response.model,
            stop_reason,
            usage,
        })
    }

    fn stream(&self, request: CompletionRequest) -> EventStream {
        let body = self.build_request(&request, true);
        let client = self.client.clone();

        Box::pin(async_stream::try_stream! {
            let raw = client
                .chat()
                .create_stream(body)
                .await
                .map_err(map_openai_error)?;
            let mut events = map_openai_stream(raw);
            while let Some(event) = events.next().await {
                yield event?;
            }
        })
    }
}

fn map_openai_error(err: OpenAIError) -> LlmError {
    match &err {
        OpenAIError::ApiError(api) => classify_api_error(api),
        OpenAIError::Reqwest(e) => match e.status().map(|s| s.as_u16()) {
            Some(401 | 403) => LlmError::AuthenticationFailed,
            Some(429) => LlmError::RateLimited {
                retry_after_ms: None,
            },
            Some(503 | 529) => LlmError::Overloaded(err.to_string()),
            _ => LlmError::Provider {
                message: err.to_string(),
            },
        },
        OpenAIError::JSONDeserialize(_, content) => {
            LlmError::Deserialization(format!("unexpected response body: {content}"))
        }
        OpenAIError::StreamError(e) => LlmError::Stream(e.to_string()),
        OpenAIError::InvalidArgument(msg) => LlmError::InvalidRequest(msg.clone()),
        _ => LlmError::Provider {
            message: err.to_string(),
        },
    }
}

/// OpenAI reports the kind in `code`/`type`; Gemini's compatibility layer
/// uses Google status names and sometimes only the message text.
fn classify_api_error(api: &ApiError) -> LlmError {
    let kind = [api.code.as_deref(), api.r#type.as_deref()];
    let is = |names: &[&str]| kind.iter().flatten().any(|k| names.contains(k));
    let bad_key = ["Incorrect API key", "API key not valid", "Invalid API key"]
        .iter()
        .any(|needle| api.message.contains(needle));

    if bad_key || is(&["authentication_error", "invalid_api_key", "UNAUTHENTICATED"]) {
        LlmError::AuthenticationFailed
    } else if is(&["rate_limit_exceeded", "rate_limit_error", "RESOURCE_EXHAUSTED"]) {
        LlmError::RateLimited {
            retry_after_ms: None,
        }
    } else if is(&["server_error", "overloaded_error", "UNAVAILABLE"]) {
        LlmError::Overloaded(api.message.clone())
    } else {
        LlmError::Provider {
            message: api.message.clone(),
        }
    }
}
