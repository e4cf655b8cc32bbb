//! GeminiProvider -- native Google `generateContent` API over reqwest.
//!
//! The API key travels in the `x-goog-api-key` header and is held as a
//! [`SecretString`], never in the URL.

pub mod streaming;
pub mod types;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use askdb_core::llm::provider::{EventStream, LlmProvider};
use askdb_observe::genai_attrs;
use askdb_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, MessageRole, ProviderCapabilities,
    StopReason, Usage,
};

use self::streaming::create_gemini_stream;
use self::types::{
    Content, ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini provider speaking the native REST protocol.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    capabilities: ProviderCapabilities,
}

impl GeminiProvider {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
            model: model.into(),
            capabilities: ProviderCapabilities {
                streaming: true,
                max_context_tokens: 1_000_000,
                max_output_tokens: 65_536,
            },
        })
    }

    /// Override the base URL (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn model_for<'a>(&'a self, request: &'a CompletionRequest) -> &'a str {
        if request.model.is_empty() {
            &self.model
        } else {
            &request.model
        }
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    fn stream_url(&self, model: &str) -> String {
        format!("{}/models/{model}:streamGenerateContent?alt=sse", self.base_url)
    }

    /// Convert a generic request. System turns (and `request.system`) are
    /// merged into `systemInstruction`; assistant turns become `model`.
    fn to_gemini_request(&self, request: &CompletionRequest) -> GenerateContentRequest {
        let mut system_parts: Vec<&str> = Vec::new();
        if let Some(system) = request.system.as_deref() {
            system_parts.push(system);
        }

        let mut contents = Vec::with_capacity(request.messages.len());
        for msg in &request.messages {
            match msg.role {
                MessageRole::System => system_parts.push(&msg.content),
                MessageRole::User => contents.push(Content::text(Some("user"), &msg.content)),
                MessageRole::Assistant => {
                    contents.push(Content::text(Some("model"), &msg.content))
                }
            }
        }

        GenerateContentRequest {
            contents,
            system_instruction: (!system_parts.is_empty())
                .then(|| Content::text(None, system_parts.join("\n\n"))),
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        }
    }
}

/// Map a Gemini `finishReason` string.
pub(crate) fn map_finish_reason(reason: &str) -> StopReason {
    match reason {
        "MAX_TOKENS" => StopReason::MaxTokens,
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII" => {
            StopReason::ContentFilter
        }
        _ => StopReason::EndTurn,
    }
}

/// Map a non-success HTTP status and body to an [`LlmError`].
pub(crate) fn map_status(status: u16, body: String) -> LlmError {
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);

    match status {
        401 | 403 => LlmError::AuthenticationFailed,
        400 if message.contains("API key not valid") => LlmError::AuthenticationFailed,
        400 => LlmError::InvalidRequest(message),
        429 => LlmError::RateLimited {
            retry_after_ms: None,
        },
        503 | 529 => LlmError::Overloaded(message),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {message}"),
        },
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        genai_attrs::PROVIDER_GEMINI
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let model = self.model_for(request).to_string();
        let body = self.to_gemini_request(request);

        let response = self
            .client
            .post(self.generate_url(&model))
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(map_status(status.as_u16(), error_body));
        }

        let gemini_resp: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

        if gemini_resp.candidates.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        let usage = gemini_resp
            .usage_metadata
            .as_ref()
            .map(|u| Usage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            })
            .unwrap_or_default();

        tracing::debug!(
            model = %model,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "gemini completion received"
        );

        Ok(CompletionResponse {
            id: gemini_resp.response_id.clone().unwrap_or_default(),
            content: gemini_resp.text(),
            model: gemini_resp.model_version.clone().unwrap_or(model),
            stop_reason: gemini_resp
                .finish_reason()
                .map(map_finish_reason)
                .unwrap_or(StopReason::EndTurn),
            usage,
        })
    }

    fn stream(&self, request: CompletionRequest) -> EventStream {
        let body = self.to_gemini_request(&request);
        let url = self.stream_url(self.model_for(&request));
        create_gemini_stream(&self.client, &url, body, &self.api_key)
    }
}
