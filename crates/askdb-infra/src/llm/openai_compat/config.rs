//! Endpoint presets for the OpenAI-compatible provider.

use askdb_types::llm::ProviderCapabilities;
use secrecy::SecretString;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const GEMINI_OPENAI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Where to send chat completions and how to label them.
pub struct OpenAiCompatConfig {
    /// Reported as the provider name in logs and spans.
    pub provider_name: String,
    pub base_url: String,
    pub api_key: SecretString,
    pub model: String,
    pub capabilities: ProviderCapabilities,
}

impl OpenAiCompatConfig {
    fn endpoint(
        provider_name: &str,
        base_url: &str,
        api_key: SecretString,
        model: &str,
        (max_context_tokens, max_output_tokens): (u32, u32),
    ) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
            capabilities: ProviderCapabilities {
                streaming: true,
                max_context_tokens,
                max_output_tokens,
            },
        }
    }
}

pub fn openai_defaults(api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig::endpoint("openai", OPENAI_BASE_URL, api_key, model, (128_000, 16_384))
}

/// Gemini via `/v1beta/openai`.
pub fn gemini_defaults(api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig::endpoint(
        "gemini",
        GEMINI_OPENAI_BASE_URL,
        api_key,
        model,
        (1_000_000, 65_536),
    )
}

/// Self-hosted or proxied endpoint named in `[llm].base_url`.
pub fn custom(
    provider_name: &str,
    base_url: &str,
    api_key: SecretString,
    model: &str,
) -> OpenAiCompatConfig {
    OpenAiCompatConfig::endpoint(provider_name, base_url, api_key, model, (128_000, 8_192))
}
