//! LLM provider implementations and the provider factory.

pub mod gemini;
pub mod openai_compat;

use secrecy::SecretString;

use askdb_core::llm::box_provider::BoxLlmProvider;
use askdb_types::config::LlmConfig;
use askdb_types::llm::{LlmError, ProviderType};

use self::gemini::GeminiProvider;
use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config as oai_config;

/// Create a [`BoxLlmProvider`] from the `[llm]` configuration section.
///
/// For OpenAI-compatible endpoints without an explicit `base_url`, the base
/// URL is inferred from the provider name (`openai`, `gemini`); unknown names
/// fall back to the OpenAI URL.
pub fn create_provider(
    config: &LlmConfig,
    api_key: SecretString,
) -> Result<BoxLlmProvider, LlmError> {
    match config.provider {
        ProviderType::OpenAiCompatible => {
            let oai = match config.base_url.as_deref() {
                Some(base_url) => {
                    oai_config::custom(&config.name, base_url, api_key, &config.model)
                }
                None => match config.name.as_str() {
                    "gemini" => oai_config::gemini_defaults(api_key, &config.model),
                    _ => oai_config::openai_defaults(api_key, &config.model),
                },
            };
            let provider = OpenAiCompatibleProvider::new(oai);
            tracing::debug!(
                provider = %config.name,
                model = provider.model(),
                "llm provider ready"
            );
            Ok(BoxLlmProvider::new(provider))
        }
        ProviderType::Gemini => {
            let mut provider = GeminiProvider::new(api_key, config.model.clone())?;
            if let Some(base_url) = config.base_url.as_deref() {
                provider = provider.with_base_url(base_url);
            }
            tracing::debug!(provider = "gemini", model = provider.model(), "llm provider ready");
            Ok(BoxLlmProvider::new(provider))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SecretString {
        SecretString::from("test-key")
    }

    #[test]
    fn test_create_provider_openai_compatible_gemini_by_name() {
        let config = LlmConfig::default();
        let provider = create_provider(&config, key()).unwrap();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.capabilities().max_context_tokens, 1_000_000);
    }

    #[test]
    fn test_create_provider_openai_by_name() {
        let config = LlmConfig {
            name: "openai".to_string(),
            model: "gpt-4o".to_string(),
            ..Default::default()
        };
        let provider = create_provider(&config, key()).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_create_provider_with_base_url_keeps_name() {
        let config = LlmConfig {
            name: "local-llm".to_string(),
            base_url: Some("http://localhost:8080/v1".to_string()),
            ..Default::default()
        };
        let provider = create_provider(&config, key()).unwrap();
        assert_eq!(provider.name(), "local-llm");
    }

    #[test]
    fn test_create_provider_native_gemini() {
        let config = LlmConfig {
            provider: ProviderType::Gemini,
            ..Default::default()
        };
        let provider = create_provider(&config, key()).unwrap();
        assert_eq!(provider.name(), "gemini");
        assert!(provider.capabilities().streaming);
    }
}
