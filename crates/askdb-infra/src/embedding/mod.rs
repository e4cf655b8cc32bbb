//! Embedding providers and the embedder factory.

pub mod gemini;
pub mod openai;

use secrecy::SecretString;

use askdb_core::retrieval::box_embedder::BoxEmbedder;
use askdb_types::config::{LlmConfig, RetrievalConfig};
use askdb_types::error::RetrievalError;
use askdb_types::llm::ProviderType;

use crate::llm::openai_compat::config::{GEMINI_OPENAI_BASE_URL, OPENAI_BASE_URL};

use self::gemini::GeminiEmbedder;
use self::openai::OpenAiEmbedder;

/// Create a [`BoxEmbedder`] for schema retrieval.
///
/// OpenAI-compatible embedders reuse the `[llm]` base URL (or the URL
/// inferred from its provider name); the native Gemini embedder honours
/// only an explicit base URL when `[llm]` is native Gemini too.
pub fn create_embedder(
    retrieval: &RetrievalConfig,
    llm: &LlmConfig,
    api_key: SecretString,
) -> Result<BoxEmbedder, RetrievalError> {
    match retrieval.embedding_provider {
        ProviderType::Gemini => {
            let mut embedder = GeminiEmbedder::new(api_key, retrieval.embedding_model.clone())?;
            if llm.provider == ProviderType::Gemini {
                if let Some(base_url) = llm.base_url.as_deref() {
                    embedder = embedder.with_base_url(base_url);
                }
            }
            Ok(BoxEmbedder::new(embedder))
        }
        ProviderType::OpenAiCompatible => {
            let base_url = match (llm.provider, llm.base_url.as_deref()) {
                (ProviderType::OpenAiCompatible, Some(url)) => url,
                _ if llm.name == "gemini" => GEMINI_OPENAI_BASE_URL,
                _ => OPENAI_BASE_URL,
            };
            Ok(BoxEmbedder::new(OpenAiEmbedder::new(
                api_key,
                base_url,
                retrieval.embedding_model.clone(),
            )?))
        }
    }
}
