//! GeminiEmbedder -- native `models/{model}:embedContent` over reqwest.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use askdb_core::retrieval::embedder::Embedder;
use askdb_observe::genai_attrs;
use askdb_types::error::RetrievalError;

use crate::llm::gemini::GEMINI_BASE_URL;

pub const DEFAULT_GEMINI_EMBEDDING_MODEL: &str = "gemini-embedding-001";

/// Output size of `gemini-embedding-001` when no dimensionality is requested.
const GEMINI_EMBEDDING_DIMENSION: usize = 3072;

#[derive(Serialize)]
struct EmbedContentRequest<'a> {
    model: String,
    content: EmbedContent<'a>,
}

#[derive(Serialize)]
struct EmbedContent<'a> {
    parts: [EmbedPart<'a>; 1],
}

#[derive(Serialize)]
struct EmbedPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

/// Embeds text with Google's embedding models, one request per text.
pub struct GeminiEmbedder {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiEmbedder {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Result<Self, RetrievalError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| RetrievalError::Embedding(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
            model: model.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self) -> String {
        format!("{}/models/{}:embedContent", self.base_url, self.model)
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let body = EmbedContentRequest {
            model: format!("models/{}", self.model),
            content: EmbedContent {
                parts: [EmbedPart { text }],
            },
        };

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| RetrievalError::Embedding(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Embedding(format!("HTTP {status}: {error_body}")));
        }

        let parsed: EmbedContentResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::Embedding(format!("failed to parse response: {e}")))?;
        Ok(parsed.embedding.values)
    }
}

impl Embedder for GeminiEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        let span = tracing::info_span!(
            "gen_ai.embeddings",
            gen_ai.operation.name = genai_attrs::OP_EMBEDDINGS,
            gen_ai.system = genai_attrs::PROVIDER_GEMINI,
            gen_ai.request.model = %self.model,
            texts = texts.len(),
        );
        async {
            let mut vectors = Vec::with_capacity(texts.len());
            for text in texts {
                vectors.push(self.embed_one(text).await?);
            }
            Ok(vectors)
        }
        .instrument(span)
        .await
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        GEMINI_EMBEDDING_DIMENSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let body = EmbedContentRequest {
            model: "models/gemini-embedding-001".to_string(),
            content: EmbedContent {
                parts: [EmbedPart { text: "Table: users" }],
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "models/gemini-embedding-001");
        assert_eq!(json["content"]["parts"][0]["text"], "Table: users");
    }

    #[test]
    fn test_response_parse() {
        let parsed: EmbedContentResponse =
            serde_json::from_str(r#"{"embedding":{"values":[0.1,-0.2,0.3]}}"#).unwrap();
        assert_eq!(parsed.embedding.values, vec![0.1, -0.2, 0.3]);
    }

    #[test]
    fn test_url_and_identity() {
        let e = GeminiEmbedder::new(SecretString::from("k"), DEFAULT_GEMINI_EMBEDDING_MODEL)
            .unwrap()
            .with_base_url("http://localhost:1234/v1beta");
        assert_eq!(
            e.url(),
            "http://localhost:1234/v1beta/models/gemini-embedding-001:embedContent"
        );
        assert_eq!(e.model_name(), "gemini-embedding-001");
        assert_eq!(e.dimension(), 3072);
    }
}
