//! OpenAiEmbedder -- `POST {base_url}/embeddings` over reqwest.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use askdb_core::retrieval::embedder::Embedder;
use askdb_observe::genai_attrs;
use askdb_types::error::RetrievalError;

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

/// Embeds text through any OpenAI-compatible `/embeddings` endpoint in one batch.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(
        api_key: SecretString,
        base_url: &str,
        model: impl Into<String>,
    ) -> Result<Self, RetrievalError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| RetrievalError::Embedding(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    fn url(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }
}

/// Order embeddings by their `index` field so they line up with the inputs.
fn ordered(mut data: Vec<EmbeddingData>) -> Vec<Vec<f32>> {
    data.sort_by_key(|d| d.index);
    data.into_iter().map(|d| d.embedding).collect()
}

impl Embedder for OpenAiEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        let span = tracing::info_span!(
            "gen_ai.embeddings",
            gen_ai.operation.name = genai_attrs::OP_EMBEDDINGS,
            gen_ai.system = genai_attrs::PROVIDER_OPENAI,
            gen_ai.request.model = %self.model,
            texts = texts.len(),
        );

        async {
            let response = self
                .client
                .post(self.url())
                .bearer_auth(self.api_key.expose_secret())
                .json(&EmbeddingsRequest {
                    model: &self.model,
                    input: texts,
                })
                .send()
                .await
                .map_err(|e| RetrievalError::Embedding(format!("HTTP request failed: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                let error_body = response.text().await.unwrap_or_default();
                return Err(RetrievalError::Embedding(format!(
                    "HTTP {status}: {error_body}"
                )));
            }

            let parsed: EmbeddingsResponse = response.json().await.map_err(|e| {
                RetrievalError::Embedding(format!("failed to parse response: {e}"))
            })?;
            Ok(ordered(parsed.data))
        }
        .instrument(span)
        .await
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        if self.model.contains("3-large") { 3072 } else { 1536 }
    }
}
