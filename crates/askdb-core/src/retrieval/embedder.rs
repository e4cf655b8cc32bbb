//! Embedder trait for text-to-vector conversion.
//!
//! Implementations (Gemini, OpenAI-compatible endpoints) live in askdb-infra.

use askdb_types::error::RetrievalError;

/// Trait for converting text into embedding vectors.
pub trait Embedder: Send + Sync {
    /// Embed one or more texts into vectors, one vector per input, in order.
    fn embed(
        &self,
        texts: &[String],
    ) -> impl std::future::Future<Output = Result<Vec<Vec<f32>>, RetrievalError>> + Send;

    /// The model name used for embeddings (e.g., "gemini-embedding-001").
    fn model_name(&self) -> &str;

    /// The dimensionality of the output vectors.
    fn dimension(&self) -> usize;
}
