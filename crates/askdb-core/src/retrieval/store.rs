//! SchemaVectorStore trait: where embedded schema chunks live.

use askdb_types::error::RetrievalError;

/// A chunk returned by a similarity search.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkMatch {
    pub text: String,
    /// Cosine distance to the query vector (lower is closer).
    pub distance: f32,
}

/// Vector collection holding the embedded schema chunks.
///
/// The collection is rebuilt from scratch on every run; `replace` drops
/// whatever was there before.
pub trait SchemaVectorStore: Send + Sync {
    /// Replace the collection contents with `chunks` and their embeddings.
    ///
    /// Returns the number of chunks stored.
    fn replace(
        &self,
        chunks: &[String],
        embeddings: &[Vec<f32>],
    ) -> impl std::future::Future<Output = Result<usize, RetrievalError>> + Send;

    /// Return up to `limit` chunks ordered by ascending distance.
    fn search(
        &self,
        embedding: &[f32],
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<ChunkMatch>, RetrievalError>> + Send;

    fn count(&self) -> impl std::future::Future<Output = Result<usize, RetrievalError>> + Send;
}
