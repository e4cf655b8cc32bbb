//! BoxSchemaStore -- object-safe dynamic dispatch wrapper for SchemaVectorStore.

use std::future::Future;
use std::pin::Pin;

use askdb_types::error::RetrievalError;

use super::store::{ChunkMatch, SchemaVectorStore};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RetrievalError>> + Send + 'a>>;

/// Object-safe version of [`SchemaVectorStore`] with boxed futures.
pub trait SchemaVectorStoreDyn: Send + Sync {
    fn replace_boxed<'a>(
        &'a self,
        chunks: &'a [String],
        embeddings: &'a [Vec<f32>],
    ) -> BoxFuture<'a, usize>;

    fn search_boxed<'a>(&'a self, embedding: &'a [f32], limit: usize)
    -> BoxFuture<'a, Vec<ChunkMatch>>;

    fn count_boxed(&self) -> BoxFuture<'_, usize>;
}

impl<T: SchemaVectorStore> SchemaVectorStoreDyn for T {
    fn replace_boxed<'a>(
        &'a self,
        chunks: &'a [String],
        embeddings: &'a [Vec<f32>],
    ) -> BoxFuture<'a, usize> {
        Box::pin(self.replace(chunks, embeddings))
    }

    fn search_boxed<'a>(
        &'a self,
        embedding: &'a [f32],
        limit: usize,
    ) -> BoxFuture<'a, Vec<ChunkMatch>> {
        Box::pin(self.search(embedding, limit))
    }

    fn count_boxed(&self) -> BoxFuture<'_, usize> {
        Box::pin(self.count())
    }
}

/// Type-erased schema vector store.
pub struct BoxSchemaStore {
    inner: Box<dyn SchemaVectorStoreDyn + Send + Sync>,
}

impl BoxSchemaStore {
    pub fn new<T: SchemaVectorStore + 'static>(store: T) -> Self {
        Self {
            inner: Box::new(store),
        }
    }

    pub async fn replace(
        &self,
        chunks: &[String],
        embeddings: &[Vec<f32>],
    ) -> Result<usize, RetrievalError> {
        self.inner.replace_boxed(chunks, embeddings).await
    }

    pub async fn search(
        &self,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkMatch>, RetrievalError> {
        self.inner.search_boxed(embedding, limit).await
    }

    pub async fn count(&self) -> Result<usize, RetrievalError> {
        self.inner.count_boxed().await
    }
}
