//! Runtime-selected embedder.
//!
//! [`Embedder::embed`] returns `impl Future`, so `dyn Embedder` is not an
//! option. `ErasedEmbedder` boxes the future and is implemented for every
//! embedder, which lets `BoxEmbedder` carry the Gemini or OpenAI client
//! picked from `[retrieval]`.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use askdb_types::error::RetrievalError;

use super::embedder::Embedder;

type EmbedFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<Vec<f32>>, RetrievalError>> + Send + 'a>>;

/// Dyn-compatible mirror of [`Embedder`].
pub trait ErasedEmbedder: Send + Sync {
    fn erased_embed<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a>;
    fn erased_model_name(&self) -> &str;
    fn erased_dimension(&self) -> usize;
}

impl<E: Embedder> ErasedEmbedder for E {
    fn erased_embed<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a> {
        Box::pin(self.embed(texts))
    }

    fn erased_model_name(&self) -> &str {
        self.model_name()
    }

    fn erased_dimension(&self) -> usize {
        self.dimension()
    }
}

/// Owns the embedder that turns schema chunks and questions into vectors.
pub struct BoxEmbedder {
    inner: Box<dyn ErasedEmbedder>,
}

impl BoxEmbedder {
    pub fn new<E: Embedder + 'static>(embedder: E) -> Self {
        Self {
            inner: Box::new(embedder),
        }
    }

    /// One vector per input text, in input order.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        self.inner.erased_embed(texts).await
    }

    /// Recorded next to every stored chunk.
    pub fn model_name(&self) -> &str {
        self.inner.erased_model_name()
    }

    pub fn dimension(&self) -> usize {
        self.inner.erased_dimension()
    }
}

impl fmt::Debug for BoxEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxEmbedder")
            .field("model", &self.model_name())
            .field("dimension", &self.dimension())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::KeywordEmbedder;

    #[tokio::test]
    async fn test_embed_goes_through_the_box() {
        let embedder = BoxEmbedder::new(KeywordEmbedder::new(["users", "orders"]));
        let vectors = embedder
            .embed(&["users and users".to_string(), "orders".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![2.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_debug_shows_model_and_dimension() {
        let embedder = BoxEmbedder::new(KeywordEmbedder::new(["users", "orders", "items"]));
        assert_eq!(
            format!("{embedder:?}"),
            "BoxEmbedder { model: \"keyword\", dimension: 3 }"
        );
    }
}
