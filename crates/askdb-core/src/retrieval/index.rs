//! SchemaIndex: builds and queries the embedded schema collection.

use tracing::{debug, info};

use askdb_types::error::RetrievalError;
use askdb_types::schema::DatabaseSchema;

use super::box_embedder::BoxEmbedder;
use super::box_store::BoxSchemaStore;
use super::chunker::TextChunker;

/// Chunks, embeds and stores the detailed schema text so prompts can carry
/// only the parts relevant to a question.
pub struct SchemaIndex {
    embedder: BoxEmbedder,
    store: BoxSchemaStore,
    chunker: Box<dyn TextChunker>,
    top_k: usize,
}

impl SchemaIndex {
    pub fn new(
        embedder: BoxEmbedder,
        store: BoxSchemaStore,
        chunker: Box<dyn TextChunker>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            chunker,
            top_k: top_k.max(1),
        }
    }

    /// Number of chunks returned by [`SchemaIndex::retrieve`] by default.
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Rebuild the collection from `schema`. Returns the number of chunks stored.
    #[tracing::instrument(name = "schema_index.build", skip_all, fields(tables = schema.tables.len()))]
    pub async fn build(&self, schema: &DatabaseSchema) -> Result<usize, RetrievalError> {
        let text = schema.detailed_text();
        let chunks: Vec<String> = self
            .chunker
            .chunk(&text)?
            .into_iter()
            .filter(|c| !c.trim().is_empty())
            .collect();

        if chunks.is_empty() {
            return Err(RetrievalError::EmptyIndex);
        }

        let embeddings = self.embedder.embed(&chunks).await?;
        if embeddings.len() != chunks.len() {
            return Err(RetrievalError::Embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let stored = self.store.replace(&chunks, &embeddings).await?;
        info!(
            chunks = stored,
            model = self.embedder.model_name(),
            "schema index built"
        );
        Ok(stored)
    }

    /// Embed `question` and return the `k` closest chunks joined with blank lines.
    #[tracing::instrument(name = "schema_index.retrieve", skip(self, question))]
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<String, RetrievalError> {
        if self.store.count().await? == 0 {
            return Err(RetrievalError::EmptyIndex);
        }

        let mut vectors = self.embedder.embed(&[question.to_string()]).await?;
        let query = vectors
            .pop()
            .ok_or_else(|| RetrievalError::Embedding("no embedding returned for question".into()))?;

        let matches = self.store.search(&query, k).await?;
        debug!(
            returned = matches.len(),
            closest = ?matches.first().map(|m| m.distance),
            "schema chunks retrieved"
        );

        Ok(matches
            .into_iter()
            .map(|m| m.text)
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{KeywordEmbedder, MemoryStore, TableChunker, sample_schema};

    fn index(top_k: usize) -> SchemaIndex {
        SchemaIndex::new(
            BoxEmbedder::new(KeywordEmbedder::new(["users", "payments", "amount"])),
            BoxSchemaStore::new(MemoryStore::default()),
            Box::new(TableChunker),
            top_k,
        )
    }

    #[tokio::test]
    async fn test_retrieve_before_build_is_empty_index() {
        let idx = index(4);
        let err = idx.retrieve("who paid", 4).await.unwrap_err();
        assert!(matches!(err, RetrievalError::EmptyIndex));
    }

    #[tokio::test]
    async fn test_build_then_retrieve_closest_chunk() {
        let idx = index(1);
        let stored = idx.build(&sample_schema()).await.unwrap();
        assert_eq!(stored, 2);

        let text = idx.retrieve("payments amount", 1).await.unwrap();
        assert!(text.contains("payments"), "got: {text}");
        assert!(!text.contains("Table: users"));
    }

    #[tokio::test]
    async fn test_retrieve_orders_by_distance_and_joins_with_blank_line() {
        let idx = index(2);
        idx.build(&sample_schema()).await.unwrap();
        let text = idx.retrieve("users", 2).await.unwrap();
        assert!(text.starts_with("Table: users"), "got: {text}");
        assert!(text.contains("\n\nTable: payments"), "got: {text}");
    }

    #[tokio::test]
    async fn test_build_empty_schema_fails() {
        let idx = index(4);
        let err = idx.build(&DatabaseSchema::default()).await.unwrap_err();
        assert!(matches!(err, RetrievalError::EmptyIndex));
    }

    #[test]
    fn test_top_k_at_least_one() {
        assert_eq!(index(0).top_k(), 1);
    }
}
