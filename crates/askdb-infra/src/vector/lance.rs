//! LanceDB implementation of `SchemaVectorStore`.
//!
//! The collection is ephemeral: every `replace` drops the table and writes
//! the new chunks. Without a configured path the store lives in a temporary
//! directory that is removed when the store is dropped.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow_array::{
    Array, FixedSizeListArray, Float32Array, Int32Array, RecordBatch, RecordBatchIterator,
    StringArray,
};
use futures_util::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use tempfile::TempDir;

use askdb_core::retrieval::store::{ChunkMatch, SchemaVectorStore};
use askdb_types::error::RetrievalError;

use super::schema::{schema_chunks_schema, vector_item_field, SCHEMA_CHUNKS_TABLE};

fn store_err(context: &str) -> impl FnOnce(lancedb::Error) -> RetrievalError + '_ {
    move |e| RetrievalError::Store(format!("{context}: {e}"))
}

pub struct LanceSchemaStore {
    db: lancedb::Connection,
    base_path: PathBuf,
    embedding_model: String,
    _temp_dir: Option<TempDir>,
}

impl LanceSchemaStore {
    /// Open or create a store at `base_path`, creating the directory if needed.
    pub async fn new(
        base_path: PathBuf,
        embedding_model: impl Into<String>,
    ) -> Result<Self, RetrievalError> {
        std::fs::create_dir_all(&base_path).map_err(|e| {
            RetrievalError::Store(format!("cannot create {}: {e}", base_path.display()))
        })?;
        let db = connect(&base_path).await?;
        Ok(Self {
            db,
            base_path,
            embedding_model: embedding_model.into(),
            _temp_dir: None,
        })
    }

    /// A store in a fresh temporary directory.
    pub async fn temporary(embedding_model: impl Into<String>) -> Result<Self, RetrievalError> {
        let dir = tempfile::Builder::new()
            .prefix("askdb-schema-")
            .tempdir()
            .map_err(|e| RetrievalError::Store(format!("cannot create temp dir: {e}")))?;
        let base_path = dir.path().to_path_buf();
        let db = connect(&base_path).await?;
        Ok(Self {
            db,
            base_path,
            embedding_model: embedding_model.into(),
            _temp_dir: Some(dir),
        })
    }

    /// `store_path` from `[retrieval]`, or a temporary directory when unset.
    pub async fn open(
        store_path: Option<&str>,
        embedding_model: impl Into<String>,
    ) -> Result<Self, RetrievalError> {
        match store_path {
            Some(path) => Self::new(PathBuf::from(path), embedding_model).await,
            None => Self::temporary(embedding_model).await,
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    async fn table_exists(&self) -> bool {
        self.db.open_table(SCHEMA_CHUNKS_TABLE).execute().await.is_ok()
    }

    async fn drop_table(&self) -> Result<(), RetrievalError> {
        match self.db.drop_table(SCHEMA_CHUNKS_TABLE, &[]).await {
            Ok(()) | Err(lancedb::Error::TableNotFound { .. }) => Ok(()),
            Err(e) => Err(store_err("failed to drop table")(e)),
        }
    }

    fn build_record_batch(
        &self,
        chunks: &[String],
        embeddings: &[Vec<f32>],
        dimension: i32,
    ) -> Result<RecordBatch, RetrievalError> {
        let schema = Arc::new(schema_chunks_schema(dimension));

        let index_array = Int32Array::from_iter_values(0..chunks.len() as i32);
        let text_array = StringArray::from_iter_values(chunks.iter());
        let model_array =
            StringArray::from_iter_values(std::iter::repeat_n(self.embedding_model.as_str(), chunks.len()));

        let values = Float32Array::from_iter_values(embeddings.iter().flatten().copied());
        let vector_array =
            FixedSizeListArray::try_new(vector_item_field(), dimension, Arc::new(values), None)
                .map_err(|e| RetrievalError::Store(format!("failed to build vector column: {e}")))?;

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(index_array),
                Arc::new(text_array),
                Arc::new(model_array),
                Arc::new(vector_array),
            ],
        )
        .map_err(|e| RetrievalError::Store(format!("failed to build record batch: {e}")))
    }
}

async fn connect(path: &Path) -> Result<lancedb::Connection, RetrievalError> {
    let uri = path
        .to_str()
        .ok_or_else(|| RetrievalError::Store(format!("path is not UTF-8: {}", path.display())))?;
    lancedb::connect(uri)
        .execute()
        .await
        .map_err(store_err("failed to open vector store"))
}

/// Pull `(chunk_text, _distance)` pairs out of a search result batch.
fn batch_to_matches(batch: &RecordBatch) -> Result<Vec<ChunkMatch>, RetrievalError> {
    let texts = batch
        .column_by_name("chunk_text")
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| RetrievalError::Store("search result has no chunk_text column".into()))?;
    let distances = batch
        .column_by_name("_distance")
        .and_then(|c| c.as_any().downcast_ref::<Float32Array>());

    Ok((0..batch.num_rows())
        .map(|i| ChunkMatch {
            text: texts.value(i).to_string(),
            distance: distances.map_or(0.0, |d| d.value(i)),
        })
        .collect())
}

impl SchemaVectorStore for LanceSchemaStore {
    async fn replace(
        &self,
        chunks: &[String],
        embeddings: &[Vec<f32>],
    ) -> Result<usize, RetrievalError> {
        if chunks.len() != embeddings.len() {
            return Err(RetrievalError::Store(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        self.drop_table().await?;
        let Some(first) = embeddings.first() else {
            return Ok(0);
        };

        let dimension = first.len();
        if dimension == 0 || embeddings.iter().any(|e| e.len() != dimension) {
            return Err(RetrievalError::Store(
                "embeddings must share one non-zero dimension".to_string(),
            ));
        }
        let dimension = i32::try_from(dimension)
            .map_err(|_| RetrievalError::Store(format!("dimension {dimension} too large")))?;

        let batch = self.build_record_batch(chunks, embeddings, dimension)?;
        let schema = batch.schema();
        let table = self
            .db
            .create_empty_table(SCHEMA_CHUNKS_TABLE, schema.clone())
            .execute()
            .await
            .map_err(store_err("failed to create table"))?;

        let reader = RecordBatchIterator::new(vec![Ok(batch)], schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(store_err("failed to add chunks"))?;

        tracing::debug!(chunks = chunks.len(), dimension, "schema chunks stored");
        Ok(chunks.len())
    }

    async fn search(
        &self,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkMatch>, RetrievalError> {
        if !self.table_exists().await {
            return Ok(Vec::new());
        }
        let table = self
            .db
            .open_table(SCHEMA_CHUNKS_TABLE)
            .execute()
            .await
            .map_err(store_err("failed to open table"))?;

        let results = table
            .vector_search(embedding)
            .map_err(store_err("vector search setup failed"))?
            .distance_type(lancedb::DistanceType::Cosine)
            .limit(limit)
            .execute()
            .await
            .map_err(store_err("vector search failed"))?;

        let batches: Vec<RecordBatch> = results
            .try_collect()
            .await
            .map_err(store_err("failed to collect results"))?;

        let mut matches = Vec::new();
        for batch in &batches {
            matches.extend(batch_to_matches(batch)?);
        }
        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        matches.truncate(limit);
        Ok(matches)
    }

    async fn count(&self) -> Result<usize, RetrievalError> {
        if !self.table_exists().await {
            return Ok(0);
        }
        let table = self
            .db
            .open_table(SCHEMA_CHUNKS_TABLE)
            .execute()
            .await
            .map_err(store_err("failed to open table"))?;
        table
            .count_rows(None)
            .await
            .map_err(store_err("failed to count rows"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks() -> Vec<String> {
        vec![
            "Table: users\n  - Column 'id' (INTEGER), NOT NULL".to_string(),
            "Table: payments\n  - Column 'amount' (REAL), NOT NULL".to_string(),
            "Table: products\n  - Column 'sku' (TEXT), NOT NULL".to_string(),
        ]
    }

    fn embeddings() -> Vec<Vec<f32>> {
        vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ]
    }

    #[tokio::test]
    async fn test_empty_store_counts_zero() {
        let store = LanceSchemaStore::temporary("test-model").await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.search(&[1.0, 0.0, 0.0], 4).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_and_search_nearest_first() {
        let store = LanceSchemaStore::temporary("test-model").await.unwrap();
        assert_eq!(store.replace(&chunks(), &embeddings()).await.unwrap(), 3);
        assert_eq!(store.count().await.unwrap(), 3);

        let matches = store.search(&[0.1, 0.9, 0.0], 2).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert!(matches[0].text.starts_with("Table: payments"));
        assert!(matches[0].distance <= matches[1].distance);
    }

    #[tokio::test]
    async fn test_replace_drops_previous_rows() {
        let store = LanceSchemaStore::temporary("test-model").await.unwrap();
        store.replace(&chunks(), &embeddings()).await.unwrap();

        let replaced = store
            .replace(&["Table: only".to_string()], &[vec![0.5, 0.5]])
            .await
            .unwrap();
        assert_eq!(replaced, 1);
        assert_eq!(store.count().await.unwrap(), 1);

        let matches = store.search(&[0.5, 0.5], 4).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text, "Table: only");
    }

    #[tokio::test]
    async fn test_replace_rejects_mismatched_input() {
        let store = LanceSchemaStore::temporary("test-model").await.unwrap();
        let err = store.replace(&chunks(), &embeddings()[..2]).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Store(_)));

        let err = store
            .replace(
                &chunks()[..2],
                &[vec![1.0, 0.0], vec![1.0, 0.0, 0.0]],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::Store(_)));
    }

    #[tokio::test]
    async fn test_configured_path_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store");
        let store = LanceSchemaStore::open(path.to_str(), "test-model").await.unwrap();
        assert!(path.is_dir());
        assert_eq!(store.base_path(), path.as_path());
    }

    #[tokio::test]
    async fn test_temporary_dir_removed_on_drop() {
        let store = LanceSchemaStore::temporary("test-model").await.unwrap();
        let path = store.base_path().to_path_buf();
        assert!(path.is_dir());
        drop(store);
        assert!(!path.exists());
    }
}
