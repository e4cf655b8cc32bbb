//! Arrow schema of the schema-chunk table.
//!
//! Arrow versions MUST match lancedb's transitive dependency (57.3 for lancedb 0.26).

use std::sync::Arc;

use arrow_schema::{DataType, Field, Schema};

/// Name of the table holding the embedded schema chunks.
pub const SCHEMA_CHUNKS_TABLE: &str = "db_schema";

/// Element field of the `vector` column.
pub fn vector_item_field() -> Arc<Field> {
    Arc::new(Field::new("item", DataType::Float32, true))
}

/// One row per chunk of the detailed schema text.
///
/// The vector width follows the embedder, so it is a parameter rather than a
/// constant.
pub fn schema_chunks_schema(dimension: i32) -> Schema {
    Schema::new(vec![
        Field::new("chunk_index", DataType::Int32, false),
        Field::new("chunk_text", DataType::Utf8, false),
        Field::new("embedding_model", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(vector_item_field(), dimension),
            false,
        ),
    ])
}
