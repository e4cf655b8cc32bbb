//! Schema text chunker backed by `text-splitter`.
//!
//! Splits on the largest semantic boundary that fits (blank lines between
//! tables, then lines, then words), so a table description stays whole
//! whenever it is under the chunk size.

use text_splitter::{ChunkConfig, Characters, TextSplitter};

use askdb_core::retrieval::chunker::TextChunker;
use askdb_types::config::RetrievalConfig;
use askdb_types::error::RetrievalError;

pub struct SplitterChunker {
    splitter: TextSplitter<Characters>,
    chunk_size: usize,
}

impl SplitterChunker {
    /// `chunk_size` and `overlap` are measured in characters; the overlap
    /// must be smaller than the chunk size.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, RetrievalError> {
        if chunk_size == 0 {
            return Err(RetrievalError::Chunking("chunk size must be positive".to_string()));
        }
        let config = ChunkConfig::new(chunk_size)
            .with_overlap(overlap)
            .map_err(|e| RetrievalError::Chunking(e.to_string()))?;
        Ok(Self {
            splitter: TextSplitter::new(config),
            chunk_size,
        })
    }

    pub fn from_config(config: &RetrievalConfig) -> Result<Self, RetrievalError> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl TextChunker for SplitterChunker {
    fn chunk(&self, text: &str) -> Result<Vec<String>, RetrievalError> {
        Ok(self.splitter.chunks(text).map(str::to_string).collect())
    }
}
