use askdb_types::error::RetrievalError;

/// Splits schema text into chunks small enough to embed.
///
/// Implementations must never return a chunk longer than their configured
/// maximum (measured in characters).
pub trait TextChunker: Send + Sync {
    fn chunk(&self, text: &str) -> Result<Vec<String>, RetrievalError>;
}
