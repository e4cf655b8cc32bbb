use thiserror::Error;

use crate::llm::LlmError;

/// Errors from the relational database behind the assistant.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("database connection error: {0}")]
    Connection(String),

    #[error("unsupported database url scheme: '{0}'")]
    UnsupportedDialect(String),

    #[error("schema introspection failed: {0}")]
    Introspection(String),

    /// The generated SQL was rejected or failed while running.
    ///
    /// The message is the driver's error text and is fed back to the LLM
    /// verbatim during repair.
    #[error("{0}")]
    Execution(String),
}

impl DatabaseError {
    /// Whether this error came from running a generated statement (and is
    /// therefore worth a repair attempt).
    pub fn is_execution(&self) -> bool {
        matches!(self, DatabaseError::Execution(_))
    }
}

/// Errors from the schema retrieval layer (chunking, embedding, vector store).
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("vector store error: {0}")]
    Store(String),

    #[error("chunking error: {0}")]
    Chunking(String),

    #[error("schema index is empty")]
    EmptyIndex,
}

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {message}")]
    Read { path: String, message: String },

    #[error("failed to parse config file '{path}': {message}")]
    Parse { path: String, message: String },

    #[error("missing required setting: {0}")]
    Missing(String),

    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Errors from one question/answer run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error("the model returned no SQL")]
    EmptySql,

    #[error("question must not be empty")]
    EmptyQuestion,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_error_display_is_driver_text() {
        let err = DatabaseError::Execution("no such table: users".to_string());
        assert_eq!(err.to_string(), "no such table: users");
        assert!(err.is_execution());
        assert!(!DatabaseError::Connection("refused".into()).is_execution());
    }

    #[test]
    fn test_pipeline_error_is_transparent() {
        let err: PipelineError = DatabaseError::Execution("syntax error".to_string()).into();
        assert_eq!(err.to_string(), "syntax error");

        let err: PipelineError = LlmError::AuthenticationFailed.into();
        assert_eq!(err.to_string(), "LLM authentication failed, check the API key");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Missing("database.url".to_string());
        assert_eq!(err.to_string(), "missing required setting: database.url");
    }
}
