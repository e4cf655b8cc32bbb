//! SqlDatabase trait: the relational database the assistant queries.
//!
//! Implementations (sqlx-backed) live in askdb-infra.

use askdb_types::error::DatabaseError;
use askdb_types::query::QueryResult;
use askdb_types::schema::DatabaseSchema;

/// A database that can describe its own schema and run arbitrary SQL text.
pub trait SqlDatabase: Send + Sync {
    /// Dialect name as it should appear in prompts ("SQLite", "PostgreSQL", ...).
    fn dialect(&self) -> &str;

    /// Read the current table, column, key and index metadata.
    fn introspect(
        &self,
    ) -> impl std::future::Future<Output = Result<DatabaseSchema, DatabaseError>> + Send;

    /// Execute `sql` exactly as given and fetch every row.
    ///
    /// Failures of the statement itself must be reported as
    /// [`DatabaseError::Execution`] carrying the driver's message.
    fn execute(
        &self,
        sql: &str,
    ) -> impl std::future::Future<Output = Result<QueryResult, DatabaseError>> + Send;
}
