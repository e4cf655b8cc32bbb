//! Shared domain types for askdb.
//!
//! This crate contains the types passed between the layers of the
//! natural-language-to-SQL assistant: LLM request/response shapes, schema
//! snapshots, query results, configuration, and their error types.
//!
//! Zero infrastructure dependencies -- only serde, serde_json, thiserror.

pub mod config;
pub mod error;
pub mod llm;
pub mod query;
pub mod schema;
