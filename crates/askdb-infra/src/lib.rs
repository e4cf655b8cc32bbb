//! Infrastructure implementations for askdb.
//!
//! Concrete adapters for the ports defined in `askdb-core`: LLM providers,
//! embedders, the sqlx-backed database, the LanceDB schema store, the text
//! chunker, and configuration loading.

pub mod chunker;
pub mod config;
pub mod database;
pub mod embedding;
pub mod llm;
pub mod vector;
