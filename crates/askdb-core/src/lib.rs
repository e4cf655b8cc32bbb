//! Query pipeline and port trait definitions for askdb.
//!
//! This crate defines the "ports" (LLM provider, embedder, SQL database,
//! schema vector store) that the infrastructure layer implements, plus the
//! logic that ties them together. It depends only on `askdb-types`, never on
//! `askdb-infra` or any database/IO crate.

pub mod chat;
pub mod database;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod retrieval;

#[cfg(test)]
pub(crate) mod testing;
