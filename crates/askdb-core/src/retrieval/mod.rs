//! Schema retrieval: chunk the detailed schema text, embed it, and look up
//! the chunks most relevant to a question.

pub mod box_embedder;
pub mod box_store;
pub mod chunker;
pub mod embedder;
pub mod index;
pub mod store;
