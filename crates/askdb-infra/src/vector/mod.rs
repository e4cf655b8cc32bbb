//! LanceDB-backed storage for embedded schema chunks.

pub mod lance;
pub mod schema;
