//! HTTP layer: `POST /query` and `GET /health` with permissive CORS.

pub mod error;
pub mod handlers;
pub mod router;
