//! OpenTelemetry GenAI Semantic Convention attribute constants.
//!
//! Values for the `gen_ai.operation.name` and `gen_ai.system` span fields
//! recorded by the embedding and LLM clients.

// --- Operation name values ---

/// Embed schema chunks or a question.
pub const OP_EMBEDDINGS: &str = "embeddings";

// --- Provider name values ---

pub const PROVIDER_GEMINI: &str = "gemini";

pub const PROVIDER_OPENAI: &str = "openai";
