//! The chat-completion port.

use std::future::Future;
use std::pin::Pin;

use futures_util::Stream;

use askdb_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities, StreamEvent,
};

/// Boxed event stream returned by [`LlmProvider::stream`].
///
/// Boxed rather than RPITIT so the trait stays usable behind `BoxLlmProvider`.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>>;

/// A chat-completion backend. askdb-infra provides the OpenAI-compatible and
/// native Gemini implementations.
pub trait LlmProvider: Send + Sync {
    /// Short backend name, recorded as `gen_ai.system` on spans.
    fn name(&self) -> &str;

    fn capabilities(&self) -> &ProviderCapabilities;

    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<CompletionResponse, LlmError>> + Send;

    /// Owned request so the stream can outlive the borrow of `self`.
    fn stream(&self, request: CompletionRequest) -> EventStream;
}
