//! Runtime-selected provider.
//!
//! `LlmProvider::complete` returns `impl Future`, which rules out
//! `dyn LlmProvider`. `ErasedProvider` boxes the future instead and is
//! implemented for every provider, so `BoxLlmProvider` can hold any of them.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use askdb_types::llm::{CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities};

use super::provider::{EventStream, LlmProvider};

type CompleteFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>>;

/// Dyn-compatible mirror of [`LlmProvider`].
pub trait ErasedProvider: Send + Sync {
    fn erased_name(&self) -> &str;
    fn erased_capabilities(&self) -> &ProviderCapabilities;
    fn erased_complete<'a>(&'a self, request: &'a CompletionRequest) -> CompleteFuture<'a>;
    fn erased_stream(&self, request: CompletionRequest) -> EventStream;
}

impl<P: LlmProvider> ErasedProvider for P {
    fn erased_name(&self) -> &str {
        self.name()
    }

    fn erased_capabilities(&self) -> &ProviderCapabilities {
        self.capabilities()
    }

    fn erased_complete<'a>(&'a self, request: &'a CompletionRequest) -> CompleteFuture<'a> {
        Box::pin(self.complete(request))
    }

    fn erased_stream(&self, request: CompletionRequest) -> EventStream {
        self.stream(request)
    }
}

/// Owns whichever provider the configuration picked.
pub struct BoxLlmProvider {
    inner: Box<dyn ErasedProvider>,
}

impl BoxLlmProvider {
    pub fn new<P: LlmProvider + 'static>(provider: P) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.erased_name()
    }

    pub fn capabilities(&self) -> &ProviderCapabilities {
        self.inner.erased_capabilities()
    }

    pub async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        self.inner.erased_complete(request).await
    }

    pub fn stream(&self, request: CompletionRequest) -> EventStream {
        self.inner.erased_stream(request)
    }
}

impl fmt::Debug for BoxLlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoxLlmProvider").field(&self.name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::request::GenerationSettings;
    use crate::testing::ScriptedProvider;
    use askdb_types::llm::{Message, StreamEvent};
    use futures_util::StreamExt;

    fn hello() -> CompletionRequest {
        GenerationSettings::new("m").request(vec![Message::user("hi")], None)
    }

    #[tokio::test]
    async fn test_complete_goes_through_the_box() {
        let provider = BoxLlmProvider::new(ScriptedProvider::new(["SELECT 1"]));
        assert_eq!(provider.name(), "scripted");
        assert!(provider.capabilities().streaming);

        let response = provider.complete(&hello()).await.unwrap();
        assert_eq!(response.content, "SELECT 1");
    }

    #[tokio::test]
    async fn test_stream_goes_through_the_box() {
        let provider = BoxLlmProvider::new(ScriptedProvider::new(["two words"]));

        let text: String = provider
            .stream(hello())
            .filter_map(|event| async move {
                match event.unwrap() {
                    StreamEvent::TextDelta { text } => Some(text),
                    _ => None,
                }
            })
            .collect()
            .await;
        assert_eq!(text, "two words");
    }

    #[test]
    fn test_debug_shows_backend_name() {
        let provider = BoxLlmProvider::new(ScriptedProvider::new(Vec::<String>::new()));
        assert_eq!(format!("{provider:?}"), "BoxLlmProvider(\"scripted\")");
    }
}
