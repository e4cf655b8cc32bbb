//! Helpers for building completion requests and consuming responses.

use futures_util::StreamExt;

use askdb_types::llm::{CompletionRequest, LlmError, Message, StreamEvent};

use super::provider::EventStream;

/// Model parameters shared by every call a pipeline makes.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
}

impl GenerationSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_tokens: 8_192,
            temperature: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f64>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Build a non-streaming request for the given messages.
    pub fn request(&self, messages: Vec<Message>, system: Option<String>) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            messages,
            system,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: false,
        }
    }

    pub fn streaming_request(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
    ) -> CompletionRequest {
        CompletionRequest {
            stream: true,
            ..self.request(messages, system)
        }
    }
}

/// Drain a provider stream, forwarding each text delta to `on_delta`.
///
/// Returns the concatenated text once the stream ends. The first error
/// aborts the stream and is returned as-is.
pub async fn collect_text_stream<F>(
    mut stream: EventStream,
    mut on_delta: F,
) -> Result<String, LlmError>
where
    F: FnMut(&str),
{
    let mut text = String::new();
    while let Some(event) = stream.next().await {
        match event? {
            StreamEvent::TextDelta { text: delta } => {
                on_delta(&delta);
                text.push_str(&delta);
            }
            StreamEvent::Done => break,
            StreamEvent::Connected | StreamEvent::MessageDelta { .. } | StreamEvent::Usage(_) => {}
        }
    }
    Ok(text)
}
