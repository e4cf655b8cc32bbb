//! SSE streaming for `streamGenerateContent?alt=sse`.
//!
//! Every SSE `data:` payload is a complete `GenerateContentResponse` chunk
//! carrying the next slice of text. The last chunk has a finish reason and
//! usage metadata; the server then closes the connection.

use futures_util::StreamExt;
use reqwest_eventsource::{Event, EventSource};
use secrecy::{ExposeSecret, SecretString};

use askdb_core::llm::provider::EventStream;
use askdb_types::llm::{LlmError, StreamEvent, Usage};

use super::map_finish_reason;
use super::map_status;
use super::types::{GenerateContentRequest, GenerateContentResponse};

/// Open a streaming connection and map chunks to [`StreamEvent`]s.
pub fn create_gemini_stream(
    client: &reqwest::Client,
    url: &str,
    body: GenerateContentRequest,
    api_key: &SecretString,
) -> EventStream {
    let builder = client
        .post(url)
        .header("x-goog-api-key", api_key.expose_secret())
        .json(&body);

    let mut source = match EventSource::new(builder) {
        Ok(source) => source,
        Err(e) => {
            let err = LlmError::Stream(format!("failed to open event stream: {e}"));
            return Box::pin(futures_util::stream::once(async move { Err(err) }));
        }
    };

    Box::pin(async_stream::try_stream! {
        let mut usage: Option<Usage> = None;

        while let Some(event) = source.next().await {
            match event {
                Ok(Event::Open) => yield StreamEvent::Connected,
                Ok(Event::Message(message)) => {
                    if message.data.trim().is_empty() {
                        continue;
                    }
                    let chunk: GenerateContentResponse = serde_json::from_str(&message.data)
                        .map_err(|e| LlmError::Deserialization(format!("stream chunk: {e}")))?;

                    let text = chunk.text();
                    if !text.is_empty() {
                        yield StreamEvent::TextDelta { text };
                    }
                    if let Some(meta) = &chunk.usage_metadata {
                        usage = Some(Usage {
                            input_tokens: meta.prompt_token_count,
                            output_tokens: meta.candidates_token_count,
                        });
                    }
                    if let Some(reason) = chunk.finish_reason() {
                        yield StreamEvent::MessageDelta {
                            stop_reason: map_finish_reason(reason),
                        };
                    }
                }
                Err(reqwest_eventsource::Error::StreamEnded) => break,
                Err(reqwest_eventsource::Error::InvalidStatusCode(status, response)) => {
                    source.close();
                    let body = response.text().await.unwrap_or_default();
                    Err(map_status(status.as_u16(), body))?;
                }
                Err(e) => {
                    source.close();
                    Err(LlmError::Stream(e.to_string()))?;
                }
            }
        }
        source.close();

        if let Some(usage) = usage {
            yield StreamEvent::Usage(usage);
        }
        yield StreamEvent::Done;
    })
}
