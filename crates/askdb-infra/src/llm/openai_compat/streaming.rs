//! async-openai chunk stream to [`StreamEvent`]s.

use futures_util::StreamExt;

use async_openai::types::chat::ChatCompletionResponseStream;

use askdb_core::llm::provider::EventStream;
use askdb_types::llm::{LlmError, StreamEvent, Usage};

use super::map_finish_reason;

/// `Connected`, text deltas and finish reasons as they arrive, usage from the
/// trailing chunk (requested via `include_usage`), then `Done`.
pub fn map_openai_stream(mut chunks: ChatCompletionResponseStream) -> EventStream {
    Box::pin(async_stream::try_stream! {
        yield StreamEvent::Connected;

        while let Some(next) = chunks.next().await {
            let chunk = next.map_err(|e| LlmError::Stream(e.to_string()))?;

            for choice in chunk.choices {
                if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
                    yield StreamEvent::TextDelta { text };
                }
                if let Some(reason) = choice.finish_reason {
                    yield StreamEvent::MessageDelta {
                        stop_reason: map_finish_reason(&reason),
                    };
                }
            }

            // Empty `choices` on this one.
            if let Some(usage) = chunk.usage {
                yield StreamEvent::Usage(Usage {
                    input_tokens: usage.prompt_tokens,
                    output_tokens: usage.completion_tokens,
                });
            }
        }

        yield StreamEvent::Done;
    })
}
