//! Accumulate-and-recover streaming.
//!
//! Wraps a raw [`StreamEvent`] stream from a provider adapter into a single
//! [`ChatResponse`], the same shape a non-streaming `chat()` call returns,
//! while giving the caller a per-chunk callback seam and cancellation
//! support. Content seen before a cancellation or a mid-stream error is
//! never silently dropped: it comes back as [`Error::PartialCompletion`]
//! rather than a bare failure, so a caller can decide whether partial output
//! is still useful.

use crate::traits::ChatResponse;
use futures_util::StreamExt;
use mesh_domain::error::{Error, Result};
use mesh_domain::stream::{BoxStream, StreamEvent, Usage};
use mesh_domain::tool::ToolCall;
use tokio_util::sync::CancellationToken;

/// One observable unit of a streamed completion, handed to the caller's
/// `on_chunk` callback as it arrives.
#[derive(Debug, Clone)]
pub struct StreamChunk {
    /// Text carried by this chunk (empty for tool-call-only or final chunks).
    pub content: String,
    /// `true` for an incremental chunk, `false` for the terminal chunk.
    pub delta: bool,
    /// Zero-based position of this chunk within the stream.
    pub index: usize,
    /// The model that is producing this stream.
    pub model: String,
    /// Set only on the terminal chunk.
    pub finish_reason: Option<String>,
    /// Set only on the terminal chunk.
    pub usage: Option<Usage>,
}

/// Sentinel returned by an `on_chunk` callback to stop consuming the stream
/// early without treating it as a failure. The content accumulated so far is
/// returned as a normal, successful [`ChatResponse`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StopStreaming;

/// Drive `stream` to completion (or early stop), invoking `on_chunk` for
/// every event and returning the accumulated result as a [`ChatResponse`].
///
/// - The callback returning `Err(StopStreaming)` ends the stream early and
///   succeeds with whatever content has accumulated so far.
/// - `cancel` firing, or the upstream stream yielding a mid-stream error,
///   ends the stream early too, but surfaces as `Error::PartialCompletion`
///   when content has already accumulated, or the raw error/`Cancelled`
///   when nothing has been produced yet.
pub async fn collect_stream(
    provider_id: &str,
    mut stream: BoxStream<'static, Result<StreamEvent>>,
    cancel: CancellationToken,
    mut on_chunk: impl FnMut(&StreamChunk) -> std::result::Result<(), StopStreaming>,
) -> Result<ChatResponse> {
    let mut content = String::new();
    let mut tool_calls: Vec<ToolCall> = Vec::new();
    let mut model = String::new();
    let mut finish_reason: Option<String> = None;
    let mut usage: Option<Usage> = None;
    let mut index = 0usize;

    loop {
        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!(provider = %provider_id, "stream cancelled");
                return finish_early(content, provider_id, "cancelled");
            }
            next = stream.next() => next,
        };

        let event = match event {
            Some(event) => event,
            None => break,
        };

        let event = match event {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(provider = %provider_id, error = %e, "stream failed mid-flight");
                return if content.is_empty() {
                    Err(e)
                } else {
                    Err(Error::PartialCompletion {
                        content,
                        message: e.to_string(),
                    })
                };
            }
        };

        let chunk = match &event {
            StreamEvent::Token { text } => {
                content.push_str(text);
                Some(StreamChunk {
                    content: text.clone(),
                    delta: true,
                    index,
                    model: model.clone(),
                    finish_reason: None,
                    usage: None,
                })
            }
            StreamEvent::Thinking { .. } => None,
            StreamEvent::ToolCallStarted { .. } | StreamEvent::ToolCallDelta { .. } => None,
            StreamEvent::ToolCallFinished {
                call_id,
                tool_name,
                arguments,
            } => {
                tool_calls.push(ToolCall {
                    call_id: call_id.clone(),
                    tool_name: tool_name.clone(),
                    arguments: arguments.clone(),
                });
                None
            }
            StreamEvent::Done {
                usage: done_usage,
                finish_reason: done_finish_reason,
            } => {
                usage = done_usage.clone();
                finish_reason = done_finish_reason.clone();
                Some(StreamChunk {
                    content: String::new(),
                    delta: false,
                    index,
                    model: model.clone(),
                    finish_reason: finish_reason.clone(),
                    usage: usage.clone(),
                })
            }
            StreamEvent::Error { message } => {
                return if content.is_empty() {
                    Err(Error::Provider {
                        provider: provider_id.to_string(),
                        message: message.clone(),
                    })
                } else {
                    Err(Error::PartialCompletion {
                        content,
                        message: message.clone(),
                    })
                };
            }
        };

        if let Some(chunk) = chunk {
            index += 1;
            if on_chunk(&chunk).is_err() {
                tracing::info!(
                    provider = %provider_id,
                    chars_recovered = content.len(),
                    "ai.stream_stopped_by_callback"
                );
                return Ok(ChatResponse {
                    content,
                    tool_calls,
                    usage,
                    model,
                    finish_reason: Some("stop".to_string()),
                    provider: provider_id.to_string(),
                });
            }
        }
    }

    Ok(ChatResponse {
        content,
        tool_calls,
        usage,
        model,
        finish_reason,
        provider: provider_id.to_string(),
    })
}

fn finish_early(content: String, provider_id: &str, reason: &str) -> Result<ChatResponse> {
    if content.is_empty() {
        Err(Error::Cancelled(format!(
            "stream from '{}' {} before producing any content",
            provider_id, reason
        )))
    } else {
        Err(Error::PartialCompletion {
            content,
            message: format!("stream from '{}' {}", provider_id, reason),
        })
    }
}
