//! Server-sent event decoding shared by the streaming adapters.
//!
//! A [`TextStream`] owns the HTTP response body it reads from. Dropping the
//! stream, whether it was drained, abandoned early, or stopped on an error,
//! drops the body and releases the underlying connection.

use std::pin::Pin;

use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use memchr::memchr;
use tracing::debug;

use crate::core::adapters::ProviderError;

/// Lazily produced response text fragments, in arrival order.
pub type TextStream = BoxStream<'static, Result<String, ProviderError>>;

/// What a single `data:` payload means to the adapter that parsed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Text(String),
    Skip,
    Done,
}

pub(crate) fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

/// Splits incoming byte chunks into complete lines.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    buffer: Vec<u8>,
}

impl SseLineBuffer {
    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Next complete line, without its terminator. Invalid UTF-8 lines are dropped.
    pub fn next_line(&mut self) -> Option<String> {
        loop {
            let newline_pos = memchr(b'\n', &self.buffer)?;
            let line = match std::str::from_utf8(&self.buffer[..newline_pos]) {
                Ok(s) => Some(s.trim().to_string()),
                Err(e) => {
                    debug!(error = %e, "Dropping invalid UTF-8 line in stream");
                    None
                }
            };
            self.buffer.drain(..=newline_pos);
            if let Some(line) = line {
                return Some(line);
            }
        }
    }
}

struct SseState<S, F> {
    body: Pin<Box<S>>,
    lines: SseLineBuffer,
    parse: F,
    body_done: bool,
    finished: bool,
}

/// Turns an SSE response body into a stream of text fragments.
///
/// `parse` interprets each `data:` payload. The stream ends after
/// [`SseEvent::Done`], at the end of the body, or right after the first error.
pub fn sse_text_stream<S, B, F>(body: S, parse: F) -> TextStream
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    F: FnMut(&str) -> Result<SseEvent, ProviderError> + Send + 'static,
{
    let state = SseState {
        body: Box::pin(body),
        lines: SseLineBuffer::default(),
        parse,
        body_done: false,
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }

        loop {
            while let Some(line) = state.lines.next_line() {
                let Some(payload) = extract_data_payload(&line) else {
                    continue;
                };
                match (state.parse)(payload) {
                    Ok(SseEvent::Text(text)) => return Some((Ok(text), state)),
                    Ok(SseEvent::Skip) => {}
                    Ok(SseEvent::Done) => return None,
                    Err(err) => {
                        state.finished = true;
                        return Some((Err(err), state));
                    }
                }
            }

            if state.body_done {
                return None;
            }

            match state.body.next().await {
                Some(Ok(chunk)) => state.lines.push(chunk.as_ref()),
                Some(Err(err)) => {
                    state.finished = true;
                    return Some((Err(ProviderError::Transport(err)), state));
                }
                None => {
                    // Flush a final line that arrived without a trailing newline.
                    state.lines.push(b"\n");
                    state.body_done = true;
                }
            }
        }
    })
    .boxed()
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.to_string()),
                serde_json::Value::Object(map) => map
                    .get("message")
                    .and_then(|message| message.as_str().map(str::to_owned)),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        collapsed.trim().to_string()
    })
}

/// Best human-readable message for an upstream error body.
///
/// JSON bodies yield their `error.message` (or `message`) when present; anything
/// else is returned trimmed.
pub fn summarize_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return "<empty response body>".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(summary) = extract_error_summary(&json_value) {
            if !summary.is_empty() {
                return summary;
            }
        }
        if let Ok(compact) = serde_json::to_string(&json_value) {
            return compact;
        }
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(parts: &[&str]) -> impl Stream<Item = Result<Vec<u8>, reqwest::Error>> + Send {
        let owned: Vec<Result<Vec<u8>, reqwest::Error>> =
            parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        stream::iter(owned)
    }

    fn echo_parser(payload: &str) -> Result<SseEvent, ProviderError> {
        match payload {
            "[DONE]" => Ok(SseEvent::Done),
            "" => Ok(SseEvent::Skip),
            "boom" => Err(ProviderError::Malformed("boom".to_string())),
            text => Ok(SseEvent::Text(text.to_string())),
        }
    }

    async fn collect(stream: TextStream) -> Vec<Result<String, String>> {
        stream
            .map(|item| item.map_err(|err| err.to_string()))
            .collect()
            .await
    }

    #[test]
    fn extract_data_payload_handles_spacing_variants() {
        assert_eq!(extract_data_payload("data: hello"), Some("hello"));
        assert_eq!(extract_data_payload("data:hello"), Some("hello"));
        assert_eq!(extract_data_payload("event: ping"), None);
    }

    #[test]
    fn line_buffer_reassembles_split_lines() {
        let mut buffer = SseLineBuffer::default();
        buffer.push(b"data: par");
        assert_eq!(buffer.next_line(), None);
        buffer.push(b"tial\r\ndata: next\n");
        assert_eq!(buffer.next_line().as_deref(), Some("data: partial"));
        assert_eq!(buffer.next_line().as_deref(), Some("data: next"));
        assert_eq!(buffer.next_line(), None);
    }

    #[test]
    fn line_buffer_skips_invalid_utf8() {
        let mut buffer = SseLineBuffer::default();
        buffer.push(&[0xff, 0xfe, b'\n']);
        buffer.push(b"data: ok\n");
        assert_eq!(buffer.next_line().as_deref(), Some("data: ok"));
    }

    #[tokio::test]
    async fn stream_yields_fragments_until_done() {
        let body = chunks(&[
            "event: delta\ndata: Hel",
            "lo\n\ndata: \n",
            "data:  world\ndata: [DONE]\ndata: ignored\n",
        ]);
        let items = collect(sse_text_stream(body, echo_parser)).await;
        assert_eq!(
            items,
            vec![Ok("Hello".to_string()), Ok("world".to_string())]
        );
    }

    #[tokio::test]
    async fn stream_flushes_trailing_line_without_newline() {
        let body = chunks(&["data: first\n", "data: last"]);
        let items = collect(sse_text_stream(body, echo_parser)).await;
        assert_eq!(items, vec![Ok("first".to_string()), Ok("last".to_string())]);
    }

    #[tokio::test]
    async fn stream_stops_after_first_error() {
        let body = chunks(&["data: a\ndata: boom\ndata: b\n"]);
        let items = collect(sse_text_stream(body, echo_parser)).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], Ok("a".to_string()));
        assert!(items[1].is_err());
    }

    #[test]
    fn summarize_api_error_prefers_json_message() {
        let raw = r#"{"error":{"message":"model   overloaded","type":"invalid_request_error"}}"#;
        assert_eq!(summarize_api_error(raw), "model overloaded");
    }

    #[test]
    fn summarize_api_error_handles_json_without_summary() {
        let raw = r#"{ "status": "failed" }"#;
        assert_eq!(summarize_api_error(raw), r#"{"status":"failed"}"#);
    }

    #[test]
    fn summarize_api_error_handles_plaintext_and_empty() {
        assert_eq!(summarize_api_error("  api failure \n"), "api failure");
        assert_eq!(summarize_api_error(""), "<empty response body>");
    }
}
