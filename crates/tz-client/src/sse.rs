//! Server-Sent Events decoder for streamed inference responses.
//!
//! The gateway streams one JSON [`InferenceResponse`] per event. Events are separated by a
//! blank line and carry their payload on one or more `data:` lines. A `[DONE]` payload ends
//! the stream.
//!
//! [`InferenceStream`] is pull-driven: it only reads another chunk from the body when no
//! complete event is left in its buffer.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::{debug, error, warn};
use tz_types::{GatewayError, GatewayResult, InferenceResponse};

/// Payload that marks a clean end of stream.
pub const DONE_SENTINEL: &str = "[DONE]";

type ChunkSource = Pin<Box<dyn Stream<Item = GatewayResult<Bytes>> + Send>>;

/// Lazy, finite sequence of inference responses decoded from an SSE body.
///
/// Dropping the stream drops the underlying body, which releases the connection.
pub struct InferenceStream {
    source: Option<ChunkSource>,
    buffer: Vec<u8>,
}

impl InferenceStream {
    /// Decodes any byte-chunk source.
    pub fn new<S, E>(chunks: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: std::fmt::Display + 'static,
    {
        let chunks = chunks.map(|chunk| chunk.map_err(|e| GatewayError::network("Streaming inference", e)));
        Self { source: Some(Box::pin(chunks)), buffer: Vec::new() }
    }

    /// Decodes the body of a streaming `/inference` response.
    pub fn from_response(response: reqwest::Response) -> Self {
        Self::new(response.bytes_stream())
    }

    /// Whether the chunk source has been released (end of stream, `[DONE]` or error).
    pub fn is_finished(&self) -> bool {
        self.source.is_none()
    }

    fn release(&mut self) {
        self.source = None;
        self.buffer.clear();
    }
}

impl std::fmt::Debug for InferenceStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceStream")
            .field("finished", &self.is_finished())
            .field("buffered_bytes", &self.buffer.len())
            .finish()
    }
}

enum EventPayload {
    Empty,
    Done,
    Response(Box<InferenceResponse>),
    Malformed { data: String, error: serde_json::Error },
}

impl Stream for InferenceStream {
    type Item = GatewayResult<InferenceResponse>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        loop {
            // Drain complete events before reading more of the body.
            while let Some(event) = take_event(&mut this.buffer) {
                match parse_event(&event) {
                    EventPayload::Empty => {}
                    EventPayload::Done => {
                        debug!("Inference stream finished with [DONE]");
                        this.release();
                        return Poll::Ready(None);
                    }
                    EventPayload::Response(response) => return Poll::Ready(Some(Ok(*response))),
                    EventPayload::Malformed { data, error } => {
                        warn!(error = %error, data = %data, "Skipping malformed SSE event");
                    }
                }
            }

            let Some(source) = this.source.as_mut() else {
                return Poll::Ready(None);
            };

            match source.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => this.buffer.extend_from_slice(&bytes),
                Poll::Ready(Some(Err(e))) => {
                    error!(error = %e, "Inference stream failed while reading the body");
                    this.release();
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    if this.buffer.iter().any(|b| !b.is_ascii_whitespace()) {
                        debug!(
                            buffered_bytes = this.buffer.len(),
                            "Discarding unterminated trailing SSE event"
                        );
                    }
                    this.release();
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Splits the first complete event off the front of `buffer`.
fn take_event(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let (end, next) = find_event_boundary(buffer)?;
    let mut event: Vec<u8> = buffer.drain(..next).collect();
    event.truncate(end);
    Some(event)
}

/// Finds a blank line: a `\n` immediately followed by `\n` or `\r\n`.
///
/// Returns the end of the event and the start of whatever follows the delimiter.
fn find_event_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let mut from = 0;
    while let Some(offset) = buffer[from..].iter().position(|&b| b == b'\n') {
        let newline = from + offset;
        let rest = &buffer[newline + 1..];
        if rest.starts_with(b"\n") {
            return Some((newline, newline + 2));
        }
        if rest.starts_with(b"\r\n") {
            return Some((newline, newline + 3));
        }
        from = newline + 1;
    }
    None
}

/// Concatenates the `data:` lines of one event.
fn event_data(event: &[u8]) -> String {
    String::from_utf8_lossy(event)
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim_start)
        .collect()
}

fn parse_event(event: &[u8]) -> EventPayload {
    let data = event_data(event);
    if data.is_empty() {
        return EventPayload::Empty;
    }
    if data == DONE_SENTINEL {
        return EventPayload::Done;
    }
    match serde_json::from_str::<InferenceResponse>(&data) {
        Ok(response) => EventPayload::Response(Box::new(response)),
        Err(error) => EventPayload::Malformed { data, error },
    }
}

/// Encodes one response as a single SSE frame.
pub fn encode_event(response: &InferenceResponse) -> GatewayResult<String> {
    let data = serde_json::to_string(response)
        .map_err(|e| GatewayError::Parse(format!("Failed to encode inference response: {e}")))?;
    Ok(format!("data: {data}\n\n"))
}

/// The frame that ends a stream.
pub fn encode_done() -> String {
    format!("data: {DONE_SENTINEL}\n\n")
}
