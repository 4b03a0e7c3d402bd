//! Line parser for the filtered stream.
//!
//! Converts a raw `reqwest` byte stream into `StreamMessage` values. The
//! endpoint sends one JSON object per line and blank lines as keep-alives.
//! Lines that fail to decode are reported as keep-alives too; they never end
//! the stream. A line that grows past `max_line_bytes` without a newline does:
//! it yields a `Parse` error and the stream finishes.

use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::TwitterError;
use crate::types::StreamEvent;

/// A single item read from the filtered stream.
#[derive(Debug, Clone)]
pub enum StreamMessage {
    Post(Box<StreamEvent>),
    /// Blank line, empty chunk, or a line that isn't a stream event
    KeepAlive,
}

/// Longest line accepted before the stream is failed.
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Stream adapter that splits raw bytes into lines and decodes each one.
pub struct TweetStream {
    inner: Pin<Box<dyn Stream<Item = Result<Bytes, TwitterError>> + Send>>,
    buffer: Vec<u8>,
    max_line_bytes: usize,
    finished: bool,
}

impl TweetStream {
    pub fn new<S, E>(byte_stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<TwitterError>,
    {
        Self {
            inner: Box::pin(byte_stream.map(|chunk| chunk.map_err(Into::into))),
            buffer: Vec::new(),
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            finished: false,
        }
    }

    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }
}

impl Stream for TweetStream {
    type Item = Result<StreamMessage, TwitterError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(message) = take_line(&mut this.buffer) {
                return Poll::Ready(Some(Ok(message)));
            }

            if this.finished {
                return Poll::Ready(None);
            }

            // No newline in sight; the peer is not speaking line-delimited JSON
            if this.buffer.len() > this.max_line_bytes {
                let len = this.buffer.len();
                this.buffer = Vec::new();
                this.finished = true;
                return Poll::Ready(Some(Err(TwitterError::Parse(format!(
                    "stream line exceeds {} bytes ({} buffered)",
                    this.max_line_bytes, len
                )))));
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    if bytes.is_empty() {
                        return Poll::Ready(Some(Ok(StreamMessage::KeepAlive)));
                    }
                    this.buffer.extend_from_slice(&bytes);
                }
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    this.finished = true;
                    // Flush a trailing line that had no terminating newline
                    if this.buffer.iter().all(u8::is_ascii_whitespace) {
                        this.buffer.clear();
                        return Poll::Ready(None);
                    }
                    let rest = std::mem::take(&mut this.buffer);
                    return Poll::Ready(Some(Ok(decode_line(&rest))));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Pop one complete line off the front of the buffer and decode it.
fn take_line(buffer: &mut Vec<u8>) -> Option<StreamMessage> {
    let newline_pos = buffer.iter().position(|b| *b == b'\n')?;
    let line: Vec<u8> = buffer.drain(..=newline_pos).collect();
    Some(decode_line(&line))
}

fn decode_line(line: &[u8]) -> StreamMessage {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return StreamMessage::KeepAlive;
    }

    match serde_json::from_str::<StreamEvent>(text) {
        Ok(event) => StreamMessage::Post(Box::new(event)),
        Err(e) => {
            tracing::trace!(error = %e, "undecodable stream line treated as keep-alive");
            StreamMessage::KeepAlive
        }
    }
}
