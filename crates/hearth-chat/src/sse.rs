//! Line framing for the smart-stream response body.
//!
//! The endpoint speaks an SSE-like dialect: newline-separated lines where
//! only `data: ` lines carry payload. This parser handles:
//! - Line buffering from chunked responses (a line may span chunks)
//! - `data: ` prefix extraction
//! - Comment (`:`) and non-`data` field filtering
//! - Remaining-buffer processing when the body ends without a final newline
//!
//! There is no `[DONE]` sentinel in this protocol — completion travels as a
//! JSON `done` key inside a data line, and the physical end of the byte
//! stream is the only true terminator.

use bytes::{Bytes, BytesMut};
use futures::Stream;
use tokio_stream::StreamExt;
use tracing::warn;

use crate::errors::StreamError;

/// Parse `data:` lines from a byte stream and yield raw JSON strings.
///
/// This is an async generator (implemented as a stream) that:
/// 1. Buffers incoming bytes
/// 2. Splits on newlines
/// 3. Extracts the `data: ` payload from SSE lines
/// 4. Skips comments, empty data, and non-`data` fields
/// 5. Surfaces transport read errors as a final `Err` item
pub fn parse_sse_lines<S>(byte_stream: S) -> impl Stream<Item = Result<String, StreamError>> + Send
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + Unpin + 'static,
{
    futures::stream::unfold(
        (byte_stream, BytesMut::with_capacity(8192), false),
        move |(mut stream, mut buffer, done)| async move {
            if done {
                return None;
            }

            loop {
                // Check buffer for a complete line (\n)
                if let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                    // Split the line bytes out of the buffer (zero-copy split)
                    let mut line_bytes = buffer.split_to(newline_pos + 1);
                    // Remove trailing \n
                    line_bytes.truncate(line_bytes.len() - 1);
                    // Remove trailing \r if present
                    if line_bytes.last() == Some(&b'\r') {
                        line_bytes.truncate(line_bytes.len() - 1);
                    }

                    // Convert to &str only for the final line
                    let line = match std::str::from_utf8(&line_bytes) {
                        Ok(s) => s,
                        Err(_) => continue, // skip invalid UTF-8 lines
                    };

                    if let Some(data) = extract_sse_data(line) {
                        return Some((Ok(data), (stream, buffer, false)));
                    }
                    continue;
                }

                // Read next chunk — append raw bytes, no conversion
                match stream.next().await {
                    Some(Ok(chunk)) => {
                        buffer.extend_from_slice(&chunk);
                    }
                    Some(Err(e)) => {
                        warn!("stream read error: {e}");
                        return Some((Err(StreamError::Http(e)), (stream, buffer, true)));
                    }
                    None => {
                        // Stream ended — a final line without a trailing
                        // newline still counts
                        if !buffer.is_empty() {
                            let line = match std::str::from_utf8(&buffer) {
                                Ok(s) => s.trim(),
                                Err(_) => return None,
                            };
                            if let Some(data) = extract_sse_data(line) {
                                buffer.clear();
                                return Some((Ok(data), (stream, buffer, true)));
                            }
                        }
                        return None;
                    }
                }
            }
        },
    )
}

/// Extract the data payload from one line.
///
/// Returns `Some(data)` for valid data lines, `None` for comments, empty
/// lines, empty data, and other SSE fields.
fn extract_sse_data(line: &str) -> Option<String> {
    let trimmed = line.trim();

    // Skip empty lines and comments
    if trimmed.is_empty() || trimmed.starts_with(':') {
        return None;
    }

    // Extract "data: " payload
    let data = trimmed
        .strip_prefix("data: ")
        .or_else(|| trimmed.strip_prefix("data:"))?;

    let data = data.trim();

    // Skip empty data
    if data.is_empty() {
        return None;
    }

    Some(data.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
