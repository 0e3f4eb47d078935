// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire format encoding/decoding for the IPC protocol.
//!
//! Frames are single JSON objects separated by `\n`. Outbound frames
//! append exactly one newline. A frame larger than [`MAX_FRAME_SIZE`]
//! is a protocol error that closes the connection.

use serde::Serialize;
use thiserror::Error;

/// Maximum single-frame size (4 MiB)
pub const MAX_FRAME_SIZE: usize = 4 * 1024 * 1024;

/// Protocol errors
#[derive(Debug, Error)]
pub enum FramingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Timeout")]
    Timeout,
}

/// Incremental decoder for newline-delimited frames.
///
/// Fed arbitrary byte chunks, it yields zero or more complete frames and
/// retains trailing partial data for the next push.
#[derive(Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and drain all complete frames it produced.
    ///
    /// Empty lines are skipped. Errors if the buffered partial frame
    /// exceeds [`MAX_FRAME_SIZE`].
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Vec<u8>>, FramingError> {
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        loop {
            let Some(pos) = self.buf.iter().position(|&b| b == b'\n') else {
                break;
            };
            let mut frame: Vec<u8> = self.buf.drain(..=pos).collect();
            frame.pop(); // trailing newline
            if frame.last() == Some(&b'\r') {
                frame.pop();
            }
            if frame.len() > MAX_FRAME_SIZE {
                return Err(FramingError::FrameTooLarge {
                    size: frame.len(),
                    max: MAX_FRAME_SIZE,
                });
            }
            if !frame.is_empty() {
                frames.push(frame);
            }
        }

        if self.buf.len() > MAX_FRAME_SIZE {
            return Err(FramingError::FrameTooLarge {
                size: self.buf.len(),
                max: MAX_FRAME_SIZE,
            });
        }

        Ok(frames)
    }

    /// Bytes of retained partial data.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

/// Encode a message as one frame: JSON followed by exactly one newline.
pub fn encode_frame<T: Serialize>(msg: &T) -> Result<Vec<u8>, FramingError> {
    let mut json = serde_json::to_vec(msg)?;

    if json.len() > MAX_FRAME_SIZE {
        return Err(FramingError::FrameTooLarge {
            size: json.len(),
            max: MAX_FRAME_SIZE,
        });
    }

    json.push(b'\n');
    Ok(json)
}

/// Read a single frame from an async reader (blocking until a newline).
///
/// Intended for bridge-side clients that follow a strict request/response
/// rhythm; the daemon uses [`FrameDecoder`] in its read loop instead.
pub async fn read_frame<R: tokio::io::AsyncReadExt + Unpin>(
    reader: &mut R,
    timeout: std::time::Duration,
) -> Result<Vec<u8>, FramingError> {
    let deadline = tokio::time::Instant::now() + timeout;
    let mut decoder = FrameDecoder::new();
    let mut chunk = [0u8; 8192];
    loop {
        let read = tokio::time::timeout_at(deadline, reader.read(&mut chunk))
            .await
            .map_err(|_| FramingError::Timeout)??;
        if read == 0 {
            return Err(FramingError::ConnectionClosed);
        }
        if let Some(frame) = decoder.push(&chunk[..read])?.into_iter().next() {
            return Ok(frame);
        }
    }
}

/// Write a message as one frame with a timeout.
pub async fn write_frame<W, T>(
    writer: &mut W,
    msg: &T,
    timeout: std::time::Duration,
) -> Result<(), FramingError>
where
    W: tokio::io::AsyncWriteExt + Unpin,
    T: Serialize,
{
    let data = encode_frame(msg)?;
    tokio::time::timeout(timeout, async {
        writer.write_all(&data).await?;
        writer.flush().await
    })
    .await
    .map_err(|_| FramingError::Timeout)??;
    Ok(())
}

#[cfg(test)]
#[path = "framing_tests.rs"]
mod tests;
