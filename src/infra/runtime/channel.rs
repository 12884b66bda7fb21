//! Newline-delimited JSON framing over any async byte stream.

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::core::error::ChannelError;

pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;

/// One unit read from the input side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Line(String),
    /// A line longer than the frame limit. Its bytes were discarded up to
    /// and including the next newline; the value is how many were dropped.
    Oversized(usize),
}

pub struct LineChannel<R, W> {
    reader: BufReader<R>,
    buf: Vec<u8>,
    max_frame_bytes: usize,
    writer: W,
}

impl<R, W> LineChannel<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: Vec::new(),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            writer,
        }
    }

    /// Cap on a single line, newline included.
    pub fn with_max_frame_bytes(mut self, max_frame_bytes: usize) -> Self {
        self.max_frame_bytes = max_frame_bytes;
        self
    }

    pub fn max_frame_bytes(&self) -> usize {
        self.max_frame_bytes
    }

    /// Next frame, or `None` once the input side is closed. Invalid UTF-8 is
    /// replaced rather than treated as a transport failure, so it surfaces
    /// as a parse error for that one frame.
    pub async fn recv(&mut self) -> Result<Option<Frame>, ChannelError> {
        self.buf.clear();
        let mut read = 0usize;
        let mut oversized = false;
        loop {
            let available = self.reader.fill_buf().await.map_err(ChannelError::Read)?;
            if available.is_empty() {
                break;
            }
            let (chunk, done) = match available.iter().position(|b| *b == b'\n') {
                Some(i) => (&available[..=i], true),
                None => (available, false),
            };
            let used = chunk.len();
            read += used;
            if !oversized {
                if self.buf.len() + used > self.max_frame_bytes {
                    oversized = true;
                    self.buf.clear();
                } else {
                    self.buf.extend_from_slice(chunk);
                }
            }
            self.reader.consume(used);
            if done {
                break;
            }
        }
        if read == 0 {
            return Ok(None);
        }
        if oversized {
            return Ok(Some(Frame::Oversized(read)));
        }
        let line = String::from_utf8_lossy(&self.buf);
        Ok(Some(Frame::Line(line.trim_end_matches(['\n', '\r']).to_owned())))
    }

    /// Write one frame and flush it.
    pub async fn send<T: Serialize>(&mut self, frame: &T) -> Result<(), ChannelError> {
        let mut buf = serde_json::to_vec(frame)?;
        buf.push(b'\n');
        self.writer.write_all(&buf).await.map_err(ChannelError::Write)?;
        self.writer.flush().await.map_err(ChannelError::Write)
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

/// Channel bound to the process's stdin/stdout.
pub fn stdio(max_frame_bytes: usize) -> LineChannel<tokio::io::Stdin, tokio::io::Stdout> {
    LineChannel::new(tokio::io::stdin(), tokio::io::stdout()).with_max_frame_bytes(max_frame_bytes)
}
