//! Decoder implementation for HTTP chunked transfer encoding.
//!
//! This module provides functionality to decode HTTP messages that use chunked transfer encoding
//! as specified in [RFC 7230 Section 4.1](https://tools.ietf.org/html/rfc7230#section-4.1).
//!
//! The chunked encoding allows the sender to transmit message data in a series of chunks,
//! indicating the size of each chunk before its data. Chunk extensions and trailers are not
//! supported: a size line holds nothing but hexadecimal digits, and the last chunk is
//! directly followed by the final CRLF.

use std::cmp;
use std::io::{self, Read};

use tracing::trace;
use ChunkedState::*;

use crate::protocol::StreamError;

/// The maximum number of hexadecimal chars of a chunk size line.
const MAX_SIZE_CHARS: usize = 8;

/// A reader decoding a chunked body.
///
/// The chunk data is read straight into the caller's buffer, a single read may cross
/// several chunk boundaries. Once the last chunk was read, every read returns 0.
#[derive(Debug)]
pub struct Chunked<R> {
    inner: R,
    state: ChunkedState,
    size_line: Vec<u8>,
    chunk_size: u64,
    remaining_size: u64,
}

impl<R: Read> Chunked<R> {
    /// Creates a new decoder, ready to read the size of the first chunk.
    pub fn new(inner: R) -> Self {
        Self { inner, state: Size, size_line: Vec::with_capacity(MAX_SIZE_CHARS), chunk_size: 0, remaining_size: 0 }
    }

    /// Tells if the last chunk was read.
    pub fn is_eof(&self) -> bool {
        self.state == End
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Read the chunk size in hex
    Size,
    /// Read LF after chunk size
    SizeLf,
    /// Read chunk data
    Body,
    /// Read CR after chunk data
    BodyCr,
    /// Read LF after chunk data
    BodyLf,
    /// Read CR after the last chunk
    EndCr,
    /// Read LF after the last chunk
    EndLf,
    /// Final state after reading last chunk
    End,
}

impl<R: Read> Read for Chunked<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut written = 0;
        while written < buf.len() && self.state != End {
            self.state = self.step(&mut buf[written..], &mut written)?;
        }
        Ok(written)
    }
}

macro_rules! try_next_byte {
    ($src:expr) => {{
        let mut byte = [0u8; 1];
        match $src.read(&mut byte)? {
            0 => return Err(StreamError::End.into()),
            _ => byte[0],
        }
    }};
}

impl<R: Read> Chunked<R> {
    fn step(&mut self, buf: &mut [u8], written: &mut usize) -> io::Result<ChunkedState> {
        match self.state {
            Size => self.read_size(),
            SizeLf => self.read_size_lf(),
            Body => self.read_body(buf, written),
            BodyCr => self.read_body_cr(),
            BodyLf => self.read_body_lf(),
            EndCr => self.read_end_cr(),
            EndLf => self.read_end_lf(),
            End => Ok(End),
        }
    }

    /// Collects the raw bytes of the size line up to its CR, the line is only interpreted
    /// once complete. At most `MAX_SIZE_CHARS` bytes are kept, whatever they are.
    fn read_size(&mut self) -> io::Result<ChunkedState> {
        match try_next_byte!(self.inner) {
            b'\r' => Ok(SizeLf),
            b => {
                if self.size_line.len() >= MAX_SIZE_CHARS {
                    return Err(StreamError::format(format!(
                        "Chunk length can't be longer than «{MAX_SIZE_CHARS}» hexadecimal chars."
                    ))
                    .into());
                }
                self.size_line.push(b);
                Ok(Size)
            }
        }
    }

    fn read_size_lf(&mut self) -> io::Result<ChunkedState> {
        let b = try_next_byte!(self.inner);
        if b != b'\n' {
            self.size_line.push(b'\r');
            self.size_line.push(b);
            return Err(self.invalid_size());
        }

        // surrounding whitespace is tolerated
        let hex = self.size_line.trim_ascii();
        let size = match std::str::from_utf8(hex) {
            Ok(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => u64::from_str_radix(hex, 16),
            _ => return Err(self.invalid_size()),
        };
        let Ok(size) = size else {
            return Err(self.invalid_size());
        };
        self.size_line.clear();

        trace!(size, "read chunk size");
        self.chunk_size = size;
        self.remaining_size = size;
        Ok(if size == 0 { EndCr } else { Body })
    }

    fn read_body(&mut self, buf: &mut [u8], written: &mut usize) -> io::Result<ChunkedState> {
        let max = usize::try_from(self.remaining_size).unwrap_or(usize::MAX);
        let len = cmp::min(buf.len(), max);
        let n = self.inner.read(&mut buf[..len])?;
        if n == 0 {
            return Err(StreamError::End.into());
        }

        trace!(len = n, "read chunked bytes");
        *written += n;
        self.remaining_size -= n as u64;
        Ok(if self.remaining_size == 0 { BodyCr } else { Body })
    }

    fn read_body_cr(&mut self) -> io::Result<ChunkedState> {
        match try_next_byte!(self.inner) {
            b'\r' => Ok(BodyLf),
            _ => Err(self.missing_body_crlf()),
        }
    }

    fn read_body_lf(&mut self) -> io::Result<ChunkedState> {
        match try_next_byte!(self.inner) {
            b'\n' => Ok(Size),
            _ => Err(self.missing_body_crlf()),
        }
    }

    fn read_end_cr(&mut self) -> io::Result<ChunkedState> {
        match try_next_byte!(self.inner) {
            b'\r' => Ok(EndLf),
            _ => Err(missing_end_crlf()),
        }
    }

    fn read_end_lf(&mut self) -> io::Result<ChunkedState> {
        match try_next_byte!(self.inner) {
            b'\n' => {
                trace!("finished reading chunked data");
                Ok(End)
            }
            _ => Err(missing_end_crlf()),
        }
    }

    fn invalid_size(&self) -> io::Error {
        let line = String::from_utf8_lossy(self.size_line.trim_ascii());
        StreamError::format(format!("Chunk length «{line}» is not a valid hexadecimal number.")).into()
    }

    fn missing_body_crlf(&self) -> io::Error {
        StreamError::format(format!(
            "Chunk of length «{}» is not followed by expected sequence «\\r\\n».",
            self.chunk_size
        ))
        .into()
    }
}

fn missing_end_crlf() -> io::Error {
    StreamError::format("Last chunk of length «0» is not terminated with expected final sequence «\\r\\n».").into()
}
