//! Decoder for bodies framed by the `Content-Length` header, as defined in
//! [RFC 7230 Section 3.3.2](https://tools.ietf.org/html/rfc7230#section-3.3.2).

use std::cmp;
use std::io::{self, Read};

use crate::protocol::StreamError;
use crate::utils::ensure;

/// Reads exactly `length` bytes from the inner reader, then reports the end of the body.
///
/// The inner reader ending before that is a [`StreamError::End`].
#[derive(Debug)]
pub struct FixLength<R> {
    inner: R,
    /// The number of bytes remaining to be read from the payload
    remaining: u64,
}

impl<R: Read> FixLength<R> {
    pub fn new(inner: R, length: u64) -> Self {
        Self { inner, remaining: length }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl<R: Read> Read for FixLength<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.remaining == 0 {
            return Ok(0);
        }

        let max = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        let len = cmp::min(buf.len(), max);
        let n = self.inner.read(&mut buf[..len])?;
        ensure!(n > 0, StreamError::End.into());

        self.remaining -= n as u64;
        Ok(n)
    }
}
