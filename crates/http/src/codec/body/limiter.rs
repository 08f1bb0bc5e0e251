//! A reader that fails once more than a fixed number of bytes were read.
//!
//! Unlike [`std::io::Take`], reaching the limit is an error rather than an end of
//! stream, so that an oversized request head or body can be answered with a client error
//! instead of being silently truncated.

use std::cmp;
use std::io::{self, Read};

use crate::protocol::StreamError;
use crate::utils::ensure;

/// Counts the bytes read through it and fails with [`StreamError::Limit`] as soon as the
/// total exceeds `limit`.
///
/// A read that returns no byte although bytes were requested fails with
/// [`StreamError::End`], as the source closed before the reader was done with it.
#[derive(Debug)]
pub struct Limiter<R> {
    inner: R,
    limit: u64,
    read: u64,
}

impl<R: Read> Limiter<R> {
    /// Fails with [`StreamError::InvalidLimit`] if `limit` is negative.
    pub fn new(inner: R, limit: i64) -> Result<Self, StreamError> {
        let Ok(limit) = u64::try_from(limit) else {
            return Err(StreamError::InvalidLimit { limit });
        };
        Ok(Self { inner, limit, read: 0 })
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// The number of bytes that can still be read before the limit is reached.
    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.read)
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for Limiter<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        ensure!(self.read <= self.limit, StreamError::limit(self.limit).into());

        // one byte past the limit is enough to tell that it was exceeded
        let max = usize::try_from(self.remaining().saturating_add(1)).unwrap_or(usize::MAX);
        let len = cmp::min(buf.len(), max);
        let n = self.inner.read(&mut buf[..len])?;
        ensure!(n > 0, StreamError::End.into());

        self.read += n as u64;
        ensure!(self.read <= self.limit, StreamError::limit(self.limit).into());
        Ok(n)
    }
}
