use std::io::{self, Write};

/// Writes everything written to it as chunks of the chunked transfer encoding.
///
/// Each non-empty write becomes one chunk, [`ChunkedWriter::finish`] writes the last
/// chunk. Dropping the writer without finishing leaves the body unterminated.
#[derive(Debug)]
pub struct ChunkedWriter<W: Write> {
    inner: W,
    eof: bool,
}

impl<W: Write> ChunkedWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, eof: false }
    }

    /// Writes the last chunk, later calls are no-ops.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.eof {
            return Ok(());
        }
        self.eof = true;
        self.inner.write_all(b"0\r\n\r\n")?;
        self.inner.flush()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for ChunkedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.eof {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "chunked body is already finished"));
        }

        write!(self.inner, "{:X}\r\n", buf.len())?;
        self.inner.write_all(buf)?;
        self.inner.write_all(b"\r\n")?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
