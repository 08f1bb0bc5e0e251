//! Request and response body framing.
//!
//! Every decoder is a blocking [`std::io::Read`] stacked over the connection input,
//! their failures travel as [`StreamError`](crate::protocol::StreamError) inside
//! [`std::io::Error`].
//!
//! # Components
//!
//! ## Decoders
//! - [`Limiter`]: fails once more than a given number of bytes were read
//! - [`FixLength`]: reads a body framed by `Content-Length`
//! - [`Chunked`]: reads a chunked body
//! - [`BodyDecodingStrategy`]: stacks the decoders a request needs, see [`PayloadDecoder`]
//!
//! ## Encoders
//! - [`ChunkedWriter`]: writes a chunked body

mod chunked_decoder;
mod chunked_encoder;
mod length_decoder;
mod limiter;
mod payload_decoder;

pub use chunked_decoder::Chunked;
pub use chunked_encoder::ChunkedWriter;
pub use length_decoder::FixLength;
pub use limiter::Limiter;
pub use payload_decoder::BodyDecodingStrategy;
pub use payload_decoder::NullReader;
pub use payload_decoder::PayloadDecoder;

#[cfg(test)]
pub(crate) mod tests {
    use std::cmp;
    use std::io::{self, Read};

    /// A source returning at most `granularity` bytes per read, like a socket would.
    pub struct ChoppedReader {
        data: Vec<u8>,
        position: usize,
        granularity: usize,
        failing: bool,
    }

    impl ChoppedReader {
        pub fn new(data: &[u8], granularity: usize) -> Self {
            Self { data: data.to_vec(), position: 0, granularity, failing: false }
        }

        /// A source that must not be read at all.
        pub fn failing() -> Self {
            Self { data: Vec::new(), position: 0, granularity: 0, failing: true }
        }
    }

    impl Read for ChoppedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            assert!(!self.failing, "the source was read");
            let len = cmp::min(cmp::min(buf.len(), self.granularity), self.data.len() - self.position);
            buf[..len].copy_from_slice(&self.data[self.position..self.position + len]);
            self.position += len;
            Ok(len)
        }
    }
}
