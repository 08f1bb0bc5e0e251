//! HTTP response head encoder
//!
//! Serializes the status line and the headers of a response into raw bytes. The header
//! values are written exactly as [`ResponseHeaders`] holds them, so a header copied from
//! a request is sent back byte for byte.

use std::io;
use std::io::Write;

use bytes::{BufMut, BytesMut};
use http::StatusCode;
use verbatim_header::ResponseHeaders;

use crate::protocol::SendError;

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 4 * 1024;

/// Encoder for HTTP/1.1 response heads.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderEncoder;

impl HeaderEncoder {
    /// Writes `HTTP/1.1 {code} {reason}\r\n`, one line per header and the blank line
    /// ending the head.
    pub fn encode(&mut self, status: StatusCode, headers: &ResponseHeaders, dst: &mut BytesMut) -> Result<(), SendError> {
        dst.reserve(INIT_HEADER_SIZE);
        write!(
            FastWrite(dst),
            "HTTP/1.1 {} {}\r\n",
            status.as_str(),
            status.canonical_reason().unwrap_or("Unknown")
        )?;

        for (name, value) in headers.iter() {
            dst.put_slice(name.as_bytes());
            dst.put_slice(b": ");
            dst.put_slice(value.as_bytes());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

/// Fast writer implementation for writing to BytesMut.
///
/// This is an optimization to avoid unnecessary bounds checking when writing
/// to the bytes buffer, since we've already reserved enough space.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(status: StatusCode, headers: &ResponseHeaders) -> String {
        let mut dst = BytesMut::new();
        HeaderEncoder.encode(status, headers, &mut dst).unwrap();
        String::from_utf8(dst.to_vec()).unwrap()
    }

    #[test]
    fn test_encode() {
        let headers = ResponseHeaders::new();
        headers.set("x-request-id", Some(" abc ")).unwrap();
        headers.content_length().set_value(Some(5));
        headers.set("Connection", Some("close")).unwrap();

        let expected = concat!(
            "HTTP/1.1 200 OK\r\n",
            "Connection: close\r\n",
            "Content-Length: 5\r\n",
            "x-request-id:  abc \r\n",
            "\r\n"
        );
        assert_eq!(encode(StatusCode::OK, &headers), expected);
    }

    #[test]
    fn test_no_headers() {
        assert_eq!(encode(StatusCode::NOT_FOUND, &ResponseHeaders::new()), "HTTP/1.1 404 Not Found\r\n\r\n");
    }

    #[test]
    fn test_unknown_reason() {
        let status = StatusCode::from_u16(599).unwrap();
        assert_eq!(encode(status, &ResponseHeaders::new()), "HTTP/1.1 599 Unknown\r\n\r\n");
    }
}
