//! Picks the decoders of a request body from its headers.
//!
//! The body is framed by `Content-Length` when present, then every transfer coding is
//! removed, the last applied one first, as required by
//! [RFC 7230 Section 3.3.1](https://tools.ietf.org/html/rfc7230#section-3.3.1).

use std::io::{self, Read};

use flate2::read::{DeflateDecoder, GzDecoder};
use tracing::trace;
use verbatim_header::RequestHeaders;

use crate::codec::body::{Chunked, FixLength};
use crate::protocol::ParseError;

/// Builds the reader of a request body out of the raw connection input.
pub trait BodyDecodingStrategy: Send + Sync {
    fn decode<'a>(
        &self,
        headers: &RequestHeaders,
        input: Box<dyn Read + 'a>,
    ) -> Result<Box<dyn Read + 'a>, ParseError>;
}

/// Supports `Content-Length` and the `identity`, `gzip`, `deflate` and `chunked`
/// transfer codings.
#[derive(Debug, Default, Clone, Copy)]
pub struct PayloadDecoder;

impl BodyDecodingStrategy for PayloadDecoder {
    fn decode<'a>(
        &self,
        headers: &RequestHeaders,
        input: Box<dyn Read + 'a>,
    ) -> Result<Box<dyn Read + 'a>, ParseError> {
        let content_length = headers.content_length().value();
        let codings = headers.transfer_encoding().values().to_vec();

        let mut body: Box<dyn Read + 'a> = match content_length {
            Some(0) => Box::new(NullReader),
            Some(length) => Box::new(FixLength::new(input, length)),
            None if codings.is_empty() => Box::new(NullReader),
            None => input,
        };

        for coding in codings.iter().rev() {
            let coding = coding.trim().to_ascii_lowercase();
            trace!(%coding, "decoding transfer coding");
            body = match coding.as_str() {
                "" | "identity" => body,
                "gzip" => Box::new(GzDecoder::new(body)),
                "deflate" => Box::new(DeflateDecoder::new(body)),
                "chunked" => Box::new(Chunked::new(body)),
                _ => return Err(ParseError::unsupported_transfer_encoding(coding)),
            };
        }
        Ok(body)
    }
}

/// The body of a request without one, always at its end.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReader;

impl Read for NullReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn headers(fields: &[(&str, &str)]) -> RequestHeaders {
        let headers = RequestHeaders::new();
        for (name, value) in fields {
            headers.set(name, Some(*value)).unwrap();
        }
        headers
    }

    fn read_body(fields: &[(&str, &str)], input: &[u8]) -> Result<Vec<u8>, ParseError> {
        let headers = headers(fields);
        let mut body = PayloadDecoder.decode(&headers, Box::new(input))?;
        let mut buf = Vec::new();
        body.read_to_end(&mut buf)?;
        Ok(buf)
    }

    #[test]
    fn test_no_body() {
        assert_eq!(read_body(&[], b"GET / HTTP/1.1\r\n").unwrap(), b"");
        assert_eq!(read_body(&[("Content-Length", "0")], b"ignored").unwrap(), b"");
    }

    #[test]
    fn test_content_length() {
        assert_eq!(read_body(&[("Content-Length", " 5 ")], b"hello world").unwrap(), b"hello");
    }

    #[test]
    fn test_chunked() {
        let body = read_body(&[("Transfer-Encoding", "chunked")], b"3\r\nabc\r\n0\r\n\r\n").unwrap();
        assert_eq!(body, b"abc");

        let body = read_body(&[("Transfer-Encoding", "identity, Chunked ")], b"3\r\nabc\r\n0\r\n\r\n").unwrap();
        assert_eq!(body, b"abc");
    }

    #[test]
    fn test_gzip_then_chunked() {
        let mut gzip = GzEncoder::new(Vec::new(), Compression::default());
        gzip.write_all(b"compressed body").unwrap();
        let compressed = gzip.finish().unwrap();

        let mut input = format!("{:X}\r\n", compressed.len()).into_bytes();
        input.extend_from_slice(&compressed);
        input.extend_from_slice(b"\r\n0\r\n\r\n");

        let body = read_body(&[("Transfer-Encoding", "gzip, chunked")], &input).unwrap();
        assert_eq!(body, b"compressed body");
    }

    #[test]
    fn test_unsupported_coding() {
        let e = read_body(&[("Transfer-Encoding", "br, chunked")], b"").unwrap_err();
        assert!(matches!(e, ParseError::UnsupportedTransferEncoding { ref encoding } if encoding == "br"));
        assert_eq!(e.to_string(), "Transfer encoding «br» is not supported.");
    }

    #[test]
    fn test_truncated_body() {
        let e = read_body(&[("Content-Length", "10")], b"short").unwrap_err();
        assert!(matches!(e, ParseError::Stream(crate::protocol::StreamError::End)));
    }
}
