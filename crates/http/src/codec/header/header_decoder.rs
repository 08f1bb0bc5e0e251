//! HTTP request head reader
//!
//! Reads the request line and the header block of a request from a blocking source,
//! stopping right before the body. The request line is read piece by piece so that every
//! piece gets its own size limit, the header block is parsed with `httparse` and its
//! values are set into [`RequestHeaders`], which validates the managed ones.
//!
//! # Limits
//!
//! - Maximum number of headers: 64
//! - Method, request target and header block sizes come from the server configuration
//! - Only HTTP/1.1 is supported

use std::io::{BufRead, Read};

use http::Method;
use httparse::Status;
use tracing::trace;
use verbatim_header::RequestHeaders;

use crate::codec::body::Limiter;
use crate::protocol::{ParseError, RequestHead, StreamError};
use crate::utils::ensure;

/// Maximum number of headers allowed in a request
const MAX_HEADER_NUM: usize = 64;

/// Maximum size of the http version at the end of the request line, `HTTP/1.1` is 8.
const MAX_VERSION_SIZE: usize = 16;

/// Reads the head of the next request on a connection.
pub trait HeadReader: Send + Sync {
    /// Returns `Ok(None)` when the peer closed the connection before sending anything.
    fn read_head(&self, reader: &mut dyn BufRead) -> Result<Option<RequestHead>, ParseError>;
}

/// The standard [`HeadReader`].
#[derive(Debug, Clone)]
pub struct HeaderDecoder {
    max_method_size: usize,
    max_uri_size: usize,
    max_headers_size: Option<usize>,
}

impl HeaderDecoder {
    /// `max_headers_size` of `None` does not limit the header block.
    pub fn new(max_method_size: usize, max_uri_size: usize, max_headers_size: Option<usize>) -> Self {
        Self { max_method_size, max_uri_size, max_headers_size }
    }

    fn read_request_line(&self, reader: &mut dyn BufRead) -> Result<(Method, String, String), ParseError> {
        let Some(mut method) = read_until(reader, b' ', self.max_method_size)? else {
            return Err(ParseError::format(format!(
                "Http method not valid, max chars «{}» reached.",
                self.max_method_size
            )));
        };
        method.make_ascii_uppercase();
        let Ok(method) = Method::from_bytes(&method) else {
            return Err(ParseError::InvalidMethod);
        };

        let Some(target) = read_until(reader, b' ', self.max_uri_size)? else {
            return Err(ParseError::RequestUriTooLong { max_size: self.max_uri_size });
        };
        ensure!(!target.is_empty(), ParseError::invalid_uri("request target is empty"));
        let target = String::from_utf8(target).map_err(ParseError::invalid_uri)?;

        let Some(mut version) = read_until(reader, b'\n', MAX_VERSION_SIZE)? else {
            return Err(ParseError::format(format!("Http version not valid, max chars «{MAX_VERSION_SIZE}» reached.")));
        };
        if version.last() == Some(&b'\r') {
            version.pop();
        }
        let version = String::from_utf8_lossy(&version).into_owned();

        Ok((method, target, version))
    }

    fn read_headers(&self, reader: &mut dyn BufRead) -> Result<RequestHeaders, ParseError> {
        let limit = self.max_headers_size.map_or(i64::MAX, |max| i64::try_from(max).unwrap_or(i64::MAX));
        let mut limited = Limiter::new(reader, limit)?;

        let mut block = Vec::new();
        let mut line = Vec::new();
        loop {
            line.clear();
            read_line(&mut limited, &mut line)?;
            block.extend_from_slice(&line);
            if line == b"\r\n" || line == b"\n" {
                break;
            }
            ensure!(line.contains(&b':'), ParseError::invalid_header("Invalid header, value separator «:» not found!"));
        }
        trace!(header_size = block.len(), "read header block");

        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
        let parsed = match httparse::parse_headers(&block, &mut headers) {
            Ok(Status::Complete((_, parsed))) => parsed,
            Ok(Status::Partial) => return Err(ParseError::invalid_header("header block is incomplete")),
            Err(httparse::Error::TooManyHeaders) => return Err(ParseError::too_many_headers(MAX_HEADER_NUM)),
            Err(e) => return Err(ParseError::invalid_header(e)),
        };

        let request_headers = RequestHeaders::new();
        for header in parsed {
            let value = String::from_utf8_lossy(header.value);
            request_headers.set(header.name, Some(value.trim()))?;
        }
        Ok(request_headers)
    }
}

impl Default for HeaderDecoder {
    fn default() -> Self {
        Self::new(30, 4 * 1024, Some(8 * 1024))
    }
}

impl HeadReader for HeaderDecoder {
    fn read_head(&self, reader: &mut dyn BufRead) -> Result<Option<RequestHead>, ParseError> {
        if reader.fill_buf()?.is_empty() {
            return Ok(None);
        }

        let (method, target, version) = self.read_request_line(reader)?;
        trace!(%method, %target, %version, "read request line");
        ensure!(version == "HTTP/1.1", ParseError::HttpVersionNotSupported { version });

        let headers = self.read_headers(reader)?;
        RequestHead::new(method, target, version, headers).map(Some)
    }
}

/// Reads up to `delimiter`, which is consumed but not returned.
///
/// Returns `Ok(None)` when more than `max` bytes come before the delimiter.
fn read_until(reader: &mut dyn BufRead, delimiter: u8, max: usize) -> Result<Option<Vec<u8>>, ParseError> {
    let limit = i64::try_from(max.saturating_add(1)).unwrap_or(i64::MAX);
    let mut limited = Limiter::new(reader, limit)?;

    let mut part = Vec::new();
    loop {
        let mut byte = [0u8; 1];
        match limited.read(&mut byte) {
            Ok(_) if byte[0] == delimiter => return Ok(Some(part)),
            Ok(_) => part.push(byte[0]),
            Err(e) if matches!(StreamError::from_io(&e), Some(StreamError::Limit { .. })) => return Ok(None),
            Err(e) => return Err(e.into()),
        }
    }
}

/// Appends one line to `line`, its line feed included.
fn read_line<R: Read>(reader: &mut R, line: &mut Vec<u8>) -> Result<(), ParseError> {
    loop {
        let mut byte = [0u8; 1];
        reader.read_exact(&mut byte)?;
        line.push(byte[0]);
        if byte[0] == b'\n' {
            return Ok(());
        }
    }
}
