use std::io::{self, Read};

use http::{Method, Uri};
use tracing::debug;
use verbatim_header::RequestHeaders;

use crate::codec::body::Limiter;
use crate::connection::{ExchangeOutcome, MessageWriter};
use crate::protocol::{ParseError, Response, SendError, StreamError};
use crate::utils::ensure;

/// The request line and the headers of a request.
#[derive(Debug)]
pub struct RequestHead {
    method: Method,
    target: String,
    uri: Uri,
    version: String,
    headers: RequestHeaders,
}

impl RequestHead {
    /// Resolves the absolute uri of the request: an origin-form target like `/index.html`
    /// is resolved against the `Host` header, which is then required.
    pub fn new(method: Method, target: String, version: String, headers: RequestHeaders) -> Result<Self, ParseError> {
        let uri = if target.starts_with('/') {
            let host = headers.host().ok_or(ParseError::MissingHost)?;
            format!("http://{}{target}", host.trim()).parse::<Uri>()
        } else {
            target.parse::<Uri>()
        };
        let uri = uri.map_err(ParseError::invalid_uri)?;

        Ok(Self { method, target, uri, version, headers })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request target exactly as it was sent.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn headers(&self) -> &RequestHeaders {
        &self.headers
    }

    /// Tells if the client asked to keep the connection open with `Connection: keep-alive`.
    pub fn is_keep_alive(&self) -> bool {
        self.headers.connection().keep_alive()
    }
}

/// A request being handled: its head, its body and the way to answer it.
///
/// Reading the request reads its body. At most one response can be sent.
pub struct Request<'a> {
    head: RequestHead,
    body: Box<dyn Read + 'a>,
    writer: MessageWriter<'a>,
    max_cleaning: Option<u64>,
}

impl<'a> Request<'a> {
    pub(crate) fn new(
        head: RequestHead,
        body: Box<dyn Read + 'a>,
        writer: MessageWriter<'a>,
        max_cleaning: Option<u64>,
    ) -> Self {
        Self { head, body, writer, max_cleaning }
    }

    pub fn head(&self) -> &RequestHead {
        &self.head
    }

    pub fn method(&self) -> &Method {
        self.head.method()
    }

    pub fn target(&self) -> &str {
        self.head.target()
    }

    pub fn uri(&self) -> &Uri {
        self.head.uri()
    }

    pub fn version(&self) -> &str {
        self.head.version()
    }

    pub fn headers(&self) -> &RequestHeaders {
        self.head.headers()
    }

    /// Reads the whole body as text, invalid UTF-8 sequences are replaced.
    ///
    /// The body must be framed by `Content-Length`.
    pub fn read_body_to_string(&mut self) -> Result<String, ParseError> {
        let Some(length) = self.headers().content_length().value() else {
            return Err(ParseError::format("Content-Length header is required to read the body as text."));
        };

        let mut body = Vec::with_capacity(usize::try_from(length).unwrap_or_default());
        self.body.read_to_end(&mut body)?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Sends the response of this request.
    ///
    /// The unread part of the body is discarded first. When more than the configured
    /// amount is left, the connection is closed after the response instead.
    pub fn send_response(&mut self, response: Response) -> Result<(), SendError> {
        ensure!(!self.writer.is_sent(), SendError::AlreadySent);

        if let Err(e) = self.drain_body() {
            debug!(cause = %e, "request body not drained, the connection will be closed");
            self.writer.set_close();
        }
        self.writer.send(response)
    }

    pub fn is_response_sent(&self) -> bool {
        self.writer.is_sent()
    }

    pub(crate) fn finish(self) -> ExchangeOutcome {
        self.writer.outcome()
    }

    fn drain_body(&mut self) -> io::Result<()> {
        let limit = self.max_cleaning.map_or(i64::MAX, |max| i64::try_from(max).unwrap_or(i64::MAX));
        let mut limited = Limiter::new(&mut self.body, limit)?;
        match io::copy(&mut limited, &mut io::sink()) {
            // the body reached its end before the limit
            Err(e) if StreamError::from_io(&e) == Some(&StreamError::End) => Ok(()),
            Err(e) => Err(e),
            Ok(_) => Ok(()),
        }
    }
}

impl Read for Request<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.body.read(buf)
    }
}

impl std::fmt::Debug for Request<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request").field("head", &self.head).field("sent", &self.is_response_sent()).finish()
    }
}
