use std::io::Write;

use bytes::BytesMut;
use http::StatusCode;
use tracing::debug;

use crate::codec::header::HeaderEncoder;
use crate::protocol::{DefaultResponseHeaders, Response, ResponseContent, SendError};
use crate::utils::ensure;

/// What the connection needs to know once a request has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ExchangeOutcome {
    /// The status of the response, `None` if nothing was sent.
    pub status: Option<StatusCode>,
    /// The connection must be closed after this exchange.
    pub close: bool,
}

/// Writes the single response of a request.
pub(crate) struct MessageWriter<'a> {
    writer: &'a mut dyn Write,
    default_headers: &'a dyn DefaultResponseHeaders,
    is_head: bool,
    status: Option<StatusCode>,
    close: bool,
}

impl<'a> MessageWriter<'a> {
    pub(crate) fn new(writer: &'a mut dyn Write, default_headers: &'a dyn DefaultResponseHeaders, is_head: bool) -> Self {
        Self { writer, default_headers, is_head, status: None, close: false }
    }

    pub(crate) fn is_sent(&self) -> bool {
        self.status.is_some()
    }

    pub(crate) fn set_close(&mut self) {
        self.close = true;
    }

    pub(crate) fn outcome(&self) -> ExchangeOutcome {
        ExchangeOutcome { status: self.status, close: self.close }
    }

    /// Encodes the head of the response and writes it followed by the content. The
    /// content of a response to a `HEAD` request is never written.
    pub(crate) fn send(&mut self, response: Response) -> Result<(), SendError> {
        ensure!(!self.is_sent(), SendError::AlreadySent);

        let (status, headers, content) = response.into_parts();
        content.apply_headers(&headers)?;
        self.default_headers.apply(&headers)?;
        if headers.connection().close() {
            self.close = true;
        }

        let mut head = BytesMut::new();
        HeaderEncoder.encode(status, &headers, &mut head)?;
        self.status = Some(status);

        let result = self.write(&head, content);
        if let Err(e) = &result {
            debug!(cause = %e, "failed to write the response, the connection will be closed");
            self.close = true;
        }
        result
    }

    fn write(&mut self, head: &[u8], content: ResponseContent) -> Result<(), SendError> {
        self.writer.write_all(head)?;
        if !self.is_head {
            content.write_to(&mut *self.writer)?;
        }
        Ok(self.writer.flush()?)
    }
}

#[cfg(test)]
mod tests {
    use verbatim_header::ResponseHeaders;

    use super::*;

    struct NoDefaults;

    impl DefaultResponseHeaders for NoDefaults {
        fn apply(&self, _headers: &ResponseHeaders) -> Result<(), verbatim_header::HeaderError> {
            Ok(())
        }
    }

    fn send(response: Response, is_head: bool) -> (String, ExchangeOutcome) {
        let mut out = Vec::new();
        let mut writer = MessageWriter::new(&mut out, &NoDefaults, is_head);
        writer.send(response).unwrap();
        let outcome = writer.outcome();
        (String::from_utf8(out).unwrap(), outcome)
    }

    #[test]
    fn test_send_text() {
        let (out, outcome) = send(Response::text(StatusCode::OK, "hello"), false);
        let expected = concat!(
            "HTTP/1.1 200 OK\r\n",
            "Content-Length: 5\r\n",
            "Content-Type: text/plain;charset=utf-8\r\n",
            "\r\n",
            "hello"
        );
        assert_eq!(out, expected);
        assert_eq!(outcome, ExchangeOutcome { status: Some(StatusCode::OK), close: false });
    }

    #[test]
    fn test_head_request_has_no_content() {
        let (out, _) = send(Response::text(StatusCode::OK, "hello"), true);
        assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(out.contains("Content-Length: 5\r\n"));
        assert!(out.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_connection_close() {
        let response = Response::new(StatusCode::NO_CONTENT);
        response.headers().connection().set_close(true);
        let (_, outcome) = send(response, false);
        assert!(outcome.close);
    }

    #[test]
    fn test_send_twice() {
        let mut out = Vec::new();
        let mut writer = MessageWriter::new(&mut out, &NoDefaults, false);
        writer.send(Response::new(StatusCode::OK)).unwrap();
        assert!(writer.is_sent());

        let e = writer.send(Response::with_content(StatusCode::OK, ResponseContent::Empty)).unwrap_err();
        assert!(matches!(e, SendError::AlreadySent));
    }
}
