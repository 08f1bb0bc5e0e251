use std::io;

use http::StatusCode;
use thiserror::Error;
use verbatim_header::HeaderError;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("{reason}")]
    InvalidHeader { reason: String },

    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error("{reason}")]
    Format { reason: String },

    #[error("invalid http method")]
    InvalidMethod,

    #[error("invalid http uri: {reason}")]
    InvalidUri { reason: String },

    #[error("Host header is required to resolve the request uri.")]
    MissingHost,

    #[error("Request uri is longer than «{max_size}» chars.")]
    RequestUriTooLong { max_size: usize },

    #[error("Http version «{version}» is not supported.")]
    HttpVersionNotSupported { version: String },

    #[error("Transfer encoding «{encoding}» is not supported.")]
    UnsupportedTransferEncoding { encoding: String },

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error("io error: {source}")]
    Io {
        #[source]
        source: io::Error,
    },
}

impl ParseError {
    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn format<S: ToString>(str: S) -> Self {
        Self::Format { reason: str.to_string() }
    }

    pub fn invalid_uri<S: ToString>(str: S) -> Self {
        Self::InvalidUri { reason: str.to_string() }
    }

    pub fn unsupported_transfer_encoding<S: ToString>(encoding: S) -> Self {
        Self::UnsupportedTransferEncoding { encoding: encoding.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::from(e.into())
    }

    /// The status to answer with, `None` when the connection should just be dropped,
    /// e.g. the peer went away or was too slow.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::HttpVersionNotSupported { .. } => Some(StatusCode::HTTP_VERSION_NOT_SUPPORTED),
            Self::RequestUriTooLong { .. } => Some(StatusCode::URI_TOO_LONG),
            Self::Stream(StreamError::End) | Self::Io { .. } => None,
            _ => Some(StatusCode::BAD_REQUEST),
        }
    }
}

/// Unwraps the [`StreamError`] carried by an io error, so that limit and format
/// violations detected by the body decoders keep their meaning.
impl From<io::Error> for ParseError {
    fn from(e: io::Error) -> Self {
        if e.get_ref().is_some_and(|inner| inner.is::<StreamError>()) {
            if let Some(stream_error) = e.into_inner().and_then(|inner| inner.downcast::<StreamError>().ok()) {
                return Self::Stream(*stream_error);
            }
            unreachable!("the inner error was checked to be a stream error");
        }
        Self::Io { source: e }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("invalid range: {reason}")]
    InvalidRange { reason: String },

    #[error("a response was already sent for this request")]
    AlreadySent,

    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn invalid_range<S: ToString>(str: S) -> Self {
        Self::InvalidRange { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

/// Errors raised by the body stream decoders.
///
/// The decoders implement [`std::io::Read`], so these travel inside an [`io::Error`];
/// use [`StreamError::from_io`] to get them back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("Maximum number of readable byte(s) reached (limit={limit}).")]
    Limit { limit: u64 },

    #[error("Stream ended before the expected number of byte(s) was read.")]
    End,

    #[error("{reason}")]
    Format { reason: String },

    #[error("Stream limit can't be negative, got «{limit}».")]
    InvalidLimit { limit: i64 },
}

impl StreamError {
    pub fn limit(limit: u64) -> Self {
        Self::Limit { limit }
    }

    pub fn format<S: ToString>(str: S) -> Self {
        Self::Format { reason: str.to_string() }
    }

    /// The stream error carried by `e`, if any.
    pub fn from_io(e: &io::Error) -> Option<&StreamError> {
        e.get_ref()?.downcast_ref()
    }
}

impl From<StreamError> for io::Error {
    fn from(e: StreamError) -> Self {
        let kind = match e {
            StreamError::End => io::ErrorKind::UnexpectedEof,
            StreamError::Format { .. } => io::ErrorKind::InvalidData,
            StreamError::Limit { .. } | StreamError::InvalidLimit { .. } => io::ErrorKind::InvalidInput,
        };
        io::Error::new(kind, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_error_round_trip() {
        let e = io::Error::from(StreamError::limit(10));
        assert_eq!(StreamError::from_io(&e), Some(&StreamError::limit(10)));
        assert_eq!(e.to_string(), "Maximum number of readable byte(s) reached (limit=10).");

        match ParseError::from(e) {
            ParseError::Stream(StreamError::Limit { limit }) => assert_eq!(limit, 10),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_plain_io_error() {
        let e = ParseError::from(io::Error::from(io::ErrorKind::TimedOut));
        assert!(matches!(e, ParseError::Io { .. }));
        assert_eq!(e.status_code(), None);
    }

    #[test]
    fn test_status_code() {
        assert_eq!(ParseError::format("bad").status_code(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(ParseError::from(StreamError::limit(1)).status_code(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(ParseError::from(StreamError::End).status_code(), None);
        assert_eq!(
            ParseError::HttpVersionNotSupported { version: "HTTP/2.0".into() }.status_code(),
            Some(StatusCode::HTTP_VERSION_NOT_SUPPORTED)
        );
        assert_eq!(ParseError::RequestUriTooLong { max_size: 1 }.status_code(), Some(StatusCode::URI_TOO_LONG));
    }
}
