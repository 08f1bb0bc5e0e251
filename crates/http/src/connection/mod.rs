//! HTTP connection handling module
//!
//! This module serves the requests of one client connection, one after the other, on a
//! blocking byte stream.
//!
//! # Components
//!
//! - [`HttpConnection`]: the connection loop, which:
//!   - waits for the next request with the keep-alive timeout
//!   - reads the request head and decodes the body framing
//!   - calls the handler and answers for it when it did not respond
//!   - keeps the connection open while both sides agree
//! - [`ConnectionSettings`]: the collaborators and limits shared by all the connections of
//!   a server
//! - [`ReadTimeout`]: the byte sources whose read timeout can be changed

mod http_connection;
mod message_writer;

use std::fmt;
use std::io::{self, Cursor};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

pub use http_connection::HttpConnection;
pub(crate) use message_writer::{ExchangeOutcome, MessageWriter};

use crate::codec::body::{BodyDecodingStrategy, PayloadDecoder};
use crate::codec::header::{HeadReader, HeaderDecoder};
use crate::config::ServerConfig;
use crate::protocol::{DefaultResponseHeaders, StandardHeaders};

/// What a connection is built with.
#[derive(Clone)]
pub struct ConnectionSettings {
    pub head_reader: Arc<dyn HeadReader>,
    pub body_decoding: Arc<dyn BodyDecodingStrategy>,
    pub default_headers: Arc<dyn DefaultResponseHeaders>,
    /// Read timeout once a request started.
    pub read_timeout: Duration,
    /// Read timeout while waiting for the next request.
    pub keep_alive_timeout: Duration,
    /// How many unread body bytes are discarded before a response is sent, `None` for no
    /// limit. The connection is closed when the body is longer.
    pub max_input_stream_cleaning: Option<u64>,
}

impl ConnectionSettings {
    /// The default collaborators, set up with the limits of `config`.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            head_reader: Arc::new(HeaderDecoder::new(
                config.max_method_name_size,
                config.max_request_uri_size,
                config.max_headers_size,
            )),
            body_decoding: Arc::new(PayloadDecoder),
            default_headers: Arc::new(StandardHeaders::new(config.server_name.as_str())),
            read_timeout: config.read_timeout,
            keep_alive_timeout: config.keep_alive_timeout,
            max_input_stream_cleaning: config.max_input_stream_cleaning,
        }
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("read_timeout", &self.read_timeout)
            .field("keep_alive_timeout", &self.keep_alive_timeout)
            .field("max_input_stream_cleaning", &self.max_input_stream_cleaning)
            .finish_non_exhaustive()
    }
}

/// A byte source with an adjustable read timeout.
///
/// A zero duration removes the timeout.
pub trait ReadTimeout {
    fn set_timeout(&self, timeout: Duration) -> io::Result<()>;
}

impl ReadTimeout for TcpStream {
    fn set_timeout(&self, timeout: Duration) -> io::Result<()> {
        self.set_read_timeout(Some(timeout).filter(|timeout| !timeout.is_zero()))
    }
}

// in memory sources never block

impl ReadTimeout for &[u8] {
    fn set_timeout(&self, _timeout: Duration) -> io::Result<()> {
        Ok(())
    }
}

impl<T> ReadTimeout for Cursor<T> {
    fn set_timeout(&self, _timeout: Duration) -> io::Result<()> {
        Ok(())
    }
}
