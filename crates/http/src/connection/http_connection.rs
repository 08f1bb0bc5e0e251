use std::fmt;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use http::{Method, StatusCode};
use tracing::{debug, error, info, warn};

use crate::connection::{ConnectionSettings, MessageWriter, ReadTimeout};
use crate::handler::Handler;
use crate::protocol::{HttpError, ParseError, Request, Response};

/// An HTTP connection serving the requests of one client
///
/// `HttpConnection` handles the full lifecycle of a connection:
/// - Waiting for the next request, at most the keep-alive timeout
/// - Reading the request head and decoding its body framing
/// - Calling the handler, and answering for it when it did not respond
/// - Rejecting malformed requests with a client error
///
/// # Type Parameters
///
/// * `R`: The blocking readable stream type
/// * `W`: The blocking writable stream type
pub struct HttpConnection<R, W: Write> {
    reader: BufReader<R>,
    writer: BufWriter<W>,
    settings: Arc<ConnectionSettings>,
}

impl<R, W> HttpConnection<R, W>
where
    R: Read + ReadTimeout,
    W: Write,
{
    pub fn new(reader: R, writer: W, settings: Arc<ConnectionSettings>) -> Self {
        Self { reader: BufReader::new(reader), writer: BufWriter::new(writer), settings }
    }

    /// Serves requests until the client closes the connection, one side asks to close it,
    /// the keep-alive timeout expires or `stopping` is set.
    pub fn process<H>(mut self, handler: &H, stopping: &AtomicBool) -> Result<(), HttpError>
    where
        H: Handler + ?Sized,
    {
        loop {
            self.reader.get_ref().set_timeout(self.settings.keep_alive_timeout).map_err(ParseError::io)?;
            match self.reader.fill_buf() {
                Ok([]) => {
                    debug!("connection closed by the client");
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) if is_timeout(&e) => {
                    debug!("keep-alive timeout reached, closing the connection");
                    return Ok(());
                }
                Err(e) => return Err(ParseError::io(e).into()),
            }

            self.reader.get_ref().set_timeout(self.settings.read_timeout).map_err(ParseError::io)?;
            if !self.exchange(handler)? || stopping.load(Ordering::Acquire) {
                return Ok(());
            }
        }
    }

    /// Serves one request, returns whether the connection stays open.
    fn exchange<H>(&mut self, handler: &H) -> Result<bool, HttpError>
    where
        H: Handler + ?Sized,
    {
        let Self { reader, writer, settings } = self;

        let head = match settings.head_reader.read_head(reader) {
            Ok(Some(head)) => head,
            Ok(None) => return Ok(false),
            Err(e) => return reject(writer, settings, &e),
        };

        let started = Instant::now();
        info!(method = %head.method(), target = head.target(), "request started");
        let keep_alive = head.is_keep_alive();
        let is_head = head.method() == Method::HEAD;

        let body = match settings.body_decoding.decode(head.headers(), Box::new(&mut *reader)) {
            Ok(body) => body,
            Err(e) => return reject(writer, settings, &e),
        };

        let message_writer = MessageWriter::new(writer, settings.default_headers.as_ref(), is_head);
        let mut request = Request::new(head, body, message_writer, settings.max_input_stream_cleaning);

        let result = handler.call(&mut request);
        if !request.is_response_sent() {
            let response = match &result {
                Ok(()) => Response::text(StatusCode::NOT_FOUND, "404, Not Found :("),
                Err(e) => Response::text(StatusCode::INTERNAL_SERVER_ERROR, format!("Oops: {e}")),
            };
            request.send_response(response)?;
        }
        if let Err(e) = &result {
            error!(cause = %e, "handler failed");
        }

        let outcome = request.finish();
        info!(
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            status = outcome.status.map(|status| status.as_u16()),
            "request finished"
        );
        Ok(keep_alive && !outcome.close)
    }
}

impl<R, W: Write> fmt::Debug for HttpConnection<R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpConnection").field("settings", &self.settings).finish_non_exhaustive()
    }
}

/// Answers a request that could not be read with a client error, then closes. Requests
/// cut short by the client or by a timeout are not answered.
fn reject<W: Write>(writer: &mut W, settings: &ConnectionSettings, e: &ParseError) -> Result<bool, HttpError> {
    let Some(status) = e.status_code() else {
        match e {
            ParseError::Io { source } if is_timeout(source) => warn!("read timeout, closing the connection"),
            _ => debug!(cause = %e, "request cut short, closing the connection"),
        }
        return Ok(false);
    };

    info!(cause = %e, status = status.as_u16(), "request rejected");
    let response = Response::text(status, e.to_string());
    response.headers().connection().set_close(true);

    let mut message_writer = MessageWriter::new(writer, settings.default_headers.as_ref(), false);
    message_writer.send(response)?;
    Ok(false)
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}
