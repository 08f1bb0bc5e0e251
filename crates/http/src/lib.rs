//! A blocking HTTP/1.1 server that keeps header values exactly as they were sent
//!
//! Request headers are held by [`verbatim_header`] collections: a value set by the client
//! is read back, and echoed back, byte for byte, while the headers the server relies on
//! (`Connection`, `Transfer-Encoding`, `Content-Length`, ...) are also available as typed
//! values.
//!
//! # Features
//!
//! - HTTP/1.1 request head parsing with size limits
//! - Request bodies framed by `Content-Length` or `Transfer-Encoding`, with `chunked`,
//!   `gzip` and `deflate` codings
//! - Text, bytes, file (with byte ranges) and streamed responses
//! - Keep-alive connections with separate idle and read timeouts
//! - One blocking worker per connection, accepted by a tokio listener
//!
//! # Example
//!
//! ```no_run
//! use http::StatusCode;
//! use verbatim_http::handler::{HandlerError, make_handler};
//! use verbatim_http::protocol::{Request, Response};
//! use verbatim_http::server::Server;
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = Server::builder()
//!         .address("127.0.0.1:8080")
//!         .handler(make_handler(hello_world))
//!         .build()
//!         .expect("handler is set");
//!
//!     if let Err(e) = server.start().await {
//!         eprintln!("server error: {e}");
//!     }
//! }
//!
//! fn hello_world(request: &mut Request<'_>) -> Result<(), HandlerError> {
//!     let text = format!("Hello {}!", request.uri().path());
//!     request.send_response(Response::text(StatusCode::OK, text))?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`server`]: the listener, its [`config::ServerConfig`] and the way to stop it
//! - [`connection`]: the request loop of one connection
//! - [`protocol`]: requests, responses and errors
//! - [`codec`]: request head and body decoding, response head encoding
//! - [`handler`]: the request handler trait
//!
//! # Error Handling
//!
//! - [`protocol::HttpError`]: Top-level error type
//! - [`protocol::ParseError`]: Request parsing errors, mapped to a client error status
//! - [`protocol::SendError`]: Response sending errors
//! - [`protocol::StreamError`]: Body stream errors, carried by `std::io::Error`
//!
//! # Limitations
//!
//! - HTTP/1.1 only, other versions are answered with `505`
//! - No TLS support (use a reverse proxy for HTTPS)
//! - Maximum number of headers: 64

pub mod codec;
pub mod config;
pub mod connection;
pub mod handler;
pub mod protocol;
pub mod server;

mod utils;
