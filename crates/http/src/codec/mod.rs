//! HTTP codec module for reading requests and writing responses
//!
//! Everything here works over blocking [`std::io::Read`] and [`std::io::Write`], one
//! connection being served by one worker.
//!
//! # Architecture
//!
//! - Request handling:
//!   - Head reading via the [`header`] module
//!   - Body decoding via the [`body`] module
//!
//! - Response handling:
//!   - Head encoding via the [`header`] module
//!   - Chunked body encoding via the [`body`] module
//!
//! # Example
//!
//! ```
//! use std::io::Read;
//! use verbatim_http::codec::body::{BodyDecodingStrategy, PayloadDecoder};
//! use verbatim_http::codec::header::{HeadReader, HeaderDecoder};
//!
//! let mut input = &b"POST /echo HTTP/1.1\r\nHost: localhost\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\n"[..];
//!
//! let head = HeaderDecoder::default().read_head(&mut input).unwrap().unwrap();
//! let mut body = PayloadDecoder.decode(head.headers(), Box::new(&mut input)).unwrap();
//!
//! let mut text = String::new();
//! body.read_to_string(&mut text).unwrap();
//! assert_eq!(text, "hello");
//! ```

pub mod body;
pub mod header;
