//! HTTP header values that never lose their raw text.
//!
//! This crate models HTTP/1.1 header values with two faces: the exact raw string as it
//! was received or set, and a structured view derived from it. The raw string stays
//! authoritative until a structured field is changed, then it is rebuilt from the fields
//! the next time it is read. A header that is read and written back without changes is
//! therefore sent byte for byte as it arrived.
//!
//! # Example
//!
//! ```
//! use verbatim_header::RequestHeaders;
//!
//! let headers = RequestHeaders::new();
//! headers.set("connection", Some(" Upgrade , keep-alive")).unwrap();
//! assert!(headers.connection().keep_alive());
//!
//! headers.connection().set_close(true);
//! assert_eq!(headers.get("Connection").as_deref(), Some("close, Upgrade , keep-alive"));
//! ```
//!
//! # Architecture
//!
//! - [`tokenizer`]: splits a raw value on a delimiter, with quoted strings and escapes
//! - [`Header`]: one header, either managed (structured) or unmanaged (raw only)
//! - [`managed`]: the structured headers, `Connection`, `Content-Length`, `Content-Type`,
//!   `Content-Range`, `Date`, `Range` and `Transfer-Encoding`
//! - [`HttpHeaders`]: a thread safe, case-insensitive, ordered collection, with
//!   [`RequestHeaders`] and [`ResponseHeaders`] registering the managed headers of each side
//!
//! # Error Handling
//!
//! Malformed values that cannot be kept, like a `Content-Length` that is not a number
//! or a value with a line break, are rejected with a [`HeaderError`] and leave the header
//! unchanged. Values that are only unrecognized, like a `Date` in another format, are
//! kept and their structured view stays empty.

mod error;
pub use error::HeaderError;

mod header;
pub use header::Header;
pub use header::ManagedHeader;
pub use header::Unmanaged;

mod headers;
pub use headers::ChangeKind;
pub use headers::HeaderChange;
pub use headers::HttpHeaders;
pub use headers::Iter;
pub use headers::RequestHeaders;
pub use headers::ResponseHeaders;

pub mod managed;
pub mod tokenizer;

mod utils;
