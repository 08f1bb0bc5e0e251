//! HTTP head processing: reading request heads and writing response heads.
//!
//! # Components
//!
//! - [`HeadReader`]: reads the request line and the header block of a request,
//!   [`HeaderDecoder`] being the standard implementation
//!   - Enforces the method, request target and header block size limits
//!   - Validates the managed headers while filling [`RequestHeaders`](verbatim_header::RequestHeaders)
//!
//! - [`HeaderEncoder`]: writes the status line and the headers of a response

mod header_decoder;
mod header_encoder;

pub use header_decoder::HeadReader;
pub use header_decoder::HeaderDecoder;
pub use header_encoder::HeaderEncoder;
