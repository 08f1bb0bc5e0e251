//! Core HTTP protocol types.
//!
//! # Architecture
//!
//! - **Request Processing** (`request`):
//!   - [`RequestHead`]: the request line and the headers of a request
//!   - [`Request`]: a request being handled, with its body and its response
//!
//! - **Response Processing** (`response`, `content`):
//!   - [`Response`]: status, headers and content of a response
//!   - [`ResponseContent`]: the bodies a response can carry, [`FileContent`] for files
//!   - [`DefaultResponseHeaders`]: headers set on every response, see [`StandardHeaders`]
//!
//! - **Error Handling** (`error`):
//!   - [`HttpError`]: Top-level error type
//!   - [`ParseError`]: Request parsing errors
//!   - [`SendError`]: Response sending errors
//!   - [`StreamError`]: Body stream errors

mod content;
mod error;
mod request;
mod response;

pub use content::FileContent;
pub use content::ResponseContent;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
pub use error::StreamError;
pub use request::Request;
pub use request::RequestHead;
pub use response::DefaultResponseHeaders;
pub use response::Response;
pub use response::StandardHeaders;
