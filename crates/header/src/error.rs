use thiserror::Error;

/// Errors raised while reading or writing header values.
///
/// The messages are part of the wire behavior: the connection layer sends them back
/// as the body of a `400 Bad Request`, so they are kept stable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("{reason}")]
    Format { reason: String },

    #[error("Header name can neither be null nor white space.")]
    InvalidName,

    #[error("New line sequence «\\r\\n» is not allowed in a header value.")]
    NewLine,
}

impl HeaderError {
    pub fn format<S: ToString>(str: S) -> Self {
        Self::Format { reason: str.to_string() }
    }

    pub(crate) fn missing_string_end(raw: &str) -> Self {
        Self::format(format!("Header value «{raw}» is missing a string end delimiter."))
    }
}
