//! The header model.
//!
//! A [`Header`] is a closed set of variants: one per managed header with structured
//! fields, plus [`Unmanaged`] for any other name. Whatever the variant, the raw value
//! is the authority: the exact text last set is returned unchanged until a structured
//! field is modified, after which the raw value is rebuilt from the fields on the next read.

use std::fmt;

use once_cell::unsync::OnceCell;

use crate::managed::{Connection, ContentLength, ContentRange, ContentType, Date, Range, TransferEncoding};
use crate::tokenizer::{self, Tokens};
use crate::utils::check_raw;
use crate::HeaderError;

/// A header with a structured model, registered once per header collection.
pub trait ManagedHeader: fmt::Debug + Default + Send {
    /// Canonical name, used for display.
    const NAME: &'static str;
    /// Lowercased name, used as collection key.
    const KEY: &'static str;

    fn raw(&self) -> Option<&str>;

    /// Replaces the raw value and re-derives every structured field from it.
    ///
    /// Nothing changes when an error is returned.
    fn set_raw(&mut self, raw: Option<&str>) -> Result<(), HeaderError>;

    fn from_header(header: &Header) -> Option<&Self>;

    fn from_header_mut(header: &mut Header) -> Option<&mut Self>;

    fn into_header(self) -> Header;
}

/// Memoized raw value of a managed header.
///
/// An empty cell means the structured fields changed since the raw value was last built.
#[derive(Debug, Clone)]
pub(crate) struct RawCache(OnceCell<Option<String>>);

impl Default for RawCache {
    fn default() -> Self {
        Self::with_value(None)
    }
}

impl RawCache {
    pub(crate) fn with_value(raw: Option<&str>) -> Self {
        Self(OnceCell::with_value(raw.map(str::to_string)))
    }

    pub(crate) fn invalidate(&mut self) {
        self.0.take();
    }

    pub(crate) fn get_or_serialize(&self, serialize: impl FnOnce() -> Option<String>) -> Option<&str> {
        self.0.get_or_init(serialize).as_deref()
    }
}

/// A header without structured model, its value is kept as is.
#[derive(Debug, Clone)]
pub struct Unmanaged {
    name: String,
    raw: Option<String>,
}

impl Unmanaged {
    pub fn new(name: &str, raw: &str) -> Result<Self, HeaderError> {
        check_raw(raw)?;
        Ok(Self { name: name.trim().to_string(), raw: Some(raw.to_string()) })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        name.trim().clone_into(&mut self.name);
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn set_raw(&mut self, raw: Option<&str>) -> Result<(), HeaderError> {
        if let Some(raw) = raw {
            check_raw(raw)?;
        }
        self.raw = raw.map(str::to_string);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum Header {
    Connection(Connection),
    TransferEncoding(TransferEncoding),
    ContentLength(ContentLength),
    ContentType(ContentType),
    Date(Date),
    Range(Range),
    ContentRange(ContentRange),
    Unmanaged(Unmanaged),
}

/// Dispatches an expression over every managed variant.
macro_rules! each_managed {
    ($header:expr, $managed:ident => $managed_expr:expr, $unmanaged:ident => $unmanaged_expr:expr) => {
        match $header {
            Header::Connection($managed) => $managed_expr,
            Header::TransferEncoding($managed) => $managed_expr,
            Header::ContentLength($managed) => $managed_expr,
            Header::ContentType($managed) => $managed_expr,
            Header::Date($managed) => $managed_expr,
            Header::Range($managed) => $managed_expr,
            Header::ContentRange($managed) => $managed_expr,
            Header::Unmanaged($unmanaged) => $unmanaged_expr,
        }
    };
}

impl Header {
    pub fn unmanaged(name: &str, raw: &str) -> Result<Self, HeaderError> {
        Unmanaged::new(name, raw).map(Header::Unmanaged)
    }

    pub fn name(&self) -> &str {
        fn name_of<T: ManagedHeader>(_: &T) -> &'static str {
            T::NAME
        }
        each_managed!(self, h => name_of(h), u => u.name())
    }

    pub fn raw(&self) -> Option<&str> {
        each_managed!(self, h => h.raw(), u => u.raw())
    }

    pub fn set_raw(&mut self, raw: Option<&str>) -> Result<(), HeaderError> {
        each_managed!(self, h => h.set_raw(raw), u => u.set_raw(raw))
    }

    pub fn is_managed(&self) -> bool {
        !matches!(self, Header::Unmanaged(_))
    }

    /// Tokenizes the current raw value, `None` if the header has no value.
    pub fn parse_values(&self, delimiter: char) -> Option<Tokens<'_>> {
        self.raw().map(|raw| tokenizer::parse(raw, delimiter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmanaged_round_trip() {
        for raw in ["", " ", " a , \"b\" ", "\r", "\n", "\n\r", "«»", "tab\tinside"] {
            let mut header = Header::unmanaged("X-Test", "init").unwrap();
            header.set_raw(Some(raw)).unwrap();
            assert_eq!(header.raw(), Some(raw));
        }
    }

    #[test]
    fn test_reject_new_line() {
        let mut header = Header::unmanaged("X-Test", "init").unwrap();
        let err = header.set_raw(Some("a\r\nb")).unwrap_err();
        assert_eq!(err, HeaderError::NewLine);
        assert_eq!(err.to_string(), "New line sequence «\\r\\n» is not allowed in a header value.");
        assert_eq!(header.raw(), Some("init"));

        assert!(Header::unmanaged("X-Test", "\r\n").is_err());
    }

    #[test]
    fn test_name() {
        let header = Header::unmanaged(" X-Custom ", "v").unwrap();
        assert_eq!(header.name(), "X-Custom");
        assert!(!header.is_managed());

        let header = Connection::default().into_header();
        assert_eq!(header.name(), "Connection");
        assert!(header.is_managed());
    }

    #[test]
    fn test_managed_reject_new_line() {
        let mut header = ContentType::default().into_header();
        header.set_raw(Some("text/plain")).unwrap();
        assert!(header.set_raw(Some("text/html\r\n")).is_err());
        assert_eq!(header.raw(), Some("text/plain"));
    }

    #[test]
    fn test_parse_values() {
        let header = Header::unmanaged("Accept", "a, b").unwrap();
        let values: Vec<_> = header.parse_values(',').unwrap().map(|v| v.unwrap().raw).collect();
        assert_eq!(values, vec!["a", " b"]);

        assert!(Date::default().into_header().parse_values(',').is_none());
    }
}
