//! Headers with a structured model.
//!
//! Each type here keeps the raw value it was given and derives typed fields from it.
//! Setting the raw value re-parses everything, touching a typed field marks the raw
//! value stale so the next read rebuilds it.

mod connection;
pub use connection::Connection;

mod transfer_encoding;
pub use transfer_encoding::TransferEncoding;

mod content_length;
pub use content_length::ContentLength;

mod content_type;
pub use content_type::ContentType;

mod date;
pub use date::Date;
pub use date::HttpDate;

mod range;
pub use range::ByteRange;
pub use range::Range;

mod content_range;
pub use content_range::ContentRange;

/// Implements the [`ManagedHeader`](crate::ManagedHeader) plumbing that maps a type to
/// its [`Header`](crate::Header) variant.
macro_rules! managed_header {
    ($ty:ident, $name:literal, $key:literal) => {
        impl $crate::ManagedHeader for $ty {
            const NAME: &'static str = $name;
            const KEY: &'static str = $key;

            fn raw(&self) -> Option<&str> {
                $ty::raw(self)
            }

            fn set_raw(&mut self, raw: Option<&str>) -> Result<(), $crate::HeaderError> {
                $ty::set_raw(self, raw)
            }

            fn from_header(header: &$crate::Header) -> Option<&Self> {
                match header {
                    $crate::Header::$ty(h) => Some(h),
                    _ => None,
                }
            }

            fn from_header_mut(header: &mut $crate::Header) -> Option<&mut Self> {
                match header {
                    $crate::Header::$ty(h) => Some(h),
                    _ => None,
                }
            }

            fn into_header(self) -> $crate::Header {
                $crate::Header::$ty(self)
            }
        }
    };
}

pub(crate) use managed_header;

/// Parses a signed integer field, surrounding whitespace allowed.
pub(crate) fn parse_i64(s: &str) -> Option<i64> {
    s.trim().parse().ok()
}
