/// Returns early with the given error when the predicate does not hold.
///
/// ```ignore
/// ensure!(!name.trim().is_empty(), HeaderError::InvalidName);
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;

/// Rejects raw values that would break the header framing on the wire.
pub(crate) fn check_raw(raw: &str) -> Result<(), crate::HeaderError> {
    ensure!(!raw.contains("\r\n"), crate::HeaderError::NewLine);
    Ok(())
}

/// Trims a header name and lowercases it, giving the key used for lookups.
pub(crate) fn header_key(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}
