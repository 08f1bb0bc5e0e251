use crate::managed::{managed_header, parse_i64};
use crate::ManagedHeader;
use crate::utils::{check_raw, ensure};
use crate::HeaderError;

/// The `Content-Length` header.
///
/// The raw value may carry surrounding whitespace, which is kept as is. Setting the
/// length itself always rewrites the raw value in its canonical form.
#[derive(Debug, Clone, Default)]
pub struct ContentLength {
    raw: Option<String>,
    value: Option<u64>,
}

impl ContentLength {
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn set_raw(&mut self, raw: Option<&str>) -> Result<(), HeaderError> {
        self.value = match raw {
            Some(raw) => Some(parse(raw)?),
            None => None,
        };
        self.raw = raw.map(str::to_string);
        Ok(())
    }

    pub fn value(&self) -> Option<u64> {
        self.value
    }

    pub fn set_value(&mut self, value: Option<u64>) {
        self.value = value;
        self.raw = value.map(|value| value.to_string());
    }
}

fn parse(raw: &str) -> Result<u64, HeaderError> {
    check_raw(raw)?;
    let name = ContentLength::NAME;

    let Some(value) = parse_i64(raw) else {
        return Err(HeaderError::format(format!("{name} header value «{raw}» is not a valid positive number.")));
    };
    ensure!(value >= 0, HeaderError::format(format!("{name} header value «{raw}» is not allowed to be negative.")));

    Ok(value.unsigned_abs())
}

managed_header!(ContentLength, "Content-Length", "content-length");
