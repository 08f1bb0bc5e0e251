use crate::header::RawCache;
use crate::managed::managed_header;
use crate::tokenizer;
use crate::utils::check_raw;
use crate::HeaderError;

/// The `Transfer-Encoding` header, an ordered list of codings.
///
/// Once the list is modified the raw value becomes the entries joined with `,`;
/// an emptied list gives an empty raw value rather than none.
#[derive(Debug, Clone, Default)]
pub struct TransferEncoding {
    raw: RawCache,
    values: Vec<String>,
}

impl TransferEncoding {
    pub fn raw(&self) -> Option<&str> {
        self.raw.get_or_serialize(|| Some(self.values.join(",")))
    }

    pub fn set_raw(&mut self, raw: Option<&str>) -> Result<(), HeaderError> {
        let values = match raw {
            Some(raw) => {
                check_raw(raw)?;
                tokenizer::parse_interpreted(raw, ',').collect::<Result<Vec<_>, _>>()?
            }
            None => Vec::new(),
        };

        self.values = values;
        self.raw = RawCache::with_value(raw);
        Ok(())
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Tells if `coding` is listed, ignoring case and surrounding whitespace.
    pub fn contains(&self, coding: &str) -> bool {
        self.values.iter().any(|value| value.trim().eq_ignore_ascii_case(coding))
    }

    pub fn push<S: Into<String>>(&mut self, value: S) {
        self.values.push(value.into());
        self.raw.invalidate();
    }

    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert<S: Into<String>>(&mut self, index: usize, value: S) {
        self.values.insert(index, value.into());
        self.raw.invalidate();
    }

    pub fn remove(&mut self, index: usize) -> Option<String> {
        if index >= self.values.len() {
            return None;
        }
        self.raw.invalidate();
        Some(self.values.remove(index))
    }

    /// Replaces the entry at `index`, returning the previous one.
    pub fn set<S: Into<String>>(&mut self, index: usize, value: S) -> Option<String> {
        let slot = self.values.get_mut(index)?;
        let previous = std::mem::replace(slot, value.into());
        self.raw.invalidate();
        Some(previous)
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.raw.invalidate();
    }
}

managed_header!(TransferEncoding, "Transfer-Encoding", "transfer-encoding");
