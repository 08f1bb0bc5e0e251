use std::fmt;

use crate::header::RawCache;
use crate::managed::{managed_header, parse_i64};
use crate::utils::check_raw;
use crate::HeaderError;

/// A `start-end` byte range, either bound may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ByteRange {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl ByteRange {
    pub fn new(start: Option<i64>, end: Option<i64>) -> Self {
        Self { start, end }
    }

    /// Tells if the range is usable as defined by RFC 2616 §14.35.1: at least one bound,
    /// no negative bound, and `start <= end` when both are given.
    pub fn is_valid(&self) -> bool {
        match (self.start, self.end) {
            (None, None) => false,
            (Some(start), Some(end)) => start >= 0 && start <= end,
            (Some(bound), None) | (None, Some(bound)) => bound >= 0,
        }
    }

    /// Parses `start-end`, where each side is an integer or blank.
    pub(crate) fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split('-');
        let (Some(start), Some(end), None) = (parts.next(), parts.next(), parts.next()) else {
            return None;
        };
        let range = Self { start: parse_bound(start)?, end: parse_bound(end)? };
        (range.start.is_some() || range.end.is_some()).then_some(range)
    }
}

fn parse_bound(s: &str) -> Option<Option<i64>> {
    if s.trim().is_empty() { Some(None) } else { parse_i64(s).map(Some) }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(start) = self.start {
            write!(f, "{start}")?;
        }
        f.write_str("-")?;
        if let Some(end) = self.end {
            write!(f, "{end}")?;
        }
        Ok(())
    }
}

/// The `Range` request header: `unit=range,range,...`.
///
/// A raw value that does not follow that grammar is kept, the unit and ranges are
/// then empty.
#[derive(Debug, Clone, Default)]
pub struct Range {
    raw: RawCache,
    unit: Option<String>,
    ranges: Vec<ByteRange>,
}

impl Range {
    pub fn raw(&self) -> Option<&str> {
        self.raw.get_or_serialize(|| self.serialize())
    }

    pub fn set_raw(&mut self, raw: Option<&str>) -> Result<(), HeaderError> {
        if let Some(raw) = raw {
            check_raw(raw)?;
        }

        match raw.and_then(parse) {
            Some((unit, ranges)) => {
                self.unit = Some(unit);
                self.ranges = ranges;
            }
            None => {
                self.unit = None;
                self.ranges.clear();
            }
        }
        self.raw = RawCache::with_value(raw);
        Ok(())
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn set_unit(&mut self, unit: Option<&str>) {
        if self.unit() == unit {
            return;
        }
        self.unit = unit.map(str::to_string);
        self.raw.invalidate();
    }

    pub fn ranges(&self) -> &[ByteRange] {
        &self.ranges
    }

    pub fn push_range(&mut self, range: ByteRange) {
        self.ranges.push(range);
        self.raw.invalidate();
    }

    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert_range(&mut self, index: usize, range: ByteRange) {
        self.ranges.insert(index, range);
        self.raw.invalidate();
    }

    pub fn remove_range(&mut self, index: usize) -> Option<ByteRange> {
        if index >= self.ranges.len() {
            return None;
        }
        self.raw.invalidate();
        Some(self.ranges.remove(index))
    }

    /// Replaces the range at `index`, returning the previous one.
    pub fn set_range(&mut self, index: usize, range: ByteRange) -> Option<ByteRange> {
        self.update_range(index, |current| *current = range)
    }

    pub fn set_range_start(&mut self, index: usize, start: Option<i64>) -> Option<ByteRange> {
        self.update_range(index, |current| current.start = start)
    }

    pub fn set_range_end(&mut self, index: usize, end: Option<i64>) -> Option<ByteRange> {
        self.update_range(index, |current| current.end = end)
    }

    pub fn clear_ranges(&mut self) {
        self.ranges.clear();
        self.raw.invalidate();
    }

    fn update_range(&mut self, index: usize, update: impl FnOnce(&mut ByteRange)) -> Option<ByteRange> {
        let current = self.ranges.get_mut(index)?;
        let previous = *current;
        update(current);
        if *current != previous {
            self.raw.invalidate();
        }
        Some(previous)
    }

    /// Once a field changed, the value is always rebuilt, `=` when nothing is left.
    fn serialize(&self) -> Option<String> {
        let ranges: Vec<String> = self.ranges.iter().map(ByteRange::to_string).collect();
        Some(format!("{}={}", self.unit().unwrap_or_default(), ranges.join(",")))
    }
}

fn parse(raw: &str) -> Option<(String, Vec<ByteRange>)> {
    let mut parts = raw.split('=');
    let (Some(unit), Some(ranges), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };

    let unit = unit.trim();
    if unit.is_empty() {
        return None;
    }

    let ranges = ranges.split(',').map(ByteRange::parse).collect::<Option<Vec<_>>>()?;
    Some((unit.to_string(), ranges))
}

managed_header!(Range, "Range", "range");

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(raw: &str) -> Range {
        let mut header = Range::default();
        header.set_raw(Some(raw)).unwrap();
        header
    }

    #[test]
    fn test_parse() {
        let header = parsed(" bytes = 0-499, -500 ,9500- ");
        assert_eq!(header.unit(), Some("bytes"));
        assert_eq!(
            header.ranges(),
            [
                ByteRange::new(Some(0), Some(499)),
                ByteRange::new(None, Some(500)),
                ByteRange::new(Some(9500), None)
            ]
        );
        assert_eq!(header.raw(), Some(" bytes = 0-499, -500 ,9500- "));
    }

    #[test]
    fn test_parse_invalid() {
        for raw in ["bytes", "=0-1", "bytes=0-1=2", "bytes=-", "bytes=a-1", "bytes=0-1-2", "bytes=0-1,"] {
            let header = parsed(raw);
            assert_eq!(header.unit(), None, "{raw}");
            assert!(header.ranges().is_empty(), "{raw}");
            assert_eq!(header.raw(), Some(raw));
        }
    }

    #[test]
    fn test_modify_ranges() {
        let mut header = parsed("bytes=200-1000");
        header.set_unit(Some("bits"));
        assert_eq!(header.raw(), Some("bits=200-1000"));

        header.set_unit(Some("bytes"));
        header.set_range_end(0, None);
        assert_eq!(header.raw(), Some("bytes=200-"));

        header.push_range(ByteRange::new(None, Some(5)));
        assert_eq!(header.raw(), Some("bytes=200-,-5"));

        header.insert_range(0, ByteRange::new(Some(1), Some(2)));
        assert_eq!(header.set_range_start(5, Some(0)), None);
        assert_eq!(header.remove_range(1), Some(ByteRange::new(Some(200), None)));
        assert_eq!(header.raw(), Some("bytes=1-2,-5"));

        header.clear_ranges();
        assert_eq!(header.raw(), Some("bytes="));
    }

    #[test]
    fn test_modified_empty_range() {
        let mut header = parsed("bytes=0-1");
        header.set_unit(None);
        header.clear_ranges();
        assert_eq!(header.raw(), Some("="));

        let mut header = Range::default();
        assert_eq!(header.raw(), None);
        header.push_range(ByteRange::new(Some(3), None));
        assert_eq!(header.raw(), Some("=3-"));
        header.set_raw(None).unwrap();
        assert_eq!(header.raw(), None);
    }

    #[test]
    fn test_unchanged_range_keeps_raw() {
        let mut header = parsed("bytes = 1 - 2");
        header.set_range_start(0, Some(1));
        header.set_range(0, ByteRange::new(Some(1), Some(2)));
        header.set_unit(Some("bytes"));
        assert_eq!(header.raw(), Some("bytes = 1 - 2"));
    }

    #[test]
    fn test_unset() {
        let mut header = parsed("bytes=0-1");
        header.set_raw(None).unwrap();
        assert_eq!(header.raw(), None);
        assert_eq!(header.unit(), None);
    }

    #[test]
    fn test_byte_range_is_valid() {
        assert!(ByteRange::new(Some(0), Some(0)).is_valid());
        assert!(ByteRange::new(None, Some(10)).is_valid());
        assert!(ByteRange::new(Some(10), None).is_valid());
        assert!(!ByteRange::new(None, None).is_valid());
        assert!(!ByteRange::new(Some(5), Some(4)).is_valid());
        assert!(!ByteRange::new(Some(-1), None).is_valid());
    }

    #[test]
    fn test_byte_range_display() {
        assert_eq!(ByteRange::new(Some(1), Some(2)).to_string(), "1-2");
        assert_eq!(ByteRange::new(None, Some(2)).to_string(), "-2");
        assert_eq!(ByteRange::new(None, None).to_string(), "-");
    }
}
