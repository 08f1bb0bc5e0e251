use crate::header::RawCache;
use crate::managed::{managed_header, parse_i64, ByteRange};
use crate::utils::check_raw;
use crate::HeaderError;

/// The `Content-Range` response header: `unit start-end/size`, where the range and
/// the size may be `*` when unknown.
#[derive(Debug, Clone, Default)]
pub struct ContentRange {
    raw: RawCache,
    unit: Option<String>,
    range: Option<ByteRange>,
    size: Option<i64>,
}

#[derive(Debug, Default)]
struct Fields {
    unit: Option<String>,
    range: Option<ByteRange>,
    size: Option<i64>,
}

impl ContentRange {
    pub fn raw(&self) -> Option<&str> {
        self.raw.get_or_serialize(|| self.serialize())
    }

    pub fn set_raw(&mut self, raw: Option<&str>) -> Result<(), HeaderError> {
        if let Some(raw) = raw {
            check_raw(raw)?;
        }

        let Fields { unit, range, size } = raw.and_then(parse).unwrap_or_default();
        self.unit = unit;
        self.range = range;
        self.size = size;
        self.raw = RawCache::with_value(raw);
        Ok(())
    }

    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn set_unit(&mut self, unit: Option<&str>) {
        if self.unit() != unit {
            self.unit = unit.map(str::to_string);
            self.raw.invalidate();
        }
    }

    /// The range, `None` when unknown (`*`).
    pub fn range(&self) -> Option<ByteRange> {
        self.range
    }

    pub fn set_range(&mut self, range: Option<ByteRange>) {
        if self.range != range {
            self.range = range;
            self.raw.invalidate();
        }
    }

    /// The complete length of the representation, `None` when unknown (`*`).
    pub fn size(&self) -> Option<i64> {
        self.size
    }

    pub fn set_size(&mut self, size: Option<i64>) {
        if self.size != size {
            self.size = size;
            self.raw.invalidate();
        }
    }

    /// Clears every field along with the raw value.
    pub fn unset(&mut self) {
        self.unit = None;
        self.range = None;
        self.size = None;
        self.raw = RawCache::default();
    }

    fn serialize(&self) -> Option<String> {
        if self.unit.is_none() && self.range.is_none() && self.size.is_none() {
            return None;
        }

        let range = self.range.map_or_else(|| "*".to_string(), |range| range.to_string());
        let size = self.size.map_or_else(|| "*".to_string(), |size| size.to_string());
        Some(format!("{} {range}/{size}", self.unit().unwrap_or_default()))
    }
}

fn parse(raw: &str) -> Option<Fields> {
    let (unit, rest) = raw.trim().split_once(' ')?;
    let (range, size) = rest.split_once('/')?;

    let range = match range.trim() {
        "*" => None,
        range => {
            let (start, end) = range.split_once('-')?;
            Some(ByteRange::new(Some(parse_i64(start)?), Some(parse_i64(end)?)))
        }
    };
    let size = match size.trim() {
        "*" => None,
        size => Some(parse_i64(size)?),
    };

    Some(Fields { unit: Some(unit.to_string()), range, size })
}

managed_header!(ContentRange, "Content-Range", "content-range");

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(raw: &str) -> ContentRange {
        let mut header = ContentRange::default();
        header.set_raw(Some(raw)).unwrap();
        header
    }

    #[test]
    fn test_parse() {
        let header = parsed(" bytes 21010-47021/47022 ");
        assert_eq!(header.unit(), Some("bytes"));
        assert_eq!(header.range(), Some(ByteRange::new(Some(21010), Some(47021))));
        assert_eq!(header.size(), Some(47022));
        assert_eq!(header.raw(), Some(" bytes 21010-47021/47022 "));

        let header = parsed("bytes */ 1234");
        assert_eq!(header.range(), None);
        assert_eq!(header.size(), Some(1234));

        let header = parsed("bytes 0-10/*");
        assert_eq!(header.size(), None);
    }

    #[test]
    fn test_parse_invalid() {
        for raw in ["bytes", "bytes 0-10", "bytes a-10/20", "bytes 0-10/x", "bytes 5/10", "bytes -10/20"] {
            let header = parsed(raw);
            assert_eq!(header.unit(), None, "{raw}");
            assert_eq!(header.range(), None, "{raw}");
            assert_eq!(header.size(), None, "{raw}");
            assert_eq!(header.raw(), Some(raw));
        }
    }

    #[test]
    fn test_serialize() {
        let mut header = ContentRange::default();
        header.set_unit(Some("bytes"));
        assert_eq!(header.raw(), Some("bytes */*"));

        let mut header = ContentRange::default();
        header.set_size(Some(5000));
        assert_eq!(header.raw(), Some(" */5000"));

        let mut header = ContentRange::default();
        header.set_range(Some(ByteRange::new(Some(5), Some(10))));
        assert_eq!(header.raw(), Some(" 5-10/*"));

        let mut header = ContentRange::default();
        header.set_unit(Some("bytes"));
        header.set_range(Some(ByteRange::default()));
        header.set_size(Some(67589));
        assert_eq!(header.raw(), Some("bytes -/67589"));
    }

    #[test]
    fn test_modify_keeps_other_fields() {
        let mut header = parsed("bytes 0-99/1000");
        header.set_size(Some(1000));
        assert_eq!(header.raw(), Some("bytes 0-99/1000"));

        header.set_range(Some(ByteRange::new(Some(100), Some(199))));
        assert_eq!(header.raw(), Some("bytes 100-199/1000"));
    }

    #[test]
    fn test_unset() {
        let mut header = parsed("bytes 0-99/1000");
        header.unset();
        assert_eq!(header.raw(), None);
        assert_eq!(header.unit(), None);
        assert_eq!(header.range(), None);
    }
}
