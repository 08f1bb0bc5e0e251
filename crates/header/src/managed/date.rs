use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::header::RawCache;
use crate::managed::managed_header;
use crate::utils::check_raw;
use crate::HeaderError;

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const MONTHS: [&str; 12] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

/// A point in time with second precision, always in UTC.
///
/// Formats as an RFC 1123 date, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HttpDate {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl HttpDate {
    /// Builds a date, `None` unless it is a valid calendar date between years 1 and 9999.
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Option<Self> {
        let valid = (1..=9999).contains(&year)
            && (1..=12).contains(&month)
            && (1..=days_in_month(year, month)).contains(&day)
            && hour < 24
            && minute < 60
            && second < 60;
        valid.then_some(Self { year, month, day, hour, minute, second })
    }

    pub fn now() -> Self {
        Self::from(SystemTime::now())
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }

    /// Day of the week, 0 is Sunday.
    pub fn weekday(&self) -> u8 {
        // 1970-01-01 was a Thursday
        let weekday = (days_from_civil(self.year, self.month, self.day) + 4).rem_euclid(7);
        u8::try_from(weekday).unwrap_or_default()
    }

    /// Parses `Www, dd Mon yyyy HH:MM:SS GMT`, names compared case-insensitively.
    ///
    /// The weekday must match the date.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let bytes = s.as_bytes();
        if bytes.len() != 29 || !s.is_ascii() {
            return None;
        }

        let literal = |at: usize, expected: &str| s[at..at + expected.len()].eq_ignore_ascii_case(expected);
        if !(literal(3, ", ") && literal(7, " ") && literal(11, " ") && literal(16, " "))
            || !(literal(19, ":") && literal(22, ":") && literal(25, " GMT"))
        {
            return None;
        }

        let weekday = WEEKDAYS.iter().position(|name| name.eq_ignore_ascii_case(&s[0..3]))?;
        let month = MONTHS.iter().position(|name| name.eq_ignore_ascii_case(&s[8..11]))?;

        let date = Self::new(
            digits(&bytes[12..16])?,
            u8::try_from(month + 1).ok()?,
            u8::try_from(digits(&bytes[5..7])?).ok()?,
            u8::try_from(digits(&bytes[17..19])?).ok()?,
            u8::try_from(digits(&bytes[20..22])?).ok()?,
            u8::try_from(digits(&bytes[23..25])?).ok()?,
        )?;

        (usize::from(date.weekday()) == weekday).then_some(date)
    }
}

fn digits(bytes: &[u8]) -> Option<u16> {
    bytes.iter().try_fold(0u16, |acc, b| b.is_ascii_digit().then(|| acc * 10 + u16::from(b - b'0')))
}

fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Days since 1970-01-01, see <http://howardhinnant.github.io/date_algorithms.html>.
fn days_from_civil(year: u16, month: u8, day: u8) -> i64 {
    let year = i64::from(year) - i64::from(month <= 2);
    let era = year.div_euclid(400);
    let year_of_era = year - era * 400;
    let month = i64::from(month);
    let day_of_year = (153 * (if month > 2 { month - 3 } else { month + 9 }) + 2) / 5 + i64::from(day) - 1;
    let day_of_era = year_of_era * 365 + year_of_era / 4 - year_of_era / 100 + day_of_year;
    era * 146_097 + day_of_era - 719_468
}

/// The last second `httpdate` formats, 9999-12-31 23:59:59.
const MAX_UNIX_SECONDS: u64 = 253_402_300_799;

const EPOCH: HttpDate = HttpDate { year: 1970, month: 1, day: 1, hour: 0, minute: 0, second: 0 };

impl From<SystemTime> for HttpDate {
    /// Converts a system time, clamped between the epoch and the end of year 9999.
    fn from(time: SystemTime) -> Self {
        let time = time.clamp(UNIX_EPOCH, UNIX_EPOCH + Duration::from_secs(MAX_UNIX_SECONDS));
        Self::parse(&httpdate::fmt_http_date(time)).unwrap_or(EPOCH)
    }
}

impl fmt::Display for HttpDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {:02} {} {:04} {:02}:{:02}:{:02} GMT",
            WEEKDAYS[usize::from(self.weekday())],
            self.day,
            MONTHS[usize::from(self.month - 1)],
            self.year,
            self.hour,
            self.minute,
            self.second
        )
    }
}

/// The `Date` header.
///
/// A raw value that is not a valid RFC 1123 date is kept, the date is then unknown.
#[derive(Debug, Clone, Default)]
pub struct Date {
    raw: RawCache,
    value: Option<HttpDate>,
}

impl Date {
    pub fn raw(&self) -> Option<&str> {
        self.raw.get_or_serialize(|| self.value.map(|date| date.to_string()))
    }

    pub fn set_raw(&mut self, raw: Option<&str>) -> Result<(), HeaderError> {
        if let Some(raw) = raw {
            check_raw(raw)?;
        }
        self.value = raw.and_then(HttpDate::parse);
        self.raw = RawCache::with_value(raw);
        Ok(())
    }

    pub fn value(&self) -> Option<HttpDate> {
        self.value
    }

    pub fn set_value(&mut self, value: Option<HttpDate>) {
        if self.value == value && (value.is_some() || self.raw().is_none()) {
            return;
        }
        self.value = value;
        self.raw.invalidate();
    }
}

managed_header!(Date, "Date", "date");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(HttpDate::new(1, 1, 1, 0, 0, 0).unwrap().to_string(), "Mon, 01 Jan 0001 00:00:00 GMT");
        assert_eq!(HttpDate::new(2000, 10, 1, 20, 10, 50).unwrap().to_string(), "Sun, 01 Oct 2000 20:10:50 GMT");
    }

    #[test]
    fn test_parse() {
        let date = HttpDate::parse(" sun, 06 NOV 1994 08:49:37 gmt ").unwrap();
        assert_eq!(date, HttpDate::new(1994, 11, 6, 8, 49, 37).unwrap());
        assert_eq!(date.weekday(), 0);
    }

    #[test]
    fn test_parse_invalid() {
        for raw in [
            "",
            "Sun, 06 Nov 1994 08:49:37 GMT+1",
            "Sun, 06 Nov 1994 08:49:37 UTC",
            "Mon, 06 Nov 1994 08:49:37 GMT",
            "Sun, 06 Nov 1994 24:49:37 GMT",
            "Sun, 06 Nov 1994 08:60:37 GMT",
            "Sun, 06 Nov 1994 08:49:60 GMT",
            "Sun, 00 Nov 1994 08:49:37 GMT",
            "Mon, 31 Nov 2020 08:49:37 GMT",
            "Sun, 01 Dec 2020 08:49:37 GMT",
            "Sun, 06 Nox 1994 08:49:37 GMT",
            "Sun,  6 Nov 1994 08:49:37 GMT",
            "Sunday, 06-Nov-94 08:49:37 GMT",
        ] {
            assert_eq!(HttpDate::parse(raw), None, "{raw}");
        }
    }

    #[test]
    fn test_leap_day() {
        assert!(HttpDate::new(2000, 2, 29, 0, 0, 0).is_some());
        assert!(HttpDate::new(2100, 2, 29, 0, 0, 0).is_none());
        assert!(HttpDate::parse("Thu, 29 Feb 2024 12:00:00 GMT").is_some());
    }

    #[test]
    fn test_from_system_time() {
        assert_eq!(HttpDate::from(UNIX_EPOCH).to_string(), "Thu, 01 Jan 1970 00:00:00 GMT");
        let time = UNIX_EPOCH + Duration::from_secs(784_111_777);
        assert_eq!(HttpDate::from(time).to_string(), "Sun, 06 Nov 1994 08:49:37 GMT");
        let time = UNIX_EPOCH + Duration::from_secs(1_709_208_000);
        assert_eq!(HttpDate::from(time).to_string(), "Thu, 29 Feb 2024 12:00:00 GMT");
    }

    #[test]
    fn test_from_system_time_is_clamped() {
        let before_epoch = UNIX_EPOCH - Duration::from_secs(86_400);
        assert_eq!(HttpDate::from(before_epoch).to_string(), "Thu, 01 Jan 1970 00:00:00 GMT");
        let far_future = UNIX_EPOCH + Duration::from_secs(MAX_UNIX_SECONDS + 86_400);
        assert_eq!(HttpDate::from(far_future).to_string(), "Fri, 31 Dec 9999 23:59:59 GMT");
    }

    #[test]
    fn test_now_matches_httpdate() {
        let before = httpdate::fmt_http_date(SystemTime::now());
        let now = HttpDate::now().to_string();
        let after = httpdate::fmt_http_date(SystemTime::now());
        assert!(now == before || now == after, "{now} is neither {before} nor {after}");
    }

    #[test]
    fn test_header_keeps_invalid_raw() {
        let mut header = Date::default();
        header.set_raw(Some("yesterday")).unwrap();
        assert_eq!(header.value(), None);
        assert_eq!(header.raw(), Some("yesterday"));
    }

    #[test]
    fn test_header_set_value() {
        let mut header = Date::default();
        header.set_raw(Some("sun, 01 oct 2000 20:10:50 gmt")).unwrap();
        let date = header.value().unwrap();

        header.set_value(Some(date));
        assert_eq!(header.raw(), Some("sun, 01 oct 2000 20:10:50 gmt"));

        header.set_value(HttpDate::new(2000, 10, 2, 20, 10, 50));
        assert_eq!(header.raw(), Some("Mon, 02 Oct 2000 20:10:50 GMT"));

        header.set_value(None);
        assert_eq!(header.raw(), None);
    }

    #[test]
    fn test_header_clear_invalid_raw() {
        let mut header = Date::default();
        header.set_raw(Some("yesterday")).unwrap();
        header.set_value(None);
        assert_eq!(header.raw(), None);
    }
}
