//! Tokenizer for delimiter separated header values.
//!
//! A header value such as `gzip, "a,b" , chunked` is split on a single delimiter
//! character into [`ParsedValue`]s. Each value keeps two views:
//!
//! - `raw`: the exact slice between two delimiters, untouched
//! - `interpreted`: the meaningful content with quotes stripped, escapes resolved
//!   and surrounding whitespace trimmed
//!
//! The scan is a single left to right pass without backtracking. Inside a quoted span
//! a backslash only escapes a following quote; any other escaped character keeps its
//! backslash, so `"a\\b"` is interpreted as `a\\b` while `"a\"b"` becomes `a"b`.

use crate::HeaderError;

/// One delimiter separated segment of a header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedValue<'a> {
    /// The exact text of the segment, delimiter excluded.
    pub raw: &'a str,
    /// The content of the segment, or `None` if it holds only whitespace.
    pub interpreted: Option<String>,
}

/// Splits `raw` on `delimiter`.
///
/// The returned iterator is lazy; calling `parse` again restarts the scan.
/// An empty input yields a single empty value and so does a trailing delimiter.
///
/// # Examples
///
/// ```
/// use verbatim_header::tokenizer::parse;
///
/// let values: Vec<_> = parse(r#" a , "b,c" "#, ',').map(|v| v.unwrap().interpreted).collect();
/// assert_eq!(values, vec![Some("a".to_string()), Some("b,c".to_string())]);
/// ```
pub fn parse(raw: &str, delimiter: char) -> Tokens<'_> {
    Tokens { raw, delimiter, pos: 0, finished: false }
}

/// Like [`parse`], but yields only the interpreted content of the segments that have one.
///
/// A quoted empty string (`""`) is kept as an empty value, a blank segment is dropped.
pub fn parse_interpreted(raw: &str, delimiter: char) -> impl Iterator<Item = Result<String, HeaderError>> + '_ {
    parse(raw, delimiter).filter_map(|value| match value {
        Ok(ParsedValue { interpreted, .. }) => interpreted.map(Ok),
        Err(e) => Some(Err(e)),
    })
}

/// Tells if `s` is a `token` as defined by RFC 7230: at least one char, no control
/// chars and none of the separators `()<>@,;:\"/[]?={}`, space or tab.
pub fn is_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_token_char)
}

fn is_token_char(c: char) -> bool {
    !c.is_ascii_control()
        && !matches!(
            c,
            '(' | ')' | '<' | '>' | '@' | ',' | ';' | ':' | '\\' | '"' | '/' | '[' | ']' | '?' | '=' | '{' | '}' | ' ' | '\t'
        )
}

/// Iterator returned by [`parse`].
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    raw: &'a str,
    delimiter: char,
    pos: usize,
    finished: bool,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Result<ParsedValue<'a>, HeaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let start = self.pos;
        let mut segment = Segment::default();

        for (offset, c) in self.raw[start..].char_indices() {
            if !segment.quoted && c == self.delimiter {
                self.pos = start + offset + c.len_utf8();
                return Some(Ok(segment.finish(&self.raw[start..start + offset])));
            }
            segment.push(c);
        }

        self.finished = true;
        self.pos = self.raw.len();

        if segment.quoted {
            return Some(Err(HeaderError::missing_string_end(self.raw)));
        }
        Some(Ok(segment.finish(&self.raw[start..])))
    }
}

/// Scan state of the segment under construction.
#[derive(Debug, Default)]
struct Segment {
    quoted: bool,
    escape: bool,
    interpreted: Option<String>,
    whitespace: String,
}

impl Segment {
    fn push(&mut self, c: char) {
        if self.quoted {
            self.push_quoted(c);
        } else {
            self.push_unquoted(c);
        }
    }

    fn push_unquoted(&mut self, c: char) {
        if c == '"' {
            self.quoted = true;
            self.flush_whitespace();
            self.interpreted.get_or_insert_with(String::new);
        } else if c.is_whitespace() {
            if self.interpreted.as_ref().is_some_and(|s| !s.is_empty()) {
                self.whitespace.push(c);
            }
        } else {
            self.flush_whitespace();
            self.interpreted.get_or_insert_with(String::new).push(c);
        }
    }

    fn push_quoted(&mut self, c: char) {
        let interpreted = self.interpreted.get_or_insert_with(String::new);
        match (c, self.escape) {
            // the first backslash is literal, the second one may still escape a quote
            ('\\', true) => interpreted.push('\\'),
            ('\\', false) => self.escape = true,
            ('"', true) => {
                interpreted.push('"');
                self.escape = false;
            }
            ('"', false) => self.quoted = false,
            (c, true) => {
                interpreted.push('\\');
                interpreted.push(c);
                self.escape = false;
            }
            (c, false) => interpreted.push(c),
        }
    }

    fn flush_whitespace(&mut self) {
        if self.whitespace.is_empty() {
            return;
        }
        if let Some(interpreted) = self.interpreted.as_mut() {
            interpreted.push_str(&self.whitespace);
        }
        self.whitespace.clear();
    }

    fn finish(self, raw: &str) -> ParsedValue<'_> {
        ParsedValue { raw, interpreted: self.interpreted }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(raw: &str) -> Vec<(String, Option<String>)> {
        parse(raw, ',').map(|v| v.unwrap()).map(|v| (v.raw.to_string(), v.interpreted)).collect()
    }

    fn interpreted(raw: &str) -> Vec<String> {
        parse_interpreted(raw, ',').collect::<Result<Vec<_>, _>>().unwrap()
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(values(""), vec![(String::new(), None)]);
    }

    #[test]
    fn test_trailing_delimiter() {
        assert_eq!(values("a,"), vec![("a".to_string(), Some("a".to_string())), (String::new(), None)]);
    }

    #[test]
    fn test_blank_segments() {
        let values = values(" ,\t, a b ,");
        assert_eq!(values.len(), 4);
        assert_eq!(values[0], (" ".to_string(), None));
        assert_eq!(values[1], ("\t".to_string(), None));
        assert_eq!(values[2], (" a b ".to_string(), Some("a b".to_string())));
        assert_eq!(values[3], (String::new(), None));
    }

    #[test]
    fn test_quoted_delimiter() {
        assert_eq!(values("\"a,b,c\""), vec![("\"a,b,c\"".to_string(), Some("a,b,c".to_string()))]);
        assert_eq!(interpreted("a\",\""), vec!["a,".to_string()]);
    }

    #[test]
    fn test_whitespace_around_quotes() {
        assert_eq!(
            interpreted(" some text \"  A b C  \" some text "),
            vec!["some text   A b C   some text".to_string()]
        );
    }

    #[test]
    fn test_escapes() {
        // backslash outside of quotes is a plain char
        assert_eq!(interpreted("a\\"), vec!["a\\".to_string()]);
        assert_eq!(interpreted(r#""a\\b""#), vec![r"a\\b".to_string()]);
        assert_eq!(interpreted(r#""a\"b""#), vec!["a\"b".to_string()]);
        assert_eq!(interpreted(r#""a\\b\\"""#), vec![r#"a\\b\""#.to_string()]);
        assert_eq!(interpreted(r#""\x""#), vec![r"\x".to_string()]);
    }

    #[test]
    fn test_quoted_empty_string_is_kept() {
        assert_eq!(interpreted("\"\", ,a"), vec![String::new(), "a".to_string()]);
    }

    #[test]
    fn test_missing_string_end() {
        for raw in ["\"", "\"\\\"", "a\"some\\\"text"] {
            let err = parse(raw, ',').find_map(Result::err).unwrap();
            assert_eq!(err.to_string(), format!("Header value «{raw}» is missing a string end delimiter."));
        }
    }

    #[test]
    fn test_error_is_reported_after_good_values() {
        let mut tokens = parse("a, \"b", ',');
        assert_eq!(tokens.next().unwrap().unwrap().interpreted.as_deref(), Some("a"));
        assert!(tokens.next().unwrap().is_err());
        assert!(tokens.next().is_none());
    }

    #[test]
    fn test_custom_delimiter() {
        let values: Vec<_> = parse_interpreted("text/html; charset = \"utf-8\"", ';').map(Result::unwrap).collect();
        assert_eq!(values, vec!["text/html".to_string(), "charset = utf-8".to_string()]);
    }

    #[test]
    fn test_restartable() {
        let tokens = parse("a,b", ',');
        assert_eq!(tokens.clone().count(), 2);
        assert_eq!(tokens.count(), 2);
    }

    #[test]
    fn test_is_token() {
        assert!(is_token("gzip"));
        assert!(is_token("x-custom_1.0"));
        assert!(!is_token(""));
        assert!(!is_token("a b"));
        assert!(!is_token("a/b"));
        assert!(!is_token("a\u{7f}"));
        assert!(!is_token("tab\there"));
    }
}
