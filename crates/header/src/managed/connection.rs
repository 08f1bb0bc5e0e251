use crate::header::RawCache;
use crate::managed::managed_header;
use crate::tokenizer;
use crate::utils::check_raw;
use crate::HeaderError;

const CLOSE: usize = 0;
const KEEP_ALIVE: usize = 1;
const KEYWORDS: [&str; 2] = ["close", "keep-alive"];

/// The `Connection` header, with `close` and `keep-alive` as flags.
///
/// Tokens other than the two flags are kept verbatim at their position. Enabling a flag
/// that was present in the last raw value brings back its exact text and position,
/// otherwise the keyword is emitted in front of the other tokens.
///
/// ```
/// use verbatim_header::managed::Connection;
///
/// let mut connection = Connection::default();
/// connection.set_raw(Some("a,b")).unwrap();
/// connection.set_close(true);
/// assert_eq!(connection.raw(), Some("close,a,b"));
/// ```
#[derive(Debug, Clone)]
pub struct Connection {
    raw: RawCache,
    flags: [Flag; 2],
    others: Vec<Token>,
}

#[derive(Debug, Clone)]
struct Flag {
    enabled: bool,
    token: Token,
}

#[derive(Debug, Clone)]
struct Token {
    position: usize,
    raw: String,
}

impl Default for Connection {
    fn default() -> Self {
        Self { raw: RawCache::default(), flags: initial_flags(), others: Vec::new() }
    }
}

fn initial_flags() -> [Flag; 2] {
    [CLOSE, KEEP_ALIVE].map(|slot| Flag { enabled: false, token: Token { position: slot, raw: KEYWORDS[slot].to_string() } })
}

impl Connection {
    pub fn raw(&self) -> Option<&str> {
        self.raw.get_or_serialize(|| self.serialize())
    }

    pub fn set_raw(&mut self, raw: Option<&str>) -> Result<(), HeaderError> {
        let mut flags = initial_flags();
        let mut others = Vec::new();

        if let Some(raw) = raw {
            check_raw(raw)?;

            for (offset, value) in tokenizer::parse(raw, ',').enumerate() {
                let value = value?;
                let token = Token { position: KEYWORDS.len() + offset, raw: value.raw.to_string() };

                let slot = value.interpreted.as_deref().and_then(|interpreted| {
                    (0..KEYWORDS.len()).find(|&slot| !flags[slot].enabled && KEYWORDS[slot].eq_ignore_ascii_case(interpreted))
                });

                match slot {
                    Some(slot) => flags[slot] = Flag { enabled: true, token },
                    None => others.push(token),
                }
            }
        }

        self.flags = flags;
        self.others = others;
        self.raw = RawCache::with_value(raw);
        Ok(())
    }

    pub fn close(&self) -> bool {
        self.flags[CLOSE].enabled
    }

    pub fn set_close(&mut self, close: bool) {
        self.set_flag(CLOSE, close);
    }

    pub fn keep_alive(&self) -> bool {
        self.flags[KEEP_ALIVE].enabled
    }

    pub fn set_keep_alive(&mut self, keep_alive: bool) {
        self.set_flag(KEEP_ALIVE, keep_alive);
    }

    /// The raw text of the tokens that are neither `close` nor `keep-alive`.
    pub fn others(&self) -> impl Iterator<Item = &str> {
        self.others.iter().map(|token| token.raw.as_str())
    }

    fn set_flag(&mut self, slot: usize, enabled: bool) {
        if self.flags[slot].enabled == enabled {
            return;
        }
        self.flags[slot].enabled = enabled;
        self.raw.invalidate();
    }

    fn serialize(&self) -> Option<String> {
        let mut tokens: Vec<&Token> =
            self.flags.iter().filter(|flag| flag.enabled).map(|flag| &flag.token).chain(&self.others).collect();
        if tokens.is_empty() {
            return None;
        }
        tokens.sort_by_key(|token| token.position);

        let raw: Vec<&str> = tokens.iter().map(|token| token.raw.as_str()).collect();
        Some(raw.join(","))
    }
}

managed_header!(Connection, "Connection", "connection");

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(raw: &str) -> Connection {
        let mut connection = Connection::default();
        connection.set_raw(Some(raw)).unwrap();
        connection
    }

    #[test]
    fn test_parse_flags() {
        let connection = parsed(" Keep-Alive , foo");
        assert!(connection.keep_alive());
        assert!(!connection.close());
        assert_eq!(connection.others().collect::<Vec<_>>(), vec![" foo"]);

        let connection = parsed("\"close\"");
        assert!(connection.close());
    }

    #[test]
    fn test_enable_flags_in_front() {
        let mut connection = parsed("a,b");
        connection.set_close(true);
        assert_eq!(connection.raw(), Some("close,a,b"));
        connection.set_keep_alive(true);
        assert_eq!(connection.raw(), Some("close,keep-alive,a,b"));
    }

    #[test]
    fn test_disable_flags() {
        let mut connection = parsed(" keep-alive, close ");
        connection.set_close(false);
        assert_eq!(connection.raw(), Some(" keep-alive"));
        connection.set_keep_alive(false);
        assert_eq!(connection.raw(), None);

        let mut connection = parsed(" keep-alive , close ");
        connection.set_keep_alive(false);
        assert_eq!(connection.raw(), Some(" close "));
    }

    #[test]
    fn test_toggle_restores_raw() {
        let raw = " A , bbb , close , cDe, FFFF ,gG , keep-alive";
        let mut connection = parsed(raw);
        connection.set_close(false);
        connection.set_close(true);
        assert_eq!(connection.raw(), Some(raw));

        connection.set_keep_alive(false);
        connection.set_keep_alive(true);
        assert_eq!(connection.raw(), Some(raw));
    }

    #[test]
    fn test_unchanged_flag_keeps_raw() {
        let raw = "  CLOSE ,x";
        let mut connection = parsed(raw);
        connection.set_close(true);
        connection.set_keep_alive(false);
        assert_eq!(connection.raw(), Some(raw));
    }

    #[test]
    fn test_duplicates_are_others() {
        let mut connection = parsed("close, close");
        assert!(connection.close());
        assert_eq!(connection.others().collect::<Vec<_>>(), vec![" close"]);

        connection.set_close(false);
        assert_eq!(connection.raw(), Some(" close"));
    }

    #[test]
    fn test_set_raw_resets() {
        let mut connection = parsed("close");
        connection.set_raw(Some("keep-alive")).unwrap();
        assert!(!connection.close());
        assert!(connection.keep_alive());

        connection.set_raw(None).unwrap();
        assert!(!connection.keep_alive());
        assert_eq!(connection.raw(), None);

        connection.set_keep_alive(true);
        assert_eq!(connection.raw(), Some("keep-alive"));
    }

    #[test]
    fn test_bad_raw_keeps_state() {
        let mut connection = parsed("close");
        assert!(connection.set_raw(Some("\"keep-alive")).is_err());
        assert!(connection.close());
        assert_eq!(connection.raw(), Some("close"));
    }
}
