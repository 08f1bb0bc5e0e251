//! Fixtures shared by the benches.
//!
//! Request fixtures are stored with `\n` line endings, [`Fixture::wire`] gives them
//! back as they travel on the wire.

#[derive(Debug, Copy, Clone)]
pub struct Fixture {
    name: &'static str,
    content: &'static str,
}

impl Fixture {
    pub const fn new(name: &'static str, content: &'static str) -> Self {
        Self { name, content }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    /// The content with every line ending as `\r\n`.
    pub fn wire(&self) -> Vec<u8> {
        self.content.replace("\r\n", "\n").replace('\n', "\r\n").into_bytes()
    }
}

/// Header values for the tokenizer benches, from plain to heavily quoted.
pub const HEADER_VALUES: [Fixture; 3] = [
    Fixture::new("plain", "gzip, deflate, br, zstd"),
    Fixture::new("parameters", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,*/*;q=0.8"),
    Fixture::new("quoted", r#"close, "a,b,c", "escaped \"quote\"", keep-alive, "x\\y", token"#),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire() {
        let fixture = Fixture::new("lines", "a\nb\r\nc\n");
        assert_eq!(fixture.wire(), b"a\r\nb\r\nc\r\n");
    }
}
