//! The bodies a response can carry.

use std::cmp;
use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use bytes::Bytes;
use verbatim_header::managed::ByteRange;
use verbatim_header::ResponseHeaders;

use crate::codec::body::ChunkedWriter;
use crate::protocol::SendError;
use crate::utils::ensure;

const TEXT_MEDIA_TYPE: &str = "text/plain;charset=utf-8";
const FILE_MEDIA_TYPE: &str = "application/octet-stream";

/// Size of the buffer used to copy a file into the connection.
const DEFAULT_FILE_BUFFER_SIZE: usize = 4 * 1024 * 1024;

/// The body of a response along with the headers describing it.
#[derive(Default)]
pub enum ResponseContent {
    /// No body, `Content-Length: 0`.
    #[default]
    Empty,
    /// A body of known bytes, `Content-Length` must not be set by hand.
    Bytes(Bytes),
    /// Text sent as UTF-8, typed `text/plain;charset=utf-8` unless `media_type` is given.
    Text { text: String, media_type: Option<String> },
    /// A file or a range of it.
    File(FileContent),
    /// A body of unknown length, sent with the chunked transfer coding.
    Reader(Box<dyn Read + Send>),
}

impl ResponseContent {
    pub fn bytes<B: Into<Bytes>>(bytes: B) -> Self {
        Self::Bytes(bytes.into())
    }

    pub fn text<S: Into<String>>(text: S) -> Self {
        Self::Text { text: text.into(), media_type: None }
    }

    pub fn text_with_type<S: Into<String>>(text: S, media_type: &str) -> Self {
        Self::Text { text: text.into(), media_type: Some(media_type.to_string()) }
    }

    pub fn reader<R: Read + Send + 'static>(reader: R) -> Self {
        Self::Reader(Box::new(reader))
    }

    /// Sets the framing and type headers of this content.
    pub(crate) fn apply_headers(&self, headers: &ResponseHeaders) -> Result<(), SendError> {
        match self {
            Self::Empty => headers.content_length().set_value(Some(0)),
            Self::Bytes(bytes) => set_content_length(headers, bytes.len() as u64)?,
            Self::Text { text, media_type } => {
                ensure!(
                    !headers.contains("Content-Type"),
                    SendError::invalid_body("Content-Type header is already set.")
                );
                headers.set("Content-Type", Some(media_type.as_deref().unwrap_or(TEXT_MEDIA_TYPE)))?;
                set_content_length(headers, text.len() as u64)?;
            }
            Self::File(file) => file.apply_headers(headers)?,
            Self::Reader(_) => {
                ensure!(
                    !headers.contains("Content-Length"),
                    SendError::invalid_body("Content-Length header can't be set on a streamed body.")
                );
                let mut transfer_encoding = headers.transfer_encoding();
                if !transfer_encoding.contains("chunked") {
                    transfer_encoding.push("chunked");
                }
            }
        }
        Ok(())
    }

    pub(crate) fn write_to(self, writer: &mut dyn Write) -> io::Result<()> {
        match self {
            Self::Empty => Ok(()),
            Self::Bytes(bytes) => writer.write_all(&bytes),
            Self::Text { text, .. } => writer.write_all(text.as_bytes()),
            Self::File(file) => file.write_to(writer),
            Self::Reader(mut reader) => {
                let mut chunked = ChunkedWriter::new(writer);
                io::copy(&mut reader, &mut chunked)?;
                chunked.finish()
            }
        }
    }
}

fn set_content_length(headers: &ResponseHeaders, length: u64) -> Result<(), SendError> {
    let mut content_length = headers.content_length();
    ensure!(content_length.raw().is_none(), SendError::invalid_body("Content-Length header is already set."));
    content_length.set_value(Some(length));
    Ok(())
}

impl fmt::Debug for ResponseContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(bytes).finish(),
            Self::Text { text, media_type } => {
                f.debug_struct("Text").field("text", text).field("media_type", media_type).finish()
            }
            Self::File(file) => f.debug_tuple("File").field(file).finish(),
            Self::Reader(_) => f.write_str("Reader"),
        }
    }
}

/// A file sent as a response body, whole or as a byte range.
#[derive(Debug)]
pub struct FileContent {
    file: File,
    total: u64,
    start: u64,
    length: u64,
    media_type: Option<String>,
    buffer_size: usize,
}

impl FileContent {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Self::new(File::open(path)?)
    }

    pub fn new(file: File) -> io::Result<Self> {
        let total = file.metadata()?.len();
        Ok(Self { file, total, start: 0, length: total, media_type: None, buffer_size: DEFAULT_FILE_BUFFER_SIZE })
    }

    /// Selects the part of the file to send:
    ///
    /// - `-E`: the last `E` bytes, the whole file if it is shorter
    /// - `S-`: from `S` to the end of the file
    /// - `S-E`: from `S` to `E` inclusive, `E` being clamped to the last byte
    pub fn with_range(mut self, range: ByteRange) -> Result<Self, SendError> {
        let (start, length) = select(range, self.total)?;
        self.start = start;
        self.length = length;
        Ok(self)
    }

    /// Defaults to `application/octet-stream`.
    pub fn with_media_type(mut self, media_type: &str) -> Self {
        self.media_type = Some(media_type.to_string());
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Result<Self, SendError> {
        ensure!(buffer_size > 0, SendError::invalid_body("File buffer size must be greater than 0."));
        self.buffer_size = buffer_size;
        Ok(self)
    }

    /// Size of the whole file.
    pub fn total_size(&self) -> u64 {
        self.total
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    /// Number of bytes sent.
    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Tells if only a part of the file is sent.
    pub fn is_partial(&self) -> bool {
        self.length != self.total
    }

    fn apply_headers(&self, headers: &ResponseHeaders) -> Result<(), SendError> {
        set_content_length(headers, self.length)?;
        if !headers.contains("Content-Type") {
            headers.set("Content-Type", Some(self.media_type.as_deref().unwrap_or(FILE_MEDIA_TYPE)))?;
        }

        if self.is_partial() {
            let end = self.start + self.length - 1;
            let mut content_range = headers.content_range();
            content_range.set_unit(Some("bytes"));
            content_range.set_range(Some(ByteRange::new(Some(to_i64(self.start)), Some(to_i64(end)))));
            content_range.set_size(Some(to_i64(self.total)));
        }
        Ok(())
    }

    fn write_to(mut self, writer: &mut dyn Write) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(self.start))?;

        let buffer_size = usize::try_from(self.length).map_or(self.buffer_size, |len| cmp::min(len, self.buffer_size));
        let mut buffer = vec![0u8; buffer_size];
        let mut remaining = self.length;
        while remaining > 0 {
            let len = usize::try_from(remaining).map_or(buffer.len(), |remaining| cmp::min(remaining, buffer.len()));
            let n = self.file.read(&mut buffer[..len])?;
            if n == 0 {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "file is shorter than its announced length"));
            }
            writer.write_all(&buffer[..n])?;
            remaining -= n as u64;
        }
        Ok(())
    }
}

/// Resolves `range` against a content of `total` bytes into `(start, length)`.
fn select(range: ByteRange, total: u64) -> Result<(u64, u64), SendError> {
    let invalid = || SendError::invalid_range(format!("Range «{range}» can't be satisfied by «{total}» byte(s)."));
    let bound = |value: i64| u64::try_from(value).ok().ok_or_else(invalid);

    match (range.start, range.end) {
        (None, None) => Err(invalid()),
        (None, Some(end)) => {
            let end = bound(end)?;
            ensure!(end > 0 || total == 0, invalid());
            let length = cmp::min(end, total);
            Ok((total - length, length))
        }
        (Some(start), None) => {
            let start = bound(start)?;
            ensure!(start < total, invalid());
            Ok((start, total - start))
        }
        (Some(start), Some(end)) => {
            let (start, end) = (bound(start)?, bound(end)?);
            ensure!(start <= end && start < total, invalid());
            let end = cmp::min(end, total - 1);
            Ok((start, end - start + 1))
        }
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: Option<i64>, end: Option<i64>) -> ByteRange {
        ByteRange::new(start, end)
    }

    #[test]
    fn test_select_suffix() {
        assert_eq!(select(range(None, Some(500)), 10_000).unwrap(), (9500, 500));
        assert_eq!(select(range(None, Some(20_000)), 10_000).unwrap(), (0, 10_000));
        assert!(matches!(select(range(None, Some(0)), 10), Err(SendError::InvalidRange { .. })));
    }

    #[test]
    fn test_select_from_start() {
        assert_eq!(select(range(Some(9500), None), 10_000).unwrap(), (9500, 500));
        assert_eq!(select(range(Some(0), None), 10_000).unwrap(), (0, 10_000));
        assert!(matches!(select(range(Some(10_000), None), 10_000), Err(SendError::InvalidRange { .. })));
    }

    #[test]
    fn test_select_both_bounds() {
        assert_eq!(select(range(Some(0), Some(499)), 10_000).unwrap(), (0, 500));
        assert_eq!(select(range(Some(500), Some(500)), 10_000).unwrap(), (500, 1));
        assert_eq!(select(range(Some(9000), Some(20_000)), 10_000).unwrap(), (9000, 1000));
        assert_eq!(select(range(Some(0), Some(9999)), 10_000).unwrap(), (0, 10_000));
    }

    #[test]
    fn test_select_invalid() {
        for invalid in [range(None, None), range(Some(5), Some(4)), range(Some(-1), Some(4)), range(Some(-1), None)] {
            let e = select(invalid, 10_000).unwrap_err();
            assert!(matches!(e, SendError::InvalidRange { .. }), "{invalid}");
        }
        assert_eq!(
            select(range(Some(5), Some(4)), 10).unwrap_err().to_string(),
            "invalid range: Range «5-4» can't be satisfied by «10» byte(s)."
        );
    }

    #[test]
    fn test_text_headers() {
        let headers = ResponseHeaders::new();
        let content = ResponseContent::text("héllo");
        content.apply_headers(&headers).unwrap();

        assert_eq!(headers.get("Content-Type").as_deref(), Some("text/plain;charset=utf-8"));
        assert_eq!(headers.content_length().value(), Some(6));

        let mut body = Vec::new();
        content.write_to(&mut body).unwrap();
        assert_eq!(body, "héllo".as_bytes());
    }

    #[test]
    fn test_content_length_already_set() {
        let headers = ResponseHeaders::new();
        headers.set("Content-Length", Some("3")).unwrap();
        let e = ResponseContent::bytes(&b"abc"[..]).apply_headers(&headers).unwrap_err();
        assert_eq!(e.to_string(), "invalid body: Content-Length header is already set.");
    }

    #[test]
    fn test_content_type_already_set() {
        let headers = ResponseHeaders::new();
        headers.set("Content-Type", Some("text/html")).unwrap();
        let e = ResponseContent::text("<p/>").apply_headers(&headers).unwrap_err();
        assert_eq!(e.to_string(), "invalid body: Content-Type header is already set.");
    }

    #[test]
    fn test_reader_is_chunked() {
        let headers = ResponseHeaders::new();
        let content = ResponseContent::reader(&b"streamed"[..]);
        content.apply_headers(&headers).unwrap();
        assert_eq!(headers.get("Transfer-Encoding").as_deref(), Some("chunked"));

        let mut body = Vec::new();
        content.write_to(&mut body).unwrap();
        assert_eq!(body, b"8\r\nstreamed\r\n0\r\n\r\n");
    }

    #[test]
    fn test_file_range() {
        let path = std::env::temp_dir().join(format!("verbatim-file-content-{}.txt", std::process::id()));
        std::fs::write(&path, b"0123456789").unwrap();

        let content = FileContent::open(&path).unwrap().with_range(range(Some(2), Some(5))).unwrap();
        assert!(content.is_partial());
        assert_eq!((content.start(), content.len(), content.total_size()), (2, 4, 10));

        let headers = ResponseHeaders::new();
        let content = ResponseContent::File(content.with_buffer_size(3).unwrap());
        content.apply_headers(&headers).unwrap();
        assert_eq!(headers.get("Content-Range").as_deref(), Some("bytes 2-5/10"));
        assert_eq!(headers.get("Content-Length").as_deref(), Some("4"));
        assert_eq!(headers.get("Content-Type").as_deref(), Some("application/octet-stream"));

        let mut body = Vec::new();
        content.write_to(&mut body).unwrap();
        assert_eq!(body, b"2345");

        let whole = FileContent::open(&path).unwrap();
        assert!(!whole.is_partial());
        let e = FileContent::open(&path).unwrap().with_buffer_size(0).unwrap_err();
        assert!(matches!(e, SendError::InvalidBody { .. }));

        std::fs::remove_file(&path).unwrap();
    }
}
