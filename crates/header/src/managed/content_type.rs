use crate::header::RawCache;
use crate::managed::managed_header;
use crate::tokenizer::{self, is_token};
use crate::utils::{check_raw, ensure};
use crate::HeaderError;

const MAX_BOUNDARY_LEN: usize = 70;

/// The `Content-Type` header: a media type with optional `charset` and `boundary`
/// parameters.
///
/// Parsing is lenient: each `;` separated part is tried as media type, charset and
/// boundary, the first part matching a field fills it and unknown parts are ignored.
#[derive(Debug, Clone, Default)]
pub struct ContentType {
    raw: RawCache,
    media_type: Option<MediaType>,
    charset: Option<String>,
    boundary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct MediaType {
    value: String,
    // type and subtype, when `value` is a valid `type/subtype`
    parts: Option<(String, String)>,
}

impl MediaType {
    fn parse(value: &str) -> Self {
        let parts = value
            .trim()
            .split_once('/')
            .filter(|(ty, subtype)| is_token(ty) && is_token(subtype))
            .map(|(ty, subtype)| (ty.to_string(), subtype.to_string()));
        Self { value: value.to_string(), parts }
    }
}

impl ContentType {
    pub fn raw(&self) -> Option<&str> {
        self.raw.get_or_serialize(|| self.serialize())
    }

    pub fn set_raw(&mut self, raw: Option<&str>) -> Result<(), HeaderError> {
        let mut parsed = ContentType::default();

        if let Some(raw) = raw {
            check_raw(raw)?;

            for value in tokenizer::parse_interpreted(raw, ';') {
                let value = value?;

                if parsed.media_type.is_none() {
                    let media_type = MediaType::parse(&value);
                    if media_type.parts.is_some() {
                        parsed.media_type = Some(media_type);
                        continue;
                    }
                }

                let Some((key, param)) = value.split_once('=') else {
                    continue;
                };
                let key = key.trim();

                if parsed.charset.is_none() && key.eq_ignore_ascii_case("charset") {
                    parsed.charset = parse_charset(param).ok();
                } else if parsed.boundary.is_none() && key.eq_ignore_ascii_case("boundary") {
                    parsed.boundary = parse_boundary(param).ok();
                }
            }
        }

        parsed.raw = RawCache::with_value(raw);
        *self = parsed;
        Ok(())
    }

    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_ref().map(|media_type| media_type.value.as_str())
    }

    /// Sets the media type, its type and subtype are derived when it reads as `type/subtype`.
    pub fn set_media_type(&mut self, media_type: Option<&str>) {
        if self.media_type() == media_type {
            return;
        }
        self.media_type = media_type.map(MediaType::parse);
        self.raw.invalidate();
    }

    /// The part of the media type before `/`.
    pub fn r#type(&self) -> Option<&str> {
        self.parts().map(|(ty, _)| ty)
    }

    /// The part of the media type after `/`.
    pub fn subtype(&self) -> Option<&str> {
        self.parts().map(|(_, subtype)| subtype)
    }

    fn parts(&self) -> Option<(&str, &str)> {
        let (ty, subtype) = self.media_type.as_ref()?.parts.as_ref()?;
        Some((ty, subtype))
    }

    /// The charset parameter, lowercased.
    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    pub fn set_charset(&mut self, charset: Option<&str>) -> Result<(), HeaderError> {
        let charset = charset.map(parse_charset).transpose()?;
        if self.charset != charset {
            self.charset = charset;
            self.raw.invalidate();
        }
        Ok(())
    }

    pub fn boundary(&self) -> Option<&str> {
        self.boundary.as_deref()
    }

    pub fn set_boundary(&mut self, boundary: Option<&str>) -> Result<(), HeaderError> {
        let boundary = boundary.map(parse_boundary).transpose()?;
        if self.boundary != boundary {
            self.boundary = boundary;
            self.raw.invalidate();
        }
        Ok(())
    }

    fn serialize(&self) -> Option<String> {
        let fields: Vec<String> = [
            self.media_type().map(str::to_string),
            self.charset.as_ref().map(|charset| format!("charset={charset}")),
            self.boundary.as_ref().map(|boundary| format!("boundary={boundary}")),
        ]
        .into_iter()
        .flatten()
        .collect();

        if fields.is_empty() { None } else { Some(fields.join(";")) }
    }
}

fn parse_charset(charset: &str) -> Result<String, HeaderError> {
    let charset = charset.trim();
    ensure!(is_token(charset), HeaderError::format(format!("Charset «{charset}» is not a valid token.")));
    Ok(charset.to_ascii_lowercase())
}

fn parse_boundary(boundary: &str) -> Result<String, HeaderError> {
    let boundary = boundary.trim();
    let len = boundary.chars().count();
    ensure!(
        (1..=MAX_BOUNDARY_LEN).contains(&len),
        HeaderError::format(format!("Boundary «{boundary}» must be between 1 and {MAX_BOUNDARY_LEN} chars long."))
    );
    Ok(boundary.to_string())
}

managed_header!(ContentType, "Content-Type", "content-type");
