//! Post payload model and text normalization

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ApiError;

/// LinkedIn's commentary length limit, counted after trimming
pub const MAX_TEXT_CHARS: usize = 2950;

/// Who can see a published post
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    #[default]
    Public,
    Connections,
}

impl FromStr for Visibility {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PUBLIC" => Ok(Self::Public),
            "CONNECTIONS" => Ok(Self::Connections),
            other => Err(ApiError::InvalidPost(format!(
                "unknown visibility '{other}'"
            ))),
        }
    }
}

/// A validated, normalized post payload
///
/// The stored text is always valid UTF-8 with literal parentheses escaped,
/// since LinkedIn's little-text markup gives them special meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    text: String,
    visibility: Visibility,
    hashtags: Option<String>,
}

impl Post {
    pub fn new(
        text: &str,
        visibility: Visibility,
        hashtags: Option<String>,
    ) -> Result<Self, ApiError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ApiError::InvalidPost("text must not be empty".to_string()));
        }
        if trimmed.chars().count() > MAX_TEXT_CHARS {
            return Err(ApiError::InvalidPost(format!(
                "text exceeds {MAX_TEXT_CHARS} characters"
            )));
        }

        Ok(Self {
            text: escape_markup(trimmed),
            visibility,
            hashtags,
        })
    }

    /// Build a post from raw bytes, replacing undecodable sequences
    /// instead of rejecting them
    pub fn from_raw_bytes(
        raw: &[u8],
        visibility: Visibility,
        hashtags: Option<String>,
    ) -> Result<Self, ApiError> {
        Self::new(&String::from_utf8_lossy(raw), visibility, hashtags)
    }

    /// The normalized commentary text sent to the platform
    pub fn commentary(&self) -> &str {
        &self.text
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn hashtags(&self) -> Option<&str> {
        self.hashtags.as_deref()
    }
}

/// Escape characters LinkedIn's little-text markup treats specially
fn escape_markup(text: &str) -> String {
    text.replace('(', "\\(").replace(')', "\\)")
}

/// Image types LinkedIn accepts for upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMimeType {
    Jpeg,
    Png,
}

impl ImageMimeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Accept only MIME types on the allow-list
    pub fn from_declared(mime: &str) -> Result<Self, ApiError> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Ok(Self::Jpeg),
            "image/png" => Ok(Self::Png),
            other => Err(ApiError::InvalidPost(format!(
                "unsupported image type '{other}', expected image/jpeg or image/png"
            ))),
        }
    }

    fn sniff(bytes: &[u8]) -> Option<Self> {
        match infer::get(bytes)?.mime_type() {
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            _ => None,
        }
    }
}

/// Raw image content paired with its declared MIME type
#[derive(Debug, Clone)]
pub struct ImageUpload {
    bytes: Vec<u8>,
    mime_type: ImageMimeType,
}

impl ImageUpload {
    /// Validate a declared MIME type, or sniff the bytes when none was given
    pub fn new(bytes: Vec<u8>, declared_mime: Option<&str>) -> Result<Self, ApiError> {
        if bytes.is_empty() {
            return Err(ApiError::InvalidPost("image content is empty".to_string()));
        }

        let mime_type = match declared_mime {
            Some(mime) => ImageMimeType::from_declared(mime)?,
            None => ImageMimeType::sniff(&bytes).ok_or_else(|| {
                ApiError::InvalidPost(
                    "could not determine image type, declare image/jpeg or image/png".to_string(),
                )
            })?,
        };

        Ok(Self { bytes, mime_type })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> ImageMimeType {
        self.mime_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00];

    #[test]
    fn test_parentheses_are_escaped() {
        let post = Post::from_raw_bytes(b"hello (world)", Visibility::Public, None).unwrap();

        assert_eq!(post.commentary(), "hello \\(world\\)");
    }

    #[test]
    fn test_invalid_utf8_is_replaced_not_rejected() {
        let post = Post::from_raw_bytes(&[0xff, 0xfe, b'h', b'i'], Visibility::Public, None)
            .unwrap();

        assert!(post.commentary().contains('\u{FFFD}'));
        assert!(post.commentary().ends_with("hi"));
    }

    #[test]
    fn test_text_is_trimmed_and_must_be_non_empty() {
        let post = Post::new("  spaced out  ", Visibility::Public, None).unwrap();
        assert_eq!(post.commentary(), "spaced out");

        assert!(Post::new("   ", Visibility::Public, None).is_err());
        assert!(Post::new("", Visibility::Public, None).is_err());
    }

    #[test]
    fn test_text_length_limit() {
        let at_limit = "x".repeat(MAX_TEXT_CHARS);
        assert!(Post::new(&at_limit, Visibility::Public, None).is_ok());

        let over_limit = "x".repeat(MAX_TEXT_CHARS + 1);
        assert!(matches!(
            Post::new(&over_limit, Visibility::Public, None),
            Err(ApiError::InvalidPost(_))
        ));
    }

    #[test]
    fn test_visibility_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&Visibility::Public).unwrap(),
            "\"PUBLIC\""
        );
        assert_eq!(
            serde_json::to_string(&Visibility::Connections).unwrap(),
            "\"CONNECTIONS\""
        );
        assert_eq!("connections".parse::<Visibility>().unwrap(), Visibility::Connections);
        assert!("friends".parse::<Visibility>().is_err());
    }

    #[test]
    fn test_mime_allow_list() {
        assert_eq!(
            ImageMimeType::from_declared("image/png").unwrap(),
            ImageMimeType::Png
        );
        assert_eq!(
            ImageMimeType::from_declared("IMAGE/JPEG").unwrap(),
            ImageMimeType::Jpeg
        );
        assert!(ImageMimeType::from_declared("image/gif").is_err());
        assert!(ImageMimeType::from_declared("text/plain").is_err());
    }

    #[test]
    fn test_undeclared_mime_is_sniffed() {
        let image = ImageUpload::new(PNG_MAGIC.to_vec(), None).unwrap();
        assert_eq!(image.mime_type(), ImageMimeType::Png);

        // Unrecognizable bytes without a declared type are rejected
        assert!(ImageUpload::new(vec![0x00, 0x01, 0x02], None).is_err());
    }

    #[test]
    fn test_empty_image_is_rejected() {
        assert!(ImageUpload::new(Vec::new(), Some("image/png")).is_err());
    }
}
