//! Document types: what the upload boundary delivers and what the model sees.
//!
//! An [`UploadedDocument`] is whatever the user handed us, tagged with the
//! media type the upload control declared. The normaliser turns it into a
//! [`NormalizedInput`], the single canonical unit passed to the model:
//! either the raw image bytes or the text extracted from a PDF.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Media type reported for every [`NormalizedInput::Text`] unit.
pub const TEXT_MEDIA_TYPE: &str = "text/plain";

/// Declared media type for PDF uploads.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Raw bytes of an upload plus its declared media type.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    bytes: Vec<u8>,
    media_type: String,
    name: Option<String>,
}

impl UploadedDocument {
    pub fn new(bytes: impl Into<Vec<u8>>, media_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: media_type.into(),
            name: None,
        }
    }

    /// Attach a display name (usually the original file name).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn kind(&self) -> DocumentKind {
        DocumentKind::classify(&self.media_type)
    }

    /// Split into `(bytes, declared media type)`.
    pub fn into_parts(self) -> (Vec<u8>, String) {
        (self.bytes, self.media_type)
    }
}

impl fmt::Debug for UploadedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedDocument")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Image formats the model accepts directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageMediaType {
    /// `image/jpeg`
    Jpeg,
    /// `image/jpg` — non-standard, but some browsers report it.
    Jpg,
    /// `image/png`
    Png,
}

impl ImageMediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageMediaType::Jpeg => "image/jpeg",
            ImageMediaType::Jpg => "image/jpg",
            ImageMediaType::Png => "image/png",
        }
    }

    /// The pixel format the `image` crate should detect for this type.
    pub fn expected_format(self) -> image::ImageFormat {
        match self {
            ImageMediaType::Jpeg | ImageMediaType::Jpg => image::ImageFormat::Jpeg,
            ImageMediaType::Png => image::ImageFormat::Png,
        }
    }
}

/// What a declared media type means to the normaliser.
///
/// Every string maps to exactly one variant; consumers `match` exhaustively,
/// so supporting a new format means adding a variant here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentKind {
    Image(ImageMediaType),
    Pdf,
    Unsupported(String),
}

impl DocumentKind {
    /// Classify a declared media type.
    ///
    /// Comparison ignores case, surrounding whitespace and any `;param=…`
    /// suffix (`application/pdf; charset=binary` is still a PDF).
    pub fn classify(media_type: &str) -> Self {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "image/jpeg" => DocumentKind::Image(ImageMediaType::Jpeg),
            "image/jpg" => DocumentKind::Image(ImageMediaType::Jpg),
            "image/png" => DocumentKind::Image(ImageMediaType::Png),
            PDF_MEDIA_TYPE => DocumentKind::Pdf,
            _ => DocumentKind::Unsupported(media_type.to_string()),
        }
    }
}

/// The canonical unit handed to the model.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizedInput {
    /// Image bytes passed through untouched, tagged with the declared type.
    Image { media_type: String, bytes: Vec<u8> },
    /// Text extracted from a PDF; always reported as `text/plain`.
    Text { text: String },
}

impl NormalizedInput {
    pub fn media_type(&self) -> &str {
        match self {
            NormalizedInput::Image { media_type, .. } => media_type,
            NormalizedInput::Text { .. } => TEXT_MEDIA_TYPE,
        }
    }

    /// Payload bytes as sent to the model (UTF-8 for text).
    pub fn bytes(&self) -> &[u8] {
        match self {
            NormalizedInput::Image { bytes, .. } => bytes,
            NormalizedInput::Text { text } => text.as_bytes(),
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, NormalizedInput::Image { .. })
    }

    /// Short human-readable rendering for display before asking.
    ///
    /// Text is cut at `max_chars` characters (not bytes) and suffixed with
    /// `...` when anything was dropped.
    pub fn preview(&self, max_chars: usize) -> String {
        match self {
            NormalizedInput::Image { media_type, bytes } => {
                format!("[{} image, {} bytes]", media_type, bytes.len())
            }
            NormalizedInput::Text { text } => match text.char_indices().nth(max_chars) {
                Some((cut, _)) => format!("{}...", &text[..cut]),
                None => text.clone(),
            },
        }
    }
}

impl fmt::Debug for NormalizedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedInput::Image { media_type, bytes } => f
                .debug_struct("Image")
                .field("media_type", media_type)
                .field("len", &bytes.len())
                .finish(),
            NormalizedInput::Text { text } => f
                .debug_struct("Text")
                .field("chars", &text.chars().count())
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_supported_types() {
        assert_eq!(
            DocumentKind::classify("image/png"),
            DocumentKind::Image(ImageMediaType::Png)
        );
        assert_eq!(
            DocumentKind::classify("image/jpeg"),
            DocumentKind::Image(ImageMediaType::Jpeg)
        );
        assert_eq!(
            DocumentKind::classify("image/jpg"),
            DocumentKind::Image(ImageMediaType::Jpg)
        );
        assert_eq!(DocumentKind::classify("application/pdf"), DocumentKind::Pdf);
    }

    #[test]
    fn classify_ignores_case_and_params() {
        assert_eq!(
            DocumentKind::classify(" Application/PDF; charset=binary"),
            DocumentKind::Pdf
        );
        assert_eq!(
            DocumentKind::classify("IMAGE/PNG"),
            DocumentKind::Image(ImageMediaType::Png)
        );
    }

    #[test]
    fn classify_unsupported_keeps_declared_string() {
        for ty in ["text/plain", "image/gif", "", "application/octet-stream"] {
            assert_eq!(
                DocumentKind::classify(ty),
                DocumentKind::Unsupported(ty.to_string())
            );
        }
    }

    #[test]
    fn text_unit_reports_text_plain() {
        let unit = NormalizedInput::Text {
            text: "Total: $500".into(),
        };
        assert_eq!(unit.media_type(), TEXT_MEDIA_TYPE);
        assert_eq!(unit.bytes(), b"Total: $500");
        assert!(!unit.is_image());
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let unit = NormalizedInput::Text {
            text: "ééééé".into(),
        };
        assert_eq!(unit.preview(3), "ééé...");
        assert_eq!(unit.preview(5), "ééééé");
        assert_eq!(unit.preview(50), "ééééé");
    }

    #[test]
    fn preview_summarises_images() {
        let unit = NormalizedInput::Image {
            media_type: "image/png".into(),
            bytes: vec![0; 42],
        };
        assert_eq!(unit.preview(1500), "[image/png image, 42 bytes]");
    }

    #[test]
    fn debug_does_not_dump_bytes() {
        let doc = UploadedDocument::new(vec![7u8; 4096], "image/png").with_name("po.png");
        let dbg = format!("{doc:?}");
        assert!(dbg.contains("4096"));
        assert!(dbg.contains("po.png"));
        assert!(!dbg.contains("7, 7"));
    }
}
