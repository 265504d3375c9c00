//! Image adapter: uploaded image → [`NormalizedInput::Image`].
//!
//! The bytes are passed through untouched. Gemini decodes the image itself,
//! so re-encoding here would only cost time and risk changing what the model
//! sees. The declared media type is trusted; a trial decode is logged when
//! it fails but never rejects the upload.

use crate::document::{DocumentKind, ImageMediaType, NormalizedInput, UploadedDocument};
use crate::error::PoQaError;
use tracing::{debug, warn};

/// Wrap an uploaded image as a normalized input unit.
///
/// # Errors
/// * [`PoQaError::MissingInput`] — no document, or a document with no bytes
/// * [`PoQaError::UnsupportedMediaType`] — the declared type is not an image
///   type the model accepts
pub fn adapt_image(doc: Option<UploadedDocument>) -> Result<NormalizedInput, PoQaError> {
    let doc = doc.ok_or_else(|| PoQaError::MissingInput {
        what: "no file uploaded".into(),
    })?;

    let image_type = match doc.kind() {
        DocumentKind::Image(t) => t,
        DocumentKind::Pdf | DocumentKind::Unsupported(_) => {
            return Err(PoQaError::UnsupportedMediaType {
                media_type: doc.media_type().to_string(),
            })
        }
    };

    let (bytes, media_type) = doc.into_parts();
    if bytes.is_empty() {
        return Err(PoQaError::MissingInput {
            what: "uploaded image is empty".into(),
        });
    }

    check_signature(&bytes, image_type);
    debug!("Image input: {} ({} bytes)", media_type, bytes.len());

    Ok(NormalizedInput::Image { media_type, bytes })
}

/// Log when the bytes do not decode as the declared format.
fn check_signature(bytes: &[u8], declared: ImageMediaType) {
    if let Err(e) = image::load_from_memory_with_format(bytes, declared.expected_format()) {
        warn!(
            "Declared {} but content does not decode as {:?} ({}); sending as declared",
            declared.as_str(),
            declared.expected_format(),
            e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn passes_bytes_through_for_every_image_type() {
        for ty in ["image/jpeg", "image/png", "image/jpg"] {
            let bytes = vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3];
            let unit = adapt_image(Some(UploadedDocument::new(bytes.clone(), ty))).unwrap();
            match unit {
                NormalizedInput::Image {
                    media_type,
                    bytes: out,
                } => {
                    assert_eq!(media_type, ty);
                    assert_eq!(out, bytes);
                }
                other => panic!("expected image unit, got {other:?}"),
            }
        }
    }

    #[test]
    fn keeps_declared_type_verbatim() {
        let unit = adapt_image(Some(UploadedDocument::new(PNG_SIGNATURE, "IMAGE/PNG"))).unwrap();
        assert_eq!(unit.media_type(), "IMAGE/PNG");
    }

    #[test]
    fn undecodable_bytes_are_not_rejected() {
        let unit = adapt_image(Some(UploadedDocument::new(b"not an image".to_vec(), "image/png")));
        assert!(unit.is_ok());
    }

    #[test]
    fn absent_document_is_missing_input() {
        assert!(matches!(
            adapt_image(None),
            Err(PoQaError::MissingInput { .. })
        ));
    }

    #[test]
    fn empty_image_is_missing_input() {
        assert!(matches!(
            adapt_image(Some(UploadedDocument::new(Vec::new(), "image/png"))),
            Err(PoQaError::MissingInput { .. })
        ));
    }

    #[test]
    fn pdf_is_not_an_image() {
        assert!(matches!(
            adapt_image(Some(UploadedDocument::new(b"%PDF-1.5".to_vec(), "application/pdf"))),
            Err(PoQaError::UnsupportedMediaType { .. })
        ));
    }
}
