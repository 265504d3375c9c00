//! Input normalisation: the one branch point between upload and model.
//!
//! Dispatches on [`DocumentKind`]: images go through the image adapter
//! untouched, PDFs are reduced to their text, and anything else is refused
//! before any work is done. The match is exhaustive, so a new supported
//! format cannot be added without deciding how it is normalised.

use crate::document::{DocumentKind, NormalizedInput, UploadedDocument};
use crate::error::PoQaError;
use crate::pipeline::{extract, image};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Normalise an upload into exactly one model input unit.
///
/// # Errors
/// * [`PoQaError::UnsupportedMediaType`] — declared type is not
///   jpeg/jpg/png/pdf
/// * [`PoQaError::DocumentParse`] — the PDF is malformed or has no
///   extractable text
/// * [`PoQaError::MissingInput`] — an image upload with no bytes
///
/// Blocking for PDFs; see [`normalize_async`].
pub fn normalize(
    doc: UploadedDocument,
    scratch_dir: Option<&Path>,
) -> Result<NormalizedInput, PoQaError> {
    match doc.kind() {
        DocumentKind::Image(_) => image::adapt_image(Some(doc)),
        DocumentKind::Pdf => {
            let text = extract::extract_text(doc.bytes(), scratch_dir)?;
            text_unit(text)
        }
        DocumentKind::Unsupported(media_type) => {
            debug!("Refusing upload with media type {:?}", media_type);
            Err(PoQaError::UnsupportedMediaType { media_type })
        }
    }
}

/// Async variant of [`normalize`]; PDF parsing runs on `spawn_blocking`.
pub async fn normalize_async(
    doc: UploadedDocument,
    scratch_dir: Option<PathBuf>,
) -> Result<NormalizedInput, PoQaError> {
    match doc.kind() {
        DocumentKind::Image(_) => image::adapt_image(Some(doc)),
        DocumentKind::Pdf => {
            let (bytes, _) = doc.into_parts();
            let text = extract::extract_text_async(bytes, scratch_dir).await?;
            text_unit(text)
        }
        DocumentKind::Unsupported(media_type) => {
            debug!("Refusing upload with media type {:?}", media_type);
            Err(PoQaError::UnsupportedMediaType { media_type })
        }
    }
}

/// Wrap extracted PDF text, refusing an extraction that found nothing.
fn text_unit(text: String) -> Result<NormalizedInput, PoQaError> {
    if text.trim().is_empty() {
        return Err(PoQaError::DocumentParse {
            detail: "no extractable text (scanned PDF or empty document)".into(),
        });
    }
    info!("PDF text extracted: {} chars", text.chars().count());
    Ok(NormalizedInput::Text { text })
}
