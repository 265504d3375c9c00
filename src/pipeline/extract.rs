//! PDF text extraction: raw PDF bytes → concatenated page text.
//!
//! ## Why go through a temp file?
//!
//! Uploads arrive as byte buffers, but the parser is driven from a path. The
//! bytes are written to a [`NamedTempFile`] that lives only for the duration
//! of one extraction call; its `Drop` removes the file on success, on parse
//! failure and on early return alike, so nothing accumulates in the scratch
//! directory across requests.
//!
//! Extraction is all-or-nothing: if any page fails, including a content
//! stream that only partly decodes, the caller gets
//! [`PoQaError::DocumentParse`] and no partial text. Page text itself comes
//! from [`content`](super::content).

use crate::error::PoQaError;
use crate::pipeline::content;
use lopdf::Document;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Extract the text of every page, concatenated in page order.
///
/// No separator is inserted between pages. A document with no pages
/// yields an empty string; deciding whether that is acceptable is left to
/// the caller (the normaliser treats it as a failure).
///
/// `scratch_dir` selects where the temporary copy is written; `None` uses
/// the system temp directory.
///
/// This is blocking; async callers should use [`extract_text_async`].
pub fn extract_text(bytes: &[u8], scratch_dir: Option<&Path>) -> Result<String, PoQaError> {
    Ok(extract_page_texts(bytes, scratch_dir)?.concat())
}

/// Extract each page's text separately, in page order.
pub fn extract_page_texts(
    bytes: &[u8],
    scratch_dir: Option<&Path>,
) -> Result<Vec<String>, PoQaError> {
    if !bytes.starts_with(b"%PDF") {
        let head: Vec<u8> = bytes.iter().take(4).copied().collect();
        return Err(PoQaError::DocumentParse {
            detail: format!("missing %PDF header (first bytes: {head:?})"),
        });
    }

    let tmp = write_scratch_copy(bytes, scratch_dir)?;
    debug!("Scratch copy of PDF at {}", tmp.path().display());

    // `tmp` is dropped (and the file deleted) when this returns
    extract_from_path(tmp.path())
}

/// Async wrapper: runs the blocking extraction on the blocking thread pool.
pub async fn extract_text_async(
    bytes: Vec<u8>,
    scratch_dir: Option<std::path::PathBuf>,
) -> Result<String, PoQaError> {
    tokio::task::spawn_blocking(move || extract_text(&bytes, scratch_dir.as_deref()))
        .await
        .map_err(|e| PoQaError::Internal(format!("Extraction task panicked: {e}")))?
}

fn write_scratch_copy(bytes: &[u8], scratch_dir: Option<&Path>) -> Result<NamedTempFile, PoQaError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("po-qa-").suffix(".pdf");

    let mut tmp = match scratch_dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(|e| PoQaError::Internal(format!("tempfile: {e}")))?;

    tmp.write_all(bytes)
        .and_then(|()| tmp.flush())
        .map_err(|e| PoQaError::Internal(format!("tempfile write: {e}")))?;

    Ok(tmp)
}

fn extract_from_path(path: &Path) -> Result<Vec<String>, PoQaError> {
    let document = Document::load(path).map_err(|e| PoQaError::DocumentParse {
        detail: e.to_string(),
    })?;

    // BTreeMap keyed by 1-based page number: iteration is physical order.
    let pages = document.get_pages();
    info!("PDF loaded: {} pages", pages.len());

    let mut texts = Vec::with_capacity(pages.len());
    for (&page_num, &page_id) in &pages {
        let text = content::page_text(&document, page_num, page_id)?;
        debug!("Page {}: {} chars", page_num, text.chars().count());
        texts.push(text);
    }

    Ok(texts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_pdf_without_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_text(b"hello world", Some(dir.path())).unwrap_err();
        assert!(matches!(err, PoQaError::DocumentParse { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn empty_input_is_parse_error() {
        assert!(matches!(
            extract_text(b"", None),
            Err(PoQaError::DocumentParse { .. })
        ));
    }

    #[test]
    fn truncated_pdf_fails_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_text(b"%PDF-1.5\n%garbage with no xref", Some(dir.path())).unwrap_err();
        assert!(matches!(err, PoQaError::DocumentParse { .. }), "got {err:?}");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
