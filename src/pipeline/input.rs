//! Upload resolution: turn a user-supplied path or URL into an
//! [`UploadedDocument`].
//!
//! This is the upload boundary. It assigns a declared media type the way a
//! browser file picker would (from the extension, or from `Content-Type` for
//! downloads) and does nothing else; deciding whether that type is
//! acceptable is the normaliser's job.

use crate::document::{UploadedDocument, PDF_MEDIA_TYPE};
use crate::error::PoQaError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Media type a file picker would report for this file name.
pub fn media_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("pdf") => PDF_MEDIA_TYPE,
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Resolve the input string to an uploaded document.
///
/// `media_type` overrides whatever would otherwise be inferred.
pub async fn resolve_upload(
    input: &str,
    media_type: Option<&str>,
    timeout_secs: u64,
) -> Result<UploadedDocument, PoQaError> {
    let doc = if is_url(input) {
        download_url(input, timeout_secs).await?
    } else {
        read_local(input).await?
    };

    Ok(match media_type {
        Some(declared) => {
            let name = doc.name().map(str::to_string);
            let (bytes, _) = doc.into_parts();
            let doc = UploadedDocument::new(bytes, declared);
            match name {
                Some(n) => doc.with_name(n),
                None => doc,
            }
        }
        None => doc,
    })
}

/// Read a local file, mapping I/O failures to input errors.
async fn read_local(path_str: &str) -> Result<UploadedDocument, PoQaError> {
    if path_str.trim().is_empty() {
        return Err(PoQaError::MissingInput {
            what: "no file given".into(),
        });
    }
    let path = PathBuf::from(path_str);

    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PoQaError::FileNotFound { path: path.clone() },
        std::io::ErrorKind::PermissionDenied => PoQaError::PermissionDenied { path: path.clone() },
        _ => PoQaError::InvalidInput {
            input: format!("{path_str} ({e})"),
        },
    })?;

    let media_type = media_type_for_path(&path);
    debug!("Read {} ({} bytes, {})", path.display(), bytes.len(), media_type);

    let doc = UploadedDocument::new(bytes, media_type);
    Ok(match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => doc.with_name(name),
        None => doc,
    })
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<UploadedDocument, PoQaError> {
    info!("Downloading document from: {}", url);

    if timeout_secs == 0 {
        return Err(PoQaError::Configuration(
            "download timeout must be ≥ 1s".into(),
        ));
    }

    let parsed = reqwest::Url::parse(url).map_err(|_| PoQaError::InvalidInput {
        input: url.to_string(),
    })?;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| PoQaError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let download_err = |e: reqwest::Error| {
        if e.is_timeout() {
            PoQaError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            PoQaError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let response = client.get(parsed.clone()).send().await.map_err(download_err)?;

    if !response.status().is_success() {
        return Err(PoQaError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let file_name = file_name_from_url(&parsed);
    let header_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
        .filter(|v| !v.is_empty() && v != "application/octet-stream");

    let media_type = header_type.unwrap_or_else(|| {
        media_type_for_path(Path::new(file_name.as_deref().unwrap_or_default())).to_string()
    });

    let bytes = response.bytes().await.map_err(download_err)?;
    info!("Downloaded {} bytes ({})", bytes.len(), media_type);

    let doc = UploadedDocument::new(bytes.to_vec(), media_type);
    Ok(match file_name {
        Some(name) => doc.with_name(name),
        None => doc,
    })
}

/// Last non-empty path segment of the URL, if any.
fn file_name_from_url(url: &reqwest::Url) -> Option<String> {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|last| !last.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/po.pdf"));
        assert!(is_url("http://example.com/po.png"));
        assert!(!is_url("/tmp/po.pdf"));
        assert!(!is_url("po.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn media_type_from_extension() {
        assert_eq!(media_type_for_path(Path::new("po.PNG")), "image/png");
        assert_eq!(media_type_for_path(Path::new("scan.jpg")), "image/jpeg");
        assert_eq!(media_type_for_path(Path::new("scan.jpeg")), "image/jpeg");
        assert_eq!(media_type_for_path(Path::new("po.pdf")), "application/pdf");
        assert_eq!(media_type_for_path(Path::new("notes.txt")), "text/plain");
        assert_eq!(
            media_type_for_path(Path::new("README")),
            "application/octet-stream"
        );
    }

    #[test]
    fn file_name_from_url_segments() {
        let url = reqwest::Url::parse("https://example.com/files/po-123.pdf").unwrap();
        assert_eq!(file_name_from_url(&url).as_deref(), Some("po-123.pdf"));
        let url = reqwest::Url::parse("https://example.com/").unwrap();
        assert_eq!(file_name_from_url(&url), None);
    }

    #[tokio::test]
    async fn zero_download_timeout_is_refused() {
        let err = resolve_upload("http://127.0.0.1:9/po.pdf", None, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, PoQaError::Configuration(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn missing_file() {
        let err = resolve_upload("/definitely/not/here/po.pdf", None, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, PoQaError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn local_file_with_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("po.bin");
        std::fs::write(&path, b"\x89PNG").unwrap();

        let doc = resolve_upload(path.to_str().unwrap(), None, 5).await.unwrap();
        assert_eq!(doc.media_type(), "application/octet-stream");
        assert_eq!(doc.name(), Some("po.bin"));

        let doc = resolve_upload(path.to_str().unwrap(), Some("image/png"), 5)
            .await
            .unwrap();
        assert_eq!(doc.media_type(), "image/png");
        assert_eq!(doc.bytes(), b"\x89PNG");
        assert_eq!(doc.name(), Some("po.bin"));
    }
}
