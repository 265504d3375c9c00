//! Error types for the po-qa library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PoQaError`] — **Fatal** for the current request: the document cannot
//!   be normalised, the provider is not configured, or the feedback log
//!   could not be written. Returned as `Err(PoQaError)`.
//!
//! * [`ModelCallError`] — **Non-fatal**: the remote model did not produce an
//!   answer. Stored inside [`crate::output::QueryOutcome`] so the caller
//!   still gets an outcome (with no response) and the validation and
//!   feedback steps stay usable.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the po-qa library.
///
/// Model-call failures use [`ModelCallError`] and are stored in
/// [`crate::output::QueryOutcome`] rather than propagated here, unless the
/// caller opts in via [`crate::output::QueryOutcome::into_result`].
#[derive(Debug, Error)]
pub enum PoQaError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// A document or a question was required but not supplied.
    #[error("Missing input: {what}\nPlease upload an image or PDF and enter a query.")]
    MissingInput { what: String },

    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is neither a readable path nor an HTTP/HTTPS URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Document errors ───────────────────────────────────────────────────
    /// The PDF could not be parsed, a page failed, or no text was found.
    #[error("Could not read PDF: {detail}")]
    DocumentParse { detail: String },

    /// The declared media type is not one the normaliser accepts.
    #[error(
        "Unsupported media type '{media_type}'\n\
Supported: image/jpeg, image/jpg, image/png, application/pdf."
    )]
    UnsupportedMediaType { media_type: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The remote model call failed and the caller asked for a hard error.
    #[error(transparent)]
    ModelCall(#[from] ModelCallError),

    // ── Review errors ─────────────────────────────────────────────────────
    /// A reviewer verdict that is neither yes nor no.
    #[error("Invalid verdict '{value}': expected yes or no")]
    InvalidVerdict { value: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not append to the feedback log.
    #[error("Failed to write feedback log '{path}': {source}")]
    LogWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Missing credential or an invalid configuration value.
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal failure of a single model call.
///
/// Stored in [`crate::output::QueryOutcome::error`]; the outcome's response
/// is `None` whenever this is set. Nothing here is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ModelCallError {
    /// HTTP 401/403: the key was rejected.
    #[error("Authentication error from '{provider}' (HTTP {status}): {message}")]
    Auth {
        provider: String,
        status: u16,
        message: String,
    },

    /// HTTP 429: quota or rate limit exhausted.
    #[error("Rate limit or quota exceeded for '{provider}': {message}")]
    RateLimited { provider: String, message: String },

    /// Any other non-success HTTP status.
    #[error("Model API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Connection, TLS or DNS failure before a status was received.
    #[error("Network error calling the model: {detail}")]
    Transport { detail: String },

    /// The call exceeded the configured per-call timeout.
    #[error("Model call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The reply could not be decoded or carried no text.
    #[error("Malformed model response: {detail}")]
    MalformedResponse { detail: String },

    /// The service refused to answer (safety block or similar).
    #[error("Model refused to answer: {reason}")]
    Blocked { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_media_type_display() {
        let e = PoQaError::UnsupportedMediaType {
            media_type: "text/plain".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("text/plain"), "got: {msg}");
        assert!(msg.contains("application/pdf"));
    }

    #[test]
    fn model_call_is_transparent() {
        let e: PoQaError = ModelCallError::Timeout { secs: 30 }.into();
        assert_eq!(e.to_string(), "Model call timed out after 30s");
    }

    #[test]
    fn auth_error_display() {
        let e = ModelCallError::Auth {
            provider: "gemini".into(),
            status: 403,
            message: "API key not valid".into(),
        };
        assert!(e.to_string().contains("gemini"));
        assert!(e.to_string().contains("403"));
        assert!(e.to_string().contains("API key not valid"));
    }

    #[test]
    fn log_write_keeps_source() {
        use std::error::Error as _;
        let e = PoQaError::LogWrite {
            path: PathBuf::from("/nope/feedback_log.txt"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such dir"),
        };
        assert!(e.to_string().contains("feedback_log.txt"));
        assert!(e.source().is_some());
    }

    #[test]
    fn model_call_error_serialises() {
        let e = ModelCallError::Blocked {
            reason: "SAFETY".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("SAFETY"));
    }
}
