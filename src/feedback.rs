//! Reviewer feedback log.
//!
//! After an answer is shown, a customer-service reviewer marks it correct or
//! incorrect and may add a comment. Each submission becomes one line in an
//! append-only text file. The program only ever writes this file.
//!
//! Lines are single JSON objects. JSON escaping keeps a multi-line comment
//! on one line, and the result stays readable with `cat` or `grep`.

use crate::error::PoQaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::io::AsyncWriteExt;
use tracing::info;

/// The reviewer's judgement of an answer.
///
/// Rendered as `"Yes"` / `"No"`, the labels of the review control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Yes")]
    Correct,
    #[serde(rename = "No")]
    Incorrect,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Correct => "Yes",
            Verdict::Incorrect => "No",
        })
    }
}

impl FromStr for Verdict {
    type Err = PoQaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "correct" | "true" => Ok(Verdict::Correct),
            "no" | "n" | "incorrect" | "false" => Ok(Verdict::Incorrect),
            _ => Err(PoQaError::InvalidVerdict {
                value: s.trim().to_string(),
            }),
        }
    }
}

/// One submitted review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub query: String,
    /// `None` when the model call failed; serialised as `null`.
    pub response: Option<String>,
    pub validation: Verdict,
    pub feedback: String,
}

impl FeedbackRecord {
    /// Render as a single log line (no trailing newline).
    pub fn to_line(&self) -> Result<String, PoQaError> {
        serde_json::to_string(self)
            .map_err(|e| PoQaError::Internal(format!("serialise feedback: {e}")))
    }
}

/// Append-only feedback file.
///
/// The file is opened, appended and closed on every write; no handle is
/// held between submissions. Writers are assumed to be a single process.
#[derive(Debug, Clone)]
pub struct FeedbackLog {
    path: PathBuf,
}

impl FeedbackLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as one line, creating the file if needed.
    ///
    /// # Errors
    /// [`PoQaError::LogWrite`] on any I/O failure. Nothing already in the
    /// file is modified either way.
    pub async fn append(&self, record: &FeedbackRecord) -> Result<(), PoQaError> {
        let mut line = record.to_line()?;
        line.push('\n');

        let log_err = |source: std::io::Error| PoQaError::LogWrite {
            path: self.path.clone(),
            source,
        };

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(log_err)?;
        file.write_all(line.as_bytes()).await.map_err(log_err)?;
        file.flush().await.map_err(log_err)?;

        info!(
            "Feedback logged to {} (validation: {})",
            self.path.display(),
            record.validation
        );
        Ok(())
    }
}
