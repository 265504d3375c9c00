//! Result of asking a question.

use crate::error::{ModelCallError, PoQaError};
use crate::feedback::{FeedbackRecord, Verdict};
use serde::{Deserialize, Serialize};

/// What came back from one model call.
///
/// `response` is `None` exactly when `error` is `Some`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOutcome {
    /// The question as asked.
    pub question: String,
    /// The generated answer, absent when the call failed.
    pub response: Option<String>,
    /// Model that was asked.
    pub model: String,
    pub prompt_tokens: u32,
    pub output_tokens: u32,
    /// Wall-clock time of the call in milliseconds.
    pub duration_ms: u64,
    /// Why there is no response.
    pub error: Option<ModelCallError>,
}

impl QueryOutcome {
    pub fn is_answered(&self) -> bool {
        self.response.is_some()
    }

    /// Treat a failed call as an error.
    pub fn into_result(self) -> Result<String, PoQaError> {
        match (self.response, self.error) {
            (Some(text), _) => Ok(text),
            (None, Some(e)) => Err(PoQaError::ModelCall(e)),
            (None, None) => Err(PoQaError::Internal("outcome has neither response nor error".into())),
        }
    }

    /// Build the feedback record for this outcome.
    pub fn feedback(&self, validation: Verdict, feedback: impl Into<String>) -> FeedbackRecord {
        FeedbackRecord {
            query: self.question.clone(),
            response: self.response.clone(),
            validation,
            feedback: feedback.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed() -> QueryOutcome {
        QueryOutcome {
            question: "Total?".into(),
            response: None,
            model: "gemini-1.5-flash".into(),
            prompt_tokens: 0,
            output_tokens: 0,
            duration_ms: 12,
            error: Some(ModelCallError::Transport {
                detail: "dns".into(),
            }),
        }
    }

    #[test]
    fn into_result_surfaces_model_error() {
        let err = failed().into_result().unwrap_err();
        assert!(matches!(err, PoQaError::ModelCall(ModelCallError::Transport { .. })));
    }

    #[test]
    fn feedback_on_failed_call_records_absent_response() {
        let record = failed().feedback(Verdict::Incorrect, "no answer shown");
        assert_eq!(record.query, "Total?");
        assert_eq!(record.response, None);
        assert_eq!(record.validation, Verdict::Incorrect);
    }

    #[test]
    fn answered_outcome() {
        let mut outcome = failed();
        outcome.response = Some("$500".into());
        outcome.error = None;
        assert!(outcome.is_answered());
        assert_eq!(outcome.into_result().unwrap(), "$500");
    }
}
