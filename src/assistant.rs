//! Request/response entry points.
//!
//! An [`Assistant`] is built once at startup. Construction is where a
//! missing credential is caught: without a provider there is no assistant,
//! so no question can reach the network unconfigured. Each method then runs
//! one user action to completion; nothing is carried between calls except
//! the feedback file on disk.

use crate::config::AssistantConfig;
use crate::document::{NormalizedInput, UploadedDocument};
use crate::error::PoQaError;
use crate::feedback::{FeedbackLog, FeedbackRecord};
use crate::output::QueryOutcome;
use crate::pipeline::llm::{self, QueryRequest};
use crate::pipeline::{input, normalize};
use crate::provider::{GeminiProvider, GenerativeModel};
use std::sync::Arc;
use tracing::{debug, info};

/// Question-answering session over purchase-order documents.
pub struct Assistant {
    provider: Arc<dyn GenerativeModel>,
    feedback: FeedbackLog,
    config: AssistantConfig,
}

impl std::fmt::Debug for Assistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("provider", &self.provider.name())
            .field("model", &self.provider.model())
            .field("feedback", &self.feedback)
            .finish()
    }
}

impl Assistant {
    /// Resolve the provider and build the assistant.
    ///
    /// Uses `config.provider` when set, otherwise a [`GeminiProvider`] with
    /// the configured key.
    ///
    /// # Errors
    /// [`PoQaError::Configuration`] when no provider is given and no API key
    /// is configured.
    pub fn new(config: AssistantConfig) -> Result<Self, PoQaError> {
        let provider = resolve_provider(&config)?;
        info!("Using {} model {}", provider.name(), provider.model());
        Ok(Self {
            provider,
            feedback: FeedbackLog::new(config.feedback_log.clone()),
            config,
        })
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<dyn GenerativeModel> {
        &self.provider
    }

    pub fn feedback_log(&self) -> &FeedbackLog {
        &self.feedback
    }

    /// Normalise an upload; PDF parsing runs off the async workers.
    pub async fn prepare(&self, doc: UploadedDocument) -> Result<NormalizedInput, PoQaError> {
        normalize::normalize_async(doc, self.config.scratch_dir.clone()).await
    }

    /// Resolve a path or URL and normalise it in one step.
    pub async fn prepare_path(
        &self,
        input_str: &str,
        media_type: Option<&str>,
    ) -> Result<NormalizedInput, PoQaError> {
        let doc =
            input::resolve_upload(input_str, media_type, self.config.download_timeout_secs).await?;
        self.prepare(doc).await
    }

    /// Ask a question about a prepared document.
    ///
    /// # Errors
    /// [`PoQaError::MissingInput`] when there is no document or the question
    /// is blank; the model is not called in that case. A failed model call
    /// is **not** an error: it comes back as an outcome with no response.
    pub async fn ask(
        &self,
        question: &str,
        input: Option<&NormalizedInput>,
    ) -> Result<QueryOutcome, PoQaError> {
        let input = input.ok_or_else(|| PoQaError::MissingInput {
            what: "no document uploaded".into(),
        })?;
        if question.trim().is_empty() {
            return Err(PoQaError::MissingInput {
                what: "no question entered".into(),
            });
        }

        let request = QueryRequest::new(self.config.system_prompt(), question, input.clone());
        debug!("Asking: {:?}", question);
        Ok(llm::query_model(&self.provider, &request, &self.config).await)
    }

    /// Append a reviewer's verdict to the feedback log.
    ///
    /// Independent of any earlier answer: failure here never affects an
    /// outcome the caller already holds.
    pub async fn record_feedback(&self, record: &FeedbackRecord) -> Result<(), PoQaError> {
        self.feedback.append(record).await
    }
}

/// Synchronous wrapper around [`Assistant::prepare`] + [`Assistant::ask`].
///
/// Creates a temporary tokio runtime internally; do not call from inside an
/// async context.
pub fn ask_sync(
    assistant: &Assistant,
    question: &str,
    doc: UploadedDocument,
) -> Result<QueryOutcome, PoQaError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PoQaError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(async {
            let input = assistant.prepare(doc).await?;
            assistant.ask(question, Some(&input)).await
        })
}

/// Resolve the provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`) — used as-is; this is how
///    tests and embedders inject their own backend.
/// 2. **Gemini** with `config.api_key` — refused when no key is set.
fn resolve_provider(config: &AssistantConfig) -> Result<Arc<dyn GenerativeModel>, PoQaError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let gemini = GeminiProvider::from_config(config)?;
    Ok(Arc::new(gemini))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_key_no_assistant() {
        let err = Assistant::new(AssistantConfig::default()).unwrap_err();
        assert!(matches!(err, PoQaError::Configuration(_)));
    }

    #[test]
    fn key_builds_gemini_assistant() {
        let config = AssistantConfig::builder().api_key("k").build().unwrap();
        let assistant = Assistant::new(config).unwrap();
        assert_eq!(assistant.provider().name(), "gemini");
        assert_eq!(assistant.provider().model(), "gemini-1.5-flash");
    }

    #[tokio::test]
    async fn blank_question_is_missing_input() {
        let config = AssistantConfig::builder().api_key("k").build().unwrap();
        let assistant = Assistant::new(config).unwrap();
        let unit = NormalizedInput::Text { text: "x".into() };
        let err = assistant.ask("   ", Some(&unit)).await.unwrap_err();
        assert!(matches!(err, PoQaError::MissingInput { .. }));
        let err = assistant.ask("Total?", None).await.unwrap_err();
        assert!(matches!(err, PoQaError::MissingInput { .. }));
    }
}
