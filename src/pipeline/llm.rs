//! Model query: one question about one document, best effort.
//!
//! [`query_model`] never returns an error. A failed call is logged and
//! reported inside the [`QueryOutcome`] with no response, so the caller can
//! still show the validation and feedback controls. There is no retry.

use crate::config::AssistantConfig;
use crate::document::NormalizedInput;
use crate::error::ModelCallError;
use crate::output::QueryOutcome;
use crate::provider::GenerativeModel;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

/// Everything sent to the model for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    system_prompt: String,
    question: String,
    input: NormalizedInput,
}

/// One element of the ordered request context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextPart<'a> {
    Text(&'a str),
    Input(&'a NormalizedInput),
}

impl QueryRequest {
    /// The question may be empty here; refusing blank questions is the
    /// assistant's call, not the request's.
    pub fn new(
        system_prompt: impl Into<String>,
        question: impl Into<String>,
        input: NormalizedInput,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            question: question.into(),
            input,
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn input(&self) -> &NormalizedInput {
        &self.input
    }

    /// Context in the order the model receives it:
    /// question, document, system prompt.
    pub fn context(&self) -> [ContextPart<'_>; 3] {
        [
            ContextPart::Text(&self.question),
            ContextPart::Input(&self.input),
            ContextPart::Text(&self.system_prompt),
        ]
    }
}

/// Ask the provider one question.
///
/// ## Return Value
///
/// Always returns a `QueryOutcome`. On failure `response` is `None` and
/// `error` carries the reason; callers check `outcome.error` rather than
/// handling a `Result`.
pub async fn query_model(
    provider: &Arc<dyn GenerativeModel>,
    request: &QueryRequest,
    config: &AssistantConfig,
) -> QueryOutcome {
    let start = Instant::now();
    debug!(
        "Querying {}/{} with {} input",
        provider.name(),
        provider.model(),
        request.input().media_type()
    );

    let call = provider.generate(request);
    let result = match config.api_timeout_secs {
        Some(secs) => match timeout(Duration::from_secs(secs), call).await {
            Ok(result) => result,
            Err(_) => Err(ModelCallError::Timeout { secs }),
        },
        None => call.await,
    };
    let duration_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(generation) => {
            info!(
                "Model answered: {} input tokens, {} output tokens, {}ms",
                generation.prompt_tokens, generation.output_tokens, duration_ms
            );
            QueryOutcome {
                question: request.question().to_string(),
                response: Some(generation.text),
                model: provider.model().to_string(),
                prompt_tokens: generation.prompt_tokens,
                output_tokens: generation.output_tokens,
                duration_ms,
                error: None,
            }
        }
        Err(e) => {
            warn!("Error with {} model: {}", provider.name(), e);
            QueryOutcome {
                question: request.question().to_string(),
                response: None,
                model: provider.model().to_string(),
                prompt_tokens: 0,
                output_tokens: 0,
                duration_ms,
                error: Some(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Generation;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Scripted {
        reply: Result<Generation, ModelCallError>,
        seen: Mutex<Vec<QueryRequest>>,
        delay_ms: u64,
    }

    #[async_trait]
    impl GenerativeModel for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }
        fn model(&self) -> &str {
            "scripted-1"
        }
        async fn generate(&self, request: &QueryRequest) -> Result<Generation, ModelCallError> {
            self.seen.lock().unwrap().push(request.clone());
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            self.reply.clone()
        }
    }

    fn provider(reply: Result<Generation, ModelCallError>, delay_ms: u64) -> Arc<Scripted> {
        Arc::new(Scripted {
            reply,
            seen: Mutex::new(Vec::new()),
            delay_ms,
        })
    }

    fn request() -> QueryRequest {
        QueryRequest::new(
            "SYSTEM",
            "Total?",
            NormalizedInput::Text {
                text: "Total: $500".into(),
            },
        )
    }

    #[test]
    fn context_order_is_question_input_prompt() {
        let req = request();
        let ctx = req.context();
        assert_eq!(ctx[0], ContextPart::Text("Total?"));
        assert_eq!(ctx[1], ContextPart::Input(req.input()));
        assert_eq!(ctx[2], ContextPart::Text("SYSTEM"));
    }

    #[tokio::test]
    async fn success_carries_text_and_usage() {
        let scripted = provider(
            Ok(Generation {
                text: "$500".into(),
                prompt_tokens: 10,
                output_tokens: 2,
            }),
            0,
        );
        let p: Arc<dyn GenerativeModel> = scripted.clone();
        let outcome = query_model(&p, &request(), &AssistantConfig::default()).await;
        assert_eq!(outcome.response.as_deref(), Some("$500"));
        assert_eq!(outcome.model, "scripted-1");
        assert_eq!(outcome.prompt_tokens, 10);
        assert!(outcome.error.is_none());
        assert_eq!(scripted.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failure_degrades_to_no_response() {
        let err = ModelCallError::Transport {
            detail: "connection refused".into(),
        };
        let p: Arc<dyn GenerativeModel> = provider(Err(err.clone()), 0);
        let outcome = query_model(&p, &request(), &AssistantConfig::default()).await;
        assert!(outcome.response.is_none());
        assert_eq!(outcome.error, Some(err));
        assert_eq!(outcome.question, "Total?");
    }

    #[tokio::test]
    async fn timeout_is_reported_not_raised() {
        let p: Arc<dyn GenerativeModel> = provider(Ok(Generation::new("late")), 3_000);
        let config = AssistantConfig::builder().api_timeout_secs(1).build().unwrap();
        let outcome = query_model(&p, &request(), &config).await;
        assert!(outcome.response.is_none());
        assert_eq!(outcome.error, Some(ModelCallError::Timeout { secs: 1 }));
    }
}
