//! The seam between the query client and a hosted model.
//!
//! [`GenerativeModel`] is deliberately small: one call that takes the
//! ordered request context and returns text or a [`ModelCallError`]. The
//! assistant holds it as `Arc<dyn GenerativeModel>`, so tests and embedders
//! can inject their own implementation through
//! [`crate::config::AssistantConfigBuilder::provider`].

pub mod gemini;

pub use gemini::GeminiProvider;

use crate::error::ModelCallError;
use crate::pipeline::llm::QueryRequest;
use async_trait::async_trait;

/// Text produced by one model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub prompt_tokens: u32,
    pub output_tokens: u32,
}

impl Generation {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            prompt_tokens: 0,
            output_tokens: 0,
        }
    }
}

/// A remote text-generation service.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Short provider name used in logs and errors, e.g. `"gemini"`.
    fn name(&self) -> &str;

    /// Model identifier, e.g. `"gemini-1.5-flash"`.
    fn model(&self) -> &str;

    /// Generate an answer for `request`.
    ///
    /// Implementations must not retry; the caller decides what a failure
    /// means.
    async fn generate(&self, request: &QueryRequest) -> Result<Generation, ModelCallError>;
}
