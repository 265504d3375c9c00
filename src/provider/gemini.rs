//! Gemini `generateContent` over plain HTTPS.
//!
//! The request carries a single user turn whose parts mirror the ordered
//! context of a [`QueryRequest`]: the question, the document as an inline
//! blob, then the system instruction. Both image and text units travel as
//! `inlineData`; Gemini accepts `text/plain` blobs the same way it accepts
//! images.

use crate::config::{ApiKey, AssistantConfig};
use crate::error::{ModelCallError, PoQaError};
use crate::pipeline::encode::{encode_input, InlineData};
use crate::pipeline::llm::{ContextPart, QueryRequest};
use crate::provider::{GenerativeModel, Generation};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

const PROVIDER_NAME: &str = "gemini";

/// [`GenerativeModel`] backed by the Gemini REST API.
pub struct GeminiProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: ApiKey,
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
}

impl GeminiProvider {
    /// Create a provider for `model`.
    ///
    /// # Errors
    /// [`PoQaError::Configuration`] when `api_key` is `None`. No network
    /// I/O happens before this check.
    pub fn new(api_key: Option<ApiKey>, model: impl Into<String>) -> Result<Self, PoQaError> {
        let api_key = api_key.ok_or_else(|| {
            PoQaError::Configuration(format!(
                "Google API key is not set.\nSet {} (or {}) or pass --api-key.",
                crate::config::API_KEY_ENV_VARS[0],
                crate::config::API_KEY_ENV_VARS[1]
            ))
        })?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("po-qa/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PoQaError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: crate::config::DEFAULT_ENDPOINT.to_string(),
            model: model.into(),
            api_key,
            temperature: None,
            max_output_tokens: None,
        })
    }

    /// Create a provider from every Gemini-related config field.
    pub fn from_config(config: &AssistantConfig) -> Result<Self, PoQaError> {
        let mut provider = Self::new(config.api_key.clone(), config.model.clone())?
            .with_endpoint(config.endpoint.clone());
        provider.temperature = config.temperature;
        provider.max_output_tokens = config.max_output_tokens;
        Ok(provider)
    }

    /// Point at a different base URL (proxy, regional endpoint, test server).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl GenerativeModel for GeminiProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &QueryRequest) -> Result<Generation, ModelCallError> {
        let body = build_body(request, self.temperature, self.max_output_tokens);
        debug!("POST {} ({} parts)", self.url(), body.contents[0].parts.len());

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelCallError::Transport {
                detail: e.to_string(),
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ModelCallError::Transport {
                detail: e.to_string(),
            })?;

        if !status.is_success() {
            return Err(classify_status(status.as_u16(), &text));
        }

        let reply: GenerateContentResponse =
            serde_json::from_str(&text).map_err(|e| ModelCallError::MalformedResponse {
                detail: e.to_string(),
            })?;
        parse_reply(reply)
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    status: Option<String>,
}

// ── Request / response mapping ───────────────────────────────────────────

/// Build the JSON body for one question.
pub(crate) fn build_body(
    request: &QueryRequest,
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
) -> GenerateContentRequest {
    let parts = request
        .context()
        .into_iter()
        .map(|part| match part {
            ContextPart::Text(text) => Part {
                text: Some(text.to_string()),
                inline_data: None,
            },
            ContextPart::Input(input) => Part {
                text: None,
                inline_data: Some(encode_input(input)),
            },
        })
        .collect();

    let generation_config = if temperature.is_some() || max_output_tokens.is_some() {
        Some(GenerationConfig {
            temperature,
            max_output_tokens,
        })
    } else {
        None
    };

    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts,
        }],
        generation_config,
    }
}

/// Pull the answer out of a successful reply.
///
/// The answer is the concatenation of the first candidate's text parts. A
/// reply without any text is a failure, never an empty answer.
pub(crate) fn parse_reply(reply: GenerateContentResponse) -> Result<Generation, ModelCallError> {
    let usage = reply.usage_metadata.unwrap_or_default();

    let Some(candidate) = reply.candidates.into_iter().next() else {
        return Err(match reply.prompt_feedback.and_then(|f| f.block_reason) {
            Some(reason) => ModelCallError::Blocked { reason },
            None => ModelCallError::MalformedResponse {
                detail: "reply has no candidates".into(),
            },
        });
    };

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if text.trim().is_empty() {
        return Err(match candidate.finish_reason.as_deref() {
            Some(reason) if reason != "STOP" => ModelCallError::Blocked {
                reason: format!("finish reason {reason}"),
            },
            _ => ModelCallError::MalformedResponse {
                detail: "reply contains no text".into(),
            },
        });
    }

    Ok(Generation {
        text,
        prompt_tokens: usage.prompt_token_count,
        output_tokens: usage.candidates_token_count,
    })
}

/// Map a non-success HTTP status (and its body) to a [`ModelCallError`].
pub(crate) fn classify_status(status: u16, body: &str) -> ModelCallError {
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => match env.error.status {
            Some(s) if !env.error.message.is_empty() => format!("{s}: {}", env.error.message),
            Some(s) => s,
            None => env.error.message,
        },
        Err(_) => body.chars().take(200).collect(),
    };

    match status {
        401 | 403 => ModelCallError::Auth {
            provider: PROVIDER_NAME.to_string(),
            status,
            message,
        },
        429 => ModelCallError::RateLimited {
            provider: PROVIDER_NAME.to_string(),
            message,
        },
        _ => ModelCallError::Api { status, message },
    }
}
