//! Configuration for the question-answering assistant.
//!
//! Everything the core needs from its environment lives in
//! [`AssistantConfig`]: the model credential, which model to call, where to
//! append feedback. Components receive it explicitly; nothing reads process
//! globals after [`AssistantConfig::from_env`] has run once at startup.

use crate::error::PoQaError;
use crate::provider::GenerativeModel;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default Gemini model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Default Gemini REST endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Default feedback log file, relative to the working directory.
pub const DEFAULT_FEEDBACK_LOG: &str = "feedback_log.txt";

/// Environment variables checked, in order, for the model credential.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];

/// A model API key. `Debug` never prints the secret and there is no `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key, rejecting blank strings.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Configuration for one assistant instance.
///
/// Built via [`AssistantConfig::builder()`], [`AssistantConfig::from_env()`]
/// or [`AssistantConfig::default()`] (which has no credential).
///
/// # Example
/// ```rust
/// use po_qa::AssistantConfig;
///
/// let config = AssistantConfig::builder()
///     .api_key("test-key")
///     .model("gemini-1.5-flash")
///     .feedback_log("feedback_log.txt")
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "gemini-1.5-flash");
/// ```
#[derive(Clone)]
pub struct AssistantConfig {
    /// Model credential. `None` means no model calls can be made.
    pub api_key: Option<ApiKey>,

    /// Model identifier. Default: `gemini-1.5-flash`.
    pub model: String,

    /// Base URL of the Gemini REST API. Overridable for proxies and tests.
    pub endpoint: String,

    /// Custom system prompt. If None, uses [`crate::prompts::DEFAULT_SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Sampling temperature. `None` leaves the service default.
    pub temperature: Option<f32>,

    /// Cap on generated tokens. `None` leaves the service default.
    pub max_output_tokens: Option<u32>,

    /// Per-call timeout in seconds. Default: none (wait for the service).
    pub api_timeout_secs: Option<u64>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Where feedback records are appended. Default: `feedback_log.txt`.
    pub feedback_log: PathBuf,

    /// Directory for the temporary PDF copy. `None` uses the system temp dir.
    pub scratch_dir: Option<PathBuf>,

    /// Characters of extracted text shown in previews. Default: 1500.
    pub preview_chars: usize,

    /// Pre-constructed provider. Takes precedence over the Gemini settings.
    pub provider: Option<Arc<dyn GenerativeModel>>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            system_prompt: None,
            temperature: None,
            max_output_tokens: None,
            api_timeout_secs: None,
            download_timeout_secs: 120,
            feedback_log: PathBuf::from(DEFAULT_FEEDBACK_LOG),
            scratch_dir: None,
            preview_chars: 1500,
            provider: None,
        }
    }
}

impl fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("api_key", &self.api_key)
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("system_prompt", &self.system_prompt.as_ref().map(|_| "<custom>"))
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("feedback_log", &self.feedback_log)
            .field("scratch_dir", &self.scratch_dir)
            .field("provider", &self.provider.as_ref().map(|p| p.name().to_string()))
            .finish()
    }
}

impl AssistantConfig {
    /// Create a new builder for `AssistantConfig`.
    pub fn builder() -> AssistantConfigBuilder {
        AssistantConfigBuilder {
            config: Self::default(),
        }
    }

    /// Read the credential and overrides from the environment.
    ///
    /// Reads `GOOGLE_API_KEY` (then `GEMINI_API_KEY`), `PO_QA_MODEL` and
    /// `PO_QA_FEEDBACK_LOG`. A missing key is not an error here; it
    /// surfaces as [`PoQaError::Configuration`] when the assistant is built.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        config.api_key = API_KEY_ENV_VARS
            .iter()
            .find_map(|name| lookup(name).and_then(ApiKey::new));
        if let Some(model) = lookup("PO_QA_MODEL").filter(|m| !m.trim().is_empty()) {
            config.model = model.trim().to_string();
        }
        if let Some(path) = lookup("PO_QA_FEEDBACK_LOG").filter(|p| !p.trim().is_empty()) {
            config.feedback_log = PathBuf::from(path);
        }
        config
    }

    /// The system prompt to send: the override, or the built-in default.
    pub fn system_prompt(&self) -> &str {
        self.system_prompt
            .as_deref()
            .unwrap_or(crate::prompts::DEFAULT_SYSTEM_PROMPT)
    }
}

/// Builder for [`AssistantConfig`].
pub struct AssistantConfigBuilder {
    config: AssistantConfig,
}

impl AssistantConfigBuilder {
    /// Start from an existing config (e.g. one read from the environment).
    pub fn from_config(config: AssistantConfig) -> Self {
        Self { config }
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = ApiKey::new(key);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t);
        self
    }

    pub fn max_output_tokens(mut self, n: u32) -> Self {
        self.config.max_output_tokens = Some(n);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn feedback_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.feedback_log = path.into();
        self
    }

    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.scratch_dir = Some(dir.into());
        self
    }

    pub fn preview_chars(mut self, n: usize) -> Self {
        self.config.preview_chars = n;
        self
    }

    pub fn provider(mut self, provider: Arc<dyn GenerativeModel>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// The credential is not checked here so that key-less operations
    /// (inspecting a document, writing feedback) stay possible.
    pub fn build(self) -> Result<AssistantConfig, PoQaError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(PoQaError::Configuration("model name must not be empty".into()));
        }
        if !(c.endpoint.starts_with("http://") || c.endpoint.starts_with("https://")) {
            return Err(PoQaError::Configuration(format!(
                "endpoint must be an HTTP/HTTPS URL, got '{}'",
                c.endpoint
            )));
        }
        if let Some(t) = c.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(PoQaError::Configuration(format!(
                    "temperature must be 0.0–2.0, got {t}"
                )));
            }
        }
        if c.api_timeout_secs == Some(0) {
            return Err(PoQaError::Configuration("API timeout must be ≥ 1s".into()));
        }
        if c.download_timeout_secs == 0 {
            return Err(PoQaError::Configuration("download timeout must be ≥ 1s".into()));
        }
        if c.feedback_log.as_os_str().is_empty() {
            return Err(PoQaError::Configuration("feedback log path must not be empty".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let c = AssistantConfig::default();
        assert!(c.api_key.is_none());
        assert_eq!(c.model, DEFAULT_MODEL);
        assert_eq!(c.feedback_log, PathBuf::from("feedback_log.txt"));
        assert_eq!(c.preview_chars, 1500);
        assert_eq!(c.api_timeout_secs, None);
    }

    #[test]
    fn google_key_wins_over_gemini_key() {
        let c = AssistantConfig::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "google"),
            ("GEMINI_API_KEY", "gemini"),
        ]));
        assert_eq!(c.api_key.unwrap().expose(), "google");
    }

    #[test]
    fn blank_key_falls_through() {
        let c = AssistantConfig::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "   "),
            ("GEMINI_API_KEY", "gemini"),
        ]));
        assert_eq!(c.api_key.unwrap().expose(), "gemini");
    }

    #[test]
    fn no_key_in_env() {
        let c = AssistantConfig::from_lookup(lookup(&[("PO_QA_MODEL", "gemini-2.0-flash")]));
        assert!(c.api_key.is_none());
        assert_eq!(c.model, "gemini-2.0-flash");
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let c = AssistantConfig::builder().api_key("sk-secret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("sk-secret"), "leaked key: {dbg}");
        assert!(dbg.contains("redacted"));
    }

    #[test]
    fn build_rejects_bad_values() {
        assert!(AssistantConfig::builder().model(" ").build().is_err());
        assert!(AssistantConfig::builder().temperature(3.5).build().is_err());
        assert!(AssistantConfig::builder().endpoint("ftp://x").build().is_err());
        assert!(AssistantConfig::builder().api_timeout_secs(0).build().is_err());
        assert!(matches!(
            AssistantConfig::builder().download_timeout_secs(0).build(),
            Err(PoQaError::Configuration(_))
        ));
        assert!(AssistantConfig::builder().download_timeout_secs(1).build().is_ok());
    }

    #[test]
    fn system_prompt_override() {
        let c = AssistantConfig::builder().system_prompt("Be brief.").build().unwrap();
        assert_eq!(c.system_prompt(), "Be brief.");
        assert_eq!(
            AssistantConfig::default().system_prompt(),
            crate::prompts::DEFAULT_SYSTEM_PROMPT
        );
    }
}
