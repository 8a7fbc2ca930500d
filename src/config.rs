#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::time::Duration;

use bon::Builder;

/// Default endpoint for the evaluation service.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default multimodal model used for grading.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Settings for reaching the evaluation service, sourced from the
/// environment.
///
/// A missing API key is not an error here; it surfaces as a
/// [`crate::GraderError::Configuration`] when the transport is first built.
#[derive(Clone, Builder)]
#[builder(on(String, into))]
pub struct GraderConfig {
    /// Base URL of the `generateContent` API
    #[builder(default = DEFAULT_API_BASE.to_string())]
    api_base:          String,
    /// API key used to authenticate requests
    api_key:           Option<String>,
    /// Model identifier
    #[builder(default = DEFAULT_MODEL.to_string())]
    model:             String,
    /// Sampling temperature
    #[builder(default = 0.3)]
    temperature:       f32,
    /// Nucleus sampling cutoff
    #[builder(default = 0.8)]
    top_p:             f32,
    /// Top-k sampling cutoff
    #[builder(default = 40)]
    top_k:             u32,
    /// Upper bound on response length
    #[builder(default = 1024)]
    max_output_tokens: u32,
    /// Per-request timeout
    #[builder(default = Duration::from_secs(60))]
    request_timeout:   Duration,
    /// Subject the grader is told it is an expert in; may be empty
    #[builder(default)]
    subject:           String,
}

impl GraderConfig {
    /// Reads the configuration from `GRADER_*` environment variables, using
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let api_key = read_string("GRADER_API_KEY").filter(|key| !key.is_empty());
        let defaults = Self::builder().build();

        Self {
            api_base: read_string("GRADER_API_BASE").unwrap_or(defaults.api_base),
            api_key,
            model: read_string("GRADER_MODEL").unwrap_or(defaults.model),
            temperature: read_parsed("GRADER_TEMPERATURE").unwrap_or(defaults.temperature),
            top_p: read_parsed("GRADER_TOP_P").unwrap_or(defaults.top_p),
            top_k: read_parsed("GRADER_TOP_K").unwrap_or(defaults.top_k),
            max_output_tokens: read_parsed("GRADER_MAX_OUTPUT_TOKENS")
                .unwrap_or(defaults.max_output_tokens),
            request_timeout: read_timeout_secs("GRADER_TIMEOUT_SECS", defaults.request_timeout),
            subject: read_string("GRADER_SUBJECT").unwrap_or_default(),
        }
    }

    /// Returns the API base URL without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }

    /// Returns the API key, if one was configured.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Returns the model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the sampling temperature.
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Returns the top-p cutoff.
    pub fn top_p(&self) -> f32 {
        self.top_p
    }

    /// Returns the top-k cutoff.
    pub fn top_k(&self) -> u32 {
        self.top_k
    }

    /// Returns the response length limit.
    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    /// Returns the per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns the grading subject.
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

impl std::fmt::Debug for GraderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraderConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("top_k", &self.top_k)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("request_timeout", &self.request_timeout)
            .field("subject", &self.subject)
            .finish()
    }
}

/// Reads a trimmed environment variable.
fn read_string(env: &str) -> Option<String> {
    std::env::var(env).ok().map(|value| value.trim().to_owned())
}

/// Reads and parses an environment variable, ignoring unparsable values.
fn read_parsed<T: std::str::FromStr>(env: &str) -> Option<T> {
    read_string(env).and_then(|value| value.parse::<T>().ok())
}

/// Parses an environment variable into a `Duration` of whole seconds,
/// falling back to `default` when parsing fails or the variable is missing.
fn read_timeout_secs(env: &str, default: Duration) -> Duration {
    read_parsed::<u64>(env)
        .map(Duration::from_secs)
        .unwrap_or(default)
}
