//! Configuration for quiz generation.
//!
//! All pipeline behaviour is controlled through [`QuizConfig`], built via
//! its [`QuizConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share a config between the reasoning client and the service,
//! and to diff two runs to understand why their outputs differ.
//!
//! The builder validates knob ranges; credentials are validated where they
//! are consumed ([`crate::reasoning::GeminiClient::new`]), so configs used
//! with injected test doubles never need an API key.

use crate::error::QuizError;
use std::fmt;

/// Configuration for the generation pipeline and its reasoning client.
///
/// Built via [`QuizConfig::builder()`] or [`QuizConfig::default()`].
///
/// # Example
/// ```rust
/// use docuquiz::QuizConfig;
///
/// let config = QuizConfig::builder()
///     .model("gemini-2.0-flash")
///     .api_key("AIza...")
///     .validation_concurrency(8)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct QuizConfig {
    /// Reasoning model identifier. Default: "gemini-2.0-flash".
    pub model: String,

    /// API key for the reasoning service. Default: empty.
    ///
    /// Left empty for runs driven by an injected [`crate::reasoning::TextGenerator`]
    /// double; [`crate::reasoning::GeminiClient::new`] rejects an empty key.
    pub api_key: String,

    /// Base URL of the reasoning REST endpoint. Default: the public
    /// Generative Language API. Point this at a proxy or emulator to
    /// intercept traffic.
    pub api_base: String,

    /// Sampling temperature. Default: 0.3.
    ///
    /// Question synthesis benefits from mild variety; anything above ~0.7
    /// starts producing answers that drift from the source excerpts and die
    /// in validation.
    pub temperature: f32,

    /// Maximum tokens the model may generate per call. Default: 8192.
    ///
    /// A 2×-over-generated candidate bank for 10 questions routinely runs
    /// past 4 000 output tokens. Setting this too low truncates the JSON
    /// array mid-item and the whole synthesis call degrades to an empty
    /// bank.
    pub max_tokens: usize,

    /// Per-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Concurrent per-candidate validation calls. Default: 4.
    ///
    /// Validation is one reasoning call per candidate; fanning out cuts
    /// wall-clock latency roughly linearly until the provider rate-limits.
    pub validation_concurrency: usize,

    /// Polls for not-yet-ingested page text before giving up. Default: 5.
    pub chunk_wait_attempts: u32,

    /// Fixed delay between chunk polls, in milliseconds. Default: 2000.
    pub chunk_wait_delay_ms: u64,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            api_key: String::new(),
            api_base: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            temperature: 0.3,
            max_tokens: 8192,
            api_timeout_secs: 60,
            validation_concurrency: 4,
            chunk_wait_attempts: 5,
            chunk_wait_delay_ms: 2000,
        }
    }
}

impl fmt::Debug for QuizConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizConfig")
            .field("model", &self.model)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("api_base", &self.api_base)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("validation_concurrency", &self.validation_concurrency)
            .field("chunk_wait_attempts", &self.chunk_wait_attempts)
            .field("chunk_wait_delay_ms", &self.chunk_wait_delay_ms)
            .finish()
    }
}

impl QuizConfig {
    /// Create a new builder for `QuizConfig`.
    pub fn builder() -> QuizConfigBuilder {
        QuizConfigBuilder {
            config: Self::default(),
        }
    }

    /// Defaults overlaid with environment variables.
    ///
    /// Honours `GEMINI_API_KEY`, `DOCUQUIZ_MODEL`, and `DOCUQUIZ_API_BASE`
    /// when set and non-empty. Explicit builder calls still win; this is the
    /// zero-setup path for binaries and examples.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.is_empty() {
                config.api_key = key;
            }
        }
        if let Ok(model) = std::env::var("DOCUQUIZ_MODEL") {
            if !model.is_empty() {
                config.model = model;
            }
        }
        if let Ok(base) = std::env::var("DOCUQUIZ_API_BASE") {
            if !base.is_empty() {
                config.api_base = base;
            }
        }
        config
    }
}

/// Builder for [`QuizConfig`].
#[derive(Debug)]
pub struct QuizConfigBuilder {
    config: QuizConfig,
}

impl QuizConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.config.api_base = base.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn validation_concurrency(mut self, n: usize) -> Self {
        self.config.validation_concurrency = n.max(1);
        self
    }

    pub fn chunk_wait_attempts(mut self, n: u32) -> Self {
        self.config.chunk_wait_attempts = n.max(1);
        self
    }

    pub fn chunk_wait_delay_ms(mut self, ms: u64) -> Self {
        self.config.chunk_wait_delay_ms = ms;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<QuizConfig, QuizError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(QuizError::InvalidConfig("Model id must not be empty".into()));
        }
        if !(0.0..=2.0).contains(&c.temperature) {
            return Err(QuizError::InvalidConfig(format!(
                "Temperature must be 0.0–2.0, got {}",
                c.temperature
            )));
        }
        if c.validation_concurrency == 0 {
            return Err(QuizError::InvalidConfig(
                "Validation concurrency must be ≥ 1".into(),
            ));
        }
        if c.chunk_wait_attempts == 0 {
            return Err(QuizError::InvalidConfig(
                "Chunk wait attempts must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
