//! Gemini integration for solsentry.
//!
//! This crate turns a list of analyzer issues into a validated
//! [`solsentry_core::Report`] with one call to a hosted completion model.

mod synthesizer;
mod transport;

pub use synthesizer::{ReportSynthesizer, SynthesisError, extract_candidate_text};
pub use transport::{CompletionRequest, CompletionTransport, GeminiTransport, TransportError};

use std::fmt;
use std::path::PathBuf;

use solsentry_i18n::Language;

/// Environment variable holding the completion service credential.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Configuration for the report synthesizer.
#[derive(Clone)]
pub struct LlmConfig {
    /// Credential for the completion service.
    pub api_key: Option<String>,
    /// Base URL of the Generative Language API.
    pub api_base_url: String,
    /// Model name, e.g. "gemini-1.5-flash-latest".
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Timeout in seconds for the whole request.
    pub timeout_secs: u64,
    /// Prompt language.
    pub language: Language,
    /// Directory to save raw model responses (optional).
    pub log_dir: Option<PathBuf>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash-latest".to_string(),
            temperature: 0.2,
            timeout_secs: 60,
            language: Language::English,
            log_dir: None,
        }
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .field("language", &self.language)
            .field("log_dir", &self.log_dir)
            .finish()
    }
}

impl LlmConfig {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the timeout in seconds.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs.max(1);
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Set the log directory for saving raw responses.
    pub fn with_log_dir(mut self, dir: PathBuf) -> Self {
        self.log_dir = Some(dir);
        self
    }

    /// The credential, if present and not blank.
    pub(crate) fn usable_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}
