//! Report synthesis: prompt, one remote call, strict validation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use solsentry_core::{Issue, Report};
use solsentry_prompt::PromptBuilder;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::transport::{CompletionRequest, CompletionTransport, GeminiTransport, TransportError, excerpt};
use crate::LlmConfig;

/// JSON pointer to the generated text inside a `generateContent` response.
const CANDIDATE_TEXT_POINTER: &str = "/candidates/0/content/parts/0/text";

/// Errors that can occur while synthesizing a report.
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("Completion service credential not configured; set GEMINI_API_KEY")]
    ConfigurationMissing,

    #[error("Failed to call completion service: {0}")]
    RemoteCallFailed(#[from] TransportError),

    #[error("Failed to parse completion response: {detail}")]
    ResponseUnparsable { detail: String, body: String },

    #[error("Completion response violates the report contract: {}", .fields.join(", "))]
    ResponseInvalid { fields: Vec<String> },
}

impl SynthesisError {
    /// Stable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            SynthesisError::ConfigurationMissing => "ConfigurationMissing",
            SynthesisError::RemoteCallFailed(_) => "RemoteCallFailed",
            SynthesisError::ResponseUnparsable { .. } => "ResponseUnparsable",
            SynthesisError::ResponseInvalid { .. } => "ResponseInvalid",
        }
    }

    /// Raw response excerpt attached for diagnosis, if any.
    pub fn diagnostics(&self) -> Option<String> {
        match self {
            SynthesisError::ResponseUnparsable { body, .. } if !body.is_empty() => Some(body.clone()),
            SynthesisError::ResponseInvalid { fields } => Some(fields.join(", ")),
            _ => None,
        }
    }
}

/// Pull the generated text out of a `generateContent` response body.
pub fn extract_candidate_text(body: &str) -> Result<String, SynthesisError> {
    let envelope: Value = serde_json::from_str(body).map_err(|e| SynthesisError::ResponseUnparsable {
        detail: format!("response body is not JSON: {}", e),
        body: excerpt(body),
    })?;

    envelope
        .pointer(CANDIDATE_TEXT_POINTER)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| SynthesisError::ResponseUnparsable {
            detail: "response has no candidates[0].content.parts[0].text".to_string(),
            body: excerpt(body),
        })
}

/// Produces a validated [`Report`] from analyzer issues.
///
/// Holds no per-request state; clones share the underlying transport.
#[derive(Clone)]
pub struct ReportSynthesizer {
    config: LlmConfig,
    prompt_builder: PromptBuilder,
    transport: Arc<dyn CompletionTransport>,
}

impl std::fmt::Debug for ReportSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportSynthesizer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ReportSynthesizer {
    /// Create a synthesizer talking to the configured Gemini endpoint.
    pub fn new(config: LlmConfig) -> Result<Self, SynthesisError> {
        let transport = GeminiTransport::new(config.api_base_url.clone(), config.timeout_secs)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a synthesizer over any transport.
    pub fn with_transport(config: LlmConfig, transport: Arc<dyn CompletionTransport>) -> Self {
        if let Some(ref log_dir) = config.log_dir {
            std::fs::create_dir_all(log_dir).ok();
        }

        Self {
            prompt_builder: PromptBuilder::new().with_locale(config.language),
            config,
            transport,
        }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Build the prompt this synthesizer would send for `issues`.
    pub fn prompt_for(&self, issues: &[Issue]) -> String {
        self.prompt_builder.build_prompt(issues)
    }

    /// Ask the model for a report on `issues` and validate the answer.
    ///
    /// Makes exactly one remote call; nothing is retried or repaired.
    pub async fn synthesize(&self, issues: &[Issue]) -> Result<Report, SynthesisError> {
        let api_key = self
            .config
            .usable_api_key()
            .ok_or(SynthesisError::ConfigurationMissing)?;

        let prompt = self.prompt_for(issues);
        info!(
            "Requesting report from {} for {} issue(s), prompt length {}",
            self.config.model,
            issues.len(),
            prompt.len()
        );

        let request = CompletionRequest {
            api_key,
            model: &self.config.model,
            prompt: &prompt,
            temperature: self.config.temperature,
        };

        let start_time = Instant::now();
        let body = timeout(
            Duration::from_secs(self.config.timeout_secs),
            self.transport.complete(request),
        )
        .await
        .map_err(|_| TransportError::Timeout {
            timeout_secs: self.config.timeout_secs,
        })?
        .inspect_err(|e| warn!("{}", e))?;
        let duration_ms = start_time.elapsed().as_millis() as u64;
        debug!("Completion service answered in {}ms", duration_ms);

        self.save_log(&prompt, &body, duration_ms);

        let text = extract_candidate_text(&body)?;
        let parsed: Value = serde_json::from_str(&text).map_err(|e| SynthesisError::ResponseUnparsable {
            detail: format!("generated text is not JSON: {}", e),
            body: excerpt(&text),
        })?;

        let report = Report::from_json(&parsed).map_err(|e| {
            warn!("{}", e);
            SynthesisError::ResponseInvalid { fields: e.fields }
        })?;
        info!("Report synthesized with grading {}", report.risk_grading());

        Ok(report)
    }

    fn save_log(&self, prompt: &str, body: &str, duration_ms: u64) {
        let Some(ref log_dir) = self.config.log_dir else {
            return;
        };

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S_%3f");
        let log_file: PathBuf = log_dir.join(format!("llm_{}.log", timestamp));
        let log_content = format!(
            "=== Completion Log ===\n\
             Timestamp: {}\n\
             Model: {}\n\
             Duration: {}ms\n\
             \n\
             === PROMPT ===\n\
             {}\n\
             \n\
             === RESPONSE ===\n\
             {}\n",
            chrono::Utc::now().to_rfc3339(),
            self.config.model,
            duration_ms,
            prompt,
            body
        );
        if let Err(e) = std::fs::write(&log_file, &log_content) {
            warn!("Failed to write completion log: {}", e);
        } else {
            info!("Completion log saved: {}", log_file.display());
        }
    }
}
