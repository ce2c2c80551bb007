//! Slither integration for solsentry.
//!
//! This crate runs the external static analyzer against submitted Solidity
//! source and normalizes whatever JSON shape the installed analyzer version
//! emits into the shared [`solsentry_core::Issue`] model.

mod executor;
mod parser;

pub use executor::{AnalyzerError, AnalyzerOutput, StaticAnalyzer};
pub use parser::{normalize_output, OutputShape};

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How detector descriptions become issue messages.
///
/// One policy applies to every detector of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessagePolicy {
    /// Keep only the first line of the description.
    #[default]
    FirstLine,
    /// Keep the description verbatim.
    FullText,
}

impl MessagePolicy {
    pub fn apply(&self, message: &str) -> String {
        match self {
            MessagePolicy::FirstLine => message.lines().next().unwrap_or_default().to_string(),
            MessagePolicy::FullText => message.to_string(),
        }
    }
}

impl FromStr for MessagePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first-line" | "first_line" | "firstline" => Ok(MessagePolicy::FirstLine),
            "full-text" | "full_text" | "full" => Ok(MessagePolicy::FullText),
            other => Err(format!(
                "unknown message policy '{}' (expected 'first-line' or 'full-text')",
                other
            )),
        }
    }
}

/// Configuration for the static analyzer adapter.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Analyzer executable. A bare name is resolved through `PATH`.
    pub analyzer_path: PathBuf,
    /// Timeout in seconds for one analyzer run.
    pub timeout_secs: u64,
    /// Message normalization policy.
    pub message_policy: MessagePolicy,
    /// Arguments appended after the fixed `<file> --json -` arguments.
    pub extra_args: Vec<String>,
    /// Parent directory for per-run scratch space (system temp dir if unset).
    pub scratch_dir: Option<PathBuf>,
    /// Directory to save raw analyzer output (optional).
    pub log_dir: Option<PathBuf>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            analyzer_path: PathBuf::from("slither"),
            timeout_secs: 30,
            message_policy: MessagePolicy::FirstLine,
            extra_args: Vec::new(),
            scratch_dir: None,
            log_dir: None,
        }
    }
}

impl AnalyzerConfig {
    /// Create a new configuration with the specified analyzer path.
    pub fn new(analyzer_path: PathBuf) -> Self {
        Self {
            analyzer_path,
            ..Default::default()
        }
    }

    /// Set the timeout in seconds.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs.max(1);
        self
    }

    /// Set the message policy.
    pub fn with_message_policy(mut self, policy: MessagePolicy) -> Self {
        self.message_policy = policy;
        self
    }

    /// Append extra analyzer arguments.
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// Create scratch workspaces under `dir` instead of the system temp dir.
    pub fn with_scratch_dir(mut self, dir: PathBuf) -> Self {
        self.scratch_dir = Some(dir);
        self
    }

    /// Set the log directory for saving raw analyzer output.
    pub fn with_log_dir(mut self, dir: PathBuf) -> Self {
        self.log_dir = Some(dir);
        self
    }
}
