use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use solsentry_analyzer::{AnalyzerConfig, MessagePolicy};
use solsentry_i18n::Language;
use solsentry_llm::{API_KEY_ENV, LlmConfig};

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SolsentryConfig {
    #[serde(default)]
    pub analyzer: AnalyzerSection,

    #[serde(default)]
    pub llm: LlmSection,

    #[serde(default)]
    pub prompt: PromptSection,

    #[serde(default)]
    pub server: ServerSection,
}

/// Static analyzer settings
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct AnalyzerSection {
    /// Analyzer executable (bare names are looked up in PATH)
    #[serde(default = "default_analyzer_path")]
    pub path: PathBuf,

    #[serde(default = "default_analyzer_timeout")]
    pub timeout_secs: u64,

    /// "first-line" or "full-text"
    #[serde(default)]
    pub message_policy: MessagePolicy,

    #[serde(default)]
    pub extra_args: Vec<String>,

    pub scratch_dir: Option<PathBuf>,

    pub log_dir: Option<PathBuf>,
}

fn default_analyzer_path() -> PathBuf {
    PathBuf::from("slither")
}

fn default_analyzer_timeout() -> u64 {
    30
}

impl Default for AnalyzerSection {
    fn default() -> Self {
        Self {
            path: default_analyzer_path(),
            timeout_secs: default_analyzer_timeout(),
            message_policy: MessagePolicy::default(),
            extra_args: Vec::new(),
            scratch_dir: None,
            log_dir: None,
        }
    }
}

/// Completion service settings
#[derive(Deserialize, Serialize, Clone)]
pub struct LlmSection {
    /// Never written back out; prefer the GEMINI_API_KEY environment variable.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    pub log_dir: Option<PathBuf>,
}

fn default_api_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-1.5-flash-latest".to_string()
}

fn default_temperature() -> f64 {
    0.2
}

fn default_llm_timeout() -> u64 {
    60
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: default_api_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout(),
            log_dir: None,
        }
    }
}

impl fmt::Debug for LlmSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSection")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .field("log_dir", &self.log_dir)
            .finish()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PromptSection {
    /// "en" or "id"
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for PromptSection {
    fn default() -> Self {
        Self {
            language: default_language(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Worker threads (actix default when unset)
    pub workers: Option<usize>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

/// Values given on the command line; `None` leaves the configured value alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub language: Option<String>,
    pub analyzer_path: Option<PathBuf>,
    pub analyzer_timeout: Option<u64>,
    pub message_policy: Option<MessagePolicy>,
    pub model: Option<String>,
    pub api_base_url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_dir: Option<PathBuf>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Invalid range in {field}: {value} (valid range: {valid_range})")]
    InvalidRange {
        field: String,
        value: String,
        valid_range: String,
    },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SolsentryConfig {
    /// Merge another config into this one (other takes precedence for set values).
    ///
    /// A field counts as set when it differs from its default, so a later
    /// file cannot reset a field back to the default value.
    pub fn merge(&mut self, other: &SolsentryConfig) {
        if other.analyzer.path != default_analyzer_path() {
            self.analyzer.path = other.analyzer.path.clone();
        }
        if other.analyzer.timeout_secs != default_analyzer_timeout() {
            self.analyzer.timeout_secs = other.analyzer.timeout_secs;
        }
        if other.analyzer.message_policy != MessagePolicy::default() {
            self.analyzer.message_policy = other.analyzer.message_policy;
        }
        if !other.analyzer.extra_args.is_empty() {
            self.analyzer.extra_args = other.analyzer.extra_args.clone();
        }
        if other.analyzer.scratch_dir.is_some() {
            self.analyzer.scratch_dir = other.analyzer.scratch_dir.clone();
        }
        if other.analyzer.log_dir.is_some() {
            self.analyzer.log_dir = other.analyzer.log_dir.clone();
        }

        if other.llm.api_key.is_some() {
            self.llm.api_key = other.llm.api_key.clone();
        }
        if other.llm.api_base_url != default_api_base_url() {
            self.llm.api_base_url = other.llm.api_base_url.clone();
        }
        if other.llm.model != default_model() {
            self.llm.model = other.llm.model.clone();
        }
        if other.llm.temperature != default_temperature() {
            self.llm.temperature = other.llm.temperature;
        }
        if other.llm.timeout_secs != default_llm_timeout() {
            self.llm.timeout_secs = other.llm.timeout_secs;
        }
        if other.llm.log_dir.is_some() {
            self.llm.log_dir = other.llm.log_dir.clone();
        }

        if other.prompt.language != default_language() {
            self.prompt.language = other.prompt.language.clone();
        }

        if other.server.host != default_host() {
            self.server.host = other.server.host.clone();
        }
        if other.server.port != default_port() {
            self.server.port = other.server.port;
        }
        if other.server.workers.is_some() {
            self.server.workers = other.server.workers;
        }
    }

    pub fn generate_default_config() -> String {
        let default_config = Self::default();
        toml::to_string_pretty(&default_config).unwrap_or_else(|_| {
            r#"# Solsentry Configuration File

[analyzer]
path = "slither"
timeout_secs = 30
message_policy = "first-line"
extra_args = []
# scratch_dir = "/var/tmp/solsentry"
# log_dir = "logs/analyzer"

[llm]
# api_key is read from GEMINI_API_KEY
api_base_url = "https://generativelanguage.googleapis.com/v1beta"
model = "gemini-1.5-flash-latest"
temperature = 0.2
timeout_secs = 60

[prompt]
language = "en"

[server]
host = "127.0.0.1"
port = 8000
"#
            .to_string()
        })
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: SolsentryConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get the user config file path (~/.config/solsentry/config.toml)
    pub fn get_user_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config/solsentry/config.toml"))
    }

    /// Get the current directory config file path (./solsentry.toml)
    pub fn get_current_config_path() -> PathBuf {
        PathBuf::from("./solsentry.toml")
    }

    /// Load and merge the user config and then the current directory config.
    pub fn load_with_merged_configs() -> Self {
        let mut config = Self::default();

        let paths = Self::get_user_config_path()
            .into_iter()
            .chain(std::iter::once(Self::get_current_config_path()));

        for path in paths {
            if !path.exists() {
                continue;
            }
            match Self::load_from_file(&path) {
                Ok(file_config) => {
                    config.merge(&file_config);
                    tracing::debug!("Loaded config from: {}", path.display());
                }
                Err(e) => tracing::warn!("Ignoring config {}: {}", path.display(), e),
            }
        }

        config
    }

    pub fn apply_env_vars(&mut self, env_vars: &HashMap<String, String>) -> Result<()> {
        if let Some(key) = env_vars.get(API_KEY_ENV) {
            self.llm.api_key = Some(key.clone());
        }

        for (key, value) in env_vars {
            if let Some(config_key) = key.strip_prefix("SOLSENTRY_") {
                match config_key {
                    "ANALYZER_PATH" => self.analyzer.path = PathBuf::from(value),
                    "ANALYZER_TIMEOUT_SECS" => {
                        self.analyzer.timeout_secs = value
                            .parse()
                            .map_err(|_| anyhow!("Invalid analyzer timeout value: {}", value))?;
                    }
                    "ANALYZER_MESSAGE_POLICY" => {
                        self.analyzer.message_policy = value.parse().map_err(|e: String| anyhow!(e))?;
                    }
                    "ANALYZER_EXTRA_ARGS" => {
                        self.analyzer.extra_args = value.split_whitespace().map(str::to_string).collect();
                    }
                    "ANALYZER_SCRATCH_DIR" => self.analyzer.scratch_dir = Some(PathBuf::from(value)),
                    "ANALYZER_LOG_DIR" => self.analyzer.log_dir = Some(PathBuf::from(value)),
                    "LLM_API_BASE_URL" => self.llm.api_base_url = value.clone(),
                    "LLM_MODEL" => self.llm.model = value.clone(),
                    "LLM_TEMPERATURE" => {
                        self.llm.temperature = value
                            .parse()
                            .map_err(|_| anyhow!("Invalid temperature value: {}", value))?;
                    }
                    "LLM_TIMEOUT_SECS" => {
                        self.llm.timeout_secs = value
                            .parse()
                            .map_err(|_| anyhow!("Invalid llm timeout value: {}", value))?;
                    }
                    "LLM_LOG_DIR" => self.llm.log_dir = Some(PathBuf::from(value)),
                    "PROMPT_LANGUAGE" => self.prompt.language = value.clone(),
                    "SERVER_HOST" => self.server.host = value.clone(),
                    "SERVER_PORT" => {
                        self.server.port = value
                            .parse()
                            .map_err(|_| anyhow!("Invalid port value: {}", value))?;
                    }
                    "SERVER_WORKERS" => {
                        self.server.workers = Some(
                            value
                                .parse()
                                .map_err(|_| anyhow!("Invalid workers value: {}", value))?,
                        );
                    }
                    _ => {} // Ignore unknown environment variables
                }
            }
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref language) = overrides.language {
            self.prompt.language = language.clone();
        }
        if let Some(ref path) = overrides.analyzer_path {
            self.analyzer.path = path.clone();
        }
        if let Some(timeout) = overrides.analyzer_timeout {
            self.analyzer.timeout_secs = timeout;
        }
        if let Some(policy) = overrides.message_policy {
            self.analyzer.message_policy = policy;
        }
        if let Some(ref model) = overrides.model {
            self.llm.model = model.clone();
        }
        if let Some(ref url) = overrides.api_base_url {
            self.llm.api_base_url = url.clone();
        }
        if let Some(ref host) = overrides.host {
            self.server.host = host.clone();
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(ref dir) = overrides.log_dir {
            self.analyzer.log_dir = Some(dir.join("analyzer"));
            self.llm.log_dir = Some(dir.join("llm"));
        }
    }

    /// Load configuration with full precedence chain:
    /// 1. Default values (lowest)
    /// 2. User config (~/.config/solsentry/config.toml)
    /// 3. Current directory (./solsentry.toml)
    /// 4. Explicit --config file
    /// 5. Environment variables (SOLSENTRY_*, GEMINI_API_KEY)
    /// 6. CLI arguments (highest)
    pub fn load_with_precedence(
        config_path: Option<&Path>,
        overrides: &ConfigOverrides,
        env_vars: &HashMap<String, String>,
    ) -> Result<Self> {
        let mut config = Self::load_with_merged_configs();

        if let Some(path) = config_path {
            let explicit_config = Self::load_from_file(path)
                .map_err(|e| anyhow!("Failed to load config file {}: {}", path.display(), e))?;
            config.merge(&explicit_config);
        }

        config.apply_env_vars(env_vars)?;
        config.apply_overrides(overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analyzer.timeout_secs == 0 {
            return Err(ConfigError::InvalidRange {
                field: "analyzer.timeout_secs".to_string(),
                value: self.analyzer.timeout_secs.to_string(),
                valid_range: ">= 1".to_string(),
            });
        }

        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::InvalidRange {
                field: "llm.timeout_secs".to_string(),
                value: self.llm.timeout_secs.to_string(),
                valid_range: ">= 1".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::InvalidRange {
                field: "llm.temperature".to_string(),
                value: self.llm.temperature.to_string(),
                valid_range: "0.0-2.0".to_string(),
            });
        }

        if self.server.port == 0 {
            return Err(ConfigError::InvalidRange {
                field: "server.port".to_string(),
                value: self.server.port.to_string(),
                valid_range: "1-65535".to_string(),
            });
        }

        Ok(())
    }

    pub fn language(&self) -> Language {
        Language::from_string(&self.prompt.language)
    }

    pub fn analyzer_config(&self) -> AnalyzerConfig {
        let mut config = AnalyzerConfig::new(self.analyzer.path.clone())
            .with_timeout(self.analyzer.timeout_secs)
            .with_message_policy(self.analyzer.message_policy)
            .with_extra_args(self.analyzer.extra_args.clone());
        if let Some(ref dir) = self.analyzer.scratch_dir {
            config = config.with_scratch_dir(dir.clone());
        }
        if let Some(ref dir) = self.analyzer.log_dir {
            config = config.with_log_dir(dir.clone());
        }
        config
    }

    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            api_key: self.llm.api_key.clone(),
            api_base_url: self.llm.api_base_url.clone(),
            model: self.llm.model.clone(),
            temperature: self.llm.temperature,
            timeout_secs: self.llm.timeout_secs,
            language: self.language(),
            log_dir: self.llm.log_dir.clone(),
        }
    }
}
