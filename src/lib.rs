pub mod cli;
pub mod config;
pub mod pipeline;
pub mod server;

pub use config::SolsentryConfig;
pub use pipeline::{ErrorClass, Pipeline, PipelineError, PipelineOutput};

// Re-export the component crates' main types for convenience
pub use solsentry_analyzer::{AnalyzerConfig, AnalyzerError, MessagePolicy, StaticAnalyzer};
pub use solsentry_core::{AnalysisResult, Issue, Report, RiskGrading};
pub use solsentry_llm::{LlmConfig, ReportSynthesizer, SynthesisError};
