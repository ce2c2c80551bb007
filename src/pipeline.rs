//! Two-stage assessment: static analysis, then report synthesis.

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use solsentry_analyzer::{AnalyzerError, StaticAnalyzer};
use solsentry_core::{AnalysisResult, Issue, Report};
use solsentry_llm::{ReportSynthesizer, SynthesisError};

use crate::config::SolsentryConfig;

/// Who is responsible for a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Deployment is missing something (executable, credential).
    ServerConfiguration,
    /// The submitted contract is at fault.
    ClientInput,
    /// A component produced output we cannot use.
    ServerProcessing,
    /// The completion service could not be reached or refused the call.
    ServiceUnavailable,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
}

impl PipelineError {
    pub fn class(&self) -> ErrorClass {
        match self {
            PipelineError::Analyzer(e) => match e {
                AnalyzerError::ExecutionNotFound { .. } => ErrorClass::ServerConfiguration,
                AnalyzerError::ExecutionCrashed { .. } | AnalyzerError::AnalyzerReportedFailure { .. } => {
                    ErrorClass::ClientInput
                }
                AnalyzerError::OutputUnparsable { .. } | AnalyzerError::ScratchFile(_) => {
                    ErrorClass::ServerProcessing
                }
            },
            PipelineError::Synthesis(e) => match e {
                SynthesisError::ConfigurationMissing => ErrorClass::ServerConfiguration,
                SynthesisError::RemoteCallFailed(_) => ErrorClass::ServiceUnavailable,
                SynthesisError::ResponseUnparsable { .. } | SynthesisError::ResponseInvalid { .. } => {
                    ErrorClass::ServerProcessing
                }
            },
        }
    }

    /// Stable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Analyzer(e) => e.kind(),
            PipelineError::Synthesis(e) => e.kind(),
        }
    }

    pub fn diagnostics(&self) -> Option<String> {
        match self {
            PipelineError::Analyzer(e) => e.diagnostics(),
            PipelineError::Synthesis(e) => e.diagnostics(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub issues: Vec<Issue>,
    pub report: Report,
}

/// Runs the analyzer and the synthesizer; holds no per-request state.
#[derive(Debug, Clone)]
pub struct Pipeline {
    analyzer: StaticAnalyzer,
    synthesizer: ReportSynthesizer,
}

impl Pipeline {
    pub fn new(analyzer: StaticAnalyzer, synthesizer: ReportSynthesizer) -> Self {
        Self { analyzer, synthesizer }
    }

    /// Build both stages from a loaded configuration.
    pub fn from_config(config: &SolsentryConfig) -> Result<Self, PipelineError> {
        let analyzer = StaticAnalyzer::new(config.analyzer_config());
        let synthesizer = ReportSynthesizer::new(config.llm_config())?;
        Ok(Self::new(analyzer, synthesizer))
    }

    pub fn analyzer(&self) -> &StaticAnalyzer {
        &self.analyzer
    }

    pub fn synthesizer(&self) -> &ReportSynthesizer {
        &self.synthesizer
    }

    pub async fn analyze(&self, source_code: &str) -> Result<AnalysisResult, PipelineError> {
        Ok(self.analyzer.analyze(source_code).await?)
    }

    pub async fn synthesize(&self, issues: &[Issue]) -> Result<Report, PipelineError> {
        Ok(self.synthesizer.synthesize(issues).await?)
    }

    /// Analyze then synthesize. A clean contract still gets a report.
    pub async fn run(&self, source_code: &str) -> Result<PipelineOutput, PipelineError> {
        let result = self.analyze(source_code).await?;
        info!("Static analysis found {} issue(s)", result.len());

        let report = self.synthesize(result.as_slice()).await?;
        Ok(PipelineOutput {
            issues: result.issues,
            report,
        })
    }
}
