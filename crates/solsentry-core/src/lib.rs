//! Core types for the solsentry pipeline.
//!
//! This crate holds the contract shared by both pipeline stages:
//! - Normalized analyzer findings (Issue, AnalysisResult)
//! - The synthesized risk report (Report, RiskGrading)

mod issue;
mod report;
mod risk_grading;

pub use issue::{AnalysisResult, Issue};
pub use report::{Report, ReportValidationError, REPORT_FIELDS};
pub use risk_grading::{ParseRiskGradingError, RiskGrading};
