//! Normalization of analyzer JSON output.
//!
//! Analyzer versions disagree on the envelope and on where line numbers
//! live, so every read is a key-presence probe with a fallback value.

use serde_json::Value;
use solsentry_core::{AnalysisResult, Issue};
use tracing::debug;

use crate::executor::AnalyzerError;
use crate::MessagePolicy;

const PLACEHOLDER_TYPE: &str = "N/A";
const PLACEHOLDER_SEVERITY: &str = "N/A";
const PLACEHOLDER_MESSAGE: &str = "No message available";
const UNKNOWN_ANALYZER_ERROR: &str = "Unknown error";

/// Top-level envelope of an analyzer report, selected by key presence.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputShape<'a> {
    /// `success` flag with detectors under `result` (or `results`).
    Envelope {
        success: bool,
        error: Option<&'a str>,
        detectors: &'a [Value],
    },
    /// Detectors under `results`, no success flag.
    Results { detectors: &'a [Value] },
    /// Well-formed JSON with neither envelope.
    Unrecognized,
}

impl<'a> OutputShape<'a> {
    /// Probe the known envelopes in priority order.
    pub fn detect(root: &'a Value) -> Self {
        let Some(object) = root.as_object() else {
            return OutputShape::Unrecognized;
        };

        if object.contains_key("success") || object.contains_key("result") {
            let success = object.get("success").and_then(Value::as_bool).unwrap_or(true);
            let error = object.get("error").and_then(Value::as_str);
            let container = object.get("result").or_else(|| object.get("results"));
            return OutputShape::Envelope {
                success,
                error,
                detectors: detectors_of(container),
            };
        }

        if let Some(results) = object.get("results") {
            return OutputShape::Results {
                detectors: detectors_of(Some(results)),
            };
        }

        OutputShape::Unrecognized
    }
}

/// Convert a parsed analyzer report into the ordered issue list.
///
/// Fails only when the analyzer itself reported failure; missing secondary
/// fields fall back to placeholders.
pub fn normalize_output(root: &Value, policy: MessagePolicy) -> Result<AnalysisResult, AnalyzerError> {
    let detectors = match OutputShape::detect(root) {
        OutputShape::Envelope {
            success: false,
            error,
            ..
        } => {
            return Err(AnalyzerError::AnalyzerReportedFailure {
                message: error.unwrap_or(UNKNOWN_ANALYZER_ERROR).to_string(),
            });
        }
        OutputShape::Envelope { detectors, .. } | OutputShape::Results { detectors } => detectors,
        OutputShape::Unrecognized => {
            debug!("Analyzer output matched no known shape, treating as no findings");
            &[]
        }
    };

    let issues = detectors
        .iter()
        .flat_map(|detector| expand_detector(detector, policy))
        .collect();

    Ok(AnalysisResult::new(issues))
}

/// One detector with N elements becomes N issues.
fn expand_detector(detector: &Value, policy: MessagePolicy) -> Vec<Issue> {
    let issue_type = text_or(detector, &["check"], PLACEHOLDER_TYPE);
    let severity = text_or(detector, &["impact"], PLACEHOLDER_SEVERITY);
    let message = policy.apply(&text_or(detector, &["message", "description"], PLACEHOLDER_MESSAGE));

    detector
        .get("elements")
        .and_then(Value::as_array)
        .map(|elements| {
            elements
                .iter()
                .map(|element| Issue::new(issue_type.clone(), element_line(element), severity.clone(), message.clone()))
                .collect()
        })
        .unwrap_or_default()
}

fn detectors_of(container: Option<&Value>) -> &[Value] {
    container
        .and_then(|c| c.get("detectors"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// First key holding a string, else the placeholder.
fn text_or(value: &Value, keys: &[&str], placeholder: &str) -> String {
    keys.iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .unwrap_or(placeholder)
        .to_string()
}

/// Resolve an element's line across the known source-mapping layouts.
fn element_line(element: &Value) -> i64 {
    let Some(mapping) = element.get("source_mapping") else {
        return Issue::UNMAPPED_LINE;
    };

    line_value(mapping.get("lines"))
        .or_else(|| line_value(mapping.get("line")))
        .or_else(|| line_value(mapping.get("start").and_then(|start| start.get("line"))))
        .unwrap_or(Issue::UNMAPPED_LINE)
}

/// A line is either a scalar or the first entry of a list.
fn line_value(value: Option<&Value>) -> Option<i64> {
    let line = match value? {
        Value::Array(items) => items.first().and_then(Value::as_i64),
        other => other.as_i64(),
    };
    line.filter(|l| *l >= 0)
}
