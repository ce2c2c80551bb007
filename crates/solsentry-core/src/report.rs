//! Synthesized risk report.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::risk_grading::RiskGrading;

/// The four field names of the report JSON contract, in canonical order.
pub const REPORT_FIELDS: [&str; 4] = [
    "risk_summary",
    "recommendation",
    "risk_grading",
    "confidence_score",
];

/// Key accepted in place of `recommendation`.
const RECOMMENDATION_ALIAS: &str = "llm_recommendation";

/// Validated risk report.
///
/// A `Report` can only be obtained through validation, so every instance
/// satisfies the contract: non-empty text fields, a grading from the closed
/// set and a confidence score within `[0.0, 1.0]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    risk_summary: String,
    recommendation: String,
    risk_grading: RiskGrading,
    confidence_score: f64,
}

/// Fields that failed validation, named by their canonical key.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid report field(s): {}", .fields.join(", "))]
pub struct ReportValidationError {
    pub fields: Vec<String>,
}

impl Report {
    /// Validate raw field values into a report.
    pub fn new(
        risk_summary: impl Into<String>,
        recommendation: impl Into<String>,
        risk_grading: &str,
        confidence_score: f64,
    ) -> Result<Self, ReportValidationError> {
        let mut object = Map::new();
        object.insert("risk_summary".into(), Value::String(risk_summary.into()));
        object.insert("recommendation".into(), Value::String(recommendation.into()));
        object.insert("risk_grading".into(), Value::String(risk_grading.to_string()));
        let score = serde_json::Number::from_f64(confidence_score)
            .map(Value::Number)
            .unwrap_or(Value::Null);
        object.insert("confidence_score".into(), score);
        Self::from_json(&Value::Object(object))
    }

    /// Validate a parsed JSON value against the report contract.
    ///
    /// Every violation is collected so the caller sees all offending fields
    /// at once. Nothing is defaulted or coerced.
    pub fn from_json(value: &Value) -> Result<Self, ReportValidationError> {
        let Some(object) = value.as_object() else {
            return Err(ReportValidationError {
                fields: REPORT_FIELDS.iter().map(|f| f.to_string()).collect(),
            });
        };

        let mut invalid = Vec::new();

        let risk_summary = non_empty_text(object.get("risk_summary"));
        if risk_summary.is_none() {
            invalid.push("risk_summary".to_string());
        }

        let recommendation = non_empty_text(
            object
                .get("recommendation")
                .or_else(|| object.get(RECOMMENDATION_ALIAS)),
        );
        if recommendation.is_none() {
            invalid.push("recommendation".to_string());
        }

        let risk_grading = object
            .get("risk_grading")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<RiskGrading>().ok());
        if risk_grading.is_none() {
            invalid.push("risk_grading".to_string());
        }

        let confidence_score = object
            .get("confidence_score")
            .and_then(Value::as_f64)
            .filter(|score| score.is_finite() && (0.0..=1.0).contains(score));
        if confidence_score.is_none() {
            invalid.push("confidence_score".to_string());
        }

        match (risk_summary, recommendation, risk_grading, confidence_score) {
            (Some(risk_summary), Some(recommendation), Some(risk_grading), Some(confidence_score)) => {
                Ok(Self {
                    risk_summary,
                    recommendation,
                    risk_grading,
                    confidence_score,
                })
            }
            _ => Err(ReportValidationError { fields: invalid }),
        }
    }

    pub fn risk_summary(&self) -> &str {
        &self.risk_summary
    }

    pub fn recommendation(&self) -> &str {
        &self.recommendation
    }

    pub fn risk_grading(&self) -> RiskGrading {
        self.risk_grading
    }

    pub fn confidence_score(&self) -> f64 {
        self.confidence_score
    }

    /// Canonical JSON form with exactly the four report fields.
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "risk_summary": self.risk_summary,
            "recommendation": self.recommendation,
            "risk_grading": self.risk_grading.as_str(),
            "confidence_score": self.confidence_score,
        })
    }
}

fn non_empty_text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "risk_summary": "Withdraw is reentrant.",
            "recommendation": "Apply checks-effects-interactions.",
            "risk_grading": "high",
            "confidence_score": 0.85
        })
    }

    #[test]
    fn test_valid_report() {
        let report = Report::from_json(&valid()).unwrap();
        assert_eq!(report.risk_summary(), "Withdraw is reentrant.");
        assert_eq!(report.risk_grading(), RiskGrading::High);
        assert_eq!(report.confidence_score(), 0.85);
    }

    #[test]
    fn test_round_trip_is_field_for_field_identical() {
        let report = Report::from_json(&valid()).unwrap();
        let serialized = serde_json::to_value(&report).unwrap();
        assert_eq!(serialized["risk_grading"], "High");
        let again = Report::from_json(&serialized).unwrap();
        assert_eq!(report, again);
        assert_eq!(serialized, report.to_json());
    }

    #[test]
    fn test_confidence_boundaries() {
        for score in [0.0, 1.0] {
            let mut value = valid();
            value["confidence_score"] = json!(score);
            assert!(Report::from_json(&value).is_ok(), "score {score} should pass");
        }
        for score in [1.0001, -0.0001] {
            let mut value = valid();
            value["confidence_score"] = json!(score);
            let err = Report::from_json(&value).unwrap_err();
            assert_eq!(err.fields, vec!["confidence_score"]);
        }
    }

    #[test]
    fn test_confidence_must_be_a_number() {
        let mut value = valid();
        value["confidence_score"] = json!("0.9");
        let err = Report::from_json(&value).unwrap_err();
        assert_eq!(err.fields, vec!["confidence_score"]);
    }

    #[test]
    fn test_grading_outside_closed_set() {
        let mut value = valid();
        value["risk_grading"] = json!("Severe");
        let err = Report::from_json(&value).unwrap_err();
        assert_eq!(err.fields, vec!["risk_grading"]);
    }

    #[test]
    fn test_padded_grading_is_not_coerced() {
        let mut value = valid();
        value["risk_grading"] = json!(" High ");
        let err = Report::from_json(&value).unwrap_err();
        assert_eq!(err.fields, vec!["risk_grading"]);
    }

    #[test]
    fn test_collects_every_offending_field() {
        let value = json!({"risk_summary": "  ", "risk_grading": 3});
        let err = Report::from_json(&value).unwrap_err();
        assert_eq!(
            err.fields,
            vec!["risk_summary", "recommendation", "risk_grading", "confidence_score"]
        );
    }

    #[test]
    fn test_non_object_root() {
        let err = Report::from_json(&json!(["High"])).unwrap_err();
        assert_eq!(err.fields.len(), 4);
    }

    #[test]
    fn test_recommendation_alias() {
        let value = json!({
            "risk_summary": "s",
            "llm_recommendation": "r",
            "risk_grading": "Low",
            "confidence_score": 0.1
        });
        let report = Report::from_json(&value).unwrap();
        assert_eq!(report.recommendation(), "r");
        assert!(report.to_json().get("llm_recommendation").is_none());
    }

    #[test]
    fn test_new_rejects_nan() {
        let err = Report::new("s", "r", "Low", f64::NAN).unwrap_err();
        assert_eq!(err.fields, vec!["confidence_score"]);
    }
}
