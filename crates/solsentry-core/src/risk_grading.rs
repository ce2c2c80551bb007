//! Overall risk grading of a report.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of overall risk gradings.
///
/// Parsing is case-insensitive; display and serialization always use the
/// canonical casing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RiskGrading {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid risk grading '{0}' (expected one of Critical, High, Medium, Low)")]
pub struct ParseRiskGradingError(pub String);

impl RiskGrading {
    pub const ALL: [RiskGrading; 4] = [
        RiskGrading::Critical,
        RiskGrading::High,
        RiskGrading::Medium,
        RiskGrading::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskGrading::Critical => "Critical",
            RiskGrading::High => "High",
            RiskGrading::Medium => "Medium",
            RiskGrading::Low => "Low",
        }
    }
}

impl fmt::Display for RiskGrading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskGrading {
    type Err = ParseRiskGradingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "critical" => Ok(RiskGrading::Critical),
            "high" => Ok(RiskGrading::High),
            "medium" => Ok(RiskGrading::Medium),
            "low" => Ok(RiskGrading::Low),
            _ => Err(ParseRiskGradingError(s.to_string())),
        }
    }
}

impl TryFrom<String> for RiskGrading {
    type Error = ParseRiskGradingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RiskGrading> for String {
    fn from(grading: RiskGrading) -> Self {
        grading.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("critical".parse::<RiskGrading>().unwrap(), RiskGrading::Critical);
        assert_eq!("HIGH".parse::<RiskGrading>().unwrap(), RiskGrading::High);
        assert_eq!("Medium".parse::<RiskGrading>().unwrap(), RiskGrading::Medium);
        assert_eq!("lOw".parse::<RiskGrading>().unwrap(), RiskGrading::Low);
    }

    #[test]
    fn test_rejects_values_outside_the_set() {
        let err = "Severe".parse::<RiskGrading>().unwrap_err();
        assert_eq!(err.0, "Severe");
        assert!("".parse::<RiskGrading>().is_err());
        assert!("Info".parse::<RiskGrading>().is_err());
    }

    #[test]
    fn test_rejects_padded_values() {
        assert!(" High ".parse::<RiskGrading>().is_err());
        assert!("Low\n".parse::<RiskGrading>().is_err());
    }

    #[test]
    fn test_serializes_canonical_casing() {
        let grading: RiskGrading = serde_json::from_str(r#""high""#).unwrap();
        assert_eq!(serde_json::to_string(&grading).unwrap(), r#""High""#);
        assert_eq!(format!("{}", RiskGrading::Critical), "Critical");
    }

    #[test]
    fn test_ordering_by_severity() {
        assert!(RiskGrading::Critical > RiskGrading::High);
        assert!(RiskGrading::Medium > RiskGrading::Low);
    }
}
