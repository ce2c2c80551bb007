//! Normalized analyzer findings.

use serde::{Deserialize, Serialize};

/// One finding at one source location, independent of the analyzer version
/// that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Issue {
    /// Analyzer-defined category (e.g. "reentrancy").
    #[serde(rename = "type")]
    pub issue_type: String,
    /// Source line, or [`Issue::UNMAPPED_LINE`] when the analyzer gave no mapping.
    pub line: i64,
    /// Analyzer-defined severity label.
    pub severity: String,
    /// Human-readable description.
    pub message: String,
}

impl Issue {
    /// Line value used when no source location could be resolved.
    pub const UNMAPPED_LINE: i64 = -1;

    pub fn new(
        issue_type: impl Into<String>,
        line: i64,
        severity: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            issue_type: issue_type.into(),
            line,
            severity: severity.into(),
            message: message.into(),
        }
    }

    /// Whether this issue carries a real source line.
    pub fn has_location(&self) -> bool {
        self.line >= 0
    }
}

/// Ordered findings of one analyzer run, in emission order.
///
/// An empty result means "no findings" and is not a failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub issues: Vec<Issue>,
}

impl AnalysisResult {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Issue> {
        self.issues.iter()
    }

    pub fn as_slice(&self) -> &[Issue] {
        &self.issues
    }
}

impl From<Vec<Issue>> for AnalysisResult {
    fn from(issues: Vec<Issue>) -> Self {
        Self { issues }
    }
}

impl IntoIterator for AnalysisResult {
    type Item = Issue;
    type IntoIter = std::vec::IntoIter<Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.into_iter()
    }
}

impl<'a> IntoIterator for &'a AnalysisResult {
    type Item = &'a Issue;
    type IntoIter = std::slice::Iter<'a, Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.iter()
    }
}
