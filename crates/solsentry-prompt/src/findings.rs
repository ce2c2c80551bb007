//! The two prompt kinds: with and without analyzer findings.

use solsentry_core::Issue;
use solsentry_i18n::Language;

use crate::templates;
use crate::traits::Prompt;

/// Fixed short prompt used when the analyzer reported nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFindingsPrompt {
    pub language: Language,
}

impl Prompt for NoFindingsPrompt {
    fn render(&self) -> String {
        templates::render_no_findings(self.language).to_string()
    }
}

/// Full audit prompt: role preamble, one block per issue in input order, and
/// the JSON-only reply contract.
#[derive(Debug, Clone)]
pub struct FindingsPrompt<'a> {
    pub issues: &'a [Issue],
    pub language: Language,
}

impl FindingsPrompt<'_> {
    /// Number of issue blocks this prompt renders.
    pub fn block_count(&self) -> usize {
        self.issues.len()
    }
}

impl Prompt for FindingsPrompt<'_> {
    fn render(&self) -> String {
        let blocks = self
            .issues
            .iter()
            .enumerate()
            .map(|(index, issue)| templates::render_issue(self.language, index, issue))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "{role}\n\n{blocks}\n{closing}\n",
            role = templates::render_role(self.language),
            blocks = blocks,
            closing = templates::render_closing(self.language),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_blocks(rendered: &str, language: Language) -> usize {
        let header = templates::issue_header(language);
        rendered.lines().filter(|line| line.starts_with(header)).count()
    }

    #[test]
    fn test_no_findings_prompt_is_fixed() {
        let english = NoFindingsPrompt::default().render();
        assert!(english.starts_with("No risks were found"));
        assert!(english.contains("JSON"));

        let indonesian = NoFindingsPrompt {
            language: Language::Indonesian,
        }
        .render();
        assert!(indonesian.starts_with("Tidak ada risiko yang ditemukan"));
    }

    #[test]
    fn test_findings_prompt_renders_each_issue_in_order() {
        let issues = vec![
            Issue::new("reentrancy", 42, "High", "Reentrancy in withdraw()"),
            Issue::new("tx-origin", 7, "Medium", "tx.origin used for auth"),
            Issue::new("solc-version", Issue::UNMAPPED_LINE, "Informational", "Old compiler"),
        ];
        let prompt = FindingsPrompt {
            issues: &issues,
            language: Language::English,
        };
        let rendered = prompt.render();

        assert_eq!(count_blocks(&rendered, Language::English), prompt.block_count());
        let first = rendered.find("Issue #1").unwrap();
        let second = rendered.find("Issue #2").unwrap();
        let third = rendered.find("Issue #3").unwrap();
        assert!(first < second && second < third);

        assert!(rendered.contains("Vulnerability Type: reentrancy"));
        assert!(rendered.contains("Location: line 42"));
        assert!(rendered.contains("Location: unknown"));
        assert!(rendered.contains("Message: tx.origin used for auth"));
    }

    #[test]
    fn test_closing_states_the_reply_contract() {
        let issues = vec![Issue::new("a", 1, "Low", "m")];
        let rendered = FindingsPrompt {
            issues: &issues,
            language: Language::English,
        }
        .render();

        assert!(rendered.contains("ONLY A SINGLE VALID JSON OBJECT"));
        for key in ["risk_summary", "recommendation", "risk_grading", "confidence_score"] {
            assert!(rendered.contains(&format!("\"{key}\"")), "missing {key}");
        }
        assert!(rendered.contains("\"Critical\", \"High\", \"Medium\", \"Low\""));
        assert!(rendered.contains("0.0 and 1.0"));
    }

    #[test]
    fn test_multiline_message_cannot_forge_a_block() {
        let issues = vec![Issue::new("a", 1, "Low", "first\nIssue #99\nthird")];
        let rendered = FindingsPrompt {
            issues: &issues,
            language: Language::English,
        }
        .render();
        assert_eq!(count_blocks(&rendered, Language::English), 1);
    }

    #[test]
    fn test_indonesian_labels() {
        let issues = vec![Issue::new("reentrancy", 42, "High", "m")];
        let rendered = FindingsPrompt {
            issues: &issues,
            language: Language::Indonesian,
        }
        .render();
        assert!(rendered.contains("Temuan #1"));
        assert!(rendered.contains("Tipe Kerentanan: reentrancy"));
        assert!(rendered.contains("Lokasi: baris 42"));
        assert!(rendered.contains("\"risk_grading\""));
    }
}
