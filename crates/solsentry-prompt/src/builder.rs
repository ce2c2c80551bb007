//! Builder-pattern entry point for prompt construction.

use solsentry_core::Issue;
use solsentry_i18n::Language;

use crate::findings::{FindingsPrompt, NoFindingsPrompt};
use crate::traits::Prompt;

/// Builder for the audit prompt sent to the completion model.
///
/// The language is fixed per builder, so one deployment never mixes locales.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder {
    language: Language,
}

impl PromptBuilder {
    /// Create a new prompt builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the prompt language from a code or name (e.g. "en", "id").
    pub fn with_language(mut self, lang: &str) -> Self {
        self.language = Language::from_string(lang);
        self
    }

    /// Set the prompt language.
    pub fn with_locale(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Build the prompt for an ordered list of issues.
    ///
    /// An empty list yields the fixed no-findings prompt.
    pub fn build_prompt(&self, issues: &[Issue]) -> String {
        if issues.is_empty() {
            return NoFindingsPrompt {
                language: self.language,
            }
            .render();
        }

        FindingsPrompt {
            issues,
            language: self.language,
        }
        .render()
    }
}

/// Build a prompt with the default (English) builder.
pub fn build_prompt(issues: &[Issue]) -> String {
    PromptBuilder::new().build_prompt(issues)
}
