//! Locale selection for solsentry prompts.
//!
//! The prompt language is a per-deployment choice: one `Language` is picked
//! at startup and used for every prompt that instance renders.

use serde::{Deserialize, Serialize};

/// Language of the instructions sent to the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Indonesian,
}

impl Language {
    /// Parse a language code or name, falling back to English.
    pub fn from_string(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" | "in" | "indonesian" | "bahasa" => Language::Indonesian,
            _ => Language::English,
        }
    }

    /// ISO 639-1 code.
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Indonesian => "id",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
