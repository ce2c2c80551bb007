//! Audit prompt construction for solsentry.
//!
//! Turns an ordered list of normalized analyzer issues into the single
//! instruction string sent to the completion model. Rendering is pure and
//! deterministic: the same issues and language always yield the same text.
//!
//! # Example
//!
//! ```rust
//! use solsentry_core::Issue;
//! use solsentry_prompt::PromptBuilder;
//!
//! let issues = vec![Issue::new("reentrancy", 42, "High", "Reentrancy in withdraw()")];
//! let prompt = PromptBuilder::new().build_prompt(&issues);
//! assert!(prompt.contains("Issue #1"));
//! ```

mod builder;
mod findings;
mod templates;
mod traits;
mod types;

pub use builder::{build_prompt, PromptBuilder};
pub use findings::{FindingsPrompt, NoFindingsPrompt};
pub use solsentry_i18n::Language;
pub use traits::Prompt;
pub use types::sanitize_for_prompt;
