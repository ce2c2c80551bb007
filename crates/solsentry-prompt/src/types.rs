//! Text helpers shared by the prompt templates.

/// Sanitize analyzer-provided text before it is interpolated into a prompt.
///
/// Code fences are escaped and control characters other than whitespace are
/// dropped.
pub fn sanitize_for_prompt(text: &str) -> String {
    text.replace("```", "\\`\\`\\`")
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect()
}

/// Sanitize a field value and indent its continuation lines so that every
/// line of an issue block except the header starts with whitespace or a label.
pub(crate) fn field_value(text: &str) -> String {
    let sanitized = sanitize_for_prompt(text).replace("\r\n", "\n").replace('\r', "\n");
    sanitized.trim_end().replace('\n', "\n    ")
}
