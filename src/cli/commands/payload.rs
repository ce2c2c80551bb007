use anyhow::{Context, Result};
use serde_json::json;
use std::path::Path;

/// Request body for `POST /analyze` or `POST /pipeline`, built from a file.
pub fn build_payload(source_code: &str) -> Result<String> {
    Ok(serde_json::to_string_pretty(&json!({ "source_code": source_code }))?)
}

pub fn run_payload_command(file: &Path) -> Result<()> {
    let source_code = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    println!("{}", build_payload(&source_code)?);
    Ok(())
}
