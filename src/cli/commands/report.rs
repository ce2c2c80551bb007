use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::io::Read;
use std::path::Path;

use solsentry_core::Issue;

use crate::config::SolsentryConfig;
use crate::pipeline::Pipeline;

/// Accepts either `{"issues": [...]}` (the `/analyze` response) or a bare array.
pub fn parse_issues(input: &str) -> Result<Vec<Issue>> {
    let value: Value = serde_json::from_str(input).context("Issues input is not valid JSON")?;
    let list = match value {
        Value::Object(mut object) => match object.remove("issues") {
            Some(list) => list,
            None => bail!("Issues input has no \"issues\" field"),
        },
        list @ Value::Array(_) => list,
        _ => bail!("Issues input must be an object or an array"),
    };
    Ok(serde_json::from_value(list).context("Issues input does not match the issue shape")?)
}

fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        return Ok(buffer);
    }
    std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input.display()))
}

pub async fn run_report_command(config: SolsentryConfig, input: &Path) -> Result<()> {
    let issues = parse_issues(&read_input(input)?)?;
    let pipeline = Pipeline::from_config(&config)?;

    let report = pipeline.synthesize(&issues).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_issues_shapes() {
        let wrapped = r#"{"issues":[{"type":"reentrancy","line":42,"severity":"High","message":"m"}]}"#;
        let issues = parse_issues(wrapped).unwrap();
        assert_eq!(issues, vec![Issue::new("reentrancy", 42, "High", "m")]);

        let bare = r#"[{"type":"tx-origin","line":-1,"severity":"Medium","message":"m"}]"#;
        assert_eq!(parse_issues(bare).unwrap()[0].line, Issue::UNMAPPED_LINE);

        assert!(parse_issues("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_issues_rejects_bad_input() {
        assert!(parse_issues("not json").is_err());
        assert!(parse_issues(r#"{"findings":[]}"#).is_err());
        assert!(parse_issues("42").is_err());
        assert!(parse_issues(r#"[{"type":"x"}]"#).is_err());
    }
}
