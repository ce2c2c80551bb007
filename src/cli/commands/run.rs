use anyhow::Result;
use serde_json::json;
use std::path::PathBuf;

use crate::cli::args::validate_files;
use crate::cli::commands::{failure_entry, print_entries, process_files};
use crate::config::SolsentryConfig;
use crate::pipeline::Pipeline;

pub async fn run_pipeline_command(config: SolsentryConfig, files: Vec<PathBuf>, concurrency: usize) -> Result<()> {
    validate_files(&files, concurrency)?;

    let pipeline = Pipeline::from_config(&config)?;
    let pipeline = &pipeline;
    let outcomes = process_files(&files, concurrency, move |source| async move {
        pipeline.run(&source).await.map_err(anyhow::Error::from)
    })
    .await;

    let mut failures = 0;
    let entries = outcomes
        .into_iter()
        .map(|(path, outcome)| match outcome {
            Ok(output) => {
                eprintln!(
                    "✅ {}: {} issue(s), risk {}",
                    path.display(),
                    output.issues.len(),
                    output.report.risk_grading()
                );
                json!({
                    "file": path.display().to_string(),
                    "issues": output.issues,
                    "report": output.report,
                })
            }
            Err(e) => {
                eprintln!("❌ {}: {}", path.display(), e);
                failures += 1;
                failure_entry(&path, &e)
            }
        })
        .collect();

    print_entries(entries, failures)
}
