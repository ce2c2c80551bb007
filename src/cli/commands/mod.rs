pub mod analyze;
pub mod payload;
pub mod report;
pub mod run;
pub mod serve;

pub use analyze::run_analyze_command;
pub use payload::run_payload_command;
pub use report::run_report_command;
pub use run::run_pipeline_command;
pub use serve::run_serve_command;

use anyhow::{Result, anyhow};
use futures::stream::{self, StreamExt};
use serde_json::{Value, json};
use std::future::Future;
use std::path::{Path, PathBuf};

use crate::pipeline::PipelineError;

/// Read each file and hand its contents to `task`, at most `concurrency`
/// at a time. Outcomes come back in input order.
pub(crate) async fn process_files<T, F, Fut>(
    files: &[PathBuf],
    concurrency: usize,
    task: F,
) -> Vec<(PathBuf, Result<T>)>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let task = &task;
    let mut outcomes: Vec<(usize, PathBuf, Result<T>)> = stream::iter(files.iter().cloned().enumerate())
        .map(|(index, path)| async move {
            let outcome = match tokio::fs::read_to_string(&path).await {
                Ok(source) => task(source).await,
                Err(e) => Err(anyhow!("Failed to read {}: {}", path.display(), e)),
            };
            (index, path, outcome)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    outcomes.sort_by_key(|(index, _, _)| *index);
    outcomes.into_iter().map(|(_, path, outcome)| (path, outcome)).collect()
}

/// JSON entry for a failed file.
pub(crate) fn failure_entry(path: &Path, error: &anyhow::Error) -> Value {
    let kind = error
        .downcast_ref::<PipelineError>()
        .map(PipelineError::kind)
        .unwrap_or("Io");
    json!({
        "file": path.display().to_string(),
        "error": error.to_string(),
        "kind": kind,
    })
}

/// Print the collected entries and fail if any file failed.
pub(crate) fn print_entries(entries: Vec<Value>, failures: usize) -> Result<()> {
    let total = entries.len();
    let output = if total == 1 {
        entries.into_iter().next().unwrap_or(Value::Null)
    } else {
        Value::Array(entries)
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    if failures > 0 {
        return Err(anyhow!("{} of {} file(s) failed", failures, total));
    }
    Ok(())
}
