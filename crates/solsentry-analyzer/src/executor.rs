//! Analyzer process executor.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::Value;
use solsentry_core::AnalysisResult;
use tempfile::{NamedTempFile, TempDir};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::parser::normalize_output;
use crate::{AnalyzerConfig, MessagePolicy};

/// Errors that can occur while running the static analyzer.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Analyzer executable could not be started: {}: {source}", path.display())]
    ExecutionNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Analyzer crashed: {reason}")]
    ExecutionCrashed { reason: String, stderr: String },

    #[error("Failed to parse analyzer output: {detail}")]
    OutputUnparsable {
        detail: String,
        stdout: String,
        stderr: String,
    },

    #[error("Analyzer reported failure: {message}")]
    AnalyzerReportedFailure { message: String },

    #[error("Failed to prepare scratch file: {0}")]
    ScratchFile(#[source] std::io::Error),
}

impl AnalyzerError {
    /// Stable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalyzerError::ExecutionNotFound { .. } => "ExecutionNotFound",
            AnalyzerError::ExecutionCrashed { .. } => "ExecutionCrashed",
            AnalyzerError::OutputUnparsable { .. } => "OutputUnparsable",
            AnalyzerError::AnalyzerReportedFailure { .. } => "AnalyzerReportedFailure",
            AnalyzerError::ScratchFile(_) => "ScratchFile",
        }
    }

    /// Raw analyzer output attached for diagnosis, if any.
    pub fn diagnostics(&self) -> Option<String> {
        match self {
            AnalyzerError::ExecutionCrashed { stderr, .. } if !stderr.is_empty() => {
                Some(stderr.clone())
            }
            AnalyzerError::OutputUnparsable { stdout, stderr, .. } => Some(format!(
                "stdout: {}\nstderr: {}",
                stdout.trim_end(),
                stderr.trim_end()
            )),
            _ => None,
        }
    }
}

/// Output from one analyzer run.
#[derive(Debug, Clone)]
pub struct AnalyzerOutput {
    /// Normalized findings.
    pub result: AnalysisResult,
    /// Process exit code (the analyzer exits non-zero when it has findings).
    pub exit_code: Option<i32>,
    /// Duration in milliseconds.
    pub duration_ms: u64,
    /// Captured standard error.
    pub stderr: String,
}

/// Per-invocation scratch space: a private directory used as the analyzer's
/// working directory, holding the uniquely named contract file.
///
/// Dropping it removes both, whichever way the invocation ends.
struct ScratchWorkspace {
    file: NamedTempFile,
    dir: TempDir,
}

impl ScratchWorkspace {
    fn create(root: Option<&Path>, source_code: &str) -> std::io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("solsentry-");
        let dir = match root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };

        let mut file = tempfile::Builder::new()
            .prefix("contract-")
            .suffix(".sol")
            .tempfile_in(dir.path())?;
        file.write_all(source_code.as_bytes())?;
        file.flush()?;

        Ok(Self { file, dir })
    }

    fn contract_path(&self) -> &Path {
        self.file.path()
    }

    fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Output of a finished analyzer process.
struct RawRun {
    exit_code: Option<i32>,
    stdout: String,
    stderr: String,
}

/// Drains one child pipe into a shared buffer on a background task.
///
/// The buffer is readable at any time, so a killed process still yields what
/// it wrote. Dropping the collector stops the task.
struct PipeCollector {
    buffer: Arc<Mutex<Vec<u8>>>,
    task: JoinHandle<()>,
}

impl PipeCollector {
    fn start<R>(pipe: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);
        let task = tokio::spawn(async move {
            let Some(mut pipe) = pipe else {
                return;
            };
            let mut chunk = [0u8; 8192];
            loop {
                match pipe.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if let Ok(mut buffer) = sink.lock() {
                            buffer.extend_from_slice(&chunk[..n]);
                        }
                    }
                }
            }
        });
        Self { buffer, task }
    }

    /// Wait until the pipe reaches end of file.
    async fn finished(&mut self) {
        if let Err(e) = (&mut self.task).await {
            debug!("Pipe reader stopped early: {}", e);
        }
    }

    fn contents(&self) -> String {
        self.buffer
            .lock()
            .map(|buffer| String::from_utf8_lossy(&buffer).into_owned())
            .unwrap_or_default()
    }
}

impl Drop for PipeCollector {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Runs the external analyzer and normalizes its report.
///
/// Stateless across calls, so one instance can serve concurrent requests.
#[derive(Debug, Clone)]
pub struct StaticAnalyzer {
    analyzer_path: PathBuf,
    timeout_secs: u64,
    message_policy: MessagePolicy,
    extra_args: Vec<String>,
    scratch_dir: Option<PathBuf>,
    log_dir: Option<PathBuf>,
}

impl StaticAnalyzer {
    /// Create a new analyzer with the given configuration.
    pub fn new(config: AnalyzerConfig) -> Self {
        if let Some(ref log_dir) = config.log_dir {
            std::fs::create_dir_all(log_dir).ok();
        }

        Self {
            analyzer_path: config.analyzer_path,
            timeout_secs: config.timeout_secs,
            message_policy: config.message_policy,
            extra_args: config.extra_args,
            scratch_dir: config.scratch_dir,
            log_dir: config.log_dir,
        }
    }

    pub fn analyzer_path(&self) -> &Path {
        &self.analyzer_path
    }

    /// Analyze Solidity source and return the normalized findings.
    pub async fn analyze(&self, source_code: &str) -> Result<AnalysisResult, AnalyzerError> {
        self.analyze_with_output(source_code).await.map(|output| output.result)
    }

    /// Analyze Solidity source, keeping process metadata alongside the findings.
    pub async fn analyze_with_output(&self, source_code: &str) -> Result<AnalyzerOutput, AnalyzerError> {
        let workspace = ScratchWorkspace::create(self.scratch_dir.as_deref(), source_code)
            .map_err(AnalyzerError::ScratchFile)?;

        let start_time = Instant::now();
        let run = self.run_analyzer(&workspace).await?;
        let duration_ms = start_time.elapsed().as_millis() as u64;

        let RawRun {
            exit_code,
            stdout,
            stderr,
        } = run;

        info!("Analyzer finished with exit code {:?} in {}ms", exit_code, duration_ms);
        self.save_log(&workspace, exit_code, &stdout, &stderr);

        if stdout.trim().is_empty() && !stderr.trim().is_empty() {
            warn!("Analyzer produced no output: {}", stderr.trim_end());
            return Err(AnalyzerError::ExecutionCrashed {
                reason: "analyzer produced no output; the contract likely failed to compile".to_string(),
                stderr,
            });
        }

        if !stderr.trim().is_empty() {
            debug!("Analyzer stderr: {}", stderr.trim_end());
        }

        let root: Value = serde_json::from_str(&stdout).map_err(|e| {
            warn!("Analyzer did not produce valid JSON: {}", e);
            AnalyzerError::OutputUnparsable {
                detail: e.to_string(),
                stdout: stdout.clone(),
                stderr: stderr.clone(),
            }
        })?;

        let result = normalize_output(&root, self.message_policy).inspect_err(|e| {
            warn!("{}", e);
        })?;
        info!("Analyzer reported {} issue(s)", result.len());

        Ok(AnalyzerOutput {
            result,
            exit_code,
            duration_ms,
            stderr,
        })
    }

    /// Spawn the analyzer and collect its output within the configured timeout.
    ///
    /// Both pipes are drained while the process runs, so whatever the analyzer
    /// wrote before a timeout is still available for diagnosis.
    async fn run_analyzer(&self, workspace: &ScratchWorkspace) -> Result<RawRun, AnalyzerError> {
        let mut cmd = Command::new(&self.analyzer_path);

        cmd.arg(workspace.contract_path())
            .arg("--json")
            .arg("-")
            .args(&self.extra_args);

        cmd.current_dir(workspace.dir())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Spawning analyzer process: {:?}", cmd);

        let mut child = cmd.spawn().map_err(|e| AnalyzerError::ExecutionNotFound {
            path: self.analyzer_path.clone(),
            source: e,
        })?;

        let mut stdout = PipeCollector::start(child.stdout.take());
        let mut stderr = PipeCollector::start(child.stderr.take());

        let limit = Duration::from_secs(self.timeout_secs);
        let waited = timeout(limit, async {
            let status = child.wait().await?;
            stdout.finished().await;
            stderr.finished().await;
            Ok::<_, std::io::Error>(status)
        })
        .await;

        match waited {
            Ok(Ok(status)) => Ok(RawRun {
                exit_code: status.code(),
                stdout: stdout.contents(),
                stderr: stderr.contents(),
            }),
            Ok(Err(e)) => Err(AnalyzerError::ExecutionCrashed {
                reason: format!("failed to collect analyzer output: {}", e),
                stderr: stderr.contents(),
            }),
            Err(_) => {
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill timed out analyzer: {}", e);
                }
                let stderr = stderr.contents();
                warn!("Analyzer timed out after {} seconds, process killed", self.timeout_secs);
                self.save_log(workspace, None, &stdout.contents(), &stderr);
                Err(AnalyzerError::ExecutionCrashed {
                    reason: format!("analyzer timed out after {} seconds", self.timeout_secs),
                    stderr,
                })
            }
        }
    }

    fn save_log(&self, workspace: &ScratchWorkspace, exit_code: Option<i32>, stdout: &str, stderr: &str) {
        let Some(ref log_dir) = self.log_dir else {
            return;
        };

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S_%3f");
        let log_file = log_dir.join(format!("analyzer_{}.log", timestamp));
        let log_content = format!(
            "=== Analyzer Execution Log ===\n\
             Timestamp: {}\n\
             Analyzer: {}\n\
             Contract: {}\n\
             Exit Code: {:?}\n\
             \n\
             === STDOUT ===\n\
             {}\n\
             \n\
             === STDERR ===\n\
             {}\n",
            chrono::Utc::now().to_rfc3339(),
            self.analyzer_path.display(),
            workspace.contract_path().display(),
            exit_code,
            stdout,
            stderr
        );
        if let Err(e) = std::fs::write(&log_file, &log_content) {
            warn!("Failed to write analyzer log: {}", e);
        } else {
            info!("Analyzer log saved: {}", log_file.display());
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use solsentry_core::Issue;
    use std::os::unix::fs::PermissionsExt;

    const CONTRACT: &str = "pragma solidity ^0.8.0;\ncontract Vault {}\n";

    /// Write an executable shell script standing in for the analyzer.
    fn fake_analyzer(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-slither");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn analyzer(bin_dir: &Path, scratch: &Path, body: &str) -> StaticAnalyzer {
        let path = fake_analyzer(bin_dir, body);
        StaticAnalyzer::new(
            AnalyzerConfig::new(path)
                .with_timeout(5)
                .with_scratch_dir(scratch.to_path_buf()),
        )
    }

    fn is_empty_dir(path: &Path) -> bool {
        std::fs::read_dir(path).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn test_shape_a_output() {
        let bin = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let analyzer = analyzer(
            bin.path(),
            scratch.path(),
            r#"cat <<'EOF'
{"success":true,"result":{"detectors":[{"check":"reentrancy","impact":"High","message":"Reentrancy in withdraw()\nmore","elements":[{"source_mapping":{"start":{"line":[42]}}}]}]}}
EOF
exit 1"#,
        );

        let output = analyzer.analyze_with_output(CONTRACT).await.unwrap();
        assert_eq!(
            output.result.issues,
            vec![Issue::new("reentrancy", 42, "High", "Reentrancy in withdraw()")]
        );
        assert_eq!(output.exit_code, Some(1));
        assert!(is_empty_dir(scratch.path()));
    }

    #[tokio::test]
    async fn test_invocation_arguments_and_scratch_file() {
        let bin = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let analyzer = analyzer(
            bin.path(),
            scratch.path(),
            r#"case "$1" in *.sol) ;; *) echo "bad file $1" >&2; exit 2;; esac
[ "$2" = "--json" ] && [ "$3" = "-" ] || { echo "bad flags" >&2; exit 2; }
grep -q "contract Vault" "$1" || { echo "missing source" >&2; exit 2; }
echo '{"results":{"detectors":[]}}'"#,
        );

        let result = analyzer.analyze(CONTRACT).await.unwrap();
        assert!(result.is_empty());
        assert!(is_empty_dir(scratch.path()));
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let scratch = TempDir::new().unwrap();
        let analyzer = StaticAnalyzer::new(
            AnalyzerConfig::new(PathBuf::from("/nonexistent/solsentry/slither"))
                .with_scratch_dir(scratch.path().to_path_buf()),
        );

        let err = analyzer.analyze(CONTRACT).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::ExecutionNotFound { .. }), "{err:?}");
        assert_eq!(err.kind(), "ExecutionNotFound");
        assert!(is_empty_dir(scratch.path()));
    }

    #[tokio::test]
    async fn test_empty_stdout_with_stderr_is_a_crash() {
        let bin = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let analyzer = analyzer(
            bin.path(),
            scratch.path(),
            r#"echo "CompilerError: Expected ';' but got '}'" >&2
exit 1"#,
        );

        let err = analyzer.analyze(CONTRACT).await.unwrap_err();
        match &err {
            AnalyzerError::ExecutionCrashed { stderr, .. } => {
                assert!(stderr.contains("CompilerError"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.diagnostics().unwrap().contains("CompilerError"));
        assert!(is_empty_dir(scratch.path()));
    }

    #[tokio::test]
    async fn test_garbled_output_is_unparsable() {
        let bin = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let analyzer = analyzer(
            bin.path(),
            scratch.path(),
            r#"echo "INFO:Detectors: something"
echo "warning" >&2"#,
        );

        let err = analyzer.analyze(CONTRACT).await.unwrap_err();
        match &err {
            AnalyzerError::OutputUnparsable { stdout, stderr, .. } => {
                assert!(stdout.contains("INFO:Detectors"));
                assert!(stderr.contains("warning"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reported_failure() {
        let bin = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let analyzer = analyzer(
            bin.path(),
            scratch.path(),
            r#"echo '{"success": false, "error": "Invalid compilation", "results": {}}'"#,
        );

        let err = analyzer.analyze(CONTRACT).await.unwrap_err();
        match err {
            AnalyzerError::AnalyzerReportedFailure { message } => {
                assert_eq!(message, "Invalid compilation")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(is_empty_dir(scratch.path()));
    }

    #[tokio::test]
    async fn test_timeout_kills_and_cleans_up() {
        let bin = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let path = fake_analyzer(bin.path(), "sleep 10");
        let analyzer = StaticAnalyzer::new(
            AnalyzerConfig::new(path)
                .with_timeout(1)
                .with_scratch_dir(scratch.path().to_path_buf()),
        );

        let started = Instant::now();
        let err = analyzer.analyze(CONTRACT).await.unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(5));
        match err {
            AnalyzerError::ExecutionCrashed { reason, .. } => assert!(reason.contains("timed out")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(is_empty_dir(scratch.path()));
    }

    #[tokio::test]
    async fn test_timeout_keeps_stderr_written_so_far() {
        let bin = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let path = fake_analyzer(
            bin.path(),
            "echo 'Compiling contract... solc hung' >&2\nexec sleep 10",
        );
        let analyzer = StaticAnalyzer::new(
            AnalyzerConfig::new(path)
                .with_timeout(1)
                .with_scratch_dir(scratch.path().to_path_buf()),
        );

        let err = analyzer.analyze(CONTRACT).await.unwrap_err();
        assert_eq!(err.kind(), "ExecutionCrashed");
        match &err {
            AnalyzerError::ExecutionCrashed { reason, stderr } => {
                assert!(reason.contains("timed out"));
                assert!(stderr.contains("solc hung"), "stderr: {stderr:?}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.diagnostics().unwrap().contains("solc hung"));
        assert!(is_empty_dir(scratch.path()));
    }

    #[tokio::test]
    async fn test_dropped_run_cleans_up() {
        let bin = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let analyzer = StaticAnalyzer::new(
            AnalyzerConfig::new(fake_analyzer(bin.path(), "exec sleep 10"))
                .with_timeout(30)
                .with_scratch_dir(scratch.path().to_path_buf()),
        );

        let cancelled = timeout(Duration::from_millis(300), analyzer.analyze(CONTRACT)).await;
        assert!(cancelled.is_err());
        assert!(is_empty_dir(scratch.path()));
    }

    #[tokio::test]
    async fn test_log_dir_receives_raw_output() {
        let bin = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let logs = TempDir::new().unwrap();
        let path = fake_analyzer(bin.path(), r#"echo '{"results":{"detectors":[]}}'"#);
        let analyzer = StaticAnalyzer::new(
            AnalyzerConfig::new(path)
                .with_scratch_dir(scratch.path().to_path_buf())
                .with_log_dir(logs.path().to_path_buf()),
        );

        analyzer.analyze(CONTRACT).await.unwrap();
        let entries: Vec<_> = std::fs::read_dir(logs.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let content = std::fs::read_to_string(entries[0].as_ref().unwrap().path()).unwrap();
        assert!(content.contains("\"detectors\""));
    }

    #[test]
    fn test_analyzer_is_reusable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StaticAnalyzer>();

        let analyzer = StaticAnalyzer::new(AnalyzerConfig::default());
        assert_eq!(analyzer.analyzer_path(), Path::new("slither"));
        let err = tokio_test::block_on(async {
            StaticAnalyzer::new(AnalyzerConfig::new(PathBuf::from("/nonexistent/slither")))
                .analyze(CONTRACT)
                .await
                .unwrap_err()
        });
        assert_eq!(err.kind(), "ExecutionNotFound");
    }
}
