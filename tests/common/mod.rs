//! Shared fixtures: a shell script standing in for the analyzer and a
//! canned completion transport.

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use solsentry::{AnalyzerConfig, LlmConfig, Pipeline, ReportSynthesizer, StaticAnalyzer};
use solsentry_llm::{CompletionRequest, CompletionTransport, TransportError};

pub const CONTRACT: &str = r#"pragma solidity ^0.8.0;

contract Vault {
    mapping(address => uint256) balances;

    function withdraw() external {
        (bool ok, ) = msg.sender.call{value: balances[msg.sender]}("");
        require(ok);
        balances[msg.sender] = 0;
    }
}
"#;

pub const REENTRANCY_OUTPUT: &str = r#"{"success":true,"result":{"detectors":[{"check":"reentrancy","impact":"High","message":"Reentrancy in withdraw()\nmore","elements":[{"source_mapping":{"start":{"line":[42]}}}]}]}}"#;

pub const VALID_REPORT: &str = r#"{"risk_summary":"Funds can be drained.","recommendation":"Apply checks-effects-interactions.","risk_grading":"High","confidence_score":0.85}"#;

/// Write an executable analyzer stand-in that runs `body`.
pub fn fake_analyzer(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-slither");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Analyzer stand-in that prints `json` on stdout.
pub fn printing_analyzer(dir: &Path, json: &str) -> PathBuf {
    fake_analyzer(dir, &format!("cat <<'EOF'\n{}\nEOF", json))
}

pub struct CannedTransport {
    reply: Result<String, u16>,
    pub calls: AtomicUsize,
}

impl CannedTransport {
    /// Answers with a `generateContent` envelope wrapping `text`.
    pub fn text(text: &str) -> Arc<Self> {
        let body = serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": text}]}}]
        })
        .to_string();
        Arc::new(Self {
            reply: Ok(body),
            calls: AtomicUsize::new(0),
        })
    }

    /// Fails every call with the given HTTP status.
    pub fn status(status: u16) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(status),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionTransport for CannedTransport {
    async fn complete(&self, _request: CompletionRequest<'_>) -> Result<String, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Ok(body) => Ok(body.clone()),
            Err(status) => Err(TransportError::Status {
                status: *status,
                body: "upstream error".to_string(),
            }),
        }
    }
}

pub fn pipeline(analyzer_path: PathBuf, scratch: &Path, transport: Arc<CannedTransport>, api_key: Option<&str>) -> Pipeline {
    let analyzer = StaticAnalyzer::new(
        AnalyzerConfig::new(analyzer_path)
            .with_timeout(5)
            .with_scratch_dir(scratch.to_path_buf()),
    );
    let mut llm = LlmConfig::new();
    llm.api_key = api_key.map(str::to_string);
    let synthesizer = ReportSynthesizer::with_transport(llm, transport);
    Pipeline::new(analyzer, synthesizer)
}

pub fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path).unwrap().next().is_none()
}
