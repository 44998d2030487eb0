// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Lighthouse integration: the audit engine seam, the CLI adapter and score extraction.

use crate::models::audit::{DeviceType, LighthouseScores};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// External engine that audits one URL under one device profile.
///
/// Returns the raw JSON report, or a human-readable cause on failure.
#[async_trait]
pub trait AuditEngine: Send + Sync {
    async fn run_audit(&self, url: &str, device: DeviceType) -> Result<Value, String>;
}

/// Runs the `lighthouse` command-line tool with headless Chrome
#[derive(Debug, Clone)]
pub struct LighthouseCli {
    binary: PathBuf,
}

impl LighthouseCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Command-line arguments for auditing `url` as `device`
    pub fn args(url: &str, device: DeviceType) -> Vec<String> {
        vec![
            url.to_string(),
            "--output=json".to_string(),
            "--output-path=stdout".to_string(),
            "--chrome-flags=--headless --no-sandbox --disable-dev-shm-usage".to_string(),
            "--no-enable-error-reporting".to_string(),
            "--quiet".to_string(),
            "--preset=perf".to_string(),
            format!("--emulated-form-factor={}", device),
            "--throttling-method=simulate".to_string(),
        ]
    }
}

#[async_trait]
impl AuditEngine for LighthouseCli {
    async fn run_audit(&self, url: &str, device: DeviceType) -> Result<Value, String> {
        tracing::debug!(url, %device, binary = %self.binary.display(), "Spawning lighthouse");

        // kill_on_drop reaps the child when a caller-side timeout drops this future
        let output = Command::new(&self.binary)
            .args(Self::args(url, device))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| format!("failed to start {}: {}", self.binary.display(), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.trim();
            return Err(match output.status.code() {
                Some(code) if !detail.is_empty() => {
                    format!("lighthouse exited with status {}: {}", code, detail)
                }
                Some(code) => format!("lighthouse exited with status {}", code),
                None => "lighthouse was terminated by a signal".to_string(),
            });
        }

        parse_report(&output.stdout)
    }
}

/// Parse engine output into a report, rejecting anything without a `categories` object
pub fn parse_report(stdout: &[u8]) -> Result<Value, String> {
    let report: Value = serde_json::from_slice(stdout)
        .map_err(|e| format!("lighthouse produced malformed JSON: {}", e))?;

    if !report.get("categories").is_some_and(Value::is_object) {
        return Err("lighthouse report has no categories".to_string());
    }

    Ok(report)
}

/// Category scores of a report, scaled from 0-1 to 0-100
pub fn extract_scores(report: &Value) -> LighthouseScores {
    let categories = report.get("categories");
    let score = |key: &str| {
        categories
            .and_then(|c| c.get(key))
            .and_then(|c| c.get("score"))
            .and_then(Value::as_f64)
            .map(|s| s * 100.0)
    };

    LighthouseScores {
        performance: score("performance"),
        accessibility: score("accessibility"),
        best_practices: score("best-practices"),
        seo: score("seo"),
        pwa: score("pwa"),
    }
}
