// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::audit::{AuditOutcome, DeviceType};
use crate::services::lighthouse::{extract_scores, AuditEngine};
use std::sync::Arc;
use std::time::Duration;

/// Default upper bound for one engine run
pub const DEFAULT_AUDIT_TIMEOUT: Duration = Duration::from_secs(120);

/// Audits a single page under a single device profile
#[derive(Clone)]
pub struct PageAuditor {
    engine: Arc<dyn AuditEngine>,
    timeout: Duration,
}

impl PageAuditor {
    pub fn new(engine: Arc<dyn AuditEngine>, timeout: Duration) -> Self {
        Self { engine, timeout }
    }

    /// Run the engine and classify the result. Every outcome, including a hung
    /// engine, comes back as an `AuditOutcome`.
    pub async fn audit(&self, page_url: &str, device: DeviceType) -> AuditOutcome {
        let started = std::time::Instant::now();

        let outcome =
            match tokio::time::timeout(self.timeout, self.engine.run_audit(page_url, device)).await
            {
                Ok(Ok(report)) => AuditOutcome::Completed {
                    scores: extract_scores(&report),
                    report,
                },
                Ok(Err(cause)) => AuditOutcome::failed(cause),
                Err(_) => {
                    AuditOutcome::failed(format!("audit timed out after {:?}", self.timeout))
                }
            };

        match &outcome {
            AuditOutcome::Completed { scores, .. } => tracing::info!(
                page_url,
                %device,
                elapsed_ms = started.elapsed().as_millis() as u64,
                performance = ?scores.performance,
                "Page audit completed"
            ),
            AuditOutcome::Failed { error } => tracing::warn!(
                page_url,
                %device,
                elapsed_ms = started.elapsed().as_millis() as u64,
                error = %error,
                "Page audit failed"
            ),
        }

        outcome
    }
}
