// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Scheduling of page audit jobs: the unit of work and the two ways to run it.

use crate::error::{AuditError, Result};
use crate::models::audit::AuditOutcome;
use crate::models::queue::PageAuditJob;
use crate::services::auditor::PageAuditor;
use crate::services::store::AuditStore;
use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

const PANIC_MESSAGE: &str = "audit task panicked";

/// Accepts page audit jobs for execution
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Hand over a job whose `pending` row already exists.
    /// An error means the job was not accepted and will never run.
    async fn dispatch(&self, job: PageAuditJob) -> Result<()>;
}

/// One page audit: run the engine and write the outcome to the job's row
#[derive(Clone)]
pub struct PageAuditTask {
    store: Arc<dyn AuditStore>,
    auditor: PageAuditor,
}

impl PageAuditTask {
    pub fn new(store: Arc<dyn AuditStore>, auditor: PageAuditor) -> Self {
        Self { store, auditor }
    }

    /// Run the job to a terminal row state. Never returns an error: store failures
    /// are logged and, where possible, recorded on the row.
    pub async fn execute(&self, job: &PageAuditJob) {
        if let Err(e) = self.run(job).await {
            tracing::error!(audit_id = %job.audit_id, page_url = %job.page_url, error = %e, "Page audit task failed");
            self.mark_failed(job.audit_id, &e.to_string()).await;
        }
    }

    /// Returns whether this run wrote the terminal state
    async fn run(&self, job: &PageAuditJob) -> Result<bool> {
        let audit = self
            .store
            .get_audit_result(job.audit_id)
            .await?
            .ok_or(AuditError::AuditResultNotFound(job.audit_id))?;

        // Redelivered job: the row was finished by an earlier run
        if audit.status.is_terminal() {
            tracing::debug!(audit_id = %job.audit_id, status = %audit.status, "Skipping finished audit");
            return Ok(false);
        }

        let written = match self.auditor.audit(&job.page_url, job.device).await {
            AuditOutcome::Completed { scores, report } => {
                self.store
                    .complete_audit_result(job.audit_id, &scores, &report)
                    .await?
            }
            AuditOutcome::Failed { error } => {
                self.store.fail_audit_result(job.audit_id, &error).await?
            }
        };

        if !written {
            tracing::debug!(audit_id = %job.audit_id, "Audit row finished concurrently, outcome dropped");
        }
        Ok(written)
    }

    /// Best effort: mark the row failed, logging if even that is impossible
    pub async fn mark_failed(&self, audit_id: Uuid, error: &str) {
        match self.store.fail_audit_result(audit_id, error).await {
            Ok(_) => {}
            Err(AuditError::AuditResultNotFound(_)) => {
                tracing::warn!(%audit_id, "Cannot mark missing audit row as failed");
            }
            Err(e) => {
                tracing::error!(%audit_id, error = %e, "Failed to mark audit row as failed");
            }
        }
    }
}

/// Runs each job to completion on the caller's task
pub struct InlineDispatcher {
    task: PageAuditTask,
}

impl InlineDispatcher {
    pub fn new(task: PageAuditTask) -> Self {
        Self { task }
    }
}

#[async_trait]
impl Dispatcher for InlineDispatcher {
    async fn dispatch(&self, job: PageAuditJob) -> Result<()> {
        let outcome = AssertUnwindSafe(self.task.execute(&job))
            .catch_unwind()
            .await;

        if outcome.is_err() {
            tracing::error!(audit_id = %job.audit_id, page_url = %job.page_url, "Inline page audit panicked");
            self.task.mark_failed(job.audit_id, PANIC_MESSAGE).await;
        }
        Ok(())
    }
}

/// Fixed set of workers fed by an unbounded channel.
/// Jobs run concurrently in no particular order.
pub struct WorkerPool {
    sender: Mutex<Option<mpsc::UnboundedSender<PageAuditJob>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Spawn `worker_count` workers; must be called within a tokio runtime
    pub fn start(task: PageAuditTask, worker_count: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let receiver = Arc::new(Mutex::new(receiver));

        let workers: Vec<JoinHandle<()>> = (0..worker_count.max(1))
            .map(|worker_id| tokio::spawn(worker_loop(worker_id, task.clone(), receiver.clone())))
            .collect();

        tracing::info!(worker_count, "Audit worker pool started");

        Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
        }
    }

    /// Stop accepting jobs and wait until every queued job has run
    pub async fn shutdown(&self) {
        drop(self.sender.lock().await.take());

        let workers = std::mem::take(&mut *self.workers.lock().await);
        for result in futures::future::join_all(workers).await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Audit worker ended abnormally");
            }
        }
        tracing::info!("Audit worker pool drained");
    }
}

#[async_trait]
impl Dispatcher for WorkerPool {
    async fn dispatch(&self, job: PageAuditJob) -> Result<()> {
        let sender = self.sender.lock().await;
        let sender = sender
            .as_ref()
            .ok_or_else(|| AuditError::Dispatch("worker pool is shut down".to_string()))?;

        sender
            .send(job)
            .map_err(|_| AuditError::Dispatch("worker pool has no running workers".to_string()))
    }
}

async fn worker_loop(
    worker_id: usize,
    task: PageAuditTask,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<PageAuditJob>>>,
) {
    loop {
        // The lock is held only while waiting for the next job
        let next = receiver.lock().await.recv().await;
        let Some(job) = next else {
            break;
        };

        let audit_id = job.audit_id;
        let unit = task.clone();
        let handle = tokio::spawn(async move { unit.execute(&job).await });

        if let Err(e) = handle.await {
            tracing::error!(worker_id, %audit_id, error = %e, "Page audit task aborted");
            task.mark_failed(audit_id, PANIC_MESSAGE).await;
        }
    }
    tracing::debug!(worker_id, "Audit worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audit::{AuditStatus, DeviceType};
    use crate::services::lighthouse::AuditEngine;
    use crate::services::memory_store::MemoryStore;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Succeeds unless the URL ends with `/panic` or `/fail`
    #[derive(Default)]
    struct ScriptedEngine {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AuditEngine for ScriptedEngine {
        async fn run_audit(&self, url: &str, _device: DeviceType) -> std::result::Result<Value, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if url.ends_with("/panic") {
                panic!("engine blew up");
            }
            if url.ends_with("/fail") {
                return Err("lighthouse exited with status 1".to_string());
            }
            Ok(json!({ "categories": { "performance": { "score": 0.5 } } }))
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        engine: Arc<ScriptedEngine>,
        task: PageAuditTask,
        website_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let engine = Arc::new(ScriptedEngine::default());
        let auditor = PageAuditor::new(engine.clone(), Duration::from_secs(5));
        let task = PageAuditTask::new(store.clone(), auditor);
        let website_id = store
            .create_website("https://x.test/", None)
            .await
            .unwrap()
            .id;
        Fixture {
            store,
            engine,
            task,
            website_id,
        }
    }

    async fn job(fx: &Fixture, page_url: &str) -> PageAuditJob {
        let audit = fx
            .store
            .create_audit_result(fx.website_id, page_url, DeviceType::Mobile)
            .await
            .unwrap();
        PageAuditJob {
            audit_id: audit.id,
            website_id: fx.website_id,
            page_url: page_url.to_string(),
            device: DeviceType::Mobile,
        }
    }

    async fn status_of(fx: &Fixture, job: &PageAuditJob) -> AuditStatus {
        fx.store
            .get_audit_result(job.audit_id)
            .await
            .unwrap()
            .unwrap()
            .status
    }

    #[tokio::test]
    async fn test_inline_dispatch_completes_before_returning() {
        let fx = fixture().await;
        let ok = job(&fx, "https://x.test/").await;
        let failing = job(&fx, "https://x.test/fail").await;

        let dispatcher = InlineDispatcher::new(fx.task.clone());
        dispatcher.dispatch(ok.clone()).await.unwrap();
        dispatcher.dispatch(failing.clone()).await.unwrap();

        assert_eq!(status_of(&fx, &ok).await, AuditStatus::Completed);
        let failed = fx
            .store
            .get_audit_result(failing.audit_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(failed.status, AuditStatus::Failed);
        assert!(failed.error_message.unwrap().contains("status 1"));
    }

    #[tokio::test]
    async fn test_redelivered_job_skips_engine() {
        let fx = fixture().await;
        let job = job(&fx, "https://x.test/").await;

        fx.task.execute(&job).await;
        fx.task.execute(&job).await;

        assert_eq!(fx.engine.calls.load(Ordering::SeqCst), 1);
        assert_eq!(status_of(&fx, &job).await, AuditStatus::Completed);
    }

    #[tokio::test]
    async fn test_inline_panic_marks_row_failed() {
        let fx = fixture().await;
        let job = job(&fx, "https://x.test/panic").await;

        InlineDispatcher::new(fx.task.clone())
            .dispatch(job.clone())
            .await
            .unwrap();

        let row = fx.store.get_audit_result(job.audit_id).await.unwrap().unwrap();
        assert_eq!(row.status, AuditStatus::Failed);
        assert_eq!(row.error_message.as_deref(), Some(PANIC_MESSAGE));
    }

    #[tokio::test]
    async fn test_worker_pool_drains_on_shutdown() {
        let fx = fixture().await;
        let pool = WorkerPool::start(fx.task.clone(), 3);

        let mut jobs = Vec::new();
        for i in 0..10 {
            let job = job(&fx, &format!("https://x.test/page{}", i)).await;
            pool.dispatch(job.clone()).await.unwrap();
            jobs.push(job);
        }
        pool.shutdown().await;

        for job in &jobs {
            assert_eq!(status_of(&fx, job).await, AuditStatus::Completed);
        }
        assert_eq!(fx.engine.calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_worker_survives_panicking_job() {
        let fx = fixture().await;
        let pool = WorkerPool::start(fx.task.clone(), 1);

        let panicking = job(&fx, "https://x.test/panic").await;
        let after = job(&fx, "https://x.test/after").await;
        pool.dispatch(panicking.clone()).await.unwrap();
        pool.dispatch(after.clone()).await.unwrap();
        pool.shutdown().await;

        let row = fx
            .store
            .get_audit_result(panicking.audit_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status, AuditStatus::Failed);
        assert_eq!(row.error_message.as_deref(), Some(PANIC_MESSAGE));
        assert_eq!(status_of(&fx, &after).await, AuditStatus::Completed);
    }

    #[tokio::test]
    async fn test_dispatch_after_shutdown_is_refused() {
        let fx = fixture().await;
        let pool = WorkerPool::start(fx.task.clone(), 1);
        pool.shutdown().await;

        let job = job(&fx, "https://x.test/").await;
        let err = pool.dispatch(job.clone()).await.unwrap_err();
        assert!(matches!(err, AuditError::Dispatch(_)));
        assert_eq!(status_of(&fx, &job).await, AuditStatus::Pending);
    }

    #[tokio::test]
    async fn test_missing_row_is_logged_not_fatal() {
        let fx = fixture().await;
        let job = PageAuditJob {
            audit_id: Uuid::now_v7(),
            website_id: fx.website_id,
            page_url: "https://x.test/".to_string(),
            device: DeviceType::Desktop,
        };

        fx.task.execute(&job).await;
        assert_eq!(fx.engine.calls.load(Ordering::SeqCst), 0);
    }
}
