// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Application state, service wiring and router construction.
//!
//! This module is `pub` so that integration tests can build a test router directly
//! without starting the full binary.

use crate::error::Result;
use crate::models::crawler::CrawlerConfig;
use crate::models::settings::{DispatchMode, Settings};
use crate::routes::{audit_router, AuditApiDoc};
use crate::services::auditor::PageAuditor;
use crate::services::crawler::Crawler;
use crate::services::db::PostgresStore;
use crate::services::dispatch::{Dispatcher, InlineDispatcher, PageAuditTask, WorkerPool};
use crate::services::lighthouse::AuditEngine;
use crate::services::logging::redact_url_credentials;
use crate::services::memory_store::MemoryStore;
use crate::services::orchestrator::AuditOrchestrator;
use crate::services::store::AuditStore;
use axum::Router;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application version extracted from `Cargo.toml` at compile time.
/// The patch segment can be overridden via `AUDIT_PATCH_VERSION` (see `build.rs`).
pub const VERSION: &str = env!("AUDIT_AGENT_VERSION");

const MAX_DB_CONNECTIONS: u32 = 10;

/// Shared application state injected into every route handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AuditStore>,
    pub orchestrator: AuditOrchestrator,
    pub dispatch_mode: DispatchMode,
    /// Page cap applied when a request does not set one
    pub default_max_pages: usize,
}

/// Wired services of one process
pub struct AuditRuntime {
    pub state: AppState,
    /// Present in queued mode; must be shut down to drain pending jobs
    pub worker_pool: Option<Arc<WorkerPool>>,
}

impl AuditRuntime {
    /// Wait for queued audits to finish
    pub async fn shutdown(&self) {
        if let Some(pool) = &self.worker_pool {
            pool.shutdown().await;
        }
    }
}

/// Open the configured store: PostgreSQL when `DATABASE_URL` is set, memory otherwise
pub async fn open_store(settings: &Settings) -> Result<Arc<dyn AuditStore>> {
    match &settings.database_url {
        Some(database_url) => {
            tracing::info!(
                database_url = %redact_url_credentials(database_url),
                "Connecting to PostgreSQL"
            );
            let store = PostgresStore::connect(database_url, MAX_DB_CONNECTIONS).await?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, audit results are kept in memory only");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Wire crawler, auditor, dispatcher and orchestrator around `store` and `engine`
pub fn build_runtime(
    settings: &Settings,
    dispatch_mode: DispatchMode,
    store: Arc<dyn AuditStore>,
    engine: Arc<dyn AuditEngine>,
) -> Result<AuditRuntime> {
    let crawler = Crawler::new(&CrawlerConfig {
        user_agent: settings.user_agent.clone(),
        fetch_timeout: settings.fetch_timeout,
    })?;

    let task = PageAuditTask::new(store.clone(), PageAuditor::new(engine, settings.audit_timeout));

    let (dispatcher, worker_pool): (Arc<dyn Dispatcher>, Option<Arc<WorkerPool>>) =
        match dispatch_mode {
            DispatchMode::Inline => (Arc::new(InlineDispatcher::new(task)), None),
            DispatchMode::Queued => {
                let pool = Arc::new(WorkerPool::start(task, settings.audit_workers));
                (pool.clone(), Some(pool))
            }
        };

    let orchestrator = AuditOrchestrator::new(store.clone(), crawler, dispatcher);

    Ok(AuditRuntime {
        state: AppState {
            store,
            orchestrator,
            dispatch_mode,
            default_max_pages: settings.default_max_pages,
        },
        worker_pool,
    })
}

/// Build the Axum application router with Swagger UI.
pub fn create_router(state: AppState) -> Router {
    audit_router()
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", AuditApiDoc::openapi()))
}
