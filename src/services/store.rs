// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Persistence seam for websites and audit results.

use crate::error::Result;
use crate::models::audit::{AuditCounts, AuditResult, DeviceType, LighthouseScores};
use crate::models::website::Website;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// Record store used by the orchestrator, the page audit tasks and the API.
///
/// Terminal updates are conditional: `complete_audit_result` and
/// `fail_audit_result` only touch a row that is still `pending` and report
/// whether they did. That single-row check is the only synchronisation
/// concurrent audit tasks rely on.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Insert a website, or return the existing one with the same URL
    async fn create_website(&self, url: &str, name: Option<&str>) -> Result<Website>;

    async fn get_website(&self, id: Uuid) -> Result<Option<Website>>;

    async fn get_website_by_url(&self, url: &str) -> Result<Option<Website>>;

    async fn list_websites(&self) -> Result<Vec<Website>>;

    /// Record the outcome of a crawl on the website row
    async fn update_website_crawl(
        &self,
        id: Uuid,
        total_pages: i64,
        last_crawled: DateTime<Utc>,
    ) -> Result<()>;

    /// Insert a `pending` audit row
    async fn create_audit_result(
        &self,
        website_id: Uuid,
        page_url: &str,
        device: DeviceType,
    ) -> Result<AuditResult>;

    async fn get_audit_result(&self, id: Uuid) -> Result<Option<AuditResult>>;

    /// `pending` → `completed`. Returns false if the row was already terminal.
    async fn complete_audit_result(
        &self,
        id: Uuid,
        scores: &LighthouseScores,
        report: &Value,
    ) -> Result<bool>;

    /// `pending` → `failed`. Returns false if the row was already terminal.
    async fn fail_audit_result(&self, id: Uuid, error: &str) -> Result<bool>;

    /// Total, completed and failed row counts of a website from one snapshot
    async fn audit_counts(&self, website_id: Uuid) -> Result<AuditCounts>;

    /// Audit rows of a website in creation order
    async fn list_audit_results(
        &self,
        website_id: Uuid,
        device: Option<DeviceType>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<AuditResult>>;

    /// Look a website up by URL, creating it when absent
    async fn get_or_create_website(&self, url: &str, name: Option<&str>) -> Result<Website> {
        match self.get_website_by_url(url).await? {
            Some(website) => Ok(website),
            None => self.create_website(url, name).await,
        }
    }
}
