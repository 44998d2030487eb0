// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! In-process store for tests and database-less runs. Data is lost on restart.

use crate::error::{AuditError, Result};
use crate::models::audit::{AuditCounts, AuditResult, AuditStatus, DeviceType, LighthouseScores};
use crate::models::website::Website;
use crate::services::store::AuditStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    websites: RwLock<HashMap<Uuid, Website>>,
    // UUID v7 keys keep creation order
    audits: RwLock<BTreeMap<Uuid, AuditResult>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of audit rows across all websites
    pub async fn audit_count(&self) -> usize {
        self.audits.read().await.len()
    }

    async fn finish(
        &self,
        id: Uuid,
        apply: impl FnOnce(&mut AuditResult) + Send,
    ) -> Result<bool> {
        let mut audits = self.audits.write().await;
        let audit = audits
            .get_mut(&id)
            .ok_or(AuditError::AuditResultNotFound(id))?;

        if audit.status.is_terminal() {
            return Ok(false);
        }
        apply(audit);
        Ok(true)
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn create_website(&self, url: &str, name: Option<&str>) -> Result<Website> {
        let mut websites = self.websites.write().await;
        if let Some(existing) = websites.values().find(|w| w.url == url) {
            return Ok(existing.clone());
        }

        let website = Website::new(url, name);
        websites.insert(website.id, website.clone());
        Ok(website)
    }

    async fn get_website(&self, id: Uuid) -> Result<Option<Website>> {
        Ok(self.websites.read().await.get(&id).cloned())
    }

    async fn get_website_by_url(&self, url: &str) -> Result<Option<Website>> {
        Ok(self
            .websites
            .read()
            .await
            .values()
            .find(|w| w.url == url)
            .cloned())
    }

    async fn list_websites(&self) -> Result<Vec<Website>> {
        let mut websites: Vec<Website> = self.websites.read().await.values().cloned().collect();
        websites.sort_by_key(|w| w.id);
        Ok(websites)
    }

    async fn update_website_crawl(
        &self,
        id: Uuid,
        total_pages: i64,
        last_crawled: DateTime<Utc>,
    ) -> Result<()> {
        let mut websites = self.websites.write().await;
        let website = websites
            .get_mut(&id)
            .ok_or(AuditError::WebsiteNotFound(id))?;
        website.total_pages = total_pages;
        website.last_crawled = Some(last_crawled);
        Ok(())
    }

    async fn create_audit_result(
        &self,
        website_id: Uuid,
        page_url: &str,
        device: DeviceType,
    ) -> Result<AuditResult> {
        if !self.websites.read().await.contains_key(&website_id) {
            return Err(AuditError::WebsiteNotFound(website_id));
        }

        let audit = AuditResult::pending(website_id, page_url, device);
        self.audits.write().await.insert(audit.id, audit.clone());
        Ok(audit)
    }

    async fn get_audit_result(&self, id: Uuid) -> Result<Option<AuditResult>> {
        Ok(self.audits.read().await.get(&id).cloned())
    }

    async fn complete_audit_result(
        &self,
        id: Uuid,
        scores: &LighthouseScores,
        report: &Value,
    ) -> Result<bool> {
        let scores = scores.clone();
        let report = report.clone();
        self.finish(id, move |audit| {
            audit.status = AuditStatus::Completed;
            audit.scores = scores;
            audit.full_report = Some(report);
        })
        .await
    }

    async fn fail_audit_result(&self, id: Uuid, error: &str) -> Result<bool> {
        let error = error.to_string();
        self.finish(id, move |audit| {
            audit.status = AuditStatus::Failed;
            audit.error_message = Some(error);
        })
        .await
    }

    async fn audit_counts(&self, website_id: Uuid) -> Result<AuditCounts> {
        let audits = self.audits.read().await;
        let mut counts = AuditCounts::default();
        for audit in audits.values().filter(|a| a.website_id == website_id) {
            counts.total += 1;
            match audit.status {
                AuditStatus::Completed => counts.completed += 1,
                AuditStatus::Failed => counts.failed += 1,
                AuditStatus::Pending => {}
            }
        }
        Ok(counts)
    }

    async fn list_audit_results(
        &self,
        website_id: Uuid,
        device: Option<DeviceType>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<AuditResult>> {
        Ok(self
            .audits
            .read()
            .await
            .values()
            .filter(|a| a.website_id == website_id)
            .filter(|a| device.is_none_or(|d| a.device_type == d))
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}
