// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::error::{AuditError, Result};
use crate::models::audit::DeviceType;
use crate::models::queue::PageAuditJob;
use crate::models::website::{AuditSummary, WebsiteAuditRequest};
use crate::services::crawler::Crawler;
use crate::services::dispatch::Dispatcher;
use crate::services::links::normalize_url;
use crate::services::store::AuditStore;
use chrono::Utc;
use std::sync::Arc;

/// Turns one "audit this website" request into crawled pages and dispatched page audits
#[derive(Clone)]
pub struct AuditOrchestrator {
    store: Arc<dyn AuditStore>,
    crawler: Crawler,
    dispatcher: Arc<dyn Dispatcher>,
}

impl AuditOrchestrator {
    pub fn new(
        store: Arc<dyn AuditStore>,
        crawler: Crawler,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        Self {
            store,
            crawler,
            dispatcher,
        }
    }

    /// Crawl the website and create one `pending` row plus one dispatched job per
    /// page and device. Every row of the run exists before the first job is
    /// dispatched, so readers never see the set grow after it reads `completed`.
    /// Returns once everything is dispatched; with an inline dispatcher that is
    /// after every audit has finished.
    pub async fn audit_website(&self, request: WebsiteAuditRequest) -> Result<AuditSummary> {
        if request.max_pages == 0 {
            return Err(AuditError::InvalidRequest(
                "max_pages must be at least 1".to_string(),
            ));
        }
        let seed = normalize_url(&request.url)
            .map_err(|e| AuditError::invalid_url(&request.url, e))?
            .to_string();

        let website = self
            .store
            .get_or_create_website(&seed, request.name.as_deref())
            .await?;

        let report = self.crawler.crawl_report(&seed, request.max_pages).await?;
        self.store
            .update_website_crawl(website.id, report.pages.len() as i64, Utc::now())
            .await?;

        let devices = DeviceType::selected(request.include_mobile, request.include_desktop);
        if devices.is_empty() {
            tracing::warn!(website_id = %website.id, "No device profile requested, nothing to audit");
        }

        let mut jobs = Vec::with_capacity(report.pages.len() * devices.len());
        for page_url in &report.pages {
            for &device in &devices {
                let audit = self
                    .store
                    .create_audit_result(website.id, page_url, device)
                    .await?;

                jobs.push(PageAuditJob {
                    audit_id: audit.id,
                    website_id: website.id,
                    page_url: page_url.clone(),
                    device,
                });
            }
        }

        let mut audits_dispatched = 0;
        for job in jobs {
            let audit_id = job.audit_id;
            let page_url = job.page_url.clone();

            match self.dispatcher.dispatch(job).await {
                Ok(()) => audits_dispatched += 1,
                Err(e) => {
                    tracing::error!(%audit_id, %page_url, error = %e, "Dispatch refused");
                    self.store.fail_audit_result(audit_id, &e.to_string()).await?;
                }
            }
        }

        tracing::info!(
            website_id = %website.id,
            pages_found = report.pages.len(),
            audits_dispatched,
            "Website audit dispatched"
        );

        Ok(AuditSummary {
            website_id: website.id,
            pages_found: report.pages.len(),
            audits_dispatched,
        })
    }
}
