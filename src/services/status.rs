// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::error::{AuditError, Result};
use crate::models::audit::{AuditProgress, OverallStatus};
use crate::services::store::AuditStore;
use uuid::Uuid;

/// Overall state from row counts.
/// Failed rows count toward the total only, so a run with failures never reads `completed`.
pub fn overall_status(total_audits: i64, completed_audits: i64) -> OverallStatus {
    if total_audits == 0 {
        OverallStatus::Pending
    } else if completed_audits == total_audits {
        OverallStatus::Completed
    } else {
        OverallStatus::InProgress
    }
}

/// Current progress of a website's audits, read from the store
pub async fn audit_progress(store: &dyn AuditStore, website_id: Uuid) -> Result<AuditProgress> {
    let website = store
        .get_website(website_id)
        .await?
        .ok_or(AuditError::WebsiteNotFound(website_id))?;

    let counts = store.audit_counts(website_id).await?;

    Ok(AuditProgress {
        website_id,
        website_url: website.url,
        status: overall_status(counts.total, counts.completed),
        total_pages: website.total_pages,
        total_audits: counts.total,
        completed_audits: counts.completed,
        failed_audits: counts.failed,
        created_at: website.created_at,
    })
}
