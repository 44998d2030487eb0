// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A website that has been submitted for auditing.
/// The URL is the natural key; `id` is generated on first submission.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Website {
    pub id: Uuid,
    pub url: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_crawled: Option<DateTime<Utc>>,
    pub total_pages: i64,
}

impl Website {
    pub fn new(url: &str, name: Option<&str>) -> Self {
        Self {
            id: Uuid::now_v7(),
            url: url.to_string(),
            name: name.unwrap_or(url).to_string(),
            created_at: Utc::now(),
            last_crawled: None,
            total_pages: 0,
        }
    }
}

/// Input of one website-level audit run
#[derive(Debug, Clone)]
pub struct WebsiteAuditRequest {
    pub url: String,
    pub name: Option<String>,
    pub include_mobile: bool,
    pub include_desktop: bool,
    pub max_pages: usize,
}

/// Result of a website-level audit run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub website_id: Uuid,
    pub pages_found: usize,
    pub audits_dispatched: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_defaults_to_url() {
        let website = Website::new("https://x.test/", None);
        assert_eq!(website.name, "https://x.test/");
        assert_eq!(website.total_pages, 0);
        assert!(website.last_crawled.is_none());
    }

    #[test]
    fn test_explicit_name_is_kept() {
        let website = Website::new("https://x.test/", Some("X"));
        assert_eq!(website.name, "X");
    }
}
