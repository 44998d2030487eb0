// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default upper bound for a single page fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP settings shared by every crawl a `Crawler` runs
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// User agent string to use for every request
    pub user_agent: String,
    /// Upper bound for one GET including the body read
    pub fetch_timeout: Duration,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("audit-agent/{}", env!("CARGO_PKG_VERSION")),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Pages discovered by one crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlReport {
    /// The normalized seed the crawl started from
    pub seed_url: String,
    /// Confirmed pages, in discovery order
    pub pages: Vec<String>,
    /// Number of URLs that were requested, including failures
    pub attempted: usize,
}
