// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Typed errors for crawl and audit orchestration.

use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the orchestration layer and the store.
///
/// Page-level failures (unreachable pages, failed engine runs) are not errors:
/// the crawler skips them and the auditor records them on the audit row.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The URL could not be parsed or has no host
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Request parameters are out of range
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("website not found: {0}")]
    WebsiteNotFound(Uuid),

    #[error("audit result not found: {0}")]
    AuditResultNotFound(Uuid),

    /// Persistence layer failed or is unreachable
    #[error("storage error: {0}")]
    Store(String),

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// The dispatcher no longer accepts work
    #[error("dispatch failed: {0}")]
    Dispatch(String),
}

impl AuditError {
    pub fn invalid_url(url: &str, reason: impl std::fmt::Display) -> Self {
        Self::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn store(reason: impl std::fmt::Display) -> Self {
        Self::Store(reason.to_string())
    }
}

impl From<sqlx::Error> for AuditError {
    fn from(error: sqlx::Error) -> Self {
        Self::Store(error.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AuditError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        Self::Store(format!("migration failed: {}", error))
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;
