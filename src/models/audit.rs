// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Device profile a page is audited under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Desktop,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Mobile => "mobile",
            DeviceType::Desktop => "desktop",
        }
    }

    /// Devices selected by a pair of request flags, desktop first.
    pub fn selected(include_mobile: bool, include_desktop: bool) -> Vec<DeviceType> {
        let mut devices = Vec::with_capacity(2);
        if include_desktop {
            devices.push(DeviceType::Desktop);
        }
        if include_mobile {
            devices.push(DeviceType::Mobile);
        }
        devices
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeviceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mobile" => Ok(DeviceType::Mobile),
            "desktop" => Ok(DeviceType::Desktop),
            other => Err(format!(
                "device type must be 'mobile' or 'desktop', got: {}",
                other
            )),
        }
    }
}

/// Lifecycle state of a single page audit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Pending,
    Completed,
    Failed,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Pending => "pending",
            AuditStatus::Completed => "completed",
            AuditStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AuditStatus::Pending)
    }
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuditStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AuditStatus::Pending),
            "completed" => Ok(AuditStatus::Completed),
            "failed" => Ok(AuditStatus::Failed),
            other => Err(format!("unknown audit status: {}", other)),
        }
    }
}

/// Lighthouse category scores on a 0-100 scale.
/// `None` means the category was not evaluated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LighthouseScores {
    pub performance: Option<f64>,
    pub accessibility: Option<f64>,
    pub best_practices: Option<f64>,
    pub seo: Option<f64>,
    pub pwa: Option<f64>,
}

/// One page × device audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditResult {
    pub id: Uuid,
    pub website_id: Uuid,
    pub page_url: String,
    pub device_type: DeviceType,
    pub audit_date: DateTime<Utc>,
    pub scores: LighthouseScores,
    /// Raw engine report, kept as an opaque blob
    pub full_report: Option<serde_json::Value>,
    pub status: AuditStatus,
    pub error_message: Option<String>,
}

impl AuditResult {
    /// A fresh record in the `pending` state
    pub fn pending(website_id: Uuid, page_url: &str, device_type: DeviceType) -> Self {
        Self {
            id: Uuid::now_v7(),
            website_id,
            page_url: page_url.to_string(),
            device_type,
            audit_date: Utc::now(),
            scores: LighthouseScores::default(),
            full_report: None,
            status: AuditStatus::Pending,
            error_message: None,
        }
    }
}

/// Outcome of running the audit engine against one page
#[derive(Debug, Clone, PartialEq)]
pub enum AuditOutcome {
    Completed {
        scores: LighthouseScores,
        report: serde_json::Value,
    },
    Failed {
        error: String,
    },
}

impl AuditOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        AuditOutcome::Failed {
            error: error.into(),
        }
    }
}

/// Row counts of one website, read together
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditCounts {
    pub total: i64,
    pub completed: i64,
    pub failed: i64,
}

/// Aggregate state of all audits of one website
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Pending,
    InProgress,
    Completed,
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverallStatus::Pending => write!(f, "pending"),
            OverallStatus::InProgress => write!(f, "in_progress"),
            OverallStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Progress of a website audit as seen by readers of the store
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditProgress {
    pub website_id: Uuid,
    pub website_url: String,
    pub status: OverallStatus,
    pub total_pages: i64,
    pub total_audits: i64,
    pub completed_audits: i64,
    pub failed_audits: i64,
    pub created_at: DateTime<Utc>,
}
