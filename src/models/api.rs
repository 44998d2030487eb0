// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Request and response bodies of the HTTP API.

use crate::models::audit::{AuditResult, AuditStatus, DeviceType, LighthouseScores};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Request to audit a website
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuditRequest {
    pub website_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_name: Option<String>,
    #[serde(default = "default_true")]
    pub include_mobile: bool,
    #[serde(default = "default_true")]
    pub include_desktop: bool,
    /// Page cap for the crawl; the server default applies when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<usize>,
}

fn default_true() -> bool {
    true
}

/// Response after an audit run was accepted
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StartAuditResponse {
    pub success: bool,
    pub message: String,
    pub website_id: Uuid,
    pub pages_found: usize,
    pub audits_dispatched: usize,
}

/// Error body returned by every handler
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// Query parameters for listing audit results
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResultsQuery {
    pub device_type: Option<DeviceType>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    50
}

/// Maximum page size accepted by the results listing
pub const MAX_RESULTS_LIMIT: u32 = 500;

/// One audit result without its full report
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuditResultResponse {
    pub id: Uuid,
    pub page_url: String,
    pub device_type: DeviceType,
    pub audit_date: DateTime<Utc>,
    pub scores: LighthouseScores,
    pub status: AuditStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<AuditResult> for AuditResultResponse {
    fn from(result: AuditResult) -> Self {
        Self {
            id: result.id,
            page_url: result.page_url,
            device_type: result.device_type,
            audit_date: result.audit_date,
            scores: result.scores,
            status: result.status,
            error_message: result.error_message,
        }
    }
}

/// Endpoint listing served at the API root
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiInfoResponse {
    pub message: String,
    pub version: String,
    pub endpoints: Vec<String>,
}
