// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Audit route handlers.

use crate::app::{AppState, VERSION};
use crate::error::AuditError;
use crate::models::api::{
    ApiInfoResponse, AuditRequest, AuditResultResponse, MessageResponse, ResultsQuery,
    StartAuditResponse, MAX_RESULTS_LIMIT,
};
use crate::models::audit::{AuditProgress, AuditStatus, DeviceType, LighthouseScores, OverallStatus};
use crate::models::version::VersionResponse;
use crate::models::website::{Website, WebsiteAuditRequest};
use crate::services::status::audit_progress;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use utoipa::OpenApi;
use uuid::Uuid;

/// Error response of every audit handler
pub type ApiError = (StatusCode, Json<MessageResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(MessageResponse {
            success: false,
            message: message.into(),
        }),
    )
}

impl From<AuditError> for (StatusCode, Json<MessageResponse>) {
    fn from(error: AuditError) -> Self {
        let status = match &error {
            AuditError::InvalidUrl { .. } | AuditError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AuditError::WebsiteNotFound(_) | AuditError::AuditResultNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AuditError::Store(_) | AuditError::HttpClient(_) | AuditError::Dispatch(_) => {
                tracing::error!(error = %error, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        api_error(status, error.to_string())
    }
}

/// Create the router with every audit route
pub fn audit_router() -> Router<AppState> {
    Router::new()
        .route("/", get(root_handler))
        .route("/version", get(version_handler))
        .route("/audit", post(start_audit_handler))
        .route("/audit/{id}/status", get(audit_status_handler))
        .route("/audit/{id}/results", get(audit_results_handler))
        .route("/audit/{id}/full-report", get(full_report_handler))
        .route("/websites", get(list_websites_handler))
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Website Audit API", description = "Crawl websites and run Lighthouse audits per page"),
    paths(
        root_handler,
        version_handler,
        start_audit_handler,
        audit_status_handler,
        audit_results_handler,
        full_report_handler,
        list_websites_handler,
    ),
    components(schemas(
        ApiInfoResponse,
        VersionResponse,
        AuditRequest,
        StartAuditResponse,
        MessageResponse,
        AuditProgress,
        OverallStatus,
        AuditResultResponse,
        AuditStatus,
        DeviceType,
        LighthouseScores,
        Website,
    ))
)]
pub struct AuditApiDoc;

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "API description", body = ApiInfoResponse))
)]
pub async fn root_handler() -> Json<ApiInfoResponse> {
    Json(ApiInfoResponse {
        message: "Website Audit API".to_string(),
        version: VERSION.to_string(),
        endpoints: vec![
            "POST /audit".to_string(),
            "GET /audit/{website_id}/status".to_string(),
            "GET /audit/{website_id}/results".to_string(),
            "GET /audit/{audit_id}/full-report".to_string(),
            "GET /websites".to_string(),
        ],
    })
}

#[utoipa::path(
    get,
    path = "/version",
    responses((status = 200, description = "Agent version", body = VersionResponse))
)]
pub async fn version_handler(State(state): State<AppState>) -> Json<VersionResponse> {
    Json(VersionResponse {
        agent: "audit-agent".to_string(),
        version: VERSION.to_string(),
        dispatch_mode: state.dispatch_mode.to_string(),
    })
}

/// Crawl a website and dispatch one audit per page and device
#[utoipa::path(
    post,
    path = "/audit",
    request_body = AuditRequest,
    responses(
        (status = 200, description = "Audits dispatched", body = StartAuditResponse),
        (status = 400, description = "Invalid URL or page cap", body = MessageResponse),
        (status = 500, description = "Storage failure", body = MessageResponse)
    )
)]
pub async fn start_audit_handler(
    State(state): State<AppState>,
    Json(payload): Json<AuditRequest>,
) -> Result<Json<StartAuditResponse>, ApiError> {
    let request = WebsiteAuditRequest {
        url: payload.website_url,
        name: payload.website_name,
        include_mobile: payload.include_mobile,
        include_desktop: payload.include_desktop,
        max_pages: payload.max_pages.unwrap_or(state.default_max_pages),
    };

    let summary = state.orchestrator.audit_website(request).await?;

    Ok(Json(StartAuditResponse {
        success: true,
        message: format!(
            "Audit started: {} pages found, {} audits dispatched",
            summary.pages_found, summary.audits_dispatched
        ),
        website_id: summary.website_id,
        pages_found: summary.pages_found,
        audits_dispatched: summary.audits_dispatched,
    }))
}

#[utoipa::path(
    get,
    path = "/audit/{id}/status",
    params(("id" = Uuid, Path, description = "Website id")),
    responses(
        (status = 200, description = "Audit progress", body = AuditProgress),
        (status = 404, description = "Unknown website", body = MessageResponse)
    )
)]
pub async fn audit_status_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AuditProgress>, ApiError> {
    Ok(Json(audit_progress(state.store.as_ref(), id).await?))
}

/// Paginated audit rows of a website, optionally for one device
#[utoipa::path(
    get,
    path = "/audit/{id}/results",
    params(("id" = Uuid, Path, description = "Website id"), ResultsQuery),
    responses(
        (status = 200, description = "Audit results", body = [AuditResultResponse]),
        (status = 400, description = "Invalid pagination", body = MessageResponse)
    )
)]
pub async fn audit_results_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ResultsQuery>,
) -> Result<Json<Vec<AuditResultResponse>>, ApiError> {
    if query.page == 0 {
        return Err(api_error(StatusCode::BAD_REQUEST, "page must be at least 1"));
    }
    if query.limit == 0 || query.limit > MAX_RESULTS_LIMIT {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("limit must be between 1 and {}", MAX_RESULTS_LIMIT),
        ));
    }

    let offset = i64::from(query.page - 1) * i64::from(query.limit);
    let results = state
        .store
        .list_audit_results(id, query.device_type, offset, i64::from(query.limit))
        .await?;

    Ok(Json(results.into_iter().map(AuditResultResponse::from).collect()))
}

/// Raw Lighthouse report of one audit
#[utoipa::path(
    get,
    path = "/audit/{id}/full-report",
    params(("id" = Uuid, Path, description = "Audit result id")),
    responses(
        (status = 200, description = "Lighthouse JSON report", body = Object),
        (status = 404, description = "Unknown audit or no report yet", body = MessageResponse)
    )
)]
pub async fn full_report_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let result = state
        .store
        .get_audit_result(id)
        .await?
        .ok_or(AuditError::AuditResultNotFound(id))?;

    result.full_report.map(Json).ok_or_else(|| {
        api_error(
            StatusCode::NOT_FOUND,
            format!("audit {} has no report (status: {})", id, result.status),
        )
    })
}

#[utoipa::path(
    get,
    path = "/websites",
    responses((status = 200, description = "All audited websites", body = [Website]))
)]
pub async fn list_websites_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Website>>, ApiError> {
    Ok(Json(state.store.list_websites().await?))
}
