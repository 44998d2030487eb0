// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::error::{AuditError, Result};
use crate::models::audit::{AuditCounts, AuditResult, DeviceType, LighthouseScores};
use crate::models::website::Website;
use crate::services::store::AuditStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

const WEBSITE_COLUMNS: &str = "id, url, name, created_at, last_crawled, total_pages";

const AUDIT_COLUMNS: &str = "id, website_id, page_url, device_type, audit_date, \
     performance_score, accessibility_score, best_practices_score, seo_score, pwa_score, \
     full_report, status, error_message";

/// PostgreSQL-backed store for websites and audit results
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct WebsiteRow {
    id: Uuid,
    url: String,
    name: String,
    created_at: DateTime<Utc>,
    last_crawled: Option<DateTime<Utc>>,
    total_pages: i64,
}

impl From<WebsiteRow> for Website {
    fn from(row: WebsiteRow) -> Self {
        Self {
            id: row.id,
            url: row.url,
            name: row.name,
            created_at: row.created_at,
            last_crawled: row.last_crawled,
            total_pages: row.total_pages,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AuditResultRow {
    id: Uuid,
    website_id: Uuid,
    page_url: String,
    device_type: String,
    audit_date: DateTime<Utc>,
    performance_score: Option<f64>,
    accessibility_score: Option<f64>,
    best_practices_score: Option<f64>,
    seo_score: Option<f64>,
    pwa_score: Option<f64>,
    full_report: Option<Value>,
    status: String,
    error_message: Option<String>,
}

impl TryFrom<AuditResultRow> for AuditResult {
    type Error = AuditError;

    fn try_from(row: AuditResultRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            website_id: row.website_id,
            page_url: row.page_url,
            device_type: row.device_type.parse().map_err(AuditError::store)?,
            audit_date: row.audit_date,
            scores: LighthouseScores {
                performance: row.performance_score,
                accessibility: row.accessibility_score,
                best_practices: row.best_practices_score,
                seo: row.seo_score,
                pwa: row.pwa_score,
            },
            full_report: row.full_report,
            status: row.status.parse().map_err(AuditError::store)?,
            error_message: row.error_message,
        })
    }
}

impl PostgresStore {
    /// Connect to PostgreSQL and apply pending migrations
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!(max_connections, "Connected to PostgreSQL, migrations applied");

        Ok(Self { pool })
    }

    async fn audit_exists(&self, id: Uuid) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM audit_results WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Map "no pending row updated" to either `false` or not-found
    async fn transition_result(&self, id: Uuid, rows_affected: u64) -> Result<bool> {
        if rows_affected > 0 {
            return Ok(true);
        }
        if self.audit_exists(id).await? {
            Ok(false)
        } else {
            Err(AuditError::AuditResultNotFound(id))
        }
    }
}

#[async_trait]
impl AuditStore for PostgresStore {
    async fn create_website(&self, url: &str, name: Option<&str>) -> Result<Website> {
        let website = Website::new(url, name);

        // The no-op update makes RETURNING yield the existing row on conflict
        let row: WebsiteRow = sqlx::query_as(&format!(
            "INSERT INTO websites ({WEBSITE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (url) DO UPDATE SET url = EXCLUDED.url \
             RETURNING {WEBSITE_COLUMNS}"
        ))
        .bind(website.id)
        .bind(&website.url)
        .bind(&website.name)
        .bind(website.created_at)
        .bind(website.last_crawled)
        .bind(website.total_pages)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_website(&self, id: Uuid) -> Result<Option<Website>> {
        let row: Option<WebsiteRow> =
            sqlx::query_as(&format!("SELECT {WEBSITE_COLUMNS} FROM websites WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Website::from))
    }

    async fn get_website_by_url(&self, url: &str) -> Result<Option<Website>> {
        let row: Option<WebsiteRow> =
            sqlx::query_as(&format!("SELECT {WEBSITE_COLUMNS} FROM websites WHERE url = $1"))
                .bind(url)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Website::from))
    }

    async fn list_websites(&self) -> Result<Vec<Website>> {
        let rows: Vec<WebsiteRow> =
            sqlx::query_as(&format!("SELECT {WEBSITE_COLUMNS} FROM websites ORDER BY id"))
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Website::from).collect())
    }

    async fn update_website_crawl(
        &self,
        id: Uuid,
        total_pages: i64,
        last_crawled: DateTime<Utc>,
    ) -> Result<()> {
        let result =
            sqlx::query("UPDATE websites SET total_pages = $2, last_crawled = $3 WHERE id = $1")
                .bind(id)
                .bind(total_pages)
                .bind(last_crawled)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AuditError::WebsiteNotFound(id));
        }
        Ok(())
    }

    async fn create_audit_result(
        &self,
        website_id: Uuid,
        page_url: &str,
        device: DeviceType,
    ) -> Result<AuditResult> {
        let audit = AuditResult::pending(website_id, page_url, device);

        let result = sqlx::query(
            "INSERT INTO audit_results (id, website_id, page_url, device_type, audit_date, status) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(audit.id)
        .bind(audit.website_id)
        .bind(&audit.page_url)
        .bind(audit.device_type.as_str())
        .bind(audit.audit_date)
        .bind(audit.status.as_str())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(audit),
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
                Err(AuditError::WebsiteNotFound(website_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_audit_result(&self, id: Uuid) -> Result<Option<AuditResult>> {
        let row: Option<AuditResultRow> = sqlx::query_as(&format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_results WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AuditResult::try_from).transpose()
    }

    async fn complete_audit_result(
        &self,
        id: Uuid,
        scores: &LighthouseScores,
        report: &Value,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE audit_results SET status = 'completed', \
             performance_score = $2, accessibility_score = $3, best_practices_score = $4, \
             seo_score = $5, pwa_score = $6, full_report = $7 \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .bind(scores.performance)
        .bind(scores.accessibility)
        .bind(scores.best_practices)
        .bind(scores.seo)
        .bind(scores.pwa)
        .bind(report)
        .execute(&self.pool)
        .await?;

        self.transition_result(id, result.rows_affected()).await
    }

    async fn fail_audit_result(&self, id: Uuid, error: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE audit_results SET status = 'failed', error_message = $2 \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;

        self.transition_result(id, result.rows_affected()).await
    }

    async fn audit_counts(&self, website_id: Uuid) -> Result<AuditCounts> {
        let (total, completed, failed): (i64, i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), \
             COUNT(*) FILTER (WHERE status = 'completed'), \
             COUNT(*) FILTER (WHERE status = 'failed') \
             FROM audit_results WHERE website_id = $1",
        )
        .bind(website_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(AuditCounts {
            total,
            completed,
            failed,
        })
    }

    async fn list_audit_results(
        &self,
        website_id: Uuid,
        device: Option<DeviceType>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<AuditResult>> {
        let rows: Vec<AuditResultRow> = sqlx::query_as(&format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_results \
             WHERE website_id = $1 AND ($2::text IS NULL OR device_type = $2) \
             ORDER BY id OFFSET $3 LIMIT $4"
        ))
        .bind(website_id)
        .bind(device.map(|d| d.as_str()))
        .bind(offset.max(0))
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AuditResult::try_from).collect()
    }
}
