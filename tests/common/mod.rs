// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Shared fixtures: a scripted audit engine and a small mock website.

#![allow(dead_code)]

use async_trait::async_trait;
use audit_agent::models::audit::DeviceType;
use audit_agent::models::settings::Settings;
use audit_agent::services::lighthouse::AuditEngine;
use serde_json::{json, Value};
use std::sync::Mutex;
use std::time::Duration;

/// Engine that fails for URLs whose path is listed in `failing_paths`
#[derive(Default)]
pub struct FakeEngine {
    failing_paths: Vec<String>,
    calls: Mutex<Vec<(String, DeviceType)>>,
}

impl FakeEngine {
    pub fn failing_on(paths: &[&str]) -> Self {
        Self {
            failing_paths: paths.iter().map(|p| p.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, DeviceType)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditEngine for FakeEngine {
    async fn run_audit(&self, url: &str, device: DeviceType) -> Result<Value, String> {
        self.calls.lock().unwrap().push((url.to_string(), device));

        let path = url::Url::parse(url)
            .map(|u| u.path().to_string())
            .unwrap_or_default();
        if self.failing_paths.contains(&path) {
            return Err(format!("lighthouse exited with status 1 for {}", path));
        }

        Ok(json!({
            "lighthouseVersion": "12.0.0",
            "requestedUrl": url,
            "categories": {
                "performance": { "score": 0.87 },
                "accessibility": { "score": 1.0 },
                "best-practices": { "score": 0.75 },
                "seo": { "score": 0.9 },
                "pwa": { "score": null }
            }
        }))
    }
}

/// Default settings with short timeouts for tests
pub fn test_settings() -> Settings {
    let mut settings = Settings::from_lookup(|_| None).expect("default settings are valid");
    settings.fetch_timeout = Duration::from_secs(2);
    settings.audit_timeout = Duration::from_secs(5);
    settings.audit_workers = 3;
    settings
}

fn html_page(links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect();
    format!("<html><body>{}</body></html>", anchors)
}

/// Serve an HTML page at `path` linking to `links`
pub async fn serve_page(server: &mut mockito::ServerGuard, path: &str, links: &[&str]) -> mockito::Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(html_page(links))
        .create_async()
        .await
}

/// A four-page site: `/` links to `/a` and `/b`, `/a` links to `/c`
pub async fn small_site() -> (mockito::ServerGuard, Vec<mockito::Mock>) {
    let mut server = mockito::Server::new_async().await;
    let mocks = vec![
        serve_page(&mut server, "/", &["/a", "/b", "https://elsewhere.test/"]).await,
        serve_page(&mut server, "/a", &["/c", "/"]).await,
        serve_page(&mut server, "/b", &["/a#top"]).await,
        serve_page(&mut server, "/c", &[]).await,
    ];
    (server, mocks)
}

/// Seed URL of a mock server
pub fn seed(server: &mockito::ServerGuard) -> String {
    format!("{}/", server.url())
}
