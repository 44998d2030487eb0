// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use anyhow::{Context, Result};
use audit_agent::app::{build_runtime, create_router, open_store, VERSION};
use audit_agent::models::crawler::CrawlerConfig;
use audit_agent::models::settings::{DispatchMode, Settings};
use audit_agent::models::website::WebsiteAuditRequest;
use audit_agent::services::crawler::Crawler;
use audit_agent::services::lighthouse::LighthouseCli;
use audit_agent::services::logging::init_tracing;
use audit_agent::services::status::audit_progress;
use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "audit-agent", version = VERSION, about = "Crawl websites and audit every page with Lighthouse")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Crawl a website and print the discovered pages as JSON
    Crawl {
        url: String,
        #[arg(long)]
        max_pages: Option<usize>,
    },
    /// Crawl and audit a website inline, then print the summary and final status
    Audit {
        url: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        max_pages: Option<usize>,
        #[arg(long)]
        no_mobile: bool,
        #[arg(long)]
        no_desktop: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let settings = Settings::from_env().context("Failed to load configuration")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(settings).await,
        Command::Crawl { url, max_pages } => crawl(settings, &url, max_pages).await,
        Command::Audit {
            url,
            name,
            max_pages,
            no_mobile,
            no_desktop,
        } => {
            let request = WebsiteAuditRequest {
                url,
                name,
                include_mobile: !no_mobile,
                include_desktop: !no_desktop,
                max_pages: max_pages.unwrap_or(settings.default_max_pages),
            };
            audit(settings, request).await
        }
    }
}

async fn serve(settings: Settings) -> Result<()> {
    let store = open_store(&settings).await?;
    let engine = Arc::new(LighthouseCli::new(&settings.lighthouse_path));
    let runtime = build_runtime(&settings, settings.dispatch_mode, store, engine)?;

    let app = create_router(runtime.state.clone());
    let listener = tokio::net::TcpListener::bind(settings.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", settings.listen_addr))?;

    tracing::info!(
        version = VERSION,
        addr = %settings.listen_addr,
        dispatch_mode = %settings.dispatch_mode,
        "audit-agent listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("Shutting down, draining queued audits");
    runtime.shutdown().await;
    Ok(())
}

async fn crawl(settings: Settings, url: &str, max_pages: Option<usize>) -> Result<()> {
    let crawler = Crawler::new(&CrawlerConfig {
        user_agent: settings.user_agent.clone(),
        fetch_timeout: settings.fetch_timeout,
    })?;

    let report = crawler
        .crawl_report(url, max_pages.unwrap_or(settings.default_max_pages))
        .await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn audit(settings: Settings, request: WebsiteAuditRequest) -> Result<()> {
    let store = open_store(&settings).await?;
    let engine = Arc::new(LighthouseCli::new(&settings.lighthouse_path));
    let runtime = build_runtime(&settings, DispatchMode::Inline, store.clone(), engine)?;

    let summary = runtime.state.orchestrator.audit_website(request).await?;
    let progress = audit_progress(store.as_ref(), summary.website_id).await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "summary": summary,
            "status": progress,
        }))?
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
