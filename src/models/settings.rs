// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use anyhow::{anyhow, bail, Context, Result};
use std::net::SocketAddr;
use std::time::Duration;

/// How page audit jobs are scheduled.
///
/// Inline: the request that started the audit runs every page audit itself, one at a time.
/// Matches a single-process deployment without background workers.
///
/// Queued: jobs are pushed to an in-process worker pool and the request returns as soon
/// as everything is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    Inline,
    Queued,
}

impl DispatchMode {
    fn parse(mode: &str) -> Result<Self> {
        match mode {
            "inline" => Ok(DispatchMode::Inline),
            "queued" => Ok(DispatchMode::Queued),
            _ => bail!("DISPATCH_MODE must be 'inline' or 'queued', got: {}", mode),
        }
    }
}

impl std::fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchMode::Inline => write!(f, "inline"),
            DispatchMode::Queued => write!(f, "queued"),
        }
    }
}

/// Runtime configuration of the agent
#[derive(Debug, Clone)]
pub struct Settings {
    /// Postgres connection string; the in-memory store is used when unset
    pub database_url: Option<String>,
    pub dispatch_mode: DispatchMode,
    pub audit_workers: usize,
    pub default_max_pages: usize,
    pub fetch_timeout: Duration,
    pub audit_timeout: Duration,
    pub lighthouse_path: String,
    pub user_agent: String,
    pub listen_addr: SocketAddr,
}

impl Settings {
    /// Load settings from the process environment, reading `.env` first if present
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let dispatch_mode = match lookup("DISPATCH_MODE") {
            Some(mode) => DispatchMode::parse(&mode)?,
            None => DispatchMode::Queued,
        };

        let audit_workers: usize = parse_or(&lookup, "AUDIT_WORKERS", 2)?;
        if audit_workers == 0 {
            bail!("AUDIT_WORKERS must be at least 1");
        }

        let default_max_pages: usize = parse_or(&lookup, "MAX_PAGES", 100)?;
        if default_max_pages == 0 {
            bail!("MAX_PAGES must be at least 1");
        }

        let fetch_timeout = Duration::from_secs(parse_or(&lookup, "FETCH_TIMEOUT_SECS", 10)?);
        let audit_timeout = Duration::from_secs(parse_or(&lookup, "AUDIT_TIMEOUT_SECS", 120)?);

        let lighthouse_path =
            lookup("LIGHTHOUSE_PATH").unwrap_or_else(|| "lighthouse".to_string());
        let user_agent = lookup("USER_AGENT")
            .unwrap_or_else(|| format!("audit-agent/{}", env!("CARGO_PKG_VERSION")));

        let listen_addr = lookup("LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse()
            .context("LISTEN_ADDR must be a socket address such as 0.0.0.0:3000")?;

        Ok(Self {
            database_url,
            dispatch_mode,
            audit_workers,
            default_max_pages,
            fetch_timeout,
            audit_timeout,
            lighthouse_path,
            user_agent,
            listen_addr,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow!("{} must be a valid number, got: {}", key, raw)),
        None => Ok(default),
    }
}
