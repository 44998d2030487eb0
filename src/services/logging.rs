// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Logging setup and redaction of sensitive data in log fields.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

const DEFAULT_FILTER: &str = "info,audit_agent=debug,sqlx=warn";

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Hide the password of a connection URL for logging:
/// "postgres://user:secret@db/audit" becomes "postgres://user:***@db/audit"
pub fn redact_url_credentials(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            if url.password().is_some() {
                // Only fails for cannot-be-a-base URLs, which carry no password
                let _ = url.set_password(Some("***"));
            }
            url.to_string()
        }
        // Unparseable, redact completely
        Err(_) => "***".to_string(),
    }
}
