// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Same-site link extraction and URL normalization.

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// The host and port a crawl is confined to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteScope {
    host: String,
    port: Option<u16>,
}

impl SiteScope {
    /// Scope of the site `url` belongs to, `None` for host-less URLs
    pub fn of(url: &Url) -> Option<Self> {
        let host = url.host_str()?.to_ascii_lowercase();
        Some(Self {
            host,
            port: url.port_or_known_default(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Whether `url` is an http(s) URL on exactly this host and port
    pub fn contains(&self, url: &Url) -> bool {
        matches!(url.scheme(), "http" | "https")
            && url
                .host_str()
                .is_some_and(|host| host.eq_ignore_ascii_case(&self.host))
            && url.port_or_known_default() == self.port
    }
}

/// Parse `raw` and drop its fragment and query so equivalent URLs compare equal
pub fn normalize_url(raw: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(raw.trim())?;
    strip_fragment_and_query(&mut url);
    Ok(url)
}

fn strip_fragment_and_query(url: &mut Url) {
    url.set_fragment(None);
    url.set_query(None);
}

/// Extract the same-site links of an HTML document.
///
/// Relative hrefs are resolved against `source_url`, fragments and queries are
/// stripped, and anything outside `scope` is dropped. Hrefs that cannot be
/// resolved are skipped. Results keep document order without duplicates.
pub fn extract_links(html: &str, source_url: &Url, scope: &SiteScope) -> Vec<String> {
    let mut links = Vec::new();

    let document = Html::parse_document(html);

    let Ok(selector) = Selector::parse("a[href]") else {
        return links;
    };

    let mut seen = HashSet::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            continue;
        }

        let Ok(mut resolved) = source_url.join(href) else {
            tracing::trace!(href, source = %source_url, "Skipping unresolvable link");
            continue;
        };
        strip_fragment_and_query(&mut resolved);

        if !scope.contains(&resolved) {
            continue;
        }

        let link = resolved.to_string();
        if seen.insert(link.clone()) {
            links.push(link);
        }
    }

    links
}
