// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::error::{AuditError, Result};
use crate::models::crawler::{CrawlReport, CrawlerConfig};
use crate::services::links::{extract_links, normalize_url, SiteScope};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::collections::HashSet;
use url::Url;

/// Visited and found sets of a single crawl. Never shared between crawls.
#[derive(Debug)]
pub struct CrawlFrontier {
    max_pages: usize,
    visited: HashSet<String>,
    found: Vec<String>,
}

impl CrawlFrontier {
    pub fn new(max_pages: usize) -> Self {
        Self {
            max_pages,
            visited: HashSet::new(),
            found: Vec::new(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.found.len() >= self.max_pages
    }

    /// Marks `url` as attempted. Returns false if it was attempted before.
    pub fn begin_visit(&mut self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    pub fn record_found(&mut self, url: String) {
        self.found.push(url);
    }

    pub fn attempted(&self) -> usize {
        self.visited.len()
    }

    /// The first `max_pages` confirmed pages, in discovery order
    pub fn into_pages(mut self) -> Vec<String> {
        self.found.truncate(self.max_pages);
        self.found
    }
}

/// A fetched page. `url` is where the response came from after redirects.
struct FetchedPage {
    url: Url,
    html: Option<String>,
}

/// Domain-scoped crawler with a page cap
#[derive(Clone)]
pub struct Crawler {
    client: reqwest::Client,
}

impl Crawler {
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.fetch_timeout)
            .build()
            .map_err(|e| AuditError::HttpClient(e.to_string()))?;

        Ok(Self { client })
    }

    /// Discover up to `max_pages` reachable pages on the seed's site
    pub async fn crawl(&self, seed_url: &str, max_pages: usize) -> Result<Vec<String>> {
        Ok(self.crawl_report(seed_url, max_pages).await?.pages)
    }

    /// Depth-first crawl in document order.
    ///
    /// Each stack frame holds the not-yet-followed links of one page, so the walk
    /// descends into a link before moving on to that link's siblings.
    pub async fn crawl_report(&self, seed_url: &str, max_pages: usize) -> Result<CrawlReport> {
        if max_pages == 0 {
            return Err(AuditError::InvalidRequest(
                "max_pages must be at least 1".to_string(),
            ));
        }

        let seed = normalize_url(seed_url).map_err(|e| AuditError::invalid_url(seed_url, e))?;
        let scope =
            SiteScope::of(&seed).ok_or_else(|| AuditError::invalid_url(seed_url, "URL has no host"))?;

        tracing::info!(seed = %seed, max_pages, "Starting crawl");

        let mut frontier = CrawlFrontier::new(max_pages);
        let mut stack = vec![vec![seed.to_string()].into_iter()];

        while let Some(pending) = stack.last_mut() {
            let Some(url) = pending.next() else {
                stack.pop();
                continue;
            };

            if frontier.is_full() {
                tracing::debug!(max_pages, "Page cap reached");
                break;
            }
            if !frontier.begin_visit(&url) {
                continue;
            }

            match self.fetch_page(&url, &scope).await {
                Ok(page) => {
                    frontier.record_found(url.clone());
                    tracing::debug!(url = %url, found = frontier.found.len(), "Page found");

                    if let Some(html) = page.html {
                        // Relative links resolve against the page actually served
                        let links = extract_links(&html, &page.url, &scope);
                        tracing::trace!(url = %url, links = links.len(), "Extracted links");
                        stack.push(links.into_iter());
                    }
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Failed to crawl page");
                }
            }
        }

        let attempted = frontier.attempted();
        let pages = frontier.into_pages();
        tracing::info!(
            seed = %seed,
            pages = pages.len(),
            attempted,
            "Crawl finished"
        );

        Ok(CrawlReport {
            seed_url: seed.to_string(),
            pages,
            attempted,
        })
    }

    /// GET a page, following redirects within `scope` only. The body is kept when
    /// it is HTML. Anything but a 200 response from the site is an error.
    async fn fetch_page(
        &self,
        url: &str,
        scope: &SiteScope,
    ) -> std::result::Result<FetchedPage, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let final_url = response.url().clone();
        if !scope.contains(&final_url) {
            return Err(format!("redirected off-site to {}", final_url));
        }

        let status = response.status();
        if status != StatusCode::OK {
            return Err(format!("unexpected status {}", status));
        }

        let is_html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"));

        let html = if is_html {
            match response.text().await {
                Ok(body) => Some(body),
                Err(e) => {
                    // The page answered 200, so it still counts; its links are lost
                    tracing::warn!(url, error = %e, "Failed to read page body");
                    None
                }
            }
        } else {
            None
        };

        Ok(FetchedPage {
            url: final_url,
            html,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Mock, Server, ServerGuard};
    use std::time::Duration;

    fn test_crawler() -> Crawler {
        Crawler::new(&CrawlerConfig {
            user_agent: "AuditAgentTest/0.1".to_string(),
            fetch_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    async fn html_page(server: &mut ServerGuard, path: &str, body: &str) -> Mock {
        server
            .mock("GET", path)
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body(body)
            .create_async()
            .await
    }

    fn link(href: &str) -> String {
        format!(r#"<html><body><a href="{}">next</a></body></html>"#, href)
    }

    #[test]
    fn test_frontier_guards() {
        let mut frontier = CrawlFrontier::new(2);
        assert!(frontier.begin_visit("https://x.test/"));
        assert!(!frontier.begin_visit("https://x.test/"));
        assert!(!frontier.is_full());

        frontier.record_found("https://x.test/".to_string());
        frontier.record_found("https://x.test/a".to_string());
        assert!(frontier.is_full());
        assert_eq!(frontier.attempted(), 1);
        assert_eq!(frontier.into_pages().len(), 2);
    }

    #[tokio::test]
    async fn test_crawl_chain_stops_at_cap() {
        let mut server = Server::new_async().await;
        let _root = html_page(&mut server, "/", &link("/a")).await;
        let _a = html_page(&mut server, "/a", &link("/b")).await;
        let _b = html_page(&mut server, "/b", &link("/c")).await;
        let _c = html_page(&mut server, "/c", &link("/d")).await;
        let _d = html_page(&mut server, "/d", "<html></html>").await;

        let seed = format!("{}/", server.url());
        let pages = test_crawler().crawl(&seed, 3).await.unwrap();

        assert_eq!(pages.len(), 3);
        assert!(pages.contains(&seed));
        assert!(pages.contains(&format!("{}/a", server.url())));
        assert!(pages.contains(&format!("{}/b", server.url())));
    }

    #[tokio::test]
    async fn test_crawl_explores_whole_site_under_cap() {
        let mut server = Server::new_async().await;
        let _root = html_page(
            &mut server,
            "/",
            r#"<a href="/about">About</a><a href="/blog">Blog</a>"#,
        )
        .await;
        let _about = html_page(&mut server, "/about", &link("/contact")).await;
        let _contact = html_page(&mut server, "/contact", &link("/")).await;
        let _blog = html_page(&mut server, "/blog", &link("/about#team")).await;

        let pages = test_crawler()
            .crawl(&format!("{}/", server.url()), 100)
            .await
            .unwrap();

        let base = server.url();
        assert_eq!(
            pages,
            vec![
                format!("{}/", base),
                format!("{}/about", base),
                format!("{}/contact", base),
                format!("{}/blog", base),
            ]
        );
    }

    #[tokio::test]
    async fn test_crawl_fetches_each_page_once() {
        let mut server = Server::new_async().await;
        let _root = html_page(
            &mut server,
            "/",
            r#"<a href="/page">1</a><a href="/page?x=1">2</a><a href="/page#s">3</a>"#,
        )
        .await;
        let page = server
            .mock("GET", "/page")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(link("/"))
            .expect(1)
            .create_async()
            .await;

        let pages = test_crawler()
            .crawl(&format!("{}/", server.url()), 10)
            .await
            .unwrap();

        assert_eq!(pages.len(), 2);
        page.assert_async().await;
    }

    #[tokio::test]
    async fn test_crawl_ignores_external_links() {
        let mut server = Server::new_async().await;
        let _root = html_page(
            &mut server,
            "/",
            r#"<a href="/internal">In</a><a href="https://external.example/page">Out</a>"#,
        )
        .await;
        let _internal = html_page(&mut server, "/internal", "<p>hi</p>").await;

        let seed = format!("{}/", server.url());
        let pages = test_crawler().crawl(&seed, 10).await.unwrap();

        assert_eq!(pages.len(), 2);
        let scope = SiteScope::of(&Url::parse(&seed).unwrap()).unwrap();
        for page in &pages {
            assert!(scope.contains(&Url::parse(page).unwrap()));
        }
    }

    #[tokio::test]
    async fn test_crawl_skips_unreachable_pages() {
        let mut server = Server::new_async().await;
        let _root = html_page(
            &mut server,
            "/",
            r#"<a href="/missing">404</a><a href="/broken">500</a><a href="/ok">ok</a>"#,
        )
        .await;
        let _missing = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;
        let _broken = server
            .mock("GET", "/broken")
            .with_status(500)
            .create_async()
            .await;
        let _ok = html_page(&mut server, "/ok", "<p>ok</p>").await;

        let pages = test_crawler()
            .crawl(&format!("{}/", server.url()), 10)
            .await
            .unwrap();

        assert_eq!(
            pages,
            vec![format!("{}/", server.url()), format!("{}/ok", server.url())]
        );
    }

    #[tokio::test]
    async fn test_crawl_counts_non_html_pages_without_parsing() {
        let mut server = Server::new_async().await;
        let _root = html_page(&mut server, "/", &link("/report.pdf")).await;
        let _pdf = server
            .mock("GET", "/report.pdf")
            .with_status(200)
            .with_header("content-type", "application/pdf")
            .with_body(r#"<a href="/hidden">not html</a>"#)
            .create_async()
            .await;
        let hidden = server
            .mock("GET", "/hidden")
            .with_status(200)
            .expect(0)
            .create_async()
            .await;

        let pages = test_crawler()
            .crawl(&format!("{}/", server.url()), 10)
            .await
            .unwrap();

        assert_eq!(pages.len(), 2);
        hidden.assert_async().await;
    }

    #[tokio::test]
    async fn test_crawl_drops_off_site_redirects() {
        let mut server = Server::new_async().await;
        let mut foreign = Server::new_async().await;
        let _root = html_page(&mut server, "/", &link("/go")).await;
        let _go = server
            .mock("GET", "/go")
            .with_status(302)
            .with_header("location", &format!("{}/", foreign.url()))
            .create_async()
            .await;
        let private = server
            .mock("GET", "/private")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<p>private</p>")
            .expect(0)
            .create_async()
            .await;
        let _foreign_root = html_page(&mut foreign, "/", &link("/private")).await;

        let seed = format!("{}/", server.url());
        let pages = test_crawler().crawl(&seed, 10).await.unwrap();

        assert_eq!(pages, vec![seed]);
        private.assert_async().await;
    }

    #[tokio::test]
    async fn test_crawl_resolves_links_against_redirect_target() {
        let mut server = Server::new_async().await;
        let _root = html_page(&mut server, "/", &link("/old")).await;
        let _old = server
            .mock("GET", "/old")
            .with_status(301)
            .with_header("location", "/docs/")
            .create_async()
            .await;
        let _docs = html_page(&mut server, "/docs/", &link("intro")).await;
        let _intro = html_page(&mut server, "/docs/intro", "<p>intro</p>").await;

        let base = server.url();
        let pages = test_crawler()
            .crawl(&format!("{}/", base), 10)
            .await
            .unwrap();

        assert_eq!(
            pages,
            vec![
                format!("{}/", base),
                format!("{}/old", base),
                format!("{}/docs/intro", base),
            ]
        );
    }

    #[tokio::test]
    async fn test_crawl_seed_failure_returns_empty() {
        let mut server = Server::new_async().await;
        let _root = server
            .mock("GET", "/")
            .with_status(503)
            .create_async()
            .await;

        let pages = test_crawler()
            .crawl(&format!("{}/", server.url()), 10)
            .await
            .unwrap();

        assert!(pages.is_empty());
    }

    #[tokio::test]
    async fn test_crawl_connection_refused_returns_empty() {
        // Bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let pages = test_crawler()
            .crawl(&format!("http://{}/", addr), 5)
            .await
            .unwrap();

        assert!(pages.is_empty());
    }

    #[tokio::test]
    async fn test_crawl_times_out_on_silent_server() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let crawler = Crawler::new(&CrawlerConfig {
            user_agent: "AuditAgentTest/0.1".to_string(),
            fetch_timeout: Duration::from_millis(200),
        })
        .unwrap();

        let started = std::time::Instant::now();
        let pages = crawler.crawl(&format!("http://{}/", addr), 5).await.unwrap();

        assert!(pages.is_empty());
        assert!(started.elapsed() < Duration::from_secs(5));
        server.abort();
    }

    #[tokio::test]
    async fn test_crawl_sends_user_agent() {
        let mut server = Server::new_async().await;
        let root = server
            .mock("GET", "/")
            .match_header("user-agent", "AuditAgentTest/0.1")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<p>hello</p>")
            .create_async()
            .await;

        let pages = test_crawler()
            .crawl(&format!("{}/", server.url()), 1)
            .await
            .unwrap();

        assert_eq!(pages.len(), 1);
        root.assert_async().await;
    }

    #[tokio::test]
    async fn test_crawl_rejects_zero_cap_and_bad_seed() {
        let crawler = test_crawler();
        assert!(matches!(
            crawler.crawl("https://x.test/", 0).await,
            Err(AuditError::InvalidRequest(_))
        ));
        assert!(matches!(
            crawler.crawl("not a url", 3).await,
            Err(AuditError::InvalidUrl { .. })
        ));
    }
}
