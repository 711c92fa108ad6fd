//! Article page fetching.
//!
//! `scrape` never fails across the boundary: whatever happens, the caller
//! gets a result with a success flag, an error string on failure, and the
//! elapsed time either way, so batch callers can make per-item decisions.

use std::time::{Duration, Instant};

use anyhow::Context;
use reqwest::header;
use tracing::{info, warn};

use haberdar_common::types::{ScrapedContent, ScrapingResult};

use crate::extract;

// Many publishers block default client identifiers outright, so the
// scraper announces itself as an ordinary desktop browser.
const SCRAPE_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const SCRAPE_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const SCRAPE_ACCEPT_LANGUAGE: &str = "tr-TR,tr;q=0.9,en-US;q=0.8,en;q=0.7";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

pub struct ContentScraper {
    client: reqwest::Client,
}

impl ContentScraper {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build scraper HTTP client");
        Self { client }
    }

    /// Fetch an article URL and extract structured content with the
    /// configured default timeout.
    pub async fn scrape(&self, url: &str) -> ScrapingResult {
        self.scrape_with_timeout(url, None).await
    }

    /// Fetch with a per-call timeout override.
    pub async fn scrape_with_timeout(
        &self,
        url: &str,
        timeout: Option<Duration>,
    ) -> ScrapingResult {
        let started = Instant::now();

        match self.fetch_and_extract(url, timeout).await {
            Ok(mut content) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                content.scrape_duration_ms = elapsed_ms;
                info!(
                    url,
                    chars = content.body.len(),
                    score = content.extraction_score,
                    elapsed_ms,
                    "scrape: extracted article"
                );
                ScrapingResult::ok(content, elapsed_ms)
            }
            Err(e) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                warn!(url, error = %e, elapsed_ms, "scrape: failed");
                ScrapingResult::failed(e.to_string(), elapsed_ms)
            }
        }
    }

    async fn fetch_and_extract(
        &self,
        url: &str,
        timeout: Option<Duration>,
    ) -> anyhow::Result<ScrapedContent> {
        let mut request = self
            .client
            .get(url)
            .header(header::USER_AGENT, SCRAPE_USER_AGENT)
            .header(header::ACCEPT, SCRAPE_ACCEPT)
            .header(header::ACCEPT_LANGUAGE, SCRAPE_ACCEPT_LANGUAGE);
        if let Some(t) = timeout {
            request = request.timeout(t);
        }

        let resp = request.send().await.context("article fetch failed")?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("article returned HTTP {}", status.as_u16());
        }

        let html = resp.text().await.context("failed to read article body")?;
        let extracted = extract::extract(&html, url);

        if extracted.body.is_empty() {
            anyhow::bail!("no article content extracted");
        }

        Ok(ScrapedContent {
            title: extracted.title,
            body: extracted.body,
            summary: extracted.summary,
            author: extracted.author,
            published_at: extracted.published_at,
            image_url: extracted.image_url,
            extraction_score: extracted.score,
            scrape_duration_ms: 0,
        })
    }
}

impl Default for ContentScraper {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}
