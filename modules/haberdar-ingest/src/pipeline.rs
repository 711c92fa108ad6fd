//! The common-case ingest flow: feeds in, deduplicated articles out.
//!
//! Per-feed and per-item failures are logged and skipped; a bad feed or
//! a dead article link never aborts the run.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{info, warn};

use embed_client::EmbedClient;
use haberdar_common::types::FeedItem;
use haberdar_common::{urls, Config, HaberdarError};
use haberdar_feed::FeedReader;
use haberdar_scrape::ContentScraper;

use crate::stats::IngestStats;
use crate::store::{ArticleStore, NewArticle};

/// Feed descriptions shorter than this cannot stand in for the article
/// body; the item's page gets scraped instead.
const MIN_BODY_CHARS: usize = 400;

pub struct IngestPipeline<S: ArticleStore> {
    reader: FeedReader,
    scraper: ContentScraper,
    embedder: EmbedClient,
    store: S,
    recent_limit: usize,
}

impl<S: ArticleStore> std::fmt::Debug for IngestPipeline<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestPipeline")
            .field("recent_limit", &self.recent_limit)
            .finish_non_exhaustive()
    }
}

impl<S: ArticleStore> IngestPipeline<S> {
    pub fn new(
        reader: FeedReader,
        scraper: ContentScraper,
        embedder: EmbedClient,
        store: S,
        recent_limit: usize,
    ) -> Self {
        Self {
            reader,
            scraper,
            embedder,
            store,
            recent_limit,
        }
    }

    pub fn from_config(config: &Config, store: S) -> Result<Self, HaberdarError> {
        if config.embed_api_url.is_empty() {
            return Err(HaberdarError::Config(
                "EMBED_API_URL is required for ingest".to_string(),
            ));
        }
        let reader = FeedReader::new(Duration::from_secs(config.feed_timeout_secs));
        let scraper = ContentScraper::new(Duration::from_secs(config.scrape_timeout_secs));
        let embedder = EmbedClient::new(&config.embed_api_url, &config.embed_api_key)
            .with_dimension(config.embed_dimension)
            .with_threshold(config.similarity_threshold);
        Ok(Self::new(
            reader,
            scraper,
            embedder,
            store,
            config.dedup_recent_limit,
        ))
    }

    /// Ingest every feed: fetch, fill in missing content, reject
    /// near-duplicates, hand survivors to the store.
    pub async fn run(&self, feed_urls: &[String]) -> IngestStats {
        let mut stats = IngestStats::default();

        let mut recent_vectors = match self.store.recent_vectors(self.recent_limit).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "ingest: could not load recent vectors, dedup degraded");
                Vec::new()
            }
        };

        // guid is only meaningful within one feed, so the key is scoped
        let mut seen: HashSet<(String, String)> = HashSet::new();

        for feed_url in feed_urls {
            let feed = match self.reader.fetch(feed_url).await {
                Ok(f) => {
                    stats.feeds_fetched += 1;
                    f
                }
                Err(e) => {
                    warn!(feed_url, error = %e, "ingest: failed to fetch feed");
                    stats.feeds_failed += 1;
                    continue;
                }
            };

            for item in feed.items {
                stats.items_seen += 1;
                if !seen.insert((feed_url.clone(), item.guid.clone())) {
                    continue;
                }
                self.process_item(feed_url, item, &mut recent_vectors, &mut stats)
                    .await;
            }
        }

        info!(
            feeds = stats.feeds_fetched,
            stored = stats.articles_stored,
            duplicates = stats.duplicates_rejected,
            "ingest: run complete"
        );
        stats
    }

    async fn process_item(
        &self,
        feed_url: &str,
        item: FeedItem,
        recent_vectors: &mut Vec<Vec<f32>>,
        stats: &mut IngestStats,
    ) {
        let canonical_url = urls::sanitize_url(&item.link);

        match self.store.contains_url(&canonical_url).await {
            Ok(true) => {
                stats.items_already_stored += 1;
                return;
            }
            Ok(false) => {}
            Err(e) => {
                warn!(url = %canonical_url, error = %e, "ingest: store lookup failed");
            }
        }

        let mut article = NewArticle {
            title: item.title.clone(),
            url: canonical_url,
            body: item.description.clone(),
            summary: None,
            author: item.author.clone(),
            published_at: item.published_at,
            image_url: item.enclosure.as_ref().map(|e| e.url.clone()),
            source_feed: feed_url.to_string(),
            embedding: None,
        };

        // Thin feed entries only carry a link and a snippet; the page
        // itself has the content.
        if article.body.chars().count() < MIN_BODY_CHARS {
            let result = self.scraper.scrape(&item.link).await;
            if result.success {
                stats.items_scraped += 1;
                if let Some(content) = result.content {
                    article.body = content.body;
                    if article.title.is_empty() && !content.title.is_empty() {
                        article.title = content.title;
                    }
                    article.summary = content.summary;
                    if article.author.is_none() {
                        article.author = content.author;
                    }
                    if let Some(dt) = content.published_at {
                        article.published_at = dt;
                    }
                    if article.image_url.is_none() {
                        article.image_url = content.image_url;
                    }
                }
            } else {
                stats.scrape_failures += 1;
                if article.body.is_empty() {
                    warn!(url = %article.url, "ingest: no content available, skipping item");
                    return;
                }
            }
        }

        // A failed embedding downgrades to storing without a vector; the
        // article is still worth keeping.
        let embed_text = format!("{} {}", article.title, article.body);
        match self.embedder.embed(&embed_text).await {
            Ok(vector) => article.embedding = Some(vector),
            Err(e) => {
                stats.embed_failures += 1;
                warn!(url = %article.url, error = %e, "ingest: embedding failed");
            }
        }

        if let Some(vector) = &article.embedding {
            if self.is_duplicate(vector, recent_vectors) {
                stats.duplicates_rejected += 1;
                info!(url = %article.url, "ingest: near-duplicate rejected");
                return;
            }
        }

        match self.store.store(&article).await {
            Ok(()) => {
                stats.articles_stored += 1;
                if let Some(vector) = article.embedding {
                    recent_vectors.push(vector);
                }
            }
            Err(e) => {
                stats.store_failures += 1;
                warn!(url = %article.url, error = %e, "ingest: store failed");
            }
        }
    }

    fn is_duplicate(&self, vector: &[f32], recent_vectors: &[Vec<f32>]) -> bool {
        for known in recent_vectors {
            match self.embedder.check_similarity(known, vector, None) {
                Ok(result) if result.is_duplicate => return true,
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "ingest: skipping uncomparable stored vector");
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NoopStore;

    fn config_with_embed_url(url: &str) -> Config {
        Config {
            embed_api_url: url.to_string(),
            embed_api_key: "key".to_string(),
            embed_dimension: 384,
            similarity_threshold: 0.85,
            research_base_url: String::new(),
            research_api_key: String::new(),
            research_timeout_secs: 300,
            feed_timeout_secs: 15,
            scrape_timeout_secs: 20,
            dedup_recent_limit: 200,
        }
    }

    #[test]
    fn from_config_requires_embed_endpoint() {
        let err = IngestPipeline::from_config(&config_with_embed_url(""), NoopStore).unwrap_err();
        assert!(matches!(err, HaberdarError::Config(_)));

        let ok = IngestPipeline::from_config(
            &config_with_embed_url("https://inference.example/embed"),
            NoopStore,
        );
        assert!(ok.is_ok());
    }
}
