use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Feed types ---

/// A media attachment declared by a feed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enclosure {
    pub url: String,
    pub mime_type: Option<String>,
    pub length: Option<u64>,
}

/// One normalized entry from an RSS/Atom document.
///
/// `guid` is an opaque dedup key within a single feed only. Feeds reuse
/// each other's guids freely, so it must never be treated as globally
/// unique. Falls back to `link` when the feed omits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
    pub author: Option<String>,
    pub guid: String,
    pub enclosure: Option<Enclosure>,
}

// --- Scraping types ---

/// Structured content extracted from a single article page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedContent {
    pub title: String,
    pub body: String,
    pub summary: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    /// Ranking value of the winning body container. Internal only;
    /// meaningless outside a single extraction pass.
    pub extraction_score: f64,
    pub scrape_duration_ms: u64,
}

/// Outcome of a scrape attempt. Always returned, never an Err across the
/// boundary: callers in batch contexts make per-item decisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapingResult {
    pub success: bool,
    pub content: Option<ScrapedContent>,
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl ScrapingResult {
    pub fn ok(content: ScrapedContent, elapsed_ms: u64) -> Self {
        Self {
            success: true,
            content: Some(content),
            error: None,
            elapsed_ms,
        }
    }

    pub fn failed(error: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            success: false,
            content: None,
            error: Some(error.into()),
            elapsed_ms,
        }
    }
}
