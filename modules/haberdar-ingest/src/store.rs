//! Seam to the storage collaborator. Persistence itself lives outside
//! this core; the pipeline only needs these three operations.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// The canonical artifact handed to the storage layer.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub url: String,
    pub body: String,
    pub summary: Option<String>,
    pub author: Option<String>,
    pub published_at: DateTime<Utc>,
    pub image_url: Option<String>,
    pub source_feed: String,
    pub embedding: Option<Vec<f32>>,
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Embeddings of recently stored articles, newest first, for
    /// duplicate comparison.
    async fn recent_vectors(&self, limit: usize) -> Result<Vec<Vec<f32>>>;

    /// Whether an article with this canonical URL already exists.
    async fn contains_url(&self, url: &str) -> Result<bool>;

    async fn store(&self, article: &NewArticle) -> Result<()>;
}

/// No-op store for contexts that only exercise acquisition (dry runs,
/// tests).
pub struct NoopStore;

#[async_trait]
impl ArticleStore for NoopStore {
    async fn recent_vectors(&self, _limit: usize) -> Result<Vec<Vec<f32>>> {
        Ok(Vec::new())
    }

    async fn contains_url(&self, _url: &str) -> Result<bool> {
        Ok(false)
    }

    async fn store(&self, _article: &NewArticle) -> Result<()> {
        Ok(())
    }
}
