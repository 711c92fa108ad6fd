use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Embedding inference endpoint
    pub embed_api_url: String,
    pub embed_api_key: String,
    pub embed_dimension: usize,
    pub similarity_threshold: f32,

    // Research agent
    pub research_base_url: String,
    pub research_api_key: String,
    pub research_timeout_secs: u64,

    // Fetching
    pub feed_timeout_secs: u64,
    pub scrape_timeout_secs: u64,

    // Duplicate detection window
    pub dedup_recent_limit: usize,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            embed_api_url: required_env("EMBED_API_URL"),
            embed_api_key: required_env("EMBED_API_KEY"),
            embed_dimension: parsed_env("EMBED_DIMENSION", 384),
            similarity_threshold: parsed_env("SIMILARITY_THRESHOLD", 0.85),
            research_base_url: required_env("RESEARCH_BASE_URL"),
            research_api_key: required_env("RESEARCH_API_KEY"),
            research_timeout_secs: parsed_env("RESEARCH_TIMEOUT_SECS", 300),
            feed_timeout_secs: parsed_env("FEED_TIMEOUT_SECS", 15),
            scrape_timeout_secs: parsed_env("SCRAPE_TIMEOUT_SECS", 20),
            dedup_recent_limit: parsed_env("DEDUP_RECENT_LIMIT", 200),
        }
    }

    /// Load a minimal config for feed-only workloads (no AI keys needed).
    pub fn ingest_from_env() -> Self {
        Self {
            embed_api_url: env::var("EMBED_API_URL").unwrap_or_default(),
            embed_api_key: env::var("EMBED_API_KEY").unwrap_or_default(),
            embed_dimension: parsed_env("EMBED_DIMENSION", 384),
            similarity_threshold: parsed_env("SIMILARITY_THRESHOLD", 0.85),
            research_base_url: String::new(),
            research_api_key: String::new(),
            research_timeout_secs: parsed_env("RESEARCH_TIMEOUT_SECS", 300),
            feed_timeout_secs: parsed_env("FEED_TIMEOUT_SECS", 15),
            scrape_timeout_secs: parsed_env("SCRAPE_TIMEOUT_SECS", 20),
            dedup_recent_limit: parsed_env("DEDUP_RECENT_LIMIT", 200),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid number")),
        Err(_) => default,
    }
}
