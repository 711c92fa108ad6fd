use thiserror::Error;

/// Top-level error surfaced at the pipeline boundary. The client crates
/// carry their own typed errors; these variants are what the controller
/// layer sees.
#[derive(Error, Debug)]
pub enum HaberdarError {
    #[error("Feed error: {0}")]
    Feed(String),

    #[error("Scraping error: {0}")]
    Scraping(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Research error: {0}")]
    Research(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
