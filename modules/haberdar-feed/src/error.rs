use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    /// Connection-level failure: refused, reset, DNS, timeout.
    #[error("feed fetch failed: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("feed returned HTTP {code}")]
    Status { code: u16 },

    /// Neither the sanitized nor the raw byte stream parsed as a feed.
    #[error("feed parse failed: {0}")]
    Parse(String),

    /// A date string matched no supported format.
    #[error("unrecognized date format: {0:?}")]
    DateFormat(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FeedError::Transport(format!("timed out: {e}"))
        } else {
            FeedError::Transport(e.to_string())
        }
    }
}
