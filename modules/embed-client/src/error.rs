use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbedError {
    /// Rejected before any network call.
    #[error("text too short to embed ({len} chars after cleaning, need {min})")]
    TooShort { len: usize, min: usize },

    #[error("embedding request failed: {0}")]
    Transport(String),

    #[error("embedding endpoint returned HTTP {code}: {message}")]
    Upstream { code: u16, message: String },

    /// The response parsed but does not match the expected contract:
    /// wrong nesting, non-numeric entries, or a wrong-length vector.
    #[error("embedding response shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Vectors of different dimensions must never be compared.
    #[error("vector dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}

impl From<reqwest::Error> for EmbedError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            EmbedError::Transport(format!("timed out: {e}"))
        } else {
            EmbedError::Transport(e.to_string())
        }
    }
}
