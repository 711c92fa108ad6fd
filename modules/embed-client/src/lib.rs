//! Client for a hosted text-embedding inference endpoint, plus the
//! cosine-similarity primitives used for duplicate detection.

pub mod client;
pub mod error;
pub mod preprocess;
pub mod similarity;

pub use client::EmbedClient;
pub use error::EmbedError;
pub use similarity::{cosine_similarity, SimilarityResult};
