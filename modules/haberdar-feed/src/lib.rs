pub mod date;
pub mod discover;
pub mod error;
pub mod reader;
pub mod sanitize;

pub use error::FeedError;
pub use reader::{FeedReader, FeedResult};
