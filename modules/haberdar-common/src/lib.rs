pub mod config;
pub mod error;
pub mod telemetry;
pub mod text;
pub mod types;
pub mod urls;

pub use config::Config;
pub use error::HaberdarError;
pub use types::*;
