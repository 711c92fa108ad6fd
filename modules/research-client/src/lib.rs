//! Client for the external research agent.
//!
//! Drives one long-running remote job to completion: open a thread,
//! submit the research task, consume the event stream, assemble the
//! final structured article.

pub mod client;
pub mod error;
pub mod stream;
pub mod types;

pub use client::ResearchClient;
pub use error::{ResearchError, TransportKind};
pub use types::{
    ResearchDepth, ResearchRequest, ResearchResult, ResearchSession, ResearchSource,
    ResearchStatus,
};
