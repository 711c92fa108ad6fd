use serde::{Deserialize, Serialize};

use crate::error::ResearchError;

/// Bounds on the caller-supplied topic query, enforced before any I/O.
pub const QUERY_MIN_CHARS: usize = 5;
pub const QUERY_MAX_CHARS: usize = 500;
/// Upper bound on how many sources the agent is asked to consult.
pub const MAX_SOURCE_LIMIT: usize = 20;

const DEFAULT_MAX_SOURCES: usize = 5;

/// How far the agent should dig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchDepth {
    Quick,
    Standard,
    Deep,
}

impl ResearchDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResearchDepth::Quick => "quick",
            ResearchDepth::Standard => "standard",
            ResearchDepth::Deep => "deep",
        }
    }
}

/// One research task: a topic plus how hard to work on it.
#[derive(Debug, Clone)]
pub struct ResearchRequest {
    pub query: String,
    pub depth: ResearchDepth,
    pub max_sources: usize,
    /// Category names already known to the platform; the agent is asked
    /// to pick among them when one fits.
    pub category_hints: Vec<String>,
}

impl ResearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            depth: ResearchDepth::Standard,
            max_sources: DEFAULT_MAX_SOURCES,
            category_hints: Vec::new(),
        }
    }

    pub fn with_depth(mut self, depth: ResearchDepth) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_max_sources(mut self, max_sources: usize) -> Self {
        self.max_sources = max_sources;
        self
    }

    pub fn with_category_hints(mut self, hints: Vec<String>) -> Self {
        self.category_hints = hints;
        self
    }

    pub fn validate(&self) -> Result<(), ResearchError> {
        let len = self.query.trim().chars().count();
        if len < QUERY_MIN_CHARS {
            return Err(ResearchError::Validation(format!(
                "query too short ({len} chars, need {QUERY_MIN_CHARS})"
            )));
        }
        if len > QUERY_MAX_CHARS {
            return Err(ResearchError::Validation(format!(
                "query too long ({len} chars, max {QUERY_MAX_CHARS})"
            )));
        }
        if self.max_sources == 0 || self.max_sources > MAX_SOURCE_LIMIT {
            return Err(ResearchError::Validation(format!(
                "max_sources must be between 1 and {MAX_SOURCE_LIMIT}"
            )));
        }
        Ok(())
    }
}

/// Remote job lifecycle, tracked in memory for the duration of one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResearchStatus {
    Pending,
    Streaming,
    Completed,
    Failed,
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct ResearchSession {
    pub thread_id: String,
    pub run_id: String,
    pub status: ResearchStatus,
}

impl ResearchSession {
    pub(crate) fn new() -> Self {
        Self {
            thread_id: String::new(),
            run_id: String::new(),
            status: ResearchStatus::Pending,
        }
    }
}

/// A source the agent consulted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchSource {
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default, alias = "reliability_score", alias = "reliabilityScore")]
    pub reliability: Option<f32>,
}

/// Final synthesized article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchResult {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, alias = "category", alias = "categoryHint")]
    pub category_hint: Option<String>,
    #[serde(default, alias = "confidence_score", alias = "confidenceScore")]
    pub confidence: f32,
    #[serde(default)]
    pub sources: Vec<ResearchSource>,
    /// True when the deadline fired after usable content was captured:
    /// the result is real but the stream never finished on its own.
    #[serde(default)]
    pub partial: bool,
}
