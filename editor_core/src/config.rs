//! Highlighting configuration.
//!
//! Every field has a default so partial JSON documents are accepted.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Budgets and switches for the highlighting pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Maximum time a single (re)parse may take before it is abandoned.
    /// Zero disables the limit.
    pub parse_timeout_micros: u64,
    /// Wall-clock budget for one highlight query.
    pub query_budget_micros: u64,
    /// Maximum number of in-progress query matches tree-sitter may track.
    pub query_match_limit: u32,
    /// How far past the invalidated lines a re-highlight may grow to cover a
    /// construct (string, comment) that now spans further.
    pub max_extension_bytes: usize,
    /// Run highlight queries on the background worker thread.
    pub background_queries: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            parse_timeout_micros: 500_000,
            query_budget_micros: 50_000,
            query_match_limit: 16_384,
            max_extension_bytes: 64 * 1024,
            background_queries: false,
        }
    }
}

impl HighlightConfig {
    /// Parses a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse timeout as a `Duration`.
    pub fn parse_timeout(&self) -> Duration {
        Duration::from_micros(self.parse_timeout_micros)
    }

    /// Query budget as a `Duration`.
    pub fn query_budget(&self) -> Duration {
        Duration::from_micros(self.query_budget_micros)
    }
}
