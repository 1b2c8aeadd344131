//! Error types for the highlighting pipeline.

use std::time::Duration;

/// Errors produced by the editor core.
///
/// Parser and grammar failures are recovered inside the highlighter and only
/// logged; the host sees `InvalidRange`, `UnsupportedLanguage`,
/// `UnknownBuffer` and `InvalidConfig`.
#[derive(Debug, thiserror::Error)]
pub enum HighlightError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Grammar not found: {0}")]
    GrammarNotFound(String),

    #[error("Failed to load grammar for {language}: {reason}")]
    GrammarLoadFailure { language: String, reason: String },

    #[error("Parse exceeded its time budget of {budget:?}")]
    ParseTimeout { budget: Duration },

    #[error("Range {start}..{end} is invalid for a buffer of {len} bytes")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error("No buffer attached with id {0}")]
    UnknownBuffer(usize),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, HighlightError>;
