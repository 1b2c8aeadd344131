//! Syntax highlighting module.
//!
//! Provides incremental syntax highlighting using tree-sitter.

mod capture;
mod client;
pub mod edit;
mod highlighter;
mod language;
pub mod span;
mod theme;
mod worker;

pub use capture::{CaptureName, UnknownCapture};
pub use client::{HighlightQuery, ParserClient, QueryLimits, QueryOutcome, QuerySnapshot};
pub use edit::EditDescriptor;
pub use highlighter::{
    AttributeRun, AttributeSink, AttributeUpdate, ChannelSink, HighlightState, Highlighter,
};
pub use language::{BuiltinGrammars, Grammar, GrammarProvider, Language};
pub use span::HighlightSpan;
pub use theme::{AttributeSet, Color, FontStyle, Theme};
pub use worker::{HighlightCompletion, HighlightJob, HighlightWorker};
