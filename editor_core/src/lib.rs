//! Source Editor Core - incremental syntax highlighting for editable text.
//!
//! This crate keeps a tree-sitter syntax tree in step with a text buffer and
//! reports styled attribute runs to the host, without any dependencies on
//! windowing or rendering systems.

pub mod buffer;
pub mod config;
pub mod cursor;
pub mod error;
pub mod session;
pub mod stats;
pub mod syntax;

pub use buffer::{Point, TextBuffer, TextPosition};
pub use config::HighlightConfig;
pub use cursor::CursorPosition;
pub use error::{HighlightError, Result};
pub use session::{BufferId, EditorSession, SessionRegistry};
pub use stats::HighlightStats;
pub use syntax::{
    AttributeRun, AttributeSet, AttributeSink, AttributeUpdate, BuiltinGrammars, CaptureName,
    ChannelSink, Grammar, GrammarProvider, HighlightSpan, HighlightState, Highlighter, Language,
    Theme,
};
