//! Language detection and grammar loading.
//!
//! Detects programming languages from file extensions and hands out the
//! tree-sitter grammar plus highlight query for each of them.

use crate::error::{HighlightError, Result};
use std::path::Path;

/// Supported programming languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    C,
    Cpp,
    Json,
    Go,
    #[default]
    PlainText,
}

impl Language {
    /// Returns all available languages (for host language pickers).
    pub fn all() -> &'static [Language] {
        &[
            Language::Rust,
            Language::Python,
            Language::JavaScript,
            Language::TypeScript,
            Language::C,
            Language::Cpp,
            Language::Json,
            Language::Go,
            Language::PlainText,
        ]
    }

    /// Detects language from a file path based on extension.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::PlainText)
    }

    /// Detects language from a file extension.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "rs" => Self::Rust,
            "py" | "pyw" | "pyi" => Self::Python,
            "js" | "jsx" | "mjs" | "cjs" => Self::JavaScript,
            "ts" | "tsx" | "mts" | "cts" => Self::TypeScript,
            "c" | "h" => Self::C,
            "cpp" | "cc" | "cxx" | "c++" | "hpp" | "hh" | "hxx" | "h++" => Self::Cpp,
            "json" | "jsonc" | "json5" => Self::Json,
            "go" => Self::Go,
            _ => Self::PlainText,
        }
    }

    /// Looks up a language by its identifier (`"go"`, `"cpp"`, ...).
    pub fn from_id(id: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|language| language.id().eq_ignore_ascii_case(id))
    }

    /// Stable identifier used at the host boundary.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::Json => "json",
            Self::Go => "go",
            Self::PlainText => "plaintext",
        }
    }

    /// Returns the display name of the language.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rust => "Rust",
            Self::Python => "Python",
            Self::JavaScript => "JavaScript",
            Self::TypeScript => "TypeScript",
            Self::C => "C",
            Self::Cpp => "C++",
            Self::Json => "JSON",
            Self::Go => "Go",
            Self::PlainText => "Plain Text",
        }
    }

    /// Returns the tree-sitter language for this language, if available.
    pub fn tree_sitter_language(&self) -> Option<tree_sitter::Language> {
        match self {
            Self::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
            Self::Python => Some(tree_sitter_python::LANGUAGE.into()),
            Self::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            Self::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Self::C => Some(tree_sitter_c::LANGUAGE.into()),
            Self::Cpp => Some(tree_sitter_cpp::LANGUAGE.into()),
            Self::Json => Some(tree_sitter_json::LANGUAGE.into()),
            Self::Go => Some(tree_sitter_go::LANGUAGE.into()),
            Self::PlainText => None,
        }
    }

    /// Returns the highlight query source for this language.
    ///
    /// The C++ and TypeScript queries only cover what they add on top of C and
    /// JavaScript, so the base query is prepended.
    pub fn highlights_query(&self) -> String {
        match self {
            Self::Rust => tree_sitter_rust::HIGHLIGHTS_QUERY.to_string(),
            Self::Python => tree_sitter_python::HIGHLIGHTS_QUERY.to_string(),
            Self::JavaScript => tree_sitter_javascript::HIGHLIGHT_QUERY.to_string(),
            Self::TypeScript => format!(
                "{}\n{}",
                tree_sitter_javascript::HIGHLIGHT_QUERY,
                tree_sitter_typescript::HIGHLIGHTS_QUERY
            ),
            Self::C => tree_sitter_c::HIGHLIGHT_QUERY.to_string(),
            Self::Cpp => format!(
                "{}\n{}",
                tree_sitter_c::HIGHLIGHT_QUERY,
                tree_sitter_cpp::HIGHLIGHT_QUERY
            ),
            Self::Json => tree_sitter_json::HIGHLIGHTS_QUERY.to_string(),
            Self::Go => tree_sitter_go::HIGHLIGHTS_QUERY.to_string(),
            Self::PlainText => String::new(),
        }
    }
}

/// A parser grammar and its highlight query, as handed to the parser client.
///
/// `language` is `None` for plain text: the grammar parses nothing and
/// produces no spans.
#[derive(Clone)]
pub struct Grammar {
    pub id: String,
    pub language: Option<tree_sitter::Language>,
    pub highlights_query: String,
}

impl Grammar {
    /// A grammar with no parser.
    pub fn plain_text() -> Self {
        Self {
            id: Language::PlainText.id().to_string(),
            language: None,
            highlights_query: String::new(),
        }
    }
}

impl std::fmt::Debug for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grammar")
            .field("id", &self.id)
            .field("has_parser", &self.language.is_some())
            .field("query_bytes", &self.highlights_query.len())
            .finish()
    }
}

/// Supplies grammars by language identifier.
pub trait GrammarProvider {
    /// Returns the grammar for `language_id`, or `GrammarNotFound`.
    fn grammar(&self, language_id: &str) -> Result<Grammar>;
}

/// Provider over the grammar crates compiled into this library.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinGrammars;

impl GrammarProvider for BuiltinGrammars {
    fn grammar(&self, language_id: &str) -> Result<Grammar> {
        let language = Language::from_id(language_id)
            .ok_or_else(|| HighlightError::GrammarNotFound(language_id.to_string()))?;
        Ok(Grammar {
            id: language.id().to_string(),
            language: language.tree_sitter_language(),
            highlights_query: language.highlights_query(),
        })
    }
}
