//! Incremental parser client.
//!
//! Owns the tree-sitter parser, the current tree and the compiled highlight
//! query for one buffer. Edits are applied to the tree in place; reparses
//! reuse it so only the edited region is re-lexed.

use super::capture::CaptureName;
use super::edit::EditDescriptor;
use super::language::Grammar;
use super::span::{flatten, HighlightSpan, RawCapture};
use crate::buffer::TextBuffer;
use crate::config::HighlightConfig;
use crate::error::{HighlightError, Result};
use crate::stats::HighlightStats;
use ropey::{Rope, RopeSlice};
use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Parser, Query, QueryCursor, TextProvider, Tree};

/// How often (in captures) a running query looks at the clock.
const DEADLINE_CHECK_INTERVAL: usize = 64;

/// Result of one highlight query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutcome {
    /// Flattened spans, clipped to the requested range.
    pub spans: Vec<HighlightSpan>,
    /// The prefix of the requested range the spans are final for.
    ///
    /// A query that hits the match limit still covers the whole range: the
    /// cursor drops the overflowing matches and carries on, and running the
    /// same range again would drop them again.
    pub covered: Range<usize>,
    /// False when the query stopped on its time budget or match limit.
    pub complete: bool,
    /// Union of every capture seen, before clipping. Empty when none.
    pub extent: Range<usize>,
}

impl QueryOutcome {
    fn empty(range: &Range<usize>) -> Self {
        Self {
            spans: Vec::new(),
            covered: range.clone(),
            complete: true,
            extent: range.start..range.start,
        }
    }
}

/// Limits applied to a single query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimits {
    pub budget: Duration,
    pub match_limit: u32,
    /// How far `run_extended` may grow a range past its end.
    pub max_extension: usize,
}

impl From<&HighlightConfig> for QueryLimits {
    fn from(config: &HighlightConfig) -> Self {
        Self {
            budget: config.query_budget(),
            match_limit: config.query_match_limit,
            max_extension: config.max_extension_bytes,
        }
    }
}

/// A compiled highlight query with its capture indices resolved to the
/// taxonomy once.
pub struct HighlightQuery {
    query: Query,
    captures: Vec<Option<CaptureName>>,
}

impl HighlightQuery {
    /// Compiles `source` for `language`.
    pub fn new(language: &tree_sitter::Language, source: &str) -> std::result::Result<Self, tree_sitter::QueryError> {
        let query = Query::new(language, source)?;
        let captures = query
            .capture_names()
            .iter()
            .map(|name| CaptureName::resolve(name))
            .collect();
        Ok(Self { query, captures })
    }

    /// The taxonomy entry for a capture index, if the grammar's name maps to one.
    pub fn capture(&self, index: usize) -> Option<CaptureName> {
        self.captures.get(index).copied().flatten()
    }

    /// Runs the query over `range` of `tree`.
    ///
    /// `rope` must be the text `tree` was parsed from (or edited to match).
    pub fn run(&self, tree: &Tree, rope: &Rope, range: &Range<usize>, limits: QueryLimits) -> QueryOutcome {
        let deadline = Instant::now() + limits.budget;
        let mut cursor = QueryCursor::new();
        cursor.set_byte_range(range.clone());
        cursor.set_match_limit(limits.match_limit);

        let mut raw = Vec::new();
        let mut extent: Option<Range<usize>> = None;
        let mut stopped_at = None;
        let mut seen = 0usize;

        {
            let mut captures = cursor.captures(&self.query, tree.root_node(), RopeProvider(rope.slice(..)));
            while let Some((mat, capture_index)) = captures.next() {
                let capture = &mat.captures[*capture_index];
                let node_range = capture.node.byte_range();

                seen += 1;
                if seen % DEADLINE_CHECK_INTERVAL == 0 && Instant::now() >= deadline {
                    stopped_at = Some(node_range.start.clamp(range.start, range.end));
                    break;
                }

                let Some(name) = self.capture(capture.index as usize) else {
                    continue;
                };
                extent = Some(match extent {
                    Some(e) => e.start.min(node_range.start)..e.end.max(node_range.end),
                    None => node_range.clone(),
                });
                raw.push(RawCapture {
                    range: node_range,
                    capture: name,
                    pattern_index: mat.pattern_index,
                });
            }
        }
        let exceeded_match_limit = cursor.did_exceed_match_limit();
        if exceeded_match_limit {
            log::debug!(
                "query over {:?} exceeded its match limit of {}",
                range,
                limits.match_limit
            );
        }

        let covered_end = stopped_at.unwrap_or(range.end);
        let clip = range.start..covered_end;
        QueryOutcome {
            spans: flatten(raw, &clip),
            covered: clip,
            complete: stopped_at.is_none() && !exceeded_match_limit,
            extent: extent.unwrap_or(range.start..range.start),
        }
    }

    /// Like `run`, but when a capture runs past the end of `range` (an
    /// unterminated string swallowing the lines below) the range is grown
    /// once, to the end of the line where that capture stops, bounded by
    /// `limits.max_extension`. `covered` reports the range actually used.
    pub fn run_extended(&self, tree: &Tree, rope: &Rope, range: &Range<usize>, limits: QueryLimits) -> QueryOutcome {
        let outcome = self.run(tree, rope, range, limits);
        if !outcome.complete || outcome.extent.end <= range.end || limits.max_extension == 0 {
            return outcome;
        }
        let limit = outcome
            .extent
            .end
            .min(range.end.saturating_add(limits.max_extension))
            .min(rope.len_bytes());
        let end = line_end(rope, limit);
        if end <= range.end {
            return outcome;
        }
        log::trace!("extending highlight of {:?} to {}", range, end);
        self.run(tree, rope, &(range.start..end), limits)
    }
}

/// Offset just past the line containing `offset`.
fn line_end(rope: &Rope, offset: usize) -> usize {
    let line = rope.byte_to_line(offset.min(rope.len_bytes()));
    if line + 1 < rope.len_lines() {
        rope.line_to_byte(line + 1)
    } else {
        rope.len_bytes()
    }
}

/// A read-only copy of the parse state for querying off the editing thread.
#[derive(Clone)]
pub struct QuerySnapshot {
    pub tree: Tree,
    pub query: Arc<HighlightQuery>,
}

/// Wraps the tree-sitter parser, tree and query for one buffer.
pub struct ParserClient {
    parser: Parser,
    grammar_id: String,
    query: Option<Arc<HighlightQuery>>,
    tree: Option<Tree>,
    /// The tree has been edited since the last successful parse.
    dirty: bool,
    /// Inserted ranges of edits not yet covered by a successful parse.
    pending_edits: Vec<Range<usize>>,
    /// The parser holds a parse that timed out. The next `reparse` over the
    /// same text resumes it.
    resumable: bool,
    config: HighlightConfig,
    stats: HighlightStats,
}

impl ParserClient {
    /// Creates a client with no grammar. It highlights nothing until
    /// `set_language` succeeds.
    pub fn new(config: HighlightConfig) -> Self {
        let mut parser = Parser::new();
        #[allow(deprecated)]
        parser.set_timeout_micros(config.parse_timeout_micros);
        Self {
            parser,
            grammar_id: Grammar::plain_text().id,
            query: None,
            tree: None,
            dirty: false,
            pending_edits: Vec::new(),
            resumable: false,
            config,
            stats: HighlightStats::default(),
        }
    }

    /// Switches grammar. The tree is discarded so the next query parses the
    /// whole document.
    ///
    /// On failure the client is left without a grammar (plain text).
    pub fn set_language(&mut self, grammar: &Grammar) -> Result<()> {
        self.tree = None;
        self.dirty = false;
        self.pending_edits.clear();
        self.query = None;
        self.grammar_id = grammar.id.clone();
        self.reset_parser();

        let Some(language) = &grammar.language else {
            return Ok(());
        };
        let load_failure = |reason: String| HighlightError::GrammarLoadFailure {
            language: grammar.id.clone(),
            reason,
        };
        self.parser
            .set_language(language)
            .map_err(|e| load_failure(e.to_string()))?;
        let query = HighlightQuery::new(language, &grammar.highlights_query)
            .map_err(|e| load_failure(format!("highlight query: {e}")))?;
        self.query = Some(Arc::new(query));
        Ok(())
    }

    /// Identifier of the active grammar.
    pub fn grammar_id(&self) -> &str {
        &self.grammar_id
    }

    /// Whether a grammar with a compiled query is loaded.
    pub fn has_grammar(&self) -> bool {
        self.query.is_some()
    }

    pub fn has_tree(&self) -> bool {
        self.tree.is_some()
    }

    /// The tree has edits a reparse has not caught up with.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Drops the tree so the next parse starts from scratch.
    pub fn invalidate(&mut self) {
        self.tree = None;
        self.dirty = false;
        self.pending_edits.clear();
        self.reset_parser();
    }

    /// Throws away a timed-out parse.
    fn reset_parser(&mut self) {
        self.parser.reset();
        self.resumable = false;
    }

    /// Adjusts the tree for an edit. Does not parse.
    pub fn apply_edit(&mut self, edit: &EditDescriptor) {
        if self.query.is_none() {
            return;
        }
        // A suspended parse was reading the old text.
        if self.resumable {
            self.reset_parser();
        }
        if let Some(tree) = &mut self.tree {
            tree.edit(&edit.to_input_edit());
            self.dirty = true;
        }
        for pending in &mut self.pending_edits {
            *pending = edit.map_range(pending);
        }
        self.pending_edits.push(edit.new_range());
    }

    /// Reparses `buffer`, reusing the edited tree when there is one.
    ///
    /// Returns the byte ranges whose syntax may have changed. On timeout the
    /// edited tree is kept, the client stays dirty and the parser keeps its
    /// progress, so calling again with unchanged text continues the parse.
    pub fn reparse(&mut self, buffer: &TextBuffer) -> Result<Vec<Range<usize>>> {
        if self.query.is_none() {
            self.dirty = false;
            self.pending_edits.clear();
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let parsed = parse_rope(&mut self.parser, buffer.rope(), self.tree.as_ref());
        let elapsed = started.elapsed();

        let Some(new_tree) = parsed else {
            self.resumable = true;
            self.stats.parse_timeouts += 1;
            log::warn!(
                "{} reparse paused after {:.2}ms",
                self.grammar_id,
                elapsed.as_secs_f64() * 1000.0
            );
            return Err(HighlightError::ParseTimeout {
                budget: self.config.parse_timeout(),
            });
        };

        let mut invalidated: Vec<Range<usize>> = match &self.tree {
            Some(old_tree) => {
                self.stats.incremental_parses += 1;
                old_tree
                    .changed_ranges(&new_tree)
                    .map(|r| r.start_byte..r.end_byte)
                    .collect()
            }
            None => {
                self.stats.full_parses += 1;
                vec![0..buffer.len_bytes()]
            }
        };
        invalidated.append(&mut self.pending_edits);
        self.stats.parse.record(elapsed);
        log::debug!(
            "{} parsed in {:.2}ms, {} invalidated range(s)",
            self.grammar_id,
            elapsed.as_secs_f64() * 1000.0,
            invalidated.len()
        );

        self.tree = Some(new_tree);
        self.dirty = false;
        self.resumable = false;
        Ok(invalidated)
    }

    /// Highlights `range` of `buffer`.
    ///
    /// Parses first if there is no tree yet.
    pub fn query_highlights(&mut self, range: &Range<usize>, buffer: &TextBuffer) -> Result<QueryOutcome> {
        self.query_with(range, buffer, HighlightQuery::run)
    }

    /// Highlights `range`, growing it past its end when a capture continues
    /// beyond it. See `HighlightQuery::run_extended`.
    pub fn query_extended(&mut self, range: &Range<usize>, buffer: &TextBuffer) -> Result<QueryOutcome> {
        self.query_with(range, buffer, HighlightQuery::run_extended)
    }

    fn query_with(
        &mut self,
        range: &Range<usize>,
        buffer: &TextBuffer,
        run: fn(&HighlightQuery, &Tree, &Rope, &Range<usize>, QueryLimits) -> QueryOutcome,
    ) -> Result<QueryOutcome> {
        buffer.check_range(range)?;
        let Some(query) = self.query.clone() else {
            return Ok(QueryOutcome::empty(range));
        };
        if self.tree.is_none() {
            self.reparse(buffer)?;
        }
        let Some(tree) = &self.tree else {
            return Ok(QueryOutcome::empty(range));
        };

        let started = Instant::now();
        let outcome = run(query.as_ref(), tree, buffer.rope(), range, QueryLimits::from(&self.config));
        self.stats.query.record(started.elapsed());
        if !outcome.complete {
            self.stats.partial_queries += 1;
            log::debug!(
                "{} query over {:?} stopped early at {}",
                self.grammar_id,
                range,
                outcome.covered.end
            );
        }
        Ok(outcome)
    }

    /// Changes the reparse time budget. Zero removes the limit.
    pub fn set_parse_timeout(&mut self, timeout: Duration) {
        self.config.parse_timeout_micros = timeout.as_micros() as u64;
        #[allow(deprecated)]
        self.parser.set_timeout_micros(self.config.parse_timeout_micros);
    }

    /// Copies the tree and query for an off-thread query. `None` without a
    /// grammar or tree.
    pub fn snapshot(&self) -> Option<QuerySnapshot> {
        Some(QuerySnapshot {
            tree: self.tree.clone()?,
            query: self.query.clone()?,
        })
    }

    pub fn limits(&self) -> QueryLimits {
        QueryLimits::from(&self.config)
    }

    pub fn config(&self) -> &HighlightConfig {
        &self.config
    }

    /// Number of successful parses so far.
    pub fn parse_count(&self) -> u64 {
        self.stats.parse_count()
    }

    pub fn stats(&self) -> &HighlightStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut HighlightStats {
        &mut self.stats
    }

    #[cfg(test)]
    pub(crate) fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }
}

/// Parses a rope chunk by chunk without flattening it into a string.
fn parse_rope(parser: &mut Parser, rope: &Rope, old_tree: Option<&Tree>) -> Option<Tree> {
    let mut chunks = RopeChunkCache::new(rope);
    parser.parse_with(&mut |byte_offset, _| chunks.bytes_from(byte_offset), old_tree)
}

/// Remembers the last rope chunk handed to the parser, which usually asks
/// for consecutive offsets.
struct RopeChunkCache<'a> {
    rope: &'a Rope,
    chunk: &'a str,
    start: usize,
    end: usize,
}

impl<'a> RopeChunkCache<'a> {
    fn new(rope: &'a Rope) -> Self {
        Self {
            rope,
            chunk: "",
            start: 0,
            end: 0,
        }
    }

    fn bytes_from(&mut self, byte_offset: usize) -> &'a [u8] {
        if byte_offset >= self.rope.len_bytes() {
            return &[];
        }
        if byte_offset < self.start || byte_offset >= self.end {
            let (chunk, chunk_start, _, _) = self.rope.chunk_at_byte(byte_offset);
            self.chunk = chunk;
            self.start = chunk_start;
            self.end = chunk_start + chunk.len();
        }
        &self.chunk.as_bytes()[byte_offset - self.start..]
    }
}

/// Byte chunks of a rope slice.
pub struct ChunksBytes<'a> {
    chunks: Option<ropey::iter::Chunks<'a>>,
}

impl<'a> Iterator for ChunksBytes<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        self.chunks.as_mut()?.next().map(str::as_bytes)
    }
}

/// Gives query predicates (`#match?`, `#eq?`) access to node text.
pub struct RopeProvider<'a>(pub RopeSlice<'a>);

impl<'a> TextProvider<&'a [u8]> for RopeProvider<'a> {
    type I = ChunksBytes<'a>;

    fn text(&mut self, node: Node) -> Self::I {
        ChunksBytes {
            chunks: self
                .0
                .get_byte_slice(node.start_byte()..node.end_byte())
                .map(|slice| slice.chunks()),
        }
    }
}
