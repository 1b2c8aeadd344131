//! Incremental syntax highlighter.
//!
//! Drives the parser client for one buffer, keeps the spans the host is
//! currently showing, and emits attribute updates only where they change.

use super::capture::CaptureName;
use super::client::{ParserClient, QueryOutcome};
use super::edit::EditDescriptor;
use super::language::Grammar;
use super::span::{self, HighlightSpan};
use super::theme::{AttributeSet, Theme};
use super::worker::{HighlightJob, HighlightWorker};
use crate::buffer::TextBuffer;
use crate::config::HighlightConfig;
use crate::cursor::{CursorPosition, Cursors};
use crate::error::HighlightError;
use crate::stats::HighlightStats;
use crossbeam_channel::Sender;
use std::ops::Range;
use std::time::Duration;

/// Attributes for one stretch of an update.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeRun {
    pub range: Range<usize>,
    /// `None` for text no capture covers.
    pub capture: Option<CaptureName>,
    pub attributes: AttributeSet,
}

/// Replacement attributes for a contiguous range. The runs tile the range.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeUpdate {
    pub range: Range<usize>,
    pub runs: Vec<AttributeRun>,
}

/// Receives attribute updates. Implemented by the host.
pub trait AttributeSink {
    fn attributes_changed(&mut self, update: &AttributeUpdate);
}

impl<F> AttributeSink for F
where
    F: FnMut(&AttributeUpdate),
{
    fn attributes_changed(&mut self, update: &AttributeUpdate) {
        self(update)
    }
}

/// Forwards updates over a channel, for hosts that drain them elsewhere.
pub struct ChannelSink(pub Sender<AttributeUpdate>);

impl AttributeSink for ChannelSink {
    fn attributes_changed(&mut self, update: &AttributeUpdate) {
        if self.0.send(update.clone()).is_err() {
            log::trace!("attribute update dropped, receiver gone");
        }
    }
}

/// Where the highlighter is in its cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighlightState {
    /// Everything emitted matches the current text.
    Idle,
    /// A re-highlight of this range is waiting on the worker or a reparse.
    HighlightPending(Range<usize>),
    /// Highlighting is off; edits are not forwarded to the parser.
    Disabled,
}

/// Smallest range covering `a` (if any) and `b`.
fn hull(a: Option<Range<usize>>, b: &Range<usize>) -> Range<usize> {
    match a {
        Some(a) => a.start.min(b.start)..a.end.max(b.end),
        None => b.clone(),
    }
}

/// Incremental highlighter for a single buffer.
pub struct Highlighter {
    client: ParserClient,
    theme: Theme,
    sink: Box<dyn AttributeSink>,
    state: HighlightState,
    /// What the host currently shows, ordered and non-overlapping.
    spans: Vec<HighlightSpan>,
    /// Bumped by every edit and rebuild; older worker results are stale.
    generation: u64,
    worker: Option<HighlightWorker>,
    /// Text whose attributes must be re-sent even if its capture did not change.
    unpainted: Option<Range<usize>>,
    /// Ranges a query gave up on, retried from `on_idle`.
    deferred: Vec<Range<usize>>,
    reparse_pending: bool,
    /// Grammar that failed to load, if the buffer is degraded to plain text.
    degraded: Option<String>,
    last_rehighlight: Option<Range<usize>>,
    cursors: Cursors,
}

impl Highlighter {
    /// Creates a highlighter with no grammar. Call `set_language` to start.
    pub fn new(config: HighlightConfig, theme: Theme, sink: Box<dyn AttributeSink>) -> Self {
        let worker = if config.background_queries {
            match HighlightWorker::spawn() {
                Ok(worker) => Some(worker),
                Err(e) => {
                    log::warn!("Could not start highlight worker, querying inline: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            client: ParserClient::new(config),
            theme,
            sink,
            state: HighlightState::Idle,
            spans: Vec::new(),
            generation: 0,
            worker,
            unpainted: None,
            deferred: Vec::new(),
            reparse_pending: false,
            degraded: None,
            last_rehighlight: None,
            cursors: Cursors::default(),
        }
    }

    pub fn state(&self) -> &HighlightState {
        &self.state
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Spans currently applied in the host.
    pub fn spans(&self) -> &[HighlightSpan] {
        &self.spans
    }

    pub fn stats(&self) -> &HighlightStats {
        self.client.stats()
    }

    /// Number of parses run so far.
    pub fn parse_count(&self) -> u64 {
        self.client.parse_count()
    }

    pub fn grammar_id(&self) -> &str {
        self.client.grammar_id()
    }

    /// The grammar that failed to load, when highlighting fell back to plain text.
    pub fn degraded_grammar(&self) -> Option<&str> {
        self.degraded.as_deref()
    }

    /// The range most recently sent for re-highlighting.
    pub fn last_rehighlight_range(&self) -> Option<Range<usize>> {
        self.last_rehighlight.clone()
    }

    /// Theme attributes for a capture, falling back through its parents.
    pub fn attributes_for(&self, capture: Option<CaptureName>) -> AttributeSet {
        self.theme.attributes_for(capture)
    }

    /// Cursor positions used to order deferred work.
    pub fn set_cursor_positions(&mut self, positions: Vec<CursorPosition>) {
        self.cursors.set(positions);
    }

    /// The host's latest cursor positions.
    pub fn cursor_positions(&self) -> &[CursorPosition] {
        self.cursors.positions()
    }

    /// Changes the reparse time budget.
    pub fn set_parse_timeout(&mut self, timeout: Duration) {
        self.client.set_parse_timeout(timeout);
    }

    /// Whether a reparse, deferred range or worker result is outstanding.
    pub fn has_pending_work(&self) -> bool {
        self.reparse_pending
            || !self.deferred.is_empty()
            || matches!(self.state, HighlightState::HighlightPending(_))
    }

    /// Runs the pipeline for an edit already applied to `buffer`.
    pub fn on_text_changed(&mut self, edit: &EditDescriptor, buffer: &TextBuffer) {
        if self.state == HighlightState::Disabled {
            return;
        }
        self.generation += 1;
        self.client.apply_edit(edit);
        span::shift_for_edit(&mut self.spans, edit);

        for range in &mut self.deferred {
            *range = edit.map_range(range);
        }
        self.deferred.retain(|range| !range.is_empty());

        let inserted = edit.new_range();
        let mut unpainted = self.unpainted.take().map(|range| edit.map_range(&range));
        if !inserted.is_empty() {
            unpainted = Some(hull(unpainted, &inserted));
        }
        self.unpainted = unpainted.filter(|range| !range.is_empty());

        let carried = match &self.state {
            HighlightState::HighlightPending(range) => Some(edit.map_range(range)),
            _ => None,
        };

        match self.client.reparse(buffer) {
            Ok(invalidated) => {
                let affected = invalidated
                    .iter()
                    .chain(carried.as_ref())
                    .chain(std::iter::once(&inserted));
                let range = affected_range(affected, buffer);
                self.rehighlight(range, buffer);
            }
            Err(HighlightError::ParseTimeout { .. }) => {
                self.reparse_pending = true;
                self.state = HighlightState::HighlightPending(hull(carried, &inserted));
            }
            Err(e) => log::warn!("Reparse failed: {}", e),
        }
    }

    /// Swaps the theme and recolors the whole document from the cached spans.
    /// Nothing is reparsed.
    pub fn set_theme(&mut self, theme: Theme, buffer: &TextBuffer) {
        self.theme = theme;
        if self.state != HighlightState::Disabled {
            self.emit(0..buffer.len_bytes());
        }
    }

    /// Switches grammar and rebuilds all highlighting.
    ///
    /// A grammar that fails to load leaves the buffer highlighted as plain
    /// text; the failure is logged once.
    pub fn set_language(&mut self, grammar: &Grammar, buffer: &TextBuffer) {
        match self.client.set_language(grammar) {
            Ok(()) => self.degraded = None,
            Err(e) => {
                if self.degraded.as_deref() != Some(grammar.id.as_str()) {
                    log::warn!("{}; highlighting as plain text", e);
                }
                self.degraded = Some(grammar.id.clone());
            }
        }
        if self.state != HighlightState::Disabled {
            self.full_rebuild(buffer);
        }
    }

    /// Resets the document to default attributes and stops highlighting.
    pub fn disable(&mut self, buffer: &TextBuffer) {
        if self.state == HighlightState::Disabled {
            return;
        }
        self.generation += 1;
        self.client.invalidate();
        self.spans.clear();
        self.deferred.clear();
        self.unpainted = None;
        self.reparse_pending = false;
        self.state = HighlightState::Disabled;
        self.emit(0..buffer.len_bytes());
    }

    /// Turns highlighting back on with one full rebuild.
    pub fn enable(&mut self, buffer: &TextBuffer) {
        if self.state != HighlightState::Disabled {
            return;
        }
        self.state = HighlightState::Idle;
        self.full_rebuild(buffer);
    }

    /// Applies finished worker results. Returns how many were applied.
    pub fn poll(&mut self) -> usize {
        let completions: Vec<_> = match &self.worker {
            Some(worker) => std::iter::from_fn(|| worker.try_recv()).collect(),
            None => return 0,
        };
        let mut applied = 0;
        for completion in completions {
            if self.accept(completion.generation) {
                self.apply(completion.range, completion.outcome);
                applied += 1;
            }
        }
        applied
    }

    /// Like `poll`, but waits up to `timeout` for the first result.
    pub fn poll_blocking(&mut self, timeout: Duration) -> usize {
        let first = match &self.worker {
            Some(worker) => worker.recv_timeout(timeout),
            None => return 0,
        };
        let mut applied = 0;
        if let Some(completion) = first {
            if self.accept(completion.generation) {
                self.apply(completion.range, completion.outcome);
                applied += 1;
            }
        }
        applied + self.poll()
    }

    /// Does one piece of deferred work: a timed-out reparse first, then the
    /// deferred range nearest a cursor. Returns true while work remains.
    pub fn on_idle(&mut self, buffer: &TextBuffer) -> bool {
        if self.state == HighlightState::Disabled {
            return false;
        }

        if self.reparse_pending {
            let carried = match &self.state {
                HighlightState::HighlightPending(range) => Some(range.clone()),
                _ => None,
            };
            match self.client.reparse(buffer) {
                Ok(invalidated) => {
                    self.reparse_pending = false;
                    let range = affected_range(invalidated.iter().chain(carried.as_ref()), buffer);
                    self.rehighlight(range, buffer);
                }
                Err(e) => log::debug!("Reparse still pending: {}", e),
            }
            return self.has_pending_work();
        }

        if self.worker.is_some() && matches!(self.state, HighlightState::HighlightPending(_)) {
            return true;
        }

        if self.deferred.is_empty() {
            return false;
        }
        self.cursors.order_by_proximity(buffer, &mut self.deferred);
        let next = self.deferred.remove(0);
        self.rehighlight(next, buffer);
        self.has_pending_work()
    }

    /// Checks a worker result against the current generation.
    fn accept(&mut self, generation: u64) -> bool {
        if generation == self.generation && self.state != HighlightState::Disabled {
            return true;
        }
        self.client.stats_mut().discarded_results += 1;
        log::trace!(
            "Discarding highlight result for generation {} (current {})",
            generation,
            self.generation
        );
        false
    }

    /// Reparses from scratch and repaints the whole document.
    fn full_rebuild(&mut self, buffer: &TextBuffer) {
        self.generation += 1;
        self.client.invalidate();
        self.deferred.clear();
        self.reparse_pending = false;

        let all = 0..buffer.len_bytes();
        self.unpainted = Some(all.clone());
        match self.client.reparse(buffer) {
            Ok(_) => self.rehighlight(all, buffer),
            Err(HighlightError::ParseTimeout { .. }) => {
                self.reparse_pending = true;
                self.state = HighlightState::HighlightPending(all);
            }
            Err(e) => log::warn!("Full parse failed: {}", e),
        }
    }

    /// Queries `range`, inline or on the worker.
    fn rehighlight(&mut self, range: Range<usize>, buffer: &TextBuffer) {
        self.last_rehighlight = Some(range.clone());

        if let Some(worker) = &self.worker {
            if let Some(snapshot) = self.client.snapshot() {
                let job = HighlightJob {
                    generation: self.generation,
                    snapshot,
                    rope: buffer.rope().clone(),
                    range: range.clone(),
                    limits: self.client.limits(),
                };
                if worker.submit(job) {
                    self.state = HighlightState::HighlightPending(range);
                    return;
                }
                log::warn!("Highlight worker is gone, querying inline");
            }
        }

        match self.client.query_extended(&range, buffer) {
            Ok(outcome) => self.apply(range, outcome),
            Err(e) => log::warn!("Highlight query over {:?} failed: {}", range, e),
        }
    }

    /// Folds a query result into the span cache and emits what changed.
    fn apply(&mut self, requested: Range<usize>, outcome: QueryOutcome) {
        let covered = outcome.covered.clone();
        // Only a query cut short by its time budget leaves a tail to retry.
        // Match limit overflow covers the whole range and is accepted as is.
        if !outcome.complete && covered.end < requested.end {
            self.deferred.push(covered.end..requested.end);
        }

        let changed = span::diff(&self.spans, &outcome.spans, &covered);
        span::splice(&mut self.spans, &covered, outcome.spans);

        let mut forced = None;
        if let Some(unpainted) = self.unpainted.take() {
            let start = unpainted.start.max(covered.start);
            let end = unpainted.end.min(covered.end);
            if start <= end {
                forced = Some(start..end);
            }
            if unpainted.end > covered.end {
                self.unpainted = Some(covered.end.max(unpainted.start)..unpainted.end);
            } else if unpainted.start < covered.start && forced.is_none() {
                self.unpainted = Some(unpainted);
            }
        }

        self.state = HighlightState::Idle;
        let extent = match (changed, forced) {
            (Some(changed), forced) => Some(hull(forced, &changed)),
            (None, forced) => forced,
        };
        if let Some(extent) = extent {
            self.emit(extent);
        }
    }

    /// Sends the cached attributes of `range` to the host.
    fn emit(&mut self, range: Range<usize>) {
        let runs = span::tile(&self.spans, &range)
            .into_iter()
            .map(|(range, capture)| AttributeRun {
                attributes: self.theme.attributes_for(capture),
                range,
                capture,
            })
            .collect();
        let update = AttributeUpdate { range, runs };
        self.sink.attributes_changed(&update);
        self.client.stats_mut().updates_emitted += 1;
    }
}

/// Hull of `ranges` grown to whole lines. Empty input gives the first line.
fn affected_range<'a>(ranges: impl IntoIterator<Item = &'a Range<usize>>, buffer: &TextBuffer) -> Range<usize> {
    let len = buffer.len_bytes();
    let (start, end) = ranges
        .into_iter()
        .fold(None, |acc: Option<(usize, usize)>, r| match acc {
            Some((s, e)) => Some((s.min(r.start), e.max(r.end))),
            None => Some((r.start, r.end)),
        })
        .unwrap_or((0, 0));

    let rope = buffer.rope();
    let start = rope.line_to_byte(rope.byte_to_line(start.min(len)));
    let end = buffer.line_range(rope.byte_to_line(end.min(len))).end;
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::edit::translate;
    use crate::syntax::language::{BuiltinGrammars, GrammarProvider};
    use std::cell::RefCell;
    use std::rc::Rc;

    type Updates = Rc<RefCell<Vec<AttributeUpdate>>>;

    fn highlighter(config: HighlightConfig, language: &str, buffer: &TextBuffer) -> (Highlighter, Updates) {
        let updates: Updates = Rc::default();
        let sink_updates = updates.clone();
        let mut highlighter = Highlighter::new(
            config,
            Theme::dark(),
            Box::new(move |update: &AttributeUpdate| sink_updates.borrow_mut().push(update.clone())),
        );
        highlighter.set_language(&BuiltinGrammars.grammar(language).unwrap(), buffer);
        (highlighter, updates)
    }

    fn edit(h: &mut Highlighter, buffer: &mut TextBuffer, range: Range<usize>, text: &str) {
        let descriptor = translate(range.clone(), text, buffer).unwrap();
        buffer.replace(range, text).unwrap();
        h.on_text_changed(&descriptor, buffer);
    }

    fn fresh_spans(source: &str, language: &str) -> Vec<HighlightSpan> {
        let buffer = TextBuffer::from_str(source);
        let (h, _) = highlighter(HighlightConfig::default(), language, &buffer);
        h.spans().to_vec()
    }

    #[test]
    fn test_attach_emits_one_full_update() {
        let buffer = TextBuffer::from_str("func foo() {}\n");
        let (h, updates) = highlighter(HighlightConfig::default(), "go", &buffer);
        let updates = updates.borrow();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].range, 0..14);
        assert_eq!(h.state(), &HighlightState::Idle);
        assert_eq!(h.spans()[0], HighlightSpan::new(0..4, CaptureName::Keyword));
    }

    #[test]
    fn test_runs_tile_the_update() {
        let buffer = TextBuffer::from_str("func foo() {}\n");
        let (_, updates) = highlighter(HighlightConfig::default(), "go", &buffer);
        let update = &updates.borrow()[0];
        let mut pos = update.range.start;
        for run in &update.runs {
            assert_eq!(run.range.start, pos);
            pos = run.range.end;
        }
        assert_eq!(pos, update.range.end);
        assert_eq!(update.runs[0].attributes, Theme::dark().attributes_for(Some(CaptureName::Keyword)));
    }

    #[test]
    fn test_typing_emits_only_the_changed_region() {
        let mut buffer = TextBuffer::from_str("func a() {}\n\nfunc b() {}\n");
        let (mut h, updates) = highlighter(HighlightConfig::default(), "go", &buffer);
        updates.borrow_mut().clear();

        edit(&mut h, &mut buffer, 6..6, "bc");
        let updates = updates.borrow();
        assert_eq!(updates.len(), 1);
        assert!(updates[0].range.start <= 6 && updates[0].range.end >= 8);
        assert!(updates[0].range.end <= 12);
        drop(updates);
        assert_eq!(h.spans(), fresh_spans(&buffer.to_string(), "go").as_slice());
    }

    #[test]
    fn test_no_update_when_nothing_changes() {
        let mut buffer = TextBuffer::from_str("func a() {}\n");
        let (mut h, updates) = highlighter(HighlightConfig::default(), "go", &buffer);
        updates.borrow_mut().clear();
        // Deleting a space keeps every capture and inserts nothing.
        edit(&mut h, &mut buffer, 8..9, "");
        assert!(updates.borrow().is_empty());
        assert_eq!(h.spans(), fresh_spans("func a(){}\n", "go").as_slice());
    }

    #[test]
    fn test_deleting_closing_quote_extends_to_line_end() {
        let mut buffer = TextBuffer::from_str("x := \"abc\" + y\nz := 1\n");
        let (mut h, _) = highlighter(HighlightConfig::default(), "go", &buffer);
        edit(&mut h, &mut buffer, 9..10, "");
        let range = h.last_rehighlight_range().unwrap();
        assert!(range.start <= 9);
        assert!(range.end >= 14);
    }

    #[test]
    fn test_theme_switch_does_not_reparse() {
        let buffer = TextBuffer::from_str("func foo() {}\n");
        let (mut h, updates) = highlighter(HighlightConfig::default(), "go", &buffer);
        let parses = h.parse_count();
        updates.borrow_mut().clear();

        h.set_theme(Theme::light(), &buffer);
        assert_eq!(h.parse_count(), parses);
        let updates = updates.borrow();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].range, 0..buffer.len_bytes());
        assert_eq!(
            updates[0].runs[0].attributes,
            Theme::light().attributes_for(Some(CaptureName::Keyword))
        );
    }

    #[test]
    fn test_disable_silences_until_enable() {
        let mut buffer = TextBuffer::from_str("func foo() {}\n");
        let (mut h, updates) = highlighter(HighlightConfig::default(), "go", &buffer);
        h.disable(&buffer);
        assert_eq!(updates.borrow().len(), 2);
        assert!(updates.borrow()[1].runs.iter().all(|r| r.capture.is_none()));
        updates.borrow_mut().clear();

        let parses = h.parse_count();
        for i in 0..20 {
            edit(&mut h, &mut buffer, i..i, "x");
        }
        assert!(updates.borrow().is_empty());
        assert_eq!(h.parse_count(), parses);

        h.enable(&buffer);
        assert_eq!(updates.borrow().len(), 1);
        assert_eq!(updates.borrow()[0].range, 0..buffer.len_bytes());
        assert_eq!(h.stats().full_parses, 2);
        assert_eq!(h.spans(), fresh_spans(&buffer.to_string(), "go").as_slice());
    }

    #[test]
    fn test_plain_text_paints_inserted_text_with_defaults() {
        let mut buffer = TextBuffer::new();
        let (mut h, updates) = highlighter(HighlightConfig::default(), "plaintext", &buffer);
        edit(&mut h, &mut buffer, 0..0, "hello");
        let updates = updates.borrow();
        let last = updates.last().unwrap();
        assert_eq!(last.range, 0..5);
        assert_eq!(last.runs[0].capture, None);
        assert_eq!(h.parse_count(), 0);
    }

    #[test]
    fn test_broken_grammar_degrades_to_plain_text() {
        let buffer = TextBuffer::from_str("func foo() {}\n");
        let updates: Updates = Rc::default();
        let sink_updates = updates.clone();
        let mut h = Highlighter::new(
            HighlightConfig::default(),
            Theme::dark(),
            Box::new(move |u: &AttributeUpdate| sink_updates.borrow_mut().push(u.clone())),
        );
        let grammar = Grammar {
            id: "go".to_string(),
            language: Some(tree_sitter_go::LANGUAGE.into()),
            highlights_query: "(nope) @keyword".to_string(),
        };
        h.set_language(&grammar, &buffer);
        assert_eq!(h.degraded_grammar(), Some("go"));
        assert!(h.spans().is_empty());
        assert_eq!(updates.borrow().len(), 1);
    }

    #[test]
    fn test_timed_out_parse_is_retried_on_idle() {
        let source = "func f() { x := []int{1, 2, 3} }\n".repeat(20_000);
        let buffer = TextBuffer::from_str(&source);
        let config = HighlightConfig {
            parse_timeout_micros: 2_000,
            query_budget_micros: 60_000_000,
            ..HighlightConfig::default()
        };
        let (mut h, updates) = highlighter(config, "go", &buffer);
        assert!(updates.borrow().is_empty());
        assert!(matches!(h.state(), HighlightState::HighlightPending(_)));
        assert!(h.stats().parse_timeouts >= 1);

        // Each idle step continues the same parse under the same budget.
        let mut rounds = 0;
        while h.on_idle(&buffer) {
            rounds += 1;
            assert!(rounds < 100_000, "parse never finished");
        }
        assert_eq!(h.state(), &HighlightState::Idle);
        assert_eq!(h.stats().full_parses, 1);
        assert_eq!(updates.borrow().len(), 1);
        assert_eq!(updates.borrow()[0].range, 0..buffer.len_bytes());
    }

    #[test]
    fn test_partial_query_is_finished_on_idle() {
        let source = "func f() { x := 1 }\n".repeat(2_000);
        let buffer = TextBuffer::from_str(&source);
        let config = HighlightConfig {
            query_budget_micros: 0,
            ..HighlightConfig::default()
        };
        let (mut h, _) = highlighter(config, "go", &buffer);
        assert!(h.has_pending_work());
        h.set_cursor_positions(vec![CursorPosition::new(1_999, 0)]);

        let mut rounds = 0;
        while h.on_idle(&buffer) {
            rounds += 1;
            assert!(rounds < 100_000);
        }
        assert_eq!(h.spans(), fresh_spans(&source, "go").as_slice());
    }

    #[test]
    fn test_match_limit_leaves_no_deferred_work() {
        let source = "func f() { x := \"a\" + \"b\" }\n".repeat(200);
        let buffer = TextBuffer::from_str(&source);
        let config = HighlightConfig {
            query_match_limit: 1,
            query_budget_micros: 60_000_000,
            ..HighlightConfig::default()
        };
        let (mut h, updates) = highlighter(config, "go", &buffer);
        assert!(!h.has_pending_work());
        assert_eq!(h.state(), &HighlightState::Idle);
        assert!(!h.on_idle(&buffer));
        assert_eq!(updates.borrow().len(), 1);
        assert_eq!(updates.borrow()[0].range, 0..buffer.len_bytes());
    }

    #[test]
    fn test_background_queries_apply_on_poll() {
        let mut buffer = TextBuffer::from_str("func foo() {}\n");
        let config = HighlightConfig {
            background_queries: true,
            ..HighlightConfig::default()
        };
        let (mut h, updates) = highlighter(config, "go", &buffer);
        assert!(matches!(h.state(), HighlightState::HighlightPending(_)));
        assert_eq!(h.poll_blocking(Duration::from_secs(5)), 1);
        assert_eq!(updates.borrow().len(), 1);

        // Two edits before polling: only the newest result is applied.
        edit(&mut h, &mut buffer, 8..8, "d");
        edit(&mut h, &mut buffer, 9..9, "e");
        let mut applied = 0;
        while h.has_pending_work() {
            applied += h.poll_blocking(Duration::from_secs(5));
        }
        assert_eq!(applied, 1);
        assert_eq!(h.spans(), fresh_spans(&buffer.to_string(), "go").as_slice());
    }

    #[test]
    fn test_affected_range_is_line_aligned() {
        let buffer = TextBuffer::from_str("ab\ncd\nef\n");
        assert_eq!(affected_range([&(4..4)], &buffer), 3..6);
        assert_eq!(affected_range([&(1..2), &(7..8)], &buffer), 0..9);
        assert_eq!(affected_range([], &buffer), 0..3);
    }

    #[test]
    fn test_channel_sink() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut sink = ChannelSink(tx);
        let update = AttributeUpdate {
            range: 0..0,
            runs: Vec::new(),
        };
        sink.attributes_changed(&update);
        assert_eq!(rx.try_recv().unwrap(), update);
    }
}
