//! Highlight span sequences.
//!
//! A span list is always sorted by start, non-overlapping, and never holds
//! two touching spans with the same capture. Everything here preserves that.

use super::capture::CaptureName;
use super::edit::EditDescriptor;
use std::ops::Range;

/// A classified byte range of the document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HighlightSpan {
    pub range: Range<usize>,
    pub capture: CaptureName,
}

impl HighlightSpan {
    pub fn new(range: Range<usize>, capture: CaptureName) -> Self {
        Self { range, capture }
    }
}

/// A single capture reported by a highlight query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCapture {
    pub range: Range<usize>,
    pub capture: CaptureName,
    pub pattern_index: usize,
}

/// Appends `range` to `spans`, merging it into the last span when they touch
/// and share a capture.
fn push_merged(spans: &mut Vec<HighlightSpan>, range: Range<usize>, capture: CaptureName) {
    if range.is_empty() {
        return;
    }
    if let Some(last) = spans.last_mut() {
        if last.capture == capture && last.range.end == range.start {
            last.range.end = range.end;
            return;
        }
    }
    spans.push(HighlightSpan::new(range, capture));
}

/// Flattens possibly nested captures into an ordered span list inside `clip`.
///
/// Inner captures win over the capture enclosing them. For identical ranges
/// the lowest pattern index wins. A capture that starts inside another but
/// runs past its end is cut at the enclosing end.
pub fn flatten(mut captures: Vec<RawCapture>, clip: &Range<usize>) -> Vec<HighlightSpan> {
    captures.retain(|c| !c.range.is_empty() && c.range.end > clip.start && c.range.start < clip.end);
    captures.sort_by(|a, b| {
        a.range
            .start
            .cmp(&b.range.start)
            .then(b.range.end.cmp(&a.range.end))
            .then(a.pattern_index.cmp(&b.pattern_index))
    });
    captures.dedup_by(|later, earlier| later.range == earlier.range);

    let mut spans = Vec::new();
    // (end, capture) of every open capture, innermost last
    let mut stack: Vec<(usize, CaptureName)> = Vec::new();
    let mut pos = clip.start;

    for raw in captures {
        let start = raw.range.start.max(clip.start);

        while let Some(&(end, capture)) = stack.last() {
            if end > start {
                break;
            }
            push_merged(&mut spans, pos..end, capture);
            pos = pos.max(end);
            stack.pop();
        }
        if let Some(&(_, capture)) = stack.last() {
            push_merged(&mut spans, pos..start, capture);
        }
        pos = pos.max(start);

        let mut end = raw.range.end.min(clip.end);
        if let Some(&(outer_end, _)) = stack.last() {
            end = end.min(outer_end);
        }
        if end > start {
            stack.push((end, raw.capture));
        }
    }
    while let Some((end, capture)) = stack.pop() {
        push_merged(&mut spans, pos..end, capture);
        pos = pos.max(end);
    }
    spans
}

/// Returns the parts of `spans` that fall inside `range`.
pub fn clip(spans: &[HighlightSpan], range: &Range<usize>) -> Vec<HighlightSpan> {
    let first = spans.partition_point(|s| s.range.end <= range.start);
    spans[first..]
        .iter()
        .take_while(|s| s.range.start < range.end)
        .map(|s| {
            HighlightSpan::new(
                s.range.start.max(range.start)..s.range.end.min(range.end),
                s.capture,
            )
        })
        .filter(|s| !s.range.is_empty())
        .collect()
}

/// Carries a span list across an edit.
///
/// Spans before the edit are kept, spans after it are shifted by the length
/// change, and the replaced bytes lose their highlighting.
pub fn shift_for_edit(spans: &mut Vec<HighlightSpan>, edit: &EditDescriptor) {
    let old = edit.old_range();
    let delta = edit.delta();
    let mut shifted = Vec::with_capacity(spans.len() + 1);
    for span in spans.drain(..) {
        if span.range.start < old.start {
            push_merged(
                &mut shifted,
                span.range.start..span.range.end.min(old.start),
                span.capture,
            );
        }
        if span.range.end > old.end {
            let start = span.range.start.max(old.end);
            let moved = (start as isize + delta) as usize..(span.range.end as isize + delta) as usize;
            push_merged(&mut shifted, moved, span.capture);
        }
    }
    *spans = shifted;
}

/// Replaces everything `spans` says about `range` with `replacement`.
///
/// `replacement` must lie inside `range`.
pub fn splice(spans: &mut Vec<HighlightSpan>, range: &Range<usize>, replacement: Vec<HighlightSpan>) {
    let first = spans.partition_point(|s| s.range.end <= range.start);
    let last = spans.partition_point(|s| s.range.start < range.end);

    let mut middle = Vec::with_capacity(replacement.len() + 2);
    if let Some(head) = spans.get(first).filter(|s| s.range.start < range.start && first < last) {
        middle.push(HighlightSpan::new(head.range.start..range.start, head.capture));
    }
    for span in replacement {
        push_merged(&mut middle, span.range, span.capture);
    }
    if last > first {
        if let Some(tail) = spans.get(last - 1).filter(|s| s.range.end > range.end) {
            push_merged(&mut middle, range.end..tail.range.end, tail.capture);
        }
    }

    // Re-merge at the seams with the untouched neighbours.
    let mut rebuilt: Vec<HighlightSpan> = Vec::with_capacity(spans.len() + middle.len());
    rebuilt.extend(spans.drain(..first));
    let rest: Vec<HighlightSpan> = spans.drain(last - first..).collect();
    for span in middle.into_iter().chain(rest) {
        push_merged(&mut rebuilt, span.range, span.capture);
    }
    *spans = rebuilt;
}

/// Covers `range` completely with segments. Gaps between spans come back
/// with no capture.
pub fn tile(spans: &[HighlightSpan], range: &Range<usize>) -> Vec<(Range<usize>, Option<CaptureName>)> {
    let mut tiles = Vec::new();
    let mut pos = range.start;
    for span in clip(spans, range) {
        if span.range.start > pos {
            tiles.push((pos..span.range.start, None));
        }
        pos = span.range.end;
        tiles.push((span.range, Some(span.capture)));
    }
    if pos < range.end {
        tiles.push((pos..range.end, None));
    }
    tiles
}

/// The smallest range inside `range` outside of which `old` and `new` agree.
/// `None` when they are identical within `range`.
pub fn diff(old: &[HighlightSpan], new: &[HighlightSpan], range: &Range<usize>) -> Option<Range<usize>> {
    let old_tiles = tile(old, range);
    let new_tiles = tile(new, range);
    let (mut i, mut j) = (0, 0);
    let mut pos = range.start;
    let mut changed: Option<Range<usize>> = None;

    while i < old_tiles.len() && j < new_tiles.len() {
        let (old_range, old_capture) = &old_tiles[i];
        let (new_range, new_capture) = &new_tiles[j];
        let end = old_range.end.min(new_range.end);
        if old_capture != new_capture && end > pos {
            changed = Some(match changed {
                Some(c) => c.start..end,
                None => pos..end,
            });
        }
        pos = end;
        if old_range.end == end {
            i += 1;
        }
        if new_range.end == end {
            j += 1;
        }
    }
    changed
}
