//! Cursor positions reported by the host.
//!
//! The core never moves cursors. It only reads them to decide which deferred
//! highlighting work to do first.

use crate::buffer::{Point, TextBuffer};
use std::ops::Range;

/// Represents a cursor position in the buffer as (line, column).
/// Both are 0-indexed; the column counts bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CursorPosition {
    pub line: usize,
    pub column: usize,
}

impl CursorPosition {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Byte offset of this cursor, clamped to the end of its line and
    /// rows past the end of the buffer clamped to the buffer end.
    pub fn to_offset(self, buffer: &TextBuffer) -> usize {
        let line = buffer.line_content_range(self.line);
        let mut offset = line.start.saturating_add(self.column).min(line.end);
        while offset > line.start && !buffer.is_valid_offset(offset) {
            offset -= 1;
        }
        offset
    }
}

impl From<Point> for CursorPosition {
    fn from(point: Point) -> Self {
        Self::new(point.row, point.column)
    }
}

/// The set of cursors a host currently shows, primary first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursors {
    positions: Vec<CursorPosition>,
}

impl Cursors {
    pub fn new(positions: Vec<CursorPosition>) -> Self {
        Self { positions }
    }

    /// Replaces all positions.
    pub fn set(&mut self, positions: Vec<CursorPosition>) {
        self.positions = positions;
    }

    pub fn positions(&self) -> &[CursorPosition] {
        &self.positions
    }

    /// Line distance from the closest cursor to `range`. Zero when a cursor
    /// sits inside it, `usize::MAX` when there are no cursors. Cursors past
    /// the end of the buffer count as being on its last line.
    pub fn distance_to(&self, buffer: &TextBuffer, range: &Range<usize>) -> usize {
        let len = buffer.len_bytes();
        let first = buffer.rope().byte_to_line(range.start.min(len));
        let last = buffer
            .rope()
            .byte_to_line(range.end.saturating_sub(1).max(range.start).min(len));
        self.positions
            .iter()
            .map(|cursor| {
                let row = buffer.rope().byte_to_line(cursor.to_offset(buffer));
                if row < first {
                    first - row
                } else if row > last {
                    row - last
                } else {
                    0
                }
            })
            .min()
            .unwrap_or(usize::MAX)
    }

    /// Sorts ranges so the one nearest a cursor comes first.
    pub fn order_by_proximity(&self, buffer: &TextBuffer, ranges: &mut [Range<usize>]) {
        ranges.sort_by_key(|range| (self.distance_to(buffer, range), range.start));
    }
}
