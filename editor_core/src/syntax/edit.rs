//! Edit translation.
//!
//! Turns a raw `(range, replacement)` edit into the positions tree-sitter
//! needs. Must run against the buffer *before* the edit is applied.

use crate::buffer::{Point, TextBuffer, TextPosition};
use crate::error::Result;
use std::ops::Range;

/// A text edit expressed in both byte offsets and points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDescriptor {
    pub start: TextPosition,
    pub old_end: TextPosition,
    pub new_end: TextPosition,
    pub replacement: String,
}

impl EditDescriptor {
    /// The replaced range, in pre-edit offsets.
    pub fn old_range(&self) -> Range<usize> {
        self.start.offset..self.old_end.offset
    }

    /// The inserted range, in post-edit offsets.
    pub fn new_range(&self) -> Range<usize> {
        self.start.offset..self.new_end.offset
    }

    /// Length change of the document.
    pub fn delta(&self) -> isize {
        self.new_end.offset as isize - self.old_end.offset as isize
    }

    /// Converts this edit to a tree-sitter `InputEdit`.
    pub fn to_input_edit(&self) -> tree_sitter::InputEdit {
        tree_sitter::InputEdit {
            start_byte: self.start.offset,
            old_end_byte: self.old_end.offset,
            new_end_byte: self.new_end.offset,
            start_position: self.start.point.into(),
            old_end_position: self.old_end.point.into(),
            new_end_position: self.new_end.point.into(),
        }
    }

    /// Maps a pre-edit offset to its post-edit position.
    ///
    /// Offsets inside the replaced range collapse onto the end of the
    /// inserted text.
    pub fn map_offset(&self, offset: usize) -> usize {
        if offset <= self.start.offset {
            offset
        } else if offset < self.old_end.offset {
            self.new_end.offset
        } else {
            (offset as isize + self.delta()) as usize
        }
    }

    /// Maps a pre-edit range to post-edit offsets.
    pub fn map_range(&self, range: &Range<usize>) -> Range<usize> {
        let start = if range.start < self.old_end.offset {
            range.start.min(self.start.offset)
        } else {
            self.map_offset(range.start)
        };
        start..self.map_offset(range.end).max(start)
    }
}

/// Builds the descriptor for replacing `range` with `replacement`.
///
/// `buffer` must still hold the pre-edit text.
pub fn translate(
    range: Range<usize>,
    replacement: &str,
    buffer: &TextBuffer,
) -> Result<EditDescriptor> {
    buffer.check_range(&range)?;
    let start = buffer.position_at(range.start)?;
    let old_end = buffer.position_at(range.end)?;

    let new_end = TextPosition {
        offset: range.start + replacement.len(),
        point: advance(start.point, replacement),
    };

    Ok(EditDescriptor {
        start,
        old_end,
        new_end,
        replacement: replacement.to_string(),
    })
}

/// The point reached after writing `text` at `from`.
fn advance(from: Point, text: &str) -> Point {
    match text.rfind('\n') {
        Some(last) => Point::new(
            from.row + text.bytes().filter(|&b| b == b'\n').count(),
            text.len() - last - 1,
        ),
        None => Point::new(from.row, from.column + text.len()),
    }
}
