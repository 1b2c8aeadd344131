//! Text buffer implementation using ropey.
//!
//! All offsets are byte offsets. Rows are separated by `\n` only, which is
//! what tree-sitter counts, so points computed here can be handed to the
//! parser unchanged.

use crate::error::{HighlightError, Result};
use ropey::Rope;
use std::fmt;
use std::ops::Range;

/// A (row, column) position. Both are 0-indexed; the column counts bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl From<Point> for tree_sitter::Point {
    fn from(point: Point) -> Self {
        tree_sitter::Point {
            row: point.row,
            column: point.column,
        }
    }
}

/// A point paired with the absolute byte offset it denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextPosition {
    pub offset: usize,
    pub point: Point,
}

/// A text buffer backed by a rope data structure.
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    rope: Rope,
}

impl TextBuffer {
    /// Creates a new empty text buffer.
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Creates a text buffer from a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Returns the underlying rope. Cloning it is cheap.
    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    /// Returns the total number of bytes in the buffer.
    pub fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    /// Returns the total number of lines in the buffer.
    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.rope.len_bytes() == 0
    }

    /// Returns true if `offset` is inside the buffer and on a char boundary.
    pub fn is_valid_offset(&self, offset: usize) -> bool {
        offset <= self.len_bytes()
            && self.rope.char_to_byte(self.rope.byte_to_char(offset)) == offset
    }

    /// Rejects ranges that are reversed, out of bounds, or split a character.
    pub fn check_range(&self, range: &Range<usize>) -> Result<()> {
        if range.start > range.end
            || !self.is_valid_offset(range.start)
            || !self.is_valid_offset(range.end)
        {
            return Err(HighlightError::InvalidRange {
                start: range.start,
                end: range.end,
                len: self.len_bytes(),
            });
        }
        Ok(())
    }

    /// Returns the text in a byte range.
    pub fn substring(&self, range: Range<usize>) -> Result<String> {
        self.check_range(&range)?;
        Ok(self.rope.byte_slice(range).to_string())
    }

    /// Returns the row containing `offset` and the byte range of that row,
    /// including its trailing newline if it has one.
    pub fn line_for_offset(&self, offset: usize) -> Result<(usize, Range<usize>)> {
        self.check_range(&(offset..offset))?;
        let row = self.rope.byte_to_line(offset);
        Ok((row, self.line_range(row)))
    }

    /// Byte range of a row, including its trailing newline.
    /// Rows past the end map to an empty range at the end of the buffer.
    pub fn line_range(&self, row: usize) -> Range<usize> {
        if row >= self.len_lines() {
            return self.len_bytes()..self.len_bytes();
        }
        let start = self.rope.line_to_byte(row);
        let end = self.rope.line_to_byte(row + 1);
        start..end
    }

    /// Byte range of a row without its trailing newline.
    pub(crate) fn line_content_range(&self, row: usize) -> Range<usize> {
        let line = self.line_range(row);
        if line.end > line.start && self.rope.byte(line.end - 1) == b'\n' {
            line.start..line.end - 1
        } else {
            line
        }
    }

    /// Converts a byte offset to a point.
    pub fn point_for_offset(&self, offset: usize) -> Result<Point> {
        let (row, line) = self.line_for_offset(offset)?;
        Ok(Point::new(row, offset - line.start))
    }

    /// Converts a point to a byte offset.
    pub fn offset_for_point(&self, point: Point) -> Result<usize> {
        let line = self.line_content_range(point.row);
        let invalid = |offset: usize| HighlightError::InvalidRange {
            start: offset,
            end: offset,
            len: self.len_bytes(),
        };
        let offset = line
            .start
            .checked_add(point.column)
            .ok_or_else(|| invalid(usize::MAX))?;
        if point.row >= self.len_lines() || offset > line.end || !self.is_valid_offset(offset) {
            return Err(invalid(offset));
        }
        Ok(offset)
    }

    /// Returns the offset and point of a byte offset.
    pub fn position_at(&self, offset: usize) -> Result<TextPosition> {
        Ok(TextPosition {
            offset,
            point: self.point_for_offset(offset)?,
        })
    }

    /// Replaces the bytes in `range` with `text`.
    pub fn replace(&mut self, range: Range<usize>, text: &str) -> Result<()> {
        self.check_range(&range)?;
        let start = self.rope.byte_to_char(range.start);
        let end = self.rope.byte_to_char(range.end);
        if start < end {
            self.rope.remove(start..end);
        }
        if !text.is_empty() {
            self.rope.insert(start, text);
        }
        Ok(())
    }
}

impl fmt::Display for TextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in self.rope.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}
