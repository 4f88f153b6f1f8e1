//! Offset ↔ line/column conversion.

use crate::ByteOffset;
use text_size::TextSize;

/// A resolved source position.
///
/// `line` is 0-indexed; diagnostics add one when rendering. `col` is the
/// byte column within the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineCol {
    /// 0-indexed line number.
    pub line: u32,
    /// 0-indexed byte column.
    pub col: u32,
}

impl LineCol {
    /// Creates a new line/column position.
    #[inline]
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

/// Precomputed line starts for O(log n) offset → line/column lookups.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// `line_starts[i]` is the byte offset where line `i` begins.
    line_starts: Vec<ByteOffset>,
}

impl LineIndex {
    /// Builds a line index for the given source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];
        for (offset, c) in text.char_indices() {
            if c == '\n' {
                line_starts.push(TextSize::from((offset + 1) as u32));
            }
        }
        Self { line_starts }
    }

    /// Resolves a byte offset to a line/column position.
    ///
    /// Offsets past the last line start are clamped onto the final line.
    pub fn line_col(&self, offset: ByteOffset) -> LineCol {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };
        let line_start = self.line_starts[line];
        LineCol {
            line: line as u32,
            col: u32::from(offset) - u32::from(line_start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line() {
        let index = LineIndex::new("hello world");
        assert_eq!(index.line_col(TextSize::from(6)), LineCol::new(0, 6));
    }

    #[test]
    fn test_multiple_lines() {
        let index = LineIndex::new("---\nlet x = 1;\n---\n<p/>");
        assert_eq!(index.line_col(TextSize::from(0)), LineCol::new(0, 0));
        assert_eq!(index.line_col(TextSize::from(4)), LineCol::new(1, 0));
        assert_eq!(index.line_col(TextSize::from(9)), LineCol::new(1, 5));
        assert_eq!(index.line_col(TextSize::from(19)), LineCol::new(3, 0));
    }

    #[test]
    fn test_offset_past_end_clamps() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.line_col(TextSize::from(40)), LineCol::new(1, 37));
    }
}
