//! # Source Text and Spans
//!
//! [`SourceText`] is an immutable rope-backed buffer with a precomputed
//! line-start table; [`SourceSpan`] addresses a region of one source by
//! absolute offset and by line/character.
//!
//! All offsets are **byte** offsets, and `character_index` is the byte
//! distance from the start of the line. Converting between absolute and
//! line/character addressing is exact in both directions.

pub mod lines;
pub mod slice;

use std::ops::Range;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use xi_rope::Rope;

pub use slice::{preview, slice_to_string};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("offset {offset} is outside a source of length {len}")]
    OffsetOutOfRange { offset: usize, len: usize },
    #[error("range {start}..{end} is outside a source of length {len}")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },
    #[error("line {line} is outside a source with {lines} lines")]
    LineOutOfRange { line: usize, lines: usize },
    #[error("character {character} is past the end of line {line} (length {length})")]
    CharacterOutOfRange {
        line: usize,
        character: usize,
        length: usize,
    },
    #[error("offset {offset} is inside a multi-byte character")]
    NotCharBoundary { offset: usize },
}

/// A zero-based line/character position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SourceLocation {
    pub line_index: usize,
    pub character_index: usize,
}

/// A region of a source document.
///
/// A span of length 0 is a valid zero-width marker, used for diagnostics
/// about something missing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SourceSpan {
    pub file_path: Option<String>,
    pub absolute_index: usize,
    pub line_index: usize,
    pub character_index: usize,
    pub length: usize,
}

impl SourceSpan {
    pub fn new(
        file_path: Option<String>,
        absolute_index: usize,
        line_index: usize,
        character_index: usize,
        length: usize,
    ) -> Self {
        Self {
            file_path,
            absolute_index,
            line_index,
            character_index,
            length,
        }
    }

    /// Exclusive end offset.
    #[must_use]
    pub fn end(&self) -> usize {
        self.absolute_index + self.length
    }

    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.absolute_index..self.end()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Whether `range` lies entirely inside this span.
    pub fn contains(&self, range: &Range<usize>) -> bool {
        self.absolute_index <= range.start && range.end <= self.end()
    }

    /// Whether `offset` is inside the span, counting both ends.
    pub fn touches(&self, offset: usize) -> bool {
        self.absolute_index <= offset && offset <= self.end()
    }
}

/// Immutable text buffer with line/column and absolute-offset addressing.
///
/// Cloning is cheap: the rope and the line table are shared.
#[derive(Debug, Clone)]
pub struct SourceText {
    path: Option<String>,
    rope: Rope,
    line_starts: Arc<[usize]>,
}

impl SourceText {
    pub fn new(text: &str) -> Self {
        Self::from_rope(None, Rope::from(text))
    }

    pub fn with_path(path: impl Into<String>, text: &str) -> Self {
        Self::from_rope(Some(path.into()), Rope::from(text))
    }

    pub fn from_rope(path: Option<String>, rope: Rope) -> Self {
        let line_starts = lines::line_starts(&rope).into();
        Self {
            path,
            rope,
            line_starts,
        }
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    pub fn len(&self) -> usize {
        self.rope.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn text(&self) -> String {
        slice_to_string(&self.rope, 0..self.len())
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Text of a byte range.
    pub fn slice(&self, range: Range<usize>) -> Result<String, SourceError> {
        self.check_range(&range)?;
        for offset in [range.start, range.end] {
            if !self.is_char_boundary(offset) {
                return Err(SourceError::NotCharBoundary { offset });
            }
        }
        Ok(slice_to_string(&self.rope, range))
    }

    /// Byte range of a line, without its line terminator (`\n` or `\r\n`).
    pub fn line_range(&self, line: usize) -> Result<Range<usize>, SourceError> {
        let range = self.raw_line_range(line)?;
        if range.end > range.start && self.rope.byte_at(range.end - 1) == b'\r' {
            return Ok(range.start..range.end - 1);
        }
        Ok(range)
    }

    /// Whether `offset` falls between characters. `len()` is a boundary.
    pub fn is_char_boundary(&self, offset: usize) -> bool {
        offset == self.len() || (offset < self.len() && self.rope.is_codepoint_boundary(offset))
    }

    /// Line range up to the `\n`, keeping a preceding `\r`.
    fn raw_line_range(&self, line: usize) -> Result<Range<usize>, SourceError> {
        let start = *self
            .line_starts
            .get(line)
            .ok_or(SourceError::LineOutOfRange {
                line,
                lines: self.line_count(),
            })?;
        let end = match self.line_starts.get(line + 1) {
            Some(&next) => next - 1,
            None => self.len(),
        };
        Ok(start..end)
    }

    /// Line/character of an absolute offset. `len()` itself is a valid
    /// position (end of the last line).
    pub fn location(&self, offset: usize) -> Result<SourceLocation, SourceError> {
        if offset > self.len() {
            return Err(SourceError::OffsetOutOfRange {
                offset,
                len: self.len(),
            });
        }
        let line_index = self.line_starts.partition_point(|&start| start <= offset) - 1;
        Ok(SourceLocation {
            line_index,
            character_index: offset - self.line_starts[line_index],
        })
    }

    /// Absolute offset of a line/character position.
    pub fn offset_of(&self, line: usize, character: usize) -> Result<usize, SourceError> {
        let range = self.raw_line_range(line)?;
        let length = range.end - range.start;
        if character > length {
            return Err(SourceError::CharacterOutOfRange {
                line,
                character,
                length,
            });
        }
        Ok(range.start + character)
    }

    /// Span for a byte range of this source.
    pub fn span(&self, range: Range<usize>) -> Result<SourceSpan, SourceError> {
        self.check_range(&range)?;
        let start = self.location(range.start)?;
        Ok(SourceSpan::new(
            self.path.clone(),
            range.start,
            start.line_index,
            start.character_index,
            range.end - range.start,
        ))
    }

    /// Span for a byte range, clamped into `[0, len]`.
    pub fn clamped_span(&self, range: Range<usize>) -> SourceSpan {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        let location = self.location(start).unwrap_or(SourceLocation {
            line_index: 0,
            character_index: start,
        });
        SourceSpan::new(
            self.path.clone(),
            start,
            location.line_index,
            location.character_index,
            end - start,
        )
    }

    fn check_range(&self, range: &Range<usize>) -> Result<(), SourceError> {
        if range.start > range.end || range.end > self.len() {
            return Err(SourceError::RangeOutOfBounds {
                start: range.start,
                end: range.end,
                len: self.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn location_and_offset_are_inverse() {
        let source = SourceText::new("ab\r\ncd\n\nxyz");
        for offset in 0..=source.len() {
            let location = source.location(offset).unwrap();
            assert_eq!(
                source
                    .offset_of(location.line_index, location.character_index)
                    .unwrap(),
                offset,
                "offset {offset} -> {location:?}"
            );
        }
    }

    #[test]
    fn location_at_line_starts() {
        let source = SourceText::new("ab\ncd\n");
        assert_eq!(
            source.location(3).unwrap(),
            SourceLocation {
                line_index: 1,
                character_index: 0
            }
        );
        assert_eq!(source.line_count(), 3);
        assert_eq!(source.location(6).unwrap().line_index, 2);
    }

    #[test]
    fn out_of_range_offsets_fail() {
        let source = SourceText::new("ab");
        assert_eq!(
            source.location(3),
            Err(SourceError::OffsetOutOfRange { offset: 3, len: 2 })
        );
        assert!(source.span(1..3).is_err());
        assert!(source.offset_of(0, 3).is_err());
        assert!(source.offset_of(1, 0).is_err());
    }

    #[test]
    fn span_carries_path_and_location() {
        let source = SourceText::with_path("Views/Index.qtml", "<p>\n  @x\n");
        let span = source.span(7..8).unwrap();
        assert_eq!(
            span,
            SourceSpan::new(Some("Views/Index.qtml".to_string()), 7, 1, 3, 1)
        );
        assert_eq!(source.slice(span.range()).unwrap(), "x");
    }

    #[test]
    fn zero_width_span_is_valid() {
        let source = SourceText::new("abc");
        let span = source.span(3..3).unwrap();
        assert!(span.is_empty());
        assert!(span.touches(3));
        assert!(span.contains(&(3..3)));
    }

    #[test]
    fn clamped_span_stays_in_bounds() {
        let source = SourceText::new("ab\ncd");
        assert_eq!(source.clamped_span(4..9), SourceSpan::new(None, 4, 1, 1, 1));
        assert_eq!(source.clamped_span(7..9), SourceSpan::new(None, 5, 1, 2, 0));
    }

    #[test]
    fn line_range_excludes_terminator() {
        let source = SourceText::new("ab\ncd");
        assert_eq!(source.line_range(0).unwrap(), 0..2);
        assert_eq!(source.line_range(1).unwrap(), 3..5);
    }

    #[test]
    fn line_range_excludes_crlf() {
        let source = SourceText::new("ab\r\ncd\r\n");
        assert_eq!(source.line_range(0).unwrap(), 0..2);
        assert_eq!(source.line_range(1).unwrap(), 4..6);
        assert_eq!(source.line_range(2).unwrap(), 8..8);
        // the \r is still addressable as a character of its line
        assert_eq!(source.offset_of(0, 2).unwrap(), 2);
    }

    #[test]
    fn slice_inside_a_character_is_an_error() {
        let source = SourceText::new("aé b");
        assert_eq!(
            source.slice(0..2),
            Err(SourceError::NotCharBoundary { offset: 2 })
        );
        assert_eq!(
            source.slice(2..4),
            Err(SourceError::NotCharBoundary { offset: 2 })
        );
        assert_eq!(source.slice(0..3).unwrap(), "aé");
        assert_eq!(source.slice(5..5).unwrap(), "");
    }
}
