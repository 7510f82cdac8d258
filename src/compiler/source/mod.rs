//! This module abstracts out the source code from which the compiler derives
//! it's input data.  Every IR value that can be traced back to program text
//! carries a [`Span`] of byte offsets into that text; the [`LineMap`] converts
//! offsets into the human readable line and column used in diagnostics.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A byte offset into a single compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Offset(u32);

impl Offset {
    pub fn new(o: u32) -> Offset {
        Offset(o)
    }

    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl Display for Offset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}", self.0))
    }
}

/// Half open range `[low, high)` of source code covered by a token, a parse
/// node, or an IR value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    low: Offset,
    high: Offset,
}

impl Span {
    pub fn new(low: Offset, high: Offset) -> Span {
        Span { low, high }
    }

    pub fn from_range(low: usize, high: usize) -> Span {
        Span::new(Offset(low as u32), Offset(high as u32))
    }

    pub fn zero() -> Span {
        Span::new(Offset(0), Offset(0))
    }

    pub fn low(&self) -> Offset {
        self.low
    }

    pub fn high(&self) -> Offset {
        self.high
    }

    pub fn len(&self) -> usize {
        (self.high.0 - self.low.0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.low == self.high
    }

    /// Returns the smallest span which covers both `a` and `b`.
    pub fn cover(a: Span, b: Span) -> Span {
        Span::new(a.low.min(b.low), a.high.max(b.high))
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("[{},{}]", self.low, self.high))
    }
}

/// A 1-based line and column in a compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("Ln {}, Col {}", self.line, self.column))
    }
}

/// Index of the start offset of every line in a compilation unit.
///
/// Columns count characters, not bytes, so that multi-byte UTF-8 text lines up
/// with what the user sees in an editor.
#[derive(Debug, Clone)]
pub struct LineMap<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineMap<'a> {
    pub fn new(text: &'a str) -> LineMap<'a> {
        let mut line_starts = vec![0];
        for (idx, c) in text.char_indices() {
            if c == '\n' {
                line_starts.push(idx + 1);
            }
        }

        LineMap { text, line_starts }
    }

    /// Converts a byte offset into a line and column.  Offsets past the end of
    /// the text are clamped to the end of the text.
    pub fn position(&self, offset: Offset) -> Position {
        let offset = offset.as_usize().min(self.text.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };

        let line_start = self.line_starts[line];
        let column = self
            .text
            .get(line_start..offset)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(offset - line_start)
            + 1;

        Position {
            line: line as u32 + 1,
            column: column as u32,
        }
    }

    /// Returns the source text covered by `span`, or `None` if the span does
    /// not fall on character boundaries within this unit.
    pub fn text_in_span(&self, span: Span) -> Option<&'a str> {
        self.text.get(span.low().as_usize()..span.high().as_usize())
    }

    /// Returns the full text of the line containing `offset` without its line
    /// terminator.
    pub fn line_text(&self, offset: Offset) -> &'a str {
        let line = self.position(offset).line as usize - 1;
        let start = self.line_starts[line];
        let end = self
            .line_starts
            .get(line + 1)
            .map(|next| next - 1)
            .unwrap_or_else(|| self.text.len());
        self.text[start..end].trim_end_matches('\r')
    }
}
