//! Span - source location tracking for DST nodes and analytics records.
//!
//! A `Span` is a byte range `[start, end)` into a single file's source
//! text. Spans are small (8 bytes) and cheap to copy; nodes and analytics
//! entries carry them by value.

use serde::{Deserialize, Serialize};

/// A half-open byte range `[start, end)` in one file's source text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    #[inline]
    pub const fn at(pos: u32) -> Self {
        Span { start: pos, end: pos }
    }

    /// Span for a synthesized node with no source position.
    #[inline]
    pub const fn synthetic() -> Self {
        Span { start: u32::MAX, end: u32::MAX }
    }

    #[inline]
    pub const fn is_synthetic(&self) -> bool {
        self.start == u32::MAX && self.end == u32::MAX
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A `(line, column)` pair, both zero-based, for human-facing locations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineColumn {
    pub line: u32,
    pub column: u32,
}

impl LineColumn {
    pub const fn new(line: u32, column: u32) -> Self {
        LineColumn { line, column }
    }
}

/// A location fully identifying a span for analytics reporting: which
/// package, which file, and the start/end line+column within it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub package: String,
    pub file: String,
    pub start: LineColumn,
    pub end: LineColumn,
}

impl Location {
    pub fn new(package: impl Into<String>, file: impl Into<String>, start: LineColumn, end: LineColumn) -> Self {
        Location {
            package: package.into(),
            file: file.into(),
            start,
            end,
        }
    }
}

/// Maps byte offsets to `(line, column)` pairs for one file's source text.
///
/// Line starts are computed once and binary-searched; this mirrors the
/// teacher's `LineMap` but only needs to answer "what line+column is this
/// offset", not round-trip back to offsets.
#[derive(Clone, Debug)]
pub struct LineMap {
    line_starts: Vec<u32>,
}

impl LineMap {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        LineMap { line_starts }
    }

    pub fn line_column(&self, offset: u32) -> LineColumn {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert_at) => insert_at.saturating_sub(1),
        };
        let line_start = self.line_starts[line];
        LineColumn::new(line as u32, offset.saturating_sub(line_start))
    }
}
