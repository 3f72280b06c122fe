//! Source location tracking.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Source position: line and column, both 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Pos {
    pub line: u32,
    pub col: u32,
}

impl Pos {
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

/// Source span: file plus start/end positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourceSpan {
    pub file: String,
    pub start: Pos,
    pub end: Pos,
}

impl SourceSpan {
    pub fn new(file: impl Into<String>, start: Pos, end: Pos) -> Self {
        Self {
            file: file.into(),
            start,
            end,
        }
    }

    /// Zero-width span at a single position.
    pub fn point(file: impl Into<String>, pos: Pos) -> Self {
        Self {
            file: file.into(),
            start: pos,
            end: pos,
        }
    }

    /// A span with no location information (synthetic nodes).
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_unknown(&self) -> bool {
        self.file.is_empty() && self.start == Pos::default()
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            write!(f, "<unknown>")
        } else if self.start == self.end {
            write!(f, "{}:{}:{}", self.file, self.start.line, self.start.col)
        } else {
            write!(
                f,
                "{}:{}:{}-{}:{}",
                self.file, self.start.line, self.start.col, self.end.line, self.end.col
            )
        }
    }
}
