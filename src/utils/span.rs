//! Source location tracking

use std::fmt;

use serde::{Deserialize, Serialize};

/// A position in the source code, as reported by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    /// 1-based line
    pub line: u32,
    /// 1-based column
    pub column: u32,
}

impl Span {
    /// Create a new span
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Create a dummy span (builtins, tests)
    pub fn dummy() -> Self {
        Self { line: 0, column: 0 }
    }

    /// Whether this span points at real source
    pub fn is_dummy(&self) -> bool {
        self.line == 0 && self.column == 0
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::dummy()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
