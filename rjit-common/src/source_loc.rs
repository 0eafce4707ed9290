//! Source location tracking for error reporting
//!
//! Every typed AST node carries the location it was parsed from. The IR
//! builder keeps a stack of these as its diagnostic context, and each
//! instruction it creates is stamped with the innermost one.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A location in a source file (line and column are 1-based)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub filename: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    /// Create a location with filename
    pub fn new(filename: &str, line: u32, column: u32) -> Self {
        Self {
            filename: filename.to_string(),
            line,
            column,
        }
    }

    /// Create a dummy location for nodes synthesized by the compiler
    pub fn dummy() -> Self {
        Self::new("<unknown>", 0, 0)
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::dummy()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}
