//! Error handling for the RJIT middle end
//!
//! This module defines the common error type every crate converts into, and
//! the diagnostic collector the IR builder records source-level errors in.

use crate::source_loc::SourceLocation;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main compiler error type that encompasses every phase of the middle end
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerError {
    #[error("Lowering error at {location}: {message}")]
    Lowering {
        location: SourceLocation,
        message: String,
    },

    #[error("Lowering failed: {summary}")]
    LoweringFailed { summary: String },

    #[error("Pass error: {message}")]
    Pass { message: String },
}

impl CompilerError {
    /// Create a pass pipeline error
    pub fn pass_error(message: String) -> Self {
        CompilerError::Pass { message }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with location, severity and the offending identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub location: SourceLocation,
    pub identifier: Option<String>,
}

impl Diagnostic {
    fn with_severity(severity: Severity, message: String, location: SourceLocation) -> Self {
        Self {
            severity,
            message,
            location,
            identifier: None,
        }
    }

    pub fn error(message: String, location: SourceLocation) -> Self {
        Self::with_severity(Severity::Error, message, location)
    }

    pub fn warning(message: String, location: SourceLocation) -> Self {
        Self::with_severity(Severity::Warning, message, location)
    }

    pub fn with_identifier(mut self, identifier: &str) -> Self {
        self.identifier = Some(identifier.to_string());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.location, self.severity, self.message)?;

        if let Some(identifier) = &self.identifier {
            write!(f, " '{}'", identifier)?;
        }
        Ok(())
    }
}

/// Error reporter for collecting and displaying diagnostics
#[derive(Debug, Clone, Default)]
pub struct ErrorReporter {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and update the counters
    pub fn report(&mut self, diagnostic: Diagnostic) -> &mut Diagnostic {
        match diagnostic.severity {
            Severity::Error => self.error_count += 1,
            Severity::Warning => self.warning_count += 1,
        }
        self.diagnostics.push(diagnostic);
        let last = self.diagnostics.len() - 1;
        &mut self.diagnostics[last]
    }

    /// Report a warning diagnostic
    pub fn warning(&mut self, message: String, location: SourceLocation) -> &mut Diagnostic {
        self.report(Diagnostic::warning(message, location))
    }

    /// Check if any errors have been reported
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Print all diagnostics to stderr
    pub fn print_diagnostics(&self) {
        for diagnostic in &self.diagnostics {
            eprintln!("{}", diagnostic);
        }
    }

    /// Create a summary string
    pub fn summary(&self) -> String {
        fn plural(n: usize, word: &str) -> String {
            format!("{} {}{}", n, word, if n == 1 { "" } else { "s" })
        }

        match (self.error_count, self.warning_count) {
            (0, 0) => "No errors or warnings".to_string(),
            (0, w) => plural(w, "warning"),
            (e, 0) => plural(e, "error"),
            (e, w) => format!("{} and {}", plural(e, "error"), plural(w, "warning")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_creation() {
        let loc = SourceLocation::new("test.rj", 1, 1);
        let diag = Diagnostic::error("undefined function".to_string(), loc.clone())
            .with_identifier("foo");

        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.location, loc);
        assert_eq!(diag.identifier.as_deref(), Some("foo"));
        assert_eq!(diag.to_string(), "test.rj:1:1: error: undefined function 'foo'");
    }

    #[test]
    fn test_error_reporter() {
        let mut reporter = ErrorReporter::new();
        assert!(!reporter.has_errors());

        let location = SourceLocation::new("a.rj", 2, 1);
        let redefined = Diagnostic::error("redefinition".to_string(), location);
        reporter.report(redefined.with_identifier("main"));
        reporter.warning("unreachable code".to_string(), SourceLocation::new("a.rj", 5, 3));

        assert!(reporter.has_errors());
        assert_eq!(reporter.error_count(), 1);
        assert_eq!(reporter.warning_count(), 1);
        assert_eq!(reporter.diagnostics().len(), 2);
        assert_eq!(
            reporter.diagnostics()[0].identifier.as_deref(),
            Some("main")
        );
        assert_eq!(
            reporter.diagnostics()[1].to_string(),
            "a.rj:5:3: warning: unreachable code"
        );
    }

    #[test]
    fn test_summary() {
        let mut reporter = ErrorReporter::new();
        assert_eq!(reporter.summary(), "No errors or warnings");

        let loc = SourceLocation::dummy();
        reporter.warning("Warning 1".to_string(), loc.clone());
        assert_eq!(reporter.summary(), "1 warning");
        assert!(!reporter.has_errors());

        reporter.report(Diagnostic::error("Error 1".to_string(), loc.clone()));
        assert_eq!(reporter.summary(), "1 error and 1 warning");

        reporter.report(Diagnostic::error("Error 2".to_string(), loc));
        assert_eq!(reporter.summary(), "2 errors and 1 warning");
    }

    #[test]
    fn test_error_display() {
        let err = CompilerError::Lowering {
            location: SourceLocation::new("a.rj", 3, 5),
            message: "break outside loop".to_string(),
        };
        assert_eq!(err.to_string(), "Lowering error at a.rj:3:5: break outside loop");

        let err = CompilerError::pass_error("cycle".to_string());
        assert_eq!(err.to_string(), "Pass error: cycle");
    }
}
