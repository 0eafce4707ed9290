//! Lowering error types

use rjit_common::{CompilerError, SourceLocation};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LowerError {
    #[error("Undefined function '{name}' at {location}")]
    UndefinedFunction {
        name: String,
        location: SourceLocation,
    },

    #[error("Redefinition of function '{name}' at {location}")]
    FunctionRedefined {
        name: String,
        location: SourceLocation,
    },

    #[error("Undefined variable '{name}' at {location}")]
    UndefinedVariable {
        name: String,
        location: SourceLocation,
    },

    #[error("Invalid assignment target at {location}")]
    InvalidAssignTarget { location: SourceLocation },

    #[error("Initializer of global '{name}' is not a constant at {location}")]
    NonConstantInitializer {
        name: String,
        location: SourceLocation,
    },

    #[error("Condition of type {found} is not an integer at {location}")]
    NonIntegerCondition { found: String, location: SourceLocation },

    #[error("Operand of type {found} is not an integer at {location}")]
    NonIntegerOperand { found: String, location: SourceLocation },

    #[error("'break' outside of a loop at {location}")]
    BreakOutsideLoop { location: SourceLocation },

    #[error("'continue' outside of a loop at {location}")]
    ContinueOutsideLoop { location: SourceLocation },

    #[error("Lowering failed: {summary}")]
    Failed { count: usize, summary: String },
}

impl LowerError {
    /// Short message without the location, as recorded in diagnostics
    pub fn message(&self) -> &'static str {
        match self {
            LowerError::UndefinedFunction { .. } => "undefined function",
            LowerError::FunctionRedefined { .. } => "function redefined",
            LowerError::UndefinedVariable { .. } => "undefined variable",
            LowerError::InvalidAssignTarget { .. } => "invalid assignment target",
            LowerError::NonConstantInitializer { .. } => "global initializer is not a constant",
            LowerError::NonIntegerCondition { .. } => "condition is not an integer",
            LowerError::NonIntegerOperand { .. } => "operand is not an integer",
            LowerError::BreakOutsideLoop { .. } => "'break' outside of a loop",
            LowerError::ContinueOutsideLoop { .. } => "'continue' outside of a loop",
            LowerError::Failed { .. } => "lowering failed",
        }
    }

    /// The offending identifier, if any
    pub fn identifier(&self) -> Option<&str> {
        match self {
            LowerError::UndefinedFunction { name, .. }
            | LowerError::FunctionRedefined { name, .. }
            | LowerError::UndefinedVariable { name, .. }
            | LowerError::NonConstantInitializer { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            LowerError::UndefinedFunction { location, .. }
            | LowerError::FunctionRedefined { location, .. }
            | LowerError::UndefinedVariable { location, .. }
            | LowerError::InvalidAssignTarget { location }
            | LowerError::NonConstantInitializer { location, .. }
            | LowerError::NonIntegerCondition { location, .. }
            | LowerError::NonIntegerOperand { location, .. }
            | LowerError::BreakOutsideLoop { location }
            | LowerError::ContinueOutsideLoop { location } => Some(location),
            LowerError::Failed { .. } => None,
        }
    }
}

impl From<LowerError> for CompilerError {
    fn from(err: LowerError) -> Self {
        match err {
            LowerError::Failed { summary, .. } => CompilerError::LoweringFailed { summary },
            other => {
                let location = other.location().cloned().unwrap_or_default();
                let message = match other.identifier() {
                    Some(name) => format!("{} '{}'", other.message(), name),
                    None => other.message().to_string(),
                };
                CompilerError::Lowering { location, message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_compiler_error() {
        let err = LowerError::UndefinedFunction {
            name: "g".to_string(),
            location: SourceLocation::new("a.rj", 1, 2),
        };
        assert_eq!(err.identifier(), Some("g"));

        let compiler: CompilerError = err.into();
        assert_eq!(
            compiler.to_string(),
            "Lowering error at a.rj:1:2: undefined function 'g'"
        );

        let failed: CompilerError = LowerError::Failed {
            count: 2,
            summary: "2 errors".to_string(),
        }
        .into();
        assert_eq!(failed.to_string(), "Lowering failed: 2 errors");
    }

    #[test]
    fn test_non_integer_condition() {
        let err = LowerError::NonIntegerCondition {
            found: "str".to_string(),
            location: SourceLocation::new("a.rj", 3, 7),
        };
        assert_eq!(err.to_string(), "Condition of type str is not an integer at a.rj:3:7");
        assert_eq!(err.message(), "condition is not an integer");
        assert_eq!(err.identifier(), None);
    }
}
