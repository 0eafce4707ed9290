//! Pass pipeline error types

use rjit_common::CompilerError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PassError {
    #[error("Pass '{pass}' requires '{prerequisite}', which is not registered")]
    MissingPrerequisite {
        pass: String,
        prerequisite: String,
    },

    #[error("Dependency cycle through pass '{pass}'")]
    DependencyCycle { pass: String },

    #[error("Unknown pass '{name}'")]
    UnknownPass { name: String },

    #[error("No module set on the pass manager")]
    NoModule,
}

impl From<PassError> for CompilerError {
    fn from(err: PassError) -> Self {
        CompilerError::pass_error(err.to_string())
    }
}
