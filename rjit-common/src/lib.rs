//! RJIT compiler - common types and utilities
//!
//! Shared by every stage of the compiler: the resolved type model that the
//! typed AST hands to the IR layer, source locations used as diagnostic
//! context, the scoped symbol table and the error/diagnostic types.

pub mod error;
pub mod scope;
pub mod source_loc;
pub mod types;

pub use error::{CompilerError, Diagnostic, ErrorReporter, Severity};
pub use scope::ScopedTable;
pub use source_loc::SourceLocation;
pub use types::Type;
