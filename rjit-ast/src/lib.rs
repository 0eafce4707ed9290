//! Typed abstract syntax tree
//!
//! The AST handed to the IR layer after semantic analysis. Every expression
//! carries its resolved type and every node carries the source location it was
//! parsed from. All nodes derive serde so a typed AST can travel as JSON.

pub mod expressions;
pub mod ops;
pub mod statements;

pub use expressions::{Expression, ExpressionKind};
pub use ops::{BinaryOp, UnaryOp};
pub use statements::{
    Declaration, FunctionDefinition, Parameter, Statement, StatementKind, TopLevelItem,
    TranslationUnit,
};
