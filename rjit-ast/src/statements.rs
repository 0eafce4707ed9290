//! Statement AST nodes
//!
//! This module defines statement nodes, declarations and function definitions.

use super::expressions::Expression;
use rjit_common::{SourceLocation, Type};
use serde::{Deserialize, Serialize};

/// AST Statement nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub kind: StatementKind,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatementKind {
    /// Expression statement
    Expression(Expression),

    /// Compound statement (block)
    Compound(Vec<Statement>),

    /// Variable declaration
    Declaration { declarations: Vec<Declaration> },

    /// If statement
    If {
        condition: Expression,
        then_stmt: Box<Statement>,
        else_stmt: Option<Box<Statement>>,
    },

    /// While loop
    While {
        condition: Expression,
        body: Box<Statement>,
    },

    Break,

    Continue,

    /// Return statement
    Return(Option<Expression>),

    /// Empty statement (just semicolon)
    Empty,
}

impl Statement {
    pub fn new(kind: StatementKind, location: SourceLocation) -> Self {
        Self { kind, location }
    }

    fn synthesized(kind: StatementKind) -> Self {
        Self::new(kind, SourceLocation::dummy())
    }

    pub fn expr(expr: Expression) -> Self {
        Self::synthesized(StatementKind::Expression(expr))
    }

    pub fn compound(statements: Vec<Statement>) -> Self {
        Self::synthesized(StatementKind::Compound(statements))
    }

    pub fn declare(declarations: Vec<Declaration>) -> Self {
        Self::synthesized(StatementKind::Declaration { declarations })
    }

    /// Single variable declaration
    pub fn var(name: &str, decl_type: Type, initializer: Option<Expression>) -> Self {
        Self::declare(vec![Declaration::new(name, decl_type, initializer)])
    }

    pub fn if_else(
        condition: Expression,
        then_stmt: Statement,
        else_stmt: Option<Statement>,
    ) -> Self {
        Self::synthesized(StatementKind::If {
            condition,
            then_stmt: Box::new(then_stmt),
            else_stmt: else_stmt.map(Box::new),
        })
    }

    pub fn while_loop(condition: Expression, body: Statement) -> Self {
        Self::synthesized(StatementKind::While {
            condition,
            body: Box::new(body),
        })
    }

    pub fn ret(value: Option<Expression>) -> Self {
        Self::synthesized(StatementKind::Return(value))
    }

    pub fn brk() -> Self {
        Self::synthesized(StatementKind::Break)
    }

    pub fn cont() -> Self {
        Self::synthesized(StatementKind::Continue)
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }
}

/// Variable declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    pub decl_type: Type,
    pub initializer: Option<Expression>,
    pub location: SourceLocation,
}

impl Declaration {
    pub fn new(name: &str, decl_type: Type, initializer: Option<Expression>) -> Self {
        Self {
            name: name.to_string(),
            decl_type,
            initializer,
            location: SourceLocation::dummy(),
        }
    }
}

/// Function parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub param_type: Type,
    pub location: SourceLocation,
}

impl Parameter {
    pub fn new(name: &str, param_type: Type) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            location: SourceLocation::dummy(),
        }
    }
}

/// Function definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub return_type: Type,
    pub parameters: Vec<Parameter>,
    pub body: Statement,
    pub location: SourceLocation,
}

impl FunctionDefinition {
    pub fn new(name: &str, parameters: Vec<Parameter>, return_type: Type, body: Statement) -> Self {
        Self {
            name: name.to_string(),
            return_type,
            parameters,
            body,
            location: SourceLocation::dummy(),
        }
    }

    /// The function type of this definition
    pub fn function_type(&self) -> Type {
        Type::function(
            self.parameters.iter().map(|p| p.param_type.clone()).collect(),
            self.return_type.clone(),
        )
    }
}

/// Top-level compilation unit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationUnit {
    pub items: Vec<TopLevelItem>,
}

impl TranslationUnit {
    pub fn new(items: Vec<TopLevelItem>) -> Self {
        Self { items }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TopLevelItem {
    /// Function definition
    Function(FunctionDefinition),

    /// Global variable declaration
    Declaration(Declaration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_type() {
        let func = FunctionDefinition::new(
            "f",
            vec![Parameter::new("a", Type::Int32), Parameter::new("c", Type::UInt8)],
            Type::Int32,
            Statement::compound(vec![]),
        );

        assert_eq!(
            func.function_type(),
            Type::function(vec![Type::Int32, Type::UInt8], Type::Int32)
        );
    }

    #[test]
    fn test_if_without_else() {
        let stmt = Statement::if_else(Expression::int(1), Statement::brk(), None);
        match stmt.kind {
            StatementKind::If { else_stmt, .. } => assert!(else_stmt.is_none()),
            other => panic!("expected if, got {:?}", other),
        }
    }
}
