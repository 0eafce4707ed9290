//! Expression AST nodes
//!
//! Expressions arrive fully typed: `expr_type` is the type the semantic
//! analyzer resolved, const-qualified for right values such as literals.

use super::ops::{BinaryOp, UnaryOp};
use rjit_common::{SourceLocation, Type};
use serde::{Deserialize, Serialize};

/// AST Expression nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub location: SourceLocation,
    pub expr_type: Type,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExpressionKind {
    /// Integer literal
    IntLiteral(i64),

    /// Character literal
    CharLiteral(u8),

    /// String literal
    StringLiteral(String),

    /// Variable reference
    Identifier { name: String },

    /// Binary operation, assignments included
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Unary operation
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },

    /// Call of a named function
    Call {
        function: String,
        arguments: Vec<Expression>,
    },
}

impl Expression {
    pub fn new(kind: ExpressionKind, expr_type: Type, location: SourceLocation) -> Self {
        Self {
            kind,
            location,
            expr_type,
        }
    }

    /// Integer literal, typed `const int32`
    pub fn int(value: i64) -> Self {
        Self::new(
            ExpressionKind::IntLiteral(value),
            Type::constant(Type::Int32),
            SourceLocation::dummy(),
        )
    }

    /// Integer literal of an explicit type
    pub fn int_typed(value: i64, ty: Type) -> Self {
        Self::new(
            ExpressionKind::IntLiteral(value),
            Type::constant(ty),
            SourceLocation::dummy(),
        )
    }

    pub fn char(value: u8) -> Self {
        Self::new(
            ExpressionKind::CharLiteral(value),
            Type::constant(Type::UInt8),
            SourceLocation::dummy(),
        )
    }

    pub fn string(value: &str) -> Self {
        Self::new(
            ExpressionKind::StringLiteral(value.to_string()),
            Type::constant(Type::Str),
            SourceLocation::dummy(),
        )
    }

    pub fn ident(name: &str, ty: Type) -> Self {
        Self::new(
            ExpressionKind::Identifier {
                name: name.to_string(),
            },
            ty,
            SourceLocation::dummy(),
        )
    }

    /// Binary expression. The result type follows the usual rules of the
    /// language: booleans for comparisons and logical operators, the left
    /// operand's type for assignments, the wider operand otherwise.
    pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Self {
        let expr_type = if op.is_comparison() || op.is_logical() {
            Type::Bool
        } else if op.is_assignment() {
            left.expr_type.unqualified().clone()
        } else {
            let lhs = left.expr_type.unqualified();
            let rhs = right.expr_type.unqualified();
            if rhs.bit_width() > lhs.bit_width() {
                rhs.clone()
            } else {
                lhs.clone()
            }
        };

        Self::new(
            ExpressionKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            expr_type,
            SourceLocation::dummy(),
        )
    }

    pub fn unary(op: UnaryOp, operand: Expression) -> Self {
        let expr_type = match op {
            UnaryOp::LogicalNot => Type::Bool,
            _ => operand.expr_type.unqualified().clone(),
        };

        Self::new(
            ExpressionKind::Unary {
                op,
                operand: Box::new(operand),
            },
            expr_type,
            SourceLocation::dummy(),
        )
    }

    pub fn call(function: &str, arguments: Vec<Expression>, return_type: Type) -> Self {
        Self::new(
            ExpressionKind::Call {
                function: function.to_string(),
                arguments,
            },
            return_type,
            SourceLocation::dummy(),
        )
    }

    /// Replace the location, for builders that know where a node came from
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_types() {
        assert_eq!(Expression::int(1).expr_type, Type::constant(Type::Int32));
        assert_eq!(Expression::char(b'a').expr_type, Type::constant(Type::UInt8));
        assert!(matches!(Expression::string("hi").expr_type, Type::Const(_)));
    }

    #[test]
    fn test_binary_result_type() {
        let narrow = Expression::ident("c", Type::UInt8);
        let wide = Expression::ident("x", Type::Int32);

        let sum = Expression::binary(BinaryOp::Add, narrow.clone(), wide.clone());
        assert_eq!(sum.expr_type, Type::Int32);

        let cmp = Expression::binary(BinaryOp::Less, narrow.clone(), wide);
        assert_eq!(cmp.expr_type, Type::Bool);

        let assign = Expression::binary(BinaryOp::Assign, narrow, Expression::int(3));
        assert_eq!(assign.expr_type, Type::UInt8);
    }

    #[test]
    fn test_unary_result_type() {
        let not = Expression::unary(UnaryOp::LogicalNot, Expression::ident("x", Type::Int32));
        assert_eq!(not.expr_type, Type::Bool);

        let neg = Expression::unary(UnaryOp::Minus, Expression::int(4));
        assert_eq!(neg.expr_type, Type::Int32);
    }

    #[test]
    fn test_at_sets_location() {
        let loc = SourceLocation::new("a.rj", 2, 9);
        assert_eq!(Expression::int(0).at(loc.clone()).location, loc);
    }
}
