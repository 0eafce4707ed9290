//! Global variable lowering

use super::IrBuilder;
use crate::errors::LowerError;
use crate::module::Module;
use crate::usedef::ValueId;
use log::debug;
use rjit_ast::{Declaration, Expression, ExpressionKind, UnaryOp};

/// Lower a top-level variable into a module global
pub(super) fn lower_global(builder: &mut IrBuilder, decl: &Declaration) {
    builder.with_context(&decl.location, |this| {
        let init = match &decl.initializer {
            Some(expr) => match constant_initializer(&mut this.module, expr) {
                Some(value) => Some(value),
                None => {
                    this.fail(LowerError::NonConstantInitializer {
                        name: decl.name.clone(),
                        location: expr.location.clone(),
                    });
                    return;
                }
            },
            None => None,
        };

        debug!("global @{}: {}", decl.name, decl.decl_type);
        let global = this
            .module
            .create_global(&decl.name, decl.decl_type.unqualified().clone(), init);
        this.module.declare_global(&decl.name, global);
    });
}

/// Constant for a literal initializer, possibly under unary operators
fn constant_initializer(module: &mut Module, expr: &Expression) -> Option<ValueId> {
    if let ExpressionKind::StringLiteral(s) = &expr.kind {
        return Some(module.create_const_str(s));
    }
    let value = fold(expr)?;
    Some(module.create_const_int(value, expr.expr_type.clone()))
}

fn fold(expr: &Expression) -> Option<i64> {
    match &expr.kind {
        ExpressionKind::IntLiteral(v) => Some(*v),
        ExpressionKind::CharLiteral(c) => Some(i64::from(*c)),
        ExpressionKind::Unary { op, operand } => {
            let v = fold(operand)?;
            Some(match op {
                UnaryOp::Plus => v,
                UnaryOp::Minus => v.wrapping_neg(),
                UnaryOp::BitNot => !v,
                UnaryOp::LogicalNot => i64::from(v == 0),
            })
        }
        _ => None,
    }
}
