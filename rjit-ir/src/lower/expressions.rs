//! Expression lowering
//!
//! Identifiers lower to their slot (an address); every consumer decides
//! whether it needs the address or the loaded value.

use super::{IrBuilder, Lowered};
use crate::builder::common_type;
use crate::errors::LowerError;
use crate::instructions::ICmpPredicate;
use crate::opcode::Opcode;
use crate::usedef::ValueId;
use rjit_ast::{BinaryOp, Expression, ExpressionKind, UnaryOp};
use rjit_common::Type;

impl IrBuilder {
    pub(super) fn lower_expression(&mut self, expr: &Expression) -> Lowered {
        self.with_context(&expr.location, |this| match &expr.kind {
            ExpressionKind::IntLiteral(value) => {
                Ok(this.module.create_const_int(*value, expr.expr_type.clone()))
            }

            ExpressionKind::CharLiteral(value) => Ok(this
                .module
                .create_const_int(i64::from(*value), expr.expr_type.clone())),

            ExpressionKind::StringLiteral(value) => Ok(this.module.create_const_str(value)),

            ExpressionKind::Identifier { name } => match this.module.lookup(name) {
                Some(slot) => Ok(slot),
                None => Err(this.fail(LowerError::UndefinedVariable {
                    name: name.clone(),
                    location: expr.location.clone(),
                })),
            },

            ExpressionKind::Binary { op, left, right } => this.lower_binary(*op, left, right),

            ExpressionKind::Unary { op, operand } => this.lower_unary(*op, operand),

            ExpressionKind::Call {
                function,
                arguments,
            } => {
                let Some(callee) = this.module.get_function(function) else {
                    return Err(this.fail(LowerError::UndefinedFunction {
                        name: function.clone(),
                        location: expr.location.clone(),
                    }));
                };

                let mut args = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(this.lower_expression(arg)?);
                }
                Ok(this.module.create_call(callee, &args))
            }
        })
    }

    /// Lower an expression used as a branch condition into an `i1`
    pub(super) fn lower_condition(&mut self, expr: &Expression) -> Lowered {
        let value = self.lower_expression(expr)?;
        let value = self.module.value_of(value);
        let ty = self.module.graph.ty(value);
        if !ty.is_integer() {
            let found = ty.to_string();
            return Err(self.fail(LowerError::NonIntegerCondition {
                found,
                location: expr.location.clone(),
            }));
        }
        Ok(self.to_bool(value))
    }

    /// `icmp ne v, 0` unless the value already is a boolean
    fn to_bool(&mut self, value: ValueId) -> ValueId {
        let ty = self.module.graph.ty(value).clone();
        if ty.is_bool() {
            return value;
        }
        let zero = self.module.create_const_int(0, ty.unqualified().clone());
        self.module.create_icmp(ICmpPredicate::Ne, value, zero)
    }

    /// The slot an assignment writes to
    fn lower_assign_target(&mut self, target: &Expression) -> Lowered {
        let slot = self.lower_expression(target)?;
        if self.module.graph.is_address(slot) {
            Ok(slot)
        } else {
            Err(self.fail(LowerError::InvalidAssignTarget {
                location: target.location.clone(),
            }))
        }
    }

    fn lower_binary(&mut self, op: BinaryOp, left: &Expression, right: &Expression) -> Lowered {
        match op {
            BinaryOp::Assign => {
                let slot = self.lower_assign_target(left)?;
                let value = self.lower_expression(right)?;
                Ok(self.module.create_assign(slot, value))
            }

            BinaryOp::LogicalAnd | BinaryOp::LogicalOr => self.lower_logical(op, left, right),

            _ if op.is_comparison() => {
                let lhs = self.lower_integer(left)?;
                let rhs = self.lower_integer(right)?;
                let operand_ty = common_type(&left.expr_type, &right.expr_type);
                let pred = comparison_predicate(op, &operand_ty);
                Ok(self.module.create_icmp(pred, lhs, rhs))
            }

            _ => match op.compound_base() {
                Some(base) => {
                    let slot = self.lower_assign_target(left)?;
                    let stored = self.module.graph.ty(slot).pointee().cloned();
                    if !stored.as_ref().is_some_and(Type::is_integer) {
                        return Err(self.fail(LowerError::NonIntegerOperand {
                            found: stored.unwrap_or(Type::Void).to_string(),
                            location: left.location.clone(),
                        }));
                    }
                    let rhs = self.lower_integer(right)?;
                    let opcode = arithmetic_opcode(base, &left.expr_type, &right.expr_type);
                    let result = self.module.create_pure_binary(opcode, slot, rhs);
                    Ok(self.module.create_assign(slot, result))
                }
                None => {
                    let lhs = self.lower_integer(left)?;
                    let rhs = self.lower_integer(right)?;
                    let opcode = arithmetic_opcode(op, &left.expr_type, &right.expr_type);
                    Ok(self.module.create_pure_binary(opcode, lhs, rhs))
                }
            },
        }
    }

    /// Short-circuit `&&` / `||` through a boolean stack slot
    fn lower_logical(&mut self, op: BinaryOp, left: &Expression, right: &Expression) -> Lowered {
        let is_and = op == BinaryOp::LogicalAnd;
        let slot = self.module.create_alloca(Type::Bool, None);

        let lhs = self.lower_condition(left)?;
        self.module.create_store(lhs, slot);

        let func = self.current_function();
        let (rhs_name, end_name) = if is_and {
            ("land.rhs", "land.end")
        } else {
            ("lor.rhs", "lor.end")
        };
        let rhs_block = self.module.create_block(func, Some(rhs_name));
        let end_block = self.module.create_block(func, Some(end_name));

        if is_and {
            self.module.create_branch(lhs, rhs_block, end_block);
        } else {
            self.module.create_branch(lhs, end_block, rhs_block);
        }

        self.module.set_insert_point(rhs_block);
        let rhs = self.lower_condition(right)?;
        self.module.create_store(rhs, slot);
        self.module.create_jump(end_block);

        self.module.set_insert_point(end_block);
        Ok(self.module.create_load(slot))
    }

    /// Lower an operand of integer arithmetic and load it
    fn lower_integer(&mut self, expr: &Expression) -> Lowered {
        let value = self.lower_expression(expr)?;
        let value = self.module.value_of(value);
        let ty = self.module.graph.ty(value);
        if !ty.is_integer() {
            let found = ty.to_string();
            return Err(self.fail(LowerError::NonIntegerOperand {
                found,
                location: expr.location.clone(),
            }));
        }
        Ok(value)
    }

    fn lower_unary(&mut self, op: UnaryOp, operand: &Expression) -> Lowered {
        let value = self.lower_integer(operand)?;
        let ty = self.module.graph.ty(value).unqualified().clone();

        Ok(match op {
            UnaryOp::Plus => value,
            UnaryOp::Minus => {
                let zero = self.module.create_const_int(0, ty);
                self.module.create_pure_binary(Opcode::Sub, zero, value)
            }
            UnaryOp::LogicalNot => {
                let zero = self.module.create_const_int(0, ty);
                self.module.create_icmp(ICmpPredicate::Eq, value, zero)
            }
            UnaryOp::BitNot => {
                let ones = self.module.create_const_int(-1, ty);
                self.module.create_pure_binary(Opcode::Xor, value, ones)
            }
        })
    }
}

/// Opcode of an arithmetic operator; division, remainder and right shift
/// pick the signed or unsigned form from the operand types
fn arithmetic_opcode(op: BinaryOp, lhs: &Type, rhs: &Type) -> Opcode {
    let signed = common_type(lhs, rhs).is_signed();
    match op {
        BinaryOp::Add => Opcode::Add,
        BinaryOp::Sub => Opcode::Sub,
        BinaryOp::Mul => Opcode::Mul,
        BinaryOp::Div if signed => Opcode::SDiv,
        BinaryOp::Div => Opcode::UDiv,
        BinaryOp::Mod if signed => Opcode::SRem,
        BinaryOp::Mod => Opcode::URem,
        BinaryOp::BitAnd => Opcode::And,
        BinaryOp::BitOr => Opcode::Or,
        BinaryOp::BitXor => Opcode::Xor,
        BinaryOp::LeftShift => Opcode::Shl,
        BinaryOp::RightShift if lhs.is_signed() => Opcode::AShr,
        BinaryOp::RightShift => Opcode::LShr,
        other => panic!("{} is not an arithmetic operator", other),
    }
}

fn comparison_predicate(op: BinaryOp, operand_ty: &Type) -> ICmpPredicate {
    let signed = operand_ty.is_signed();
    match op {
        BinaryOp::Equal => ICmpPredicate::Eq,
        BinaryOp::NotEqual => ICmpPredicate::Ne,
        BinaryOp::Less if signed => ICmpPredicate::Slt,
        BinaryOp::Less => ICmpPredicate::Ult,
        BinaryOp::LessEqual if signed => ICmpPredicate::Sle,
        BinaryOp::LessEqual => ICmpPredicate::Ule,
        BinaryOp::Greater if signed => ICmpPredicate::Sgt,
        BinaryOp::Greater => ICmpPredicate::Ugt,
        BinaryOp::GreaterEqual if signed => ICmpPredicate::Sge,
        BinaryOp::GreaterEqual => ICmpPredicate::Uge,
        other => panic!("{} is not a comparison", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signedness_selects_opcode() {
        assert_eq!(arithmetic_opcode(BinaryOp::Div, &Type::Int32, &Type::Int8), Opcode::SDiv);
        assert_eq!(arithmetic_opcode(BinaryOp::Div, &Type::UInt32, &Type::Int8), Opcode::UDiv);
        assert_eq!(arithmetic_opcode(BinaryOp::Mod, &Type::Int8, &Type::UInt32), Opcode::URem);
        let shr = BinaryOp::RightShift;
        assert_eq!(arithmetic_opcode(shr, &Type::UInt8, &Type::Int32), Opcode::LShr);
        assert_eq!(arithmetic_opcode(shr, &Type::Int8, &Type::Int32), Opcode::AShr);
    }

    #[test]
    fn test_comparison_predicates() {
        assert_eq!(comparison_predicate(BinaryOp::Less, &Type::Int32), ICmpPredicate::Slt);
        assert_eq!(comparison_predicate(BinaryOp::Less, &Type::UInt8), ICmpPredicate::Ult);
        assert_eq!(comparison_predicate(BinaryOp::NotEqual, &Type::UInt8), ICmpPredicate::Ne);
        assert_eq!(
            comparison_predicate(BinaryOp::GreaterEqual, &Type::constant(Type::Int8)),
            ICmpPredicate::Sge
        );
    }
}
