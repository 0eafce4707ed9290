//! Statement lowering

use super::{IrBuilder, LoopTargets};
use crate::errors::LowerError;
use log::trace;
use rjit_ast::{Declaration, Expression, Statement, StatementKind};

impl IrBuilder {
    pub(super) fn lower_statement(&mut self, stmt: &Statement) -> Result<(), LowerError> {
        self.with_context(&stmt.location, |this| match &stmt.kind {
            StatementKind::Expression(expr) => this.lower_expression(expr).map(|_| ()),

            StatementKind::Compound(statements) => this.lower_compound(statements),

            StatementKind::Declaration { declarations } => {
                for decl in declarations {
                    this.lower_local(decl)?;
                }
                Ok(())
            }

            StatementKind::If {
                condition,
                then_stmt,
                else_stmt,
            } => this.lower_if(condition, then_stmt, else_stmt.as_deref()),

            StatementKind::While { condition, body } => this.lower_while(condition, body),

            StatementKind::Break => {
                let Some(targets) = this.loops.last().copied() else {
                    return Err(this.fail(LowerError::BreakOutsideLoop {
                        location: stmt.location.clone(),
                    }));
                };
                this.module.create_jump(targets.break_block);
                this.continue_in_unreachable_block();
                Ok(())
            }

            StatementKind::Continue => {
                let Some(targets) = this.loops.last().copied() else {
                    return Err(this.fail(LowerError::ContinueOutsideLoop {
                        location: stmt.location.clone(),
                    }));
                };
                this.module.create_jump(targets.continue_block);
                this.continue_in_unreachable_block();
                Ok(())
            }

            StatementKind::Return(value) => this.lower_return(value.as_ref()),

            StatementKind::Empty => Ok(()),
        })
    }

    /// Nested compound: new scope and new block
    fn lower_compound(&mut self, statements: &[Statement]) -> Result<(), LowerError> {
        let func = self.current_function();
        let block = self.module.create_block(func, None);
        if !self.module.is_terminated() {
            self.module.create_jump(block);
        }
        self.module.set_insert_point(block);

        self.with_scope(|this| this.lower_statements(statements))
    }

    /// Lower a statement list. Statements after a `return`, `break` or
    /// `continue` are still lowered; the first of them is reported.
    pub(super) fn lower_statements(
        &mut self,
        statements: &[Statement],
    ) -> Result<(), LowerError> {
        let mut jumped = false;
        let mut warned = false;
        for stmt in statements {
            if jumped && !warned {
                self.with_context(&stmt.location, |this| {
                    this.module.log_warning("unreachable code")
                });
                warned = true;
            }
            self.lower_statement(stmt)?;
            jumped |= matches!(
                stmt.kind,
                StatementKind::Return(_) | StatementKind::Break | StatementKind::Continue
            );
        }
        Ok(())
    }

    /// Local variable: a hoisted slot, initialised where it is declared
    fn lower_local(&mut self, decl: &Declaration) -> Result<(), LowerError> {
        self.with_context(&decl.location, |this| {
            let slot = this
                .module
                .create_alloca(decl.decl_type.clone(), Some(decl.name.as_str()));

            if let Some(init) = &decl.initializer {
                let value = this.lower_expression(init)?;
                this.module.create_assign(slot, value);
            }

            trace!("local {}: {}", decl.name, decl.decl_type);
            this.module.declare(&decl.name, slot);
            Ok(())
        })
    }

    fn lower_if(
        &mut self,
        condition: &Expression,
        then_stmt: &Statement,
        else_stmt: Option<&Statement>,
    ) -> Result<(), LowerError> {
        let cond = self.lower_condition(condition)?;

        let func = self.current_function();
        let then_block = self.module.create_block(func, Some("if.then"));
        let else_block = else_stmt.map(|_| self.module.create_block(func, Some("if.else")));
        let end_block = self.module.create_block(func, Some("if.end"));

        self.module
            .create_branch(cond, then_block, else_block.unwrap_or(end_block));

        self.module.set_insert_point(then_block);
        self.lower_statement(then_stmt)?;
        if !self.module.is_terminated() {
            self.module.create_jump(end_block);
        }

        if let (Some(block), Some(stmt)) = (else_block, else_stmt) {
            self.module.set_insert_point(block);
            self.lower_statement(stmt)?;
            if !self.module.is_terminated() {
                self.module.create_jump(end_block);
            }
        }

        self.module.set_insert_point(end_block);
        Ok(())
    }

    fn lower_while(&mut self, condition: &Expression, body: &Statement) -> Result<(), LowerError> {
        let func = self.current_function();
        let cond_block = self.module.create_block(func, Some("while.cond"));
        let body_block = self.module.create_block(func, Some("while.body"));
        let end_block = self.module.create_block(func, Some("while.end"));

        if !self.module.is_terminated() {
            self.module.create_jump(cond_block);
        }

        self.module.set_insert_point(cond_block);
        let cond = self.lower_condition(condition)?;
        self.module.create_branch(cond, body_block, end_block);

        self.module.set_insert_point(body_block);
        let targets = LoopTargets {
            continue_block: cond_block,
            break_block: end_block,
        };
        self.with_loop(targets, |this| this.lower_statement(body))?;
        if !self.module.is_terminated() {
            self.module.create_jump(cond_block);
        }

        self.module.set_insert_point(end_block);
        Ok(())
    }

    /// Store the value into `retval` and leave through `func_exit`
    fn lower_return(&mut self, value: Option<&Expression>) -> Result<(), LowerError> {
        let Some(state) = self.module.function_state().copied() else {
            panic!("return lowered outside of a function");
        };

        if let Some(expr) = value {
            let value = self.lower_expression(expr)?;
            match state.return_slot {
                Some(slot) => {
                    self.module.create_assign(slot, value);
                }
                // void function: evaluated for its side effects only
                None => {
                    self.module.value_of(value);
                }
            }
        }

        if let Some(exit) = state.exit {
            self.module.create_jump(exit);
        }
        self.continue_in_unreachable_block();
        Ok(())
    }
}
