//! Lowering from the typed AST to IR
//!
//! [`IrBuilder`] walks the AST with `match` and drives the [`Module`] builder.
//! Variables live in stack slots; control flow becomes explicit blocks.
//!
//! A source-level error (undefined name, misplaced `break`, ...) is recorded in
//! the module's diagnostics, the function being lowered is dropped, and
//! lowering moves on to the next top-level item. The overall result is an
//! error if anything was recorded.

mod expressions;
mod function_gen;
mod global_gen;
mod statements;

use crate::errors::LowerError;
use crate::module::Module;
use crate::usedef::ValueId;
use log::debug;
use rjit_ast::{TopLevelItem, TranslationUnit};
use rjit_common::{CompilerError, SourceLocation};

/// Jump targets of the innermost enclosing loop
#[derive(Debug, Clone, Copy)]
struct LoopTargets {
    continue_block: ValueId,
    break_block: ValueId,
}

/// Lowers a typed translation unit into a [`Module`]
pub struct IrBuilder {
    module: Module,
    loops: Vec<LoopTargets>,
}

impl IrBuilder {
    pub fn new(module_name: &str) -> Self {
        Self {
            module: Module::new(module_name),
            loops: Vec::new(),
        }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Lower every top-level item, recording errors instead of stopping
    pub fn lower(&mut self, unit: &TranslationUnit) {
        for item in &unit.items {
            match item {
                TopLevelItem::Function(func) => function_gen::lower_function(self, func),
                TopLevelItem::Declaration(decl) => global_gen::lower_global(self, decl),
            }
        }
    }

    /// The module, or an error summarising the recorded diagnostics
    pub fn finish(self) -> Result<Module, LowerError> {
        let reporter = self.module.reporter();
        if reporter.has_errors() {
            debug!("lowering of '{}' failed: {}", self.module.name, reporter.summary());
            return Err(LowerError::Failed {
                count: reporter.error_count(),
                summary: reporter.summary(),
            });
        }
        Ok(self.module)
    }

    /// Record `err` at the current source context and return it
    fn fail(&mut self, err: LowerError) -> LowerError {
        self.module.log_error(err.message(), err.identifier());
        err
    }

    fn with_context<R>(&mut self, location: &SourceLocation, f: impl FnOnce(&mut Self) -> R) -> R {
        self.module.push_context(location.clone());
        let result = f(self);
        self.module.pop_context();
        result
    }

    fn with_scope<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.module.push_scope();
        let result = f(self);
        self.module.pop_scope();
        result
    }

    fn with_loop<R>(&mut self, targets: LoopTargets, f: impl FnOnce(&mut Self) -> R) -> R {
        self.loops.push(targets);
        let result = f(self);
        self.loops.pop();
        result
    }

    fn current_function(&self) -> ValueId {
        match self.module.current_function() {
            Some(func) => func,
            None => panic!("statement lowered outside of a function"),
        }
    }

    /// Start a fresh block for code following a `return`, `break` or
    /// `continue`. Nothing jumps to it; block merging removes it.
    fn continue_in_unreachable_block(&mut self) {
        let func = self.current_function();
        let block = self.module.create_block(func, None);
        self.module.set_insert_point(block);
    }
}

/// Lower a typed translation unit into a module named `module_name`
pub fn lower_translation_unit(
    unit: &TranslationUnit,
    module_name: &str,
) -> Result<Module, CompilerError> {
    let mut builder = IrBuilder::new(module_name);
    builder.lower(unit);
    Ok(builder.finish()?)
}

/// `ValueId` of the value a lowering step produced. Unused result values
/// (expression statements) are simply dropped.
type Lowered = Result<ValueId, LowerError>;
