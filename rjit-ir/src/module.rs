//! Module and Global Variables
//!
//! The module owns the value arena, the function and global lists, the
//! scoped value-symbol table, the stack of source contexts and the builder
//! state (insertion point and per-function registers).

use crate::usedef::{ValueGraph, ValueId};
use log::debug;
use rjit_common::{Diagnostic, ErrorReporter, ScopedTable, SourceLocation};

/// Where the next created instruction goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertPoint {
    pub block: ValueId,
    pub index: usize,
}

/// Registers of the function being built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionState {
    pub function: ValueId,
    pub entry: ValueId,
    pub exit: Option<ValueId>,
    pub return_slot: Option<ValueId>,
}

/// IR Module - represents a complete compilation unit
#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub graph: ValueGraph,
    pub(crate) functions: Vec<ValueId>,
    pub(crate) globals: Vec<ValueId>,
    symbols: ScopedTable<ValueId>,
    contexts: Vec<SourceLocation>,
    pub(crate) insert_point: Option<InsertPoint>,
    pub(crate) current: Option<FunctionState>,
    reporter: ErrorReporter,
}

impl Module {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            graph: ValueGraph::new(),
            functions: Vec::new(),
            globals: Vec::new(),
            symbols: ScopedTable::new(),
            contexts: Vec::new(),
            insert_point: None,
            current: None,
            reporter: ErrorReporter::new(),
        }
    }

    pub fn functions(&self) -> &[ValueId] {
        &self.functions
    }

    pub fn globals(&self) -> &[ValueId] {
        &self.globals
    }

    pub fn get_function(&self, name: &str) -> Option<ValueId> {
        self.functions
            .iter()
            .copied()
            .find(|&f| self.graph.function_name(f) == name)
    }

    pub fn get_global(&self, name: &str) -> Option<ValueId> {
        self.globals.iter().copied().find(|&g| {
            matches!(self.graph.kind(g), crate::ValueKind::Global { name: n } if n == name)
        })
    }

    /// Drop a function and everything it contains from the module
    pub fn remove_function(&mut self, func: ValueId) {
        debug!("removing function @{}", self.graph.function_name(func));

        for block in self.graph.function_blocks(func) {
            for inst in self.graph.block(block).insts.clone() {
                self.graph.drop_operands(inst);
            }
            self.graph.drop_operands(block);
        }
        self.graph.drop_operands(func);
        self.graph.remove_from_users(func);

        let name = self.graph.function_name(func).to_string();
        if self.symbols.lookup(&name) == Some(func) {
            self.symbols.remove(&name);
        }
        self.functions.retain(|&f| f != func);

        if self.current.is_some_and(|state| state.function == func) {
            self.current = None;
            self.insert_point = None;
        }
    }

    // Scopes

    pub fn push_scope(&mut self) {
        self.symbols.push_scope();
    }

    pub fn pop_scope(&mut self) {
        self.symbols.pop_scope();
    }

    /// Bind a name in the current scope
    pub fn declare(&mut self, name: &str, value: ValueId) {
        self.symbols.insert(name, value);
    }

    pub fn declare_global(&mut self, name: &str, value: ValueId) {
        self.symbols.insert_global(name, value);
    }

    pub fn lookup(&self, name: &str) -> Option<ValueId> {
        self.symbols.lookup(name)
    }

    // Source contexts

    pub fn push_context(&mut self, location: SourceLocation) {
        self.contexts.push(location);
    }

    pub fn pop_context(&mut self) {
        self.contexts.pop();
    }

    pub fn current_context(&self) -> Option<&SourceLocation> {
        self.contexts.last()
    }

    // Diagnostics

    /// Record an error at the current source context
    pub fn log_error(&mut self, message: &str, identifier: Option<&str>) {
        let location = self.current_context().cloned().unwrap_or_default();
        debug!("lowering error at {}: {}", location, message);

        let diagnostic = Diagnostic::error(message.to_string(), location);
        self.reporter.report(match identifier {
            Some(name) => diagnostic.with_identifier(name),
            None => diagnostic,
        });
    }

    /// Record a warning at the current source context
    pub fn log_warning(&mut self, message: &str) {
        let location = self.current_context().cloned().unwrap_or_default();
        debug!("lowering warning at {}: {}", location, message);
        self.reporter.warning(message.to_string(), location);
    }

    pub fn reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    pub fn has_errors(&self) -> bool {
        self.reporter.has_errors()
    }

    // Function registers

    pub fn current_function(&self) -> Option<ValueId> {
        self.current.map(|state| state.function)
    }

    pub fn function_state(&self) -> Option<&FunctionState> {
        self.current.as_ref()
    }

    pub fn set_function_exit(&mut self, exit: ValueId) {
        if let Some(state) = self.current.as_mut() {
            state.exit = Some(exit);
        }
    }

    pub fn set_return_slot(&mut self, slot: ValueId) {
        if let Some(state) = self.current.as_mut() {
            state.return_slot = Some(slot);
        }
    }

    /// Clear the builder state once a function is complete
    pub fn end_function(&mut self) {
        self.current = None;
        self.insert_point = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rjit_common::Type;

    #[test]
    fn test_popped_scope_forgets_locals() {
        let mut module = Module::new("m");
        let a = module.create_const_int(1, Type::Int32);

        module.push_scope();
        module.declare("a", a);
        assert_eq!(module.lookup("a"), Some(a));
        module.pop_scope();

        assert_eq!(module.lookup("a"), None);
    }

    #[test]
    fn test_log_error_uses_context() {
        let mut module = Module::new("m");
        let loc = SourceLocation::new("x.rj", 4, 2);

        module.push_context(loc.clone());
        module.log_error("undefined variable", Some("y"));
        module.log_warning("unreachable code");
        module.pop_context();

        assert!(module.current_context().is_none());
        assert!(module.has_errors());
        let diag = &module.reporter().diagnostics()[0];
        assert_eq!(diag.location, loc);
        assert_eq!(diag.identifier.as_deref(), Some("y"));
        assert_eq!(module.reporter().warning_count(), 1);
        assert_eq!(module.reporter().diagnostics()[1].location, loc);
    }
}
