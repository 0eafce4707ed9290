//! Core pass traits
//!
//! A [`FunctionPass`] runs once per function. It is registered through a
//! [`PassFactory`] producing the [`PassInfo`] that carries its name, its
//! prerequisites and how it interacts with analysis results.

use rjit_ir::{Module, ValueId};

/// A pass over a single function
pub trait FunctionPass {
    /// Run on `func`; returns `true` iff the IR was modified
    fn run_on_function(&mut self, module: &mut Module, func: ValueId) -> bool;
}

/// Registration record of a pass
pub struct PassInfo {
    pub name: &'static str,
    pub pass: Box<dyn FunctionPass>,
    /// Whether analysis results stay valid after this pass changes the IR
    pub preserves_analyses: bool,
    /// Lowest optimisation level the pass runs at
    pub min_opt_level: u8,
    /// Passes that must run before this one
    pub requires: Vec<&'static str>,
}

impl PassInfo {
    pub fn new(
        name: &'static str,
        pass: Box<dyn FunctionPass>,
        preserves_analyses: bool,
        min_opt_level: u8,
    ) -> Self {
        Self {
            name,
            pass,
            preserves_analyses,
            min_opt_level,
            requires: Vec::new(),
        }
    }

    /// Declare a prerequisite
    pub fn requires(mut self, name: &'static str) -> Self {
        if !self.requires.contains(&name) {
            self.requires.push(name);
        }
        self
    }
}

impl std::fmt::Debug for PassInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassInfo")
            .field("name", &self.name)
            .field("preserves_analyses", &self.preserves_analyses)
            .field("min_opt_level", &self.min_opt_level)
            .field("requires", &self.requires)
            .finish()
    }
}

/// Creates a pass for registration with the pass manager
pub trait PassFactory {
    fn create_pass(&self) -> PassInfo;
}
