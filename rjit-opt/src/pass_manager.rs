//! Pass manager
//!
//! Holds the registered passes and the module they run on. Enabled passes
//! are ordered so every prerequisite runs before its dependents; each pass
//! then runs once per function in declaration order.

use crate::analysis::BlockCalculateFactory;
use crate::errors::PassError;
use crate::pass::{PassFactory, PassInfo};
use crate::transforms::BlockMergeFactory;
use log::{debug, trace};
use rjit_ir::Module;
use std::collections::{HashMap, HashSet};

/// Default optimisation level
pub const DEFAULT_OPT_LEVEL: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

pub struct PassManager {
    passes: Vec<PassInfo>,
    module: Option<Module>,
    opt_level: u8,
}

impl PassManager {
    pub fn new() -> Self {
        Self {
            passes: Vec::new(),
            module: None,
            opt_level: DEFAULT_OPT_LEVEL,
        }
    }

    /// Register the built-in passes
    pub fn initialize(&mut self) {
        self.register(&BlockCalculateFactory);
        self.register(&BlockMergeFactory);
    }

    /// Register a pass; a pass registered twice under one name replaces
    /// the earlier one
    pub fn register(&mut self, factory: &dyn PassFactory) {
        let info = factory.create_pass();
        debug!("Registering pass '{}'", info.name);
        match self.index_of(info.name) {
            Some(index) => self.passes[index] = info,
            None => self.passes.push(info),
        }
    }

    pub fn set_module(&mut self, module: Module) {
        self.module = Some(module);
    }

    pub fn module(&self) -> Option<&Module> {
        self.module.as_ref()
    }

    pub fn take_module(&mut self) -> Option<Module> {
        self.module.take()
    }

    pub fn set_opt_level(&mut self, level: u8) {
        self.opt_level = level;
    }

    pub fn opt_level(&self) -> u8 {
        self.opt_level
    }

    /// Registered passes in registration order
    pub fn passes(&self) -> &[PassInfo] {
        &self.passes
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|info| info.name).collect()
    }

    /// Run every pass enabled at the current optimisation level, plus the
    /// prerequisites they pull in. Returns whether the IR changed.
    pub fn run_passes(&mut self) -> Result<bool, PassError> {
        if self.module.is_none() {
            return Err(PassError::NoModule);
        }
        let roots: Vec<usize> = (0..self.passes.len())
            .filter(|&index| self.passes[index].min_opt_level <= self.opt_level)
            .collect();
        let order = self.schedule(&roots)?;
        self.execute(&order)
    }

    /// Run a single pass and its prerequisites, regardless of the
    /// optimisation level
    pub fn run_pass(&mut self, name: &str) -> Result<bool, PassError> {
        if self.module.is_none() {
            return Err(PassError::NoModule);
        }
        let index = self.index_of(name).ok_or_else(|| PassError::UnknownPass {
            name: name.to_string(),
        })?;
        let order = self.schedule(&[index])?;
        self.execute(&order)
    }

    /// Execution order: a depth-first topological sort over `requires`
    pub fn schedule_names(&self) -> Result<Vec<&'static str>, PassError> {
        let roots: Vec<usize> = (0..self.passes.len())
            .filter(|&index| self.passes[index].min_opt_level <= self.opt_level)
            .collect();
        let order = self.schedule(&roots)?;
        Ok(order.into_iter().map(|index| self.passes[index].name).collect())
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.passes.iter().position(|info| info.name == name)
    }

    fn schedule(&self, roots: &[usize]) -> Result<Vec<usize>, PassError> {
        let mut marks = HashMap::new();
        let mut order = Vec::new();
        for &root in roots {
            self.visit(root, &mut marks, &mut order)?;
        }
        Ok(order)
    }

    fn visit(
        &self,
        index: usize,
        marks: &mut HashMap<usize, Visit>,
        order: &mut Vec<usize>,
    ) -> Result<(), PassError> {
        match marks.get(&index) {
            Some(Visit::Done) => return Ok(()),
            Some(Visit::InProgress) => {
                return Err(PassError::DependencyCycle {
                    pass: self.passes[index].name.to_string(),
                })
            }
            None => {}
        }

        marks.insert(index, Visit::InProgress);
        for &required in &self.passes[index].requires {
            let Some(dep) = self.index_of(required) else {
                return Err(PassError::MissingPrerequisite {
                    pass: self.passes[index].name.to_string(),
                    prerequisite: required.to_string(),
                });
            };
            self.visit(dep, marks, order)?;
        }
        marks.insert(index, Visit::Done);
        order.push(index);
        Ok(())
    }

    fn execute(&mut self, order: &[usize]) -> Result<bool, PassError> {
        // Passes whose results still describe the current IR
        let mut fresh = HashSet::new();
        let mut changed = false;

        for &index in order {
            if fresh.contains(&index) {
                trace!("Skipping '{}', results are current", self.passes[index].name);
                continue;
            }
            changed |= self.run_with_prerequisites(index, &mut fresh)?;
        }
        Ok(changed)
    }

    fn run_with_prerequisites(
        &mut self,
        index: usize,
        fresh: &mut HashSet<usize>,
    ) -> Result<bool, PassError> {
        let mut changed = false;
        let requires = self.passes[index].requires.clone();
        for required in requires {
            let dep = self
                .index_of(required)
                .ok_or_else(|| PassError::MissingPrerequisite {
                    pass: self.passes[index].name.to_string(),
                    prerequisite: required.to_string(),
                })?;
            if !fresh.contains(&dep) {
                debug!(
                    "Rerunning '{}' for '{}'",
                    required, self.passes[index].name
                );
                changed |= self.run_with_prerequisites(dep, fresh)?;
            }
        }

        let pass_changed = self.run_one(index)?;
        if pass_changed && !self.passes[index].preserves_analyses {
            fresh.clear();
        }
        fresh.insert(index);
        Ok(changed | pass_changed)
    }

    fn run_one(&mut self, index: usize) -> Result<bool, PassError> {
        let module = self.module.as_mut().ok_or(PassError::NoModule)?;
        let info = &mut self.passes[index];
        debug!("Running pass '{}'", info.name);

        let mut changed = false;
        for func in module.functions().to_vec() {
            let func_changed = info.pass.run_on_function(module, func);
            trace!(
                "'{}' on @{}: {}",
                info.name,
                module.graph.function_name(func),
                if func_changed { "changed" } else { "unchanged" }
            );
            changed |= func_changed;
        }
        Ok(changed)
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}
