//! Textual IR dump
//!
//! Prints a module in an LLVM-like syntax. Local names are assigned per
//! function by [`IdManager`]: named values keep their name with a numeric
//! suffix on collision, unnamed values are numbered in order of appearance.

use crate::module::Module;
use crate::opcode::Opcode;
use crate::usedef::ValueId;
use crate::value::ValueKind;
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Write};

/// Assigns printable local names
#[derive(Debug, Default)]
pub struct IdManager {
    next_id: usize,
    names: HashMap<ValueId, String>,
    taken: HashSet<String>,
}

impl IdManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every local name, at the start of each function
    pub fn reset(&mut self) {
        self.next_id = 0;
        self.names.clear();
        self.taken.clear();
    }

    /// Name of `id`, assigning one on first request
    pub fn name(&mut self, id: ValueId, hint: Option<&str>) -> String {
        if let Some(name) = self.names.get(&id) {
            return name.clone();
        }

        let name = match hint {
            Some(hint) => {
                let mut candidate = hint.to_string();
                let mut suffix = 0;
                while self.taken.contains(&candidate) {
                    suffix += 1;
                    candidate = format!("{}{}", hint, suffix);
                }
                candidate
            }
            None => {
                let id = self.next_id;
                self.next_id += 1;
                id.to_string()
            }
        };

        self.taken.insert(name.clone());
        self.names.insert(id, name.clone());
        name
    }

    pub fn get(&self, id: ValueId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }
}

struct Printer<'a> {
    module: &'a Module,
    ids: IdManager,
}

impl<'a> Printer<'a> {
    fn new(module: &'a Module) -> Self {
        Self {
            module,
            ids: IdManager::new(),
        }
    }

    fn hint(&self, id: ValueId) -> Option<&'a str> {
        let module: &'a Module = self.module;
        let graph = &module.graph;
        match graph.kind(id) {
            ValueKind::ArgRef { name, .. } => Some(name),
            ValueKind::Block(data) => data.name.as_deref(),
            ValueKind::Inst(_) => graph.alloca_name(id),
            _ => None,
        }
    }

    /// Number every local value of `func` in layout order
    fn assign_names(&mut self, func: ValueId) {
        self.ids.reset();
        let module: &'a Module = self.module;
        let graph = &module.graph;

        for &arg in &graph.function(func).args {
            let hint = self.hint(arg);
            self.ids.name(arg, hint);
        }
        // Labels are taken before locals so a block keeps its own name
        let blocks = graph.function_blocks(func);
        for &block in &blocks {
            if let Some(hint) = self.hint(block) {
                self.ids.name(block, Some(hint));
            }
        }
        for &block in &blocks {
            let hint = self.hint(block);
            self.ids.name(block, hint);
            for &inst in &graph.block(block).insts {
                if !graph.ty(inst).is_void() {
                    let hint = self.hint(inst);
                    self.ids.name(inst, hint);
                }
            }
        }
    }

    fn operand(&self, value: Option<ValueId>) -> String {
        let Some(value) = value else {
            return "<null>".to_string();
        };

        match self.module.graph.kind(value) {
            ValueKind::ConstInt(n) => n.to_string(),
            ValueKind::ConstStr(s) => format!("{:?}", s),
            ValueKind::Global { name } => format!("@{}", name),
            ValueKind::Function(data) => format!("@{}", data.name),
            _ => match self.ids.get(value) {
                Some(name) => format!("%{}", name),
                None => format!("%<{}>", value),
            },
        }
    }

    fn typed(&self, value: Option<ValueId>) -> String {
        match value {
            Some(v) => format!("{} {}", self.module.graph.ty(v), self.operand(Some(v))),
            None => self.operand(None),
        }
    }

    fn instruction(&self, inst: ValueId) -> String {
        let graph = &self.module.graph;
        let data = graph.inst(inst);
        let ops = graph.operands(inst);
        let op = |i: usize| ops.get(i).copied().flatten();
        let ty = graph.ty(inst);

        let body = match data.opcode {
            Opcode::Alloca => {
                let pointee = ty.pointee().map(|t| t.to_string()).unwrap_or_default();
                format!("alloca {}", pointee)
            }
            Opcode::Load => format!("load {}, {}", ty, self.typed(op(0))),
            Opcode::Store => format!("store {}, {}", self.typed(op(0)), self.typed(op(1))),
            Opcode::ICmp => {
                let pred = graph
                    .icmp_predicate(inst)
                    .map(|p| p.to_string())
                    .unwrap_or_default();
                format!("icmp {} {}, {}", pred, self.typed(op(0)), self.operand(op(1)))
            }
            Opcode::Trunc | Opcode::ZExt | Opcode::SExt => {
                format!("{} {} to {}", data.opcode, self.typed(op(0)), ty)
            }
            Opcode::Call => {
                let args: Vec<String> = (1..ops.len()).map(|i| self.typed(op(i))).collect();
                format!("call {} {}({})", ty, self.operand(op(0)), args.join(", "))
            }
            Opcode::Jmp => format!("jmp label {}", self.operand(op(0))),
            Opcode::Br => format!(
                "br {}, label {}, label {}",
                self.typed(op(0)),
                self.operand(op(1)),
                self.operand(op(2))
            ),
            Opcode::Ret => match op(0) {
                Some(v) => format!("ret {}", self.typed(Some(v))),
                None => "ret void".to_string(),
            },
            binary => format!(
                "{} {} {}, {}",
                binary,
                ty,
                self.operand(op(0)),
                self.operand(op(1))
            ),
        };

        if ty.is_void() {
            body
        } else {
            format!("{} = {}", self.operand(Some(inst)), body)
        }
    }

    fn global(&self, out: &mut impl Write, global: ValueId) -> fmt::Result {
        let graph = &self.module.graph;
        let ValueKind::Global { name } = graph.kind(global) else {
            return Ok(());
        };
        let storage = graph
            .ty(global)
            .pointee()
            .map(|t| t.to_string())
            .unwrap_or_default();

        match graph.operand(global, 0) {
            Some(init) => {
                let init = self.operand(Some(init));
                writeln!(out, "@{} = global {} {}", name, storage, init)
            }
            None => writeln!(out, "@{} = global {} zeroinitializer", name, storage),
        }
    }

    fn function(&mut self, out: &mut impl Write, func: ValueId) -> fmt::Result {
        self.assign_names(func);
        let module: &'a Module = self.module;
        let graph = &module.graph;

        let args: Vec<String> = graph
            .function(func)
            .args
            .iter()
            .map(|&arg| self.typed(Some(arg)))
            .collect();
        writeln!(
            out,
            "define {} @{}({}) {{",
            graph.return_type(func),
            graph.function_name(func),
            args.join(", ")
        )?;

        for (index, block) in graph.function_blocks(func).into_iter().enumerate() {
            if index > 0 {
                writeln!(out)?;
            }
            let label = self.ids.get(block).unwrap_or_default();
            let preds: Vec<String> = graph
                .use_def_preds(block)
                .into_iter()
                .map(|p| self.operand(Some(p)))
                .collect();
            if preds.is_empty() {
                writeln!(out, "{}:", label)?;
            } else {
                writeln!(out, "{}: ; preds: {}", label, preds.join(", "))?;
            }

            for &inst in &graph.block(block).insts {
                writeln!(out, "  {}", self.instruction(inst))?;
            }
        }

        writeln!(out, "}}")
    }

    fn module(&mut self, out: &mut impl Write) -> fmt::Result {
        let module: &'a Module = self.module;
        writeln!(out, "; ModuleID = '{}'", module.name)?;

        if !module.globals().is_empty() {
            writeln!(out)?;
            for &global in module.globals() {
                self.global(out, global)?;
            }
        }

        for &func in module.functions() {
            writeln!(out)?;
            self.function(out, func)?;
        }
        Ok(())
    }
}

impl Module {
    /// Render the module as text
    pub fn dump(&self) -> String {
        self.to_string()
    }

    /// Render a single function as text
    pub fn dump_function(&self, func: ValueId) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = Printer::new(self).function(&mut out, func);
        out
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Printer::new(self).module(f)
    }
}
