//! IR Instructions
//!
//! Instruction accessors over the value graph and the comparison predicates.
//!
//! Operand layouts:
//! - binary, `icmp`: `[lhs, rhs]`
//! - casts, `load`: `[value]` / `[ptr]`
//! - `store`: `[value, ptr]`
//! - `jmp`: `[target]`, `br`: `[cond, then, else]`, `ret`: `[value?]`
//! - `call`: `[callee, args...]`

use crate::opcode::Opcode;
use crate::usedef::{ValueGraph, ValueId};
use crate::value::{InstAttr, InstData, ValueKind};
use std::fmt;

/// Integer comparison predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ICmpPredicate {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
    Ult,
    Ule,
    Ugt,
    Uge,
}

impl ICmpPredicate {
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            ICmpPredicate::Slt | ICmpPredicate::Sle | ICmpPredicate::Sgt | ICmpPredicate::Sge
        )
    }
}

impl fmt::Display for ICmpPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ICmpPredicate::Eq => "eq",
            ICmpPredicate::Ne => "ne",
            ICmpPredicate::Slt => "slt",
            ICmpPredicate::Sle => "sle",
            ICmpPredicate::Sgt => "sgt",
            ICmpPredicate::Sge => "sge",
            ICmpPredicate::Ult => "ult",
            ICmpPredicate::Ule => "ule",
            ICmpPredicate::Ugt => "ugt",
            ICmpPredicate::Uge => "uge",
        };
        write!(f, "{}", name)
    }
}

impl ValueGraph {
    pub fn is_inst(&self, id: ValueId) -> bool {
        matches!(self.kind(id), ValueKind::Inst(_))
    }

    pub fn inst(&self, id: ValueId) -> &InstData {
        match self.kind(id) {
            ValueKind::Inst(data) => data,
            other => panic!("{} is not an instruction: {:?}", id, other),
        }
    }

    pub fn inst_mut(&mut self, id: ValueId) -> &mut InstData {
        match &mut self.value_mut(id).kind {
            ValueKind::Inst(data) => data,
            _ => panic!("{} is not an instruction", id),
        }
    }

    pub fn opcode(&self, id: ValueId) -> Option<Opcode> {
        match self.kind(id) {
            ValueKind::Inst(data) => Some(data.opcode),
            _ => None,
        }
    }

    pub fn is_terminator(&self, id: ValueId) -> bool {
        self.opcode(id).is_some_and(Opcode::is_terminator)
    }

    /// Stack slots and globals are addresses: reading them needs a load
    pub fn is_address(&self, id: ValueId) -> bool {
        match self.kind(id) {
            ValueKind::Global { .. } => true,
            ValueKind::Inst(data) => data.opcode == Opcode::Alloca,
            _ => false,
        }
    }

    /// Readability name of an alloca
    pub fn alloca_name(&self, id: ValueId) -> Option<&str> {
        match self.kind(id) {
            ValueKind::Inst(InstData {
                attr: InstAttr::Alloca { name },
                ..
            }) => name.as_deref(),
            _ => None,
        }
    }

    pub fn icmp_predicate(&self, id: ValueId) -> Option<ICmpPredicate> {
        match self.kind(id) {
            ValueKind::Inst(InstData {
                attr: InstAttr::ICmp(pred),
                ..
            }) => Some(*pred),
            _ => None,
        }
    }

    /// Blocks a terminator transfers control to, in operand order
    pub fn branch_targets(&self, inst: ValueId) -> Vec<ValueId> {
        let operands = self.operands(inst);
        let targets: &[Option<ValueId>] = match self.opcode(inst) {
            Some(Opcode::Jmp) => &operands[..],
            Some(Opcode::Br) => operands.get(1..).unwrap_or(&[]),
            _ => &[],
        };
        targets.iter().flatten().copied().collect()
    }
}
