//! Value representations
//!
//! The closed set of things an IR value can be. Containers (functions and
//! blocks) are users too: a function's operands are its blocks, a block's
//! operands are the blocks that jump to it.

use crate::instructions::ICmpPredicate;
use crate::opcode::Opcode;
use crate::usedef::ValueId;

#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    /// Integer constant of the value's type
    ConstInt(i64),
    /// String constant
    ConstStr(String),
    /// Formal argument of a function
    ArgRef { index: usize, name: String },
    /// Module-level variable; its single operand is the initializer
    Global { name: String },
    Function(FunctionData),
    Block(BlockData),
    Inst(InstData),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionData {
    pub name: String,
    pub args: Vec<ValueId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockData {
    pub name: Option<String>,
    pub insts: Vec<ValueId>,
    /// Derived CFG edges, filled by the block calculation pass
    pub preds: Vec<ValueId>,
    pub succs: Vec<ValueId>,
    pub parent: ValueId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstData {
    pub opcode: Opcode,
    pub parent: ValueId,
    pub attr: InstAttr,
}

/// Opcode specific payload
#[derive(Debug, Clone, PartialEq)]
pub enum InstAttr {
    None,
    Alloca { name: Option<String> },
    ICmp(ICmpPredicate),
}
