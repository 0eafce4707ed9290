//! Function Definitions
//!
//! A function is a user whose operands are its blocks, the first one being
//! the entry. Block slots may be nulled by transforms and purged afterwards.

use crate::usedef::{ValueGraph, ValueId};
use crate::value::{FunctionData, ValueKind};
use rjit_common::Type;

impl ValueGraph {
    pub fn is_function(&self, id: ValueId) -> bool {
        matches!(self.kind(id), ValueKind::Function(_))
    }

    pub fn function(&self, id: ValueId) -> &FunctionData {
        match self.kind(id) {
            ValueKind::Function(data) => data,
            other => panic!("{} is not a function: {:?}", id, other),
        }
    }

    pub fn function_name(&self, id: ValueId) -> &str {
        &self.function(id).name
    }

    pub fn return_type(&self, func: ValueId) -> Type {
        self.ty(func).return_type().cloned().unwrap_or(Type::Void)
    }

    /// Live blocks in layout order
    pub fn function_blocks(&self, func: ValueId) -> Vec<ValueId> {
        self.operands(func).into_iter().flatten().collect()
    }

    pub fn entry_block(&self, func: ValueId) -> Option<ValueId> {
        self.operand(func, 0)
    }

    /// Slot index of a block in its function's operand list
    pub fn block_slot(&self, func: ValueId, block: ValueId) -> Option<usize> {
        self.operands(func).iter().position(|&b| b == Some(block))
    }

    /// Move a block to the given layout position
    pub fn move_block(&mut self, func: ValueId, block: ValueId, position: usize) {
        let mut blocks = self.operands(func);
        let Some(from) = blocks.iter().position(|&b| b == Some(block)) else {
            return;
        };
        let moved = blocks.remove(from);
        let position = position.min(blocks.len());
        blocks.insert(position, moved);

        // Rewrite slots in place so each keeps its use record
        for (index, value) in blocks.into_iter().enumerate() {
            self.set_operand(func, index, value);
        }
    }
}
