//! Basic Block Management
//!
//! A block is a user whose operands are the blocks that jump to it. It also
//! owns its ordered instruction list and the derived pred/succ sets.

use crate::usedef::{ValueGraph, ValueId};
use crate::value::{BlockData, ValueKind};

impl ValueGraph {
    pub fn is_block(&self, id: ValueId) -> bool {
        matches!(self.kind(id), ValueKind::Block(_))
    }

    pub fn block(&self, id: ValueId) -> &BlockData {
        match self.kind(id) {
            ValueKind::Block(data) => data,
            other => panic!("{} is not a block: {:?}", id, other),
        }
    }

    pub fn block_mut(&mut self, id: ValueId) -> &mut BlockData {
        match &mut self.value_mut(id).kind {
            ValueKind::Block(data) => data,
            _ => panic!("{} is not a block", id),
        }
    }

    /// The block's last instruction if it is a terminator
    pub fn terminator(&self, block: ValueId) -> Option<ValueId> {
        self.block(block)
            .insts
            .last()
            .copied()
            .filter(|&inst| self.is_terminator(inst))
    }

    pub fn has_terminator(&self, block: ValueId) -> bool {
        self.terminator(block).is_some()
    }

    /// Predecessors recorded in the use-def graph: every block whose
    /// jump or branch targets this one
    pub fn use_def_preds(&self, block: ValueId) -> Vec<ValueId> {
        self.operands(block).into_iter().flatten().collect()
    }

    /// Add a derived CFG edge `from -> to`, on both ends, without duplicates
    pub fn link_blocks(&mut self, from: ValueId, to: ValueId) {
        let succs = &mut self.block_mut(from).succs;
        if !succs.contains(&to) {
            succs.push(to);
        }
        let preds = &mut self.block_mut(to).preds;
        if !preds.contains(&from) {
            preds.push(from);
        }
    }
}
