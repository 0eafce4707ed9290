//! Block merging
//!
//! Folds a block into its predecessor when the two are joined by an
//! unconditional jump and nothing else enters the block:
//!
//! ```text
//! %0:                          %0:
//!   ...                          ...
//!   jmp label %1                 ...
//! %1: ; preds: %0      ==>       jmp label %2
//!   ...                        %2: ; preds: %0, %3
//!   jmp label %2
//! %2: ; preds: %1, %3
//! ```
//!
//! Blocks the entry cannot reach are removed, including dead loops whose
//! blocks only enter each other. Relies on the pred/succ lists computed by `BlockCalculate` and
//! keeps them current while rewriting.

use crate::analysis::block_calc;
use crate::pass::{FunctionPass, PassFactory, PassInfo};
use log::{debug, trace};
use rjit_ir::{Module, Opcode, ValueGraph, ValueId};
use std::collections::HashSet;

pub const NAME: &str = "BlockMerge";

#[derive(Debug, Default)]
pub struct BlockMerge;

impl FunctionPass for BlockMerge {
    fn run_on_function(&mut self, module: &mut Module, func: ValueId) -> bool {
        let graph = &mut module.graph;
        let Some(entry) = graph.entry_block(func) else {
            return false;
        };

        let mut changed = false;
        while merge_round(graph, func, entry) {
            changed = true;
        }
        if changed {
            debug!(
                "Merged @{} down to {} blocks",
                graph.function_name(func),
                graph.function_blocks(func).len()
            );
        }
        changed
    }
}

/// One scan over the function's blocks
fn merge_round(graph: &mut ValueGraph, func: ValueId, entry: ValueId) -> bool {
    let mut changed = false;
    let live = reachable(graph, entry);

    for block in graph.function_blocks(func) {
        if block == entry || graph.block_slot(func, block).is_none() {
            continue;
        }
        if !live.contains(&block) {
            remove_unreachable(graph, func, block);
            changed = true;
            continue;
        }

        let preds = graph.block(block).preds.clone();
        match preds.as_slice() {
            &[pred] if can_merge(graph, pred, block) => {
                merge_into(graph, func, pred, block);
                changed = true;
            }
            _ => {}
        }
    }

    if changed {
        graph.remove_value(func, None);
        if let Some(position) = graph.block_slot(func, entry) {
            if position != 0 {
                graph.move_block(func, entry, 0);
            }
        }
    }
    changed
}

/// Blocks reachable from `entry` along the succ lists
fn reachable(graph: &ValueGraph, entry: ValueId) -> HashSet<ValueId> {
    let mut seen = HashSet::from([entry]);
    let mut stack = vec![entry];
    while let Some(block) = stack.pop() {
        for &succ in &graph.block(block).succs {
            if seen.insert(succ) {
                stack.push(succ);
            }
        }
    }
    seen
}

fn can_merge(graph: &ValueGraph, pred: ValueId, block: ValueId) -> bool {
    pred != block
        && graph.block(pred).succs == [block]
        && graph
            .terminator(pred)
            .and_then(|term| graph.opcode(term))
            == Some(Opcode::Jmp)
}

fn remove_unreachable(graph: &mut ValueGraph, func: ValueId, block: ValueId) {
    trace!("Removing unreachable block {}", block);

    for succ in std::mem::take(&mut graph.block_mut(block).succs) {
        graph.block_mut(succ).preds.retain(|&p| p != block);
    }
    if let Some(slot) = graph.block_slot(func, block) {
        graph.set_operand(func, slot, None);
    }
    for inst in std::mem::take(&mut graph.block_mut(block).insts) {
        graph.drop_operands(inst);
    }
    graph.drop_operands(block);
    graph.remove_from_users(block);
}

/// Splice `block` onto the end of `pred`, which currently jumps to it
fn merge_into(graph: &mut ValueGraph, func: ValueId, pred: ValueId, block: ValueId) {
    trace!("Merging block {} into {}", block, pred);

    if let Some(jump) = graph.terminator(pred) {
        graph.drop_operands(jump);
        graph.block_mut(pred).insts.pop();
    }

    let insts = std::mem::take(&mut graph.block_mut(block).insts);
    for &inst in &insts {
        graph.inst_mut(inst).parent = pred;
    }
    graph.block_mut(pred).insts.extend(insts);

    let succs = std::mem::take(&mut graph.block_mut(block).succs);
    for &succ in &succs {
        let preds = &mut graph.block_mut(succ).preds;
        for p in preds.iter_mut() {
            if *p == block {
                *p = pred;
            }
        }
        let mut seen = Vec::with_capacity(preds.len());
        preds.retain(|&p| {
            if seen.contains(&p) {
                false
            } else {
                seen.push(p);
                true
            }
        });
    }
    graph.block_mut(pred).succs = succs;
    graph.block_mut(block).preds.clear();

    if let Some(slot) = graph.block_slot(func, block) {
        graph.set_operand(func, slot, None);
    }
    graph.drop_operands(block);
    graph.replace_by(block, pred);
}

pub struct BlockMergeFactory;

impl PassFactory for BlockMergeFactory {
    fn create_pass(&self) -> PassInfo {
        PassInfo::new(NAME, Box::new(BlockMerge), false, 1).requires(block_calc::NAME)
    }
}
