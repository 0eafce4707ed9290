//! CFG edge calculation
//!
//! Rebuilds every block's predecessor and successor lists from the
//! terminators: `jmp` adds one edge, `br` two, `ret` none.

use crate::pass::{FunctionPass, PassFactory, PassInfo};
use log::trace;
use rjit_ir::{Module, ValueId};

pub const NAME: &str = "BlockCalculate";

#[derive(Debug, Default)]
pub struct BlockCalculate;

impl FunctionPass for BlockCalculate {
    fn run_on_function(&mut self, module: &mut Module, func: ValueId) -> bool {
        let graph = &mut module.graph;
        let blocks = graph.function_blocks(func);

        for &block in &blocks {
            let data = graph.block_mut(block);
            data.preds.clear();
            data.succs.clear();
        }

        for &block in &blocks {
            let Some(term) = graph.terminator(block) else {
                continue;
            };
            for target in graph.branch_targets(term) {
                graph.link_blocks(block, target);
            }
        }

        trace!(
            "Calculated CFG of @{} over {} blocks",
            graph.function_name(func),
            blocks.len()
        );
        false
    }
}

pub struct BlockCalculateFactory;

impl PassFactory for BlockCalculateFactory {
    fn create_pass(&self) -> PassInfo {
        PassInfo::new(NAME, Box::new(BlockCalculate), true, 0)
    }
}
