//! RJIT optimiser
//!
//! Pass infrastructure over the IR of `rjit-ir`:
//!
//! - `pass` - the [`FunctionPass`] trait and pass registration records
//! - `pass_manager` - dependency ordering and execution
//! - `analysis` - `BlockCalculate`, the CFG edge calculation
//! - `transforms` - `BlockMerge`, jump threading of straight-line blocks

pub use self::analysis::{BlockCalculate, BlockCalculateFactory};
pub use self::errors::PassError;
pub use self::pass::{FunctionPass, PassFactory, PassInfo};
pub use self::pass_manager::{PassManager, DEFAULT_OPT_LEVEL};
pub use self::transforms::{BlockMerge, BlockMergeFactory};

mod analysis;
mod errors;
mod pass;
mod pass_manager;
mod transforms;

use rjit_common::CompilerError;
use rjit_ir::Module;

/// Run the built-in pipeline at the given optimisation level
pub fn optimize(module: Module, opt_level: u8) -> Result<Module, CompilerError> {
    let mut manager = PassManager::new();
    manager.initialize();
    manager.set_opt_level(opt_level);
    manager.set_module(module);
    manager.run_passes()?;
    manager
        .take_module()
        .ok_or_else(|| PassError::NoModule.into())
}
