//! Analyses: passes that compute derived facts without changing the IR

pub(crate) mod block_calc;

pub use block_calc::{BlockCalculate, BlockCalculateFactory};
