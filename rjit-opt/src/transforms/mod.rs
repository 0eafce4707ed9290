//! Transforms: passes that rewrite the IR

mod block_merge;

pub use block_merge::{BlockMerge, BlockMergeFactory};
