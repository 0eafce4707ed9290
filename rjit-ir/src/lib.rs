//! RJIT intermediate representation
//!
//! An SSA-oriented, control-flow-graph-structured IR built on a use-def graph,
//! plus the lowering from the typed AST.
//!
//! ## Architecture
//!
//! - `usedef` - value arena, use edges and rewrite primitives
//! - `value` - the kinds of values (constants, arguments, globals, containers, instructions)
//! - `opcode` - opcode numbering and metadata table
//! - `instructions`, `blocks`, `function` - typed accessors over the arena
//! - `module` - module state: symbols, source contexts, diagnostics
//! - `builder` - instruction creation API with alloca hoisting
//! - `dump` - textual IR
//! - `lower` - typed AST to IR

pub use self::builder::common_type;
pub use self::dump::IdManager;
pub use self::errors::LowerError;
pub use self::instructions::ICmpPredicate;
pub use self::lower::{lower_translation_unit, IrBuilder};
pub use self::module::{FunctionState, InsertPoint, Module};
pub use self::opcode::{Opcode, OpcodeFamily, OpcodeInfo};
pub use self::usedef::{Use, UseId, ValueData, ValueGraph, ValueId};
pub use self::value::{BlockData, FunctionData, InstAttr, InstData, ValueKind};

mod blocks;
mod builder;
mod dump;
mod errors;
mod function;
mod instructions;
mod lower;
mod module;
mod opcode;
mod usedef;
mod value;
