//! Opcode table
//!
//! Opcodes are numbered in contiguous ranges, one per family, so that
//! classification is a range check. Per-opcode metadata lives in a static
//! table indexed by the opcode.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Opcode {
    // TermOps
    Ret,
    Br,
    Jmp,
    // BinaryOps
    Add,
    Sub,
    Mul,
    UDiv,
    SDiv,
    URem,
    SRem,
    Shl,
    LShr,
    AShr,
    And,
    Or,
    Xor,
    // MemoryOps
    Alloca,
    Load,
    Store,
    // CastOps
    Trunc,
    ZExt,
    SExt,
    // OtherOps
    ICmp,
    Call,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeFamily {
    Term,
    Binary,
    Memory,
    Cast,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeInfo {
    pub mnemonic: &'static str,
    /// Maximum operand count, `None` for variadic instructions
    pub arity: Option<usize>,
    pub family: OpcodeFamily,
}

const fn info(mnemonic: &'static str, arity: Option<usize>, family: OpcodeFamily) -> OpcodeInfo {
    OpcodeInfo {
        mnemonic,
        arity,
        family,
    }
}

use OpcodeFamily::*;

static OPCODE_TABLE: [OpcodeInfo; 24] = [
    info("ret", Some(1), Term),
    info("br", Some(3), Term),
    info("jmp", Some(1), Term),
    info("add", Some(2), Binary),
    info("sub", Some(2), Binary),
    info("mul", Some(2), Binary),
    info("udiv", Some(2), Binary),
    info("sdiv", Some(2), Binary),
    info("urem", Some(2), Binary),
    info("srem", Some(2), Binary),
    info("shl", Some(2), Binary),
    info("lshr", Some(2), Binary),
    info("ashr", Some(2), Binary),
    info("and", Some(2), Binary),
    info("or", Some(2), Binary),
    info("xor", Some(2), Binary),
    info("alloca", Some(0), Memory),
    info("load", Some(1), Memory),
    info("store", Some(2), Memory),
    info("trunc", Some(1), Cast),
    info("zext", Some(1), Cast),
    info("sext", Some(1), Cast),
    info("icmp", Some(2), Other),
    info("call", None, Other),
];

const TERM_BEGIN: u8 = Opcode::Ret as u8;
const TERM_END: u8 = Opcode::Jmp as u8;
const BINARY_BEGIN: u8 = Opcode::Add as u8;
const BINARY_END: u8 = Opcode::Xor as u8;
const SHIFT_BEGIN: u8 = Opcode::Shl as u8;
const SHIFT_END: u8 = Opcode::AShr as u8;
const MEMORY_BEGIN: u8 = Opcode::Alloca as u8;
const MEMORY_END: u8 = Opcode::Store as u8;
const CAST_BEGIN: u8 = Opcode::Trunc as u8;
const CAST_END: u8 = Opcode::SExt as u8;

impl Opcode {
    pub fn info(self) -> &'static OpcodeInfo {
        &OPCODE_TABLE[self as usize]
    }

    pub fn mnemonic(self) -> &'static str {
        self.info().mnemonic
    }

    pub fn arity(self) -> Option<usize> {
        self.info().arity
    }

    pub fn family(self) -> OpcodeFamily {
        self.info().family
    }

    pub fn is_terminator(self) -> bool {
        (TERM_BEGIN..=TERM_END).contains(&(self as u8))
    }

    pub fn is_binary_op(self) -> bool {
        (BINARY_BEGIN..=BINARY_END).contains(&(self as u8))
    }

    pub fn is_shift(self) -> bool {
        (SHIFT_BEGIN..=SHIFT_END).contains(&(self as u8))
    }

    pub fn is_logical_shift(self) -> bool {
        matches!(self, Opcode::Shl | Opcode::LShr)
    }

    pub fn is_arithmetic_shift(self) -> bool {
        self == Opcode::AShr
    }

    pub fn is_memory_op(self) -> bool {
        (MEMORY_BEGIN..=MEMORY_END).contains(&(self as u8))
    }

    pub fn is_cast(self) -> bool {
        (CAST_BEGIN..=CAST_END).contains(&(self as u8))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}
