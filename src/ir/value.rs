//! The single IR node type.
//!
//! There is no per-opcode class hierarchy: every node is a [`ValueData`]
//! with an opcode tag, a result type, provenance, an ordered operand
//! list, and a tagged [`Payload`] for the few opcodes that need extra
//! fields (immediates, heap ranges, jump targets, phi incomings). The
//! static signature table in [`crate::ir::opcode`] says which payload a
//! given opcode must carry.

use crate::{
    impl_arena_ref,
    ir::{BlockRef, CmpCond, Effects, HeapRange, Opcode, OpcodeFlags, Origin, PayloadKind, Type},
};
use smallvec::SmallVec;

/// Handle of a value inside its owning Procedure's arena. Stable for
/// the Procedure's whole lifetime; never reused while the value lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValueRef(usize);

impl_arena_ref!(ValueRef, ValueData, "v");

/// Typed immediate of a `Const` node. Floats are stored as raw bits so
/// equality and hashing stay exact (NaN payloads included).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Imm {
    I32(i32),
    I64(i64),
    F32(u32),
    F64(u64),
}

impl Imm {
    pub fn from_f32(value: f32) -> Self {
        Imm::F32(value.to_bits())
    }
    pub fn from_f64(value: f64) -> Self {
        Imm::F64(value.to_bits())
    }

    pub fn ty(self) -> Type {
        match self {
            Imm::I32(_) => Type::Int32,
            Imm::I64(_) => Type::Int64,
            Imm::F32(_) => Type::Float32,
            Imm::F64(_) => Type::Float64,
        }
    }
}

impl std::fmt::Display for Imm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Imm::I32(v) => write!(f, "{v}"),
            Imm::I64(v) => write!(f, "{v}"),
            Imm::F32(bits) => write!(f, "{}", f32::from_bits(bits)),
            Imm::F64(bits) => write!(f, "{}", f64::from_bits(bits)),
        }
    }
}

/// Opcode-specific extra fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Payload {
    None,
    Imm(Imm),
    ArgIndex(u32),
    Cond(CmpCond),
    /// Range a `Load` reads or a `Store` writes.
    Memory(HeapRange),
    FenceRanges {
        read: HeapRange,
        write: HeapRange,
    },
    Target(BlockRef),
    Cond2 {
        on_true: BlockRef,
        on_false: BlockRef,
    },
    /// Incoming blocks of a `Phi`, paired 1:1 with its operands.
    Incoming(SmallVec<[BlockRef; 2]>),
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::None => PayloadKind::None,
            Payload::Imm(_) => PayloadKind::Imm,
            Payload::ArgIndex(_) => PayloadKind::ArgIndex,
            Payload::Cond(_) => PayloadKind::Cond,
            Payload::Memory(_) => PayloadKind::Memory,
            Payload::FenceRanges { .. } => PayloadKind::FenceRanges,
            Payload::Target(_) => PayloadKind::Target,
            Payload::Cond2 { .. } => PayloadKind::Cond2,
            Payload::Incoming(_) => PayloadKind::Incoming,
        }
    }
}

/// One IR graph node. Owned by its Procedure's value arena; operand
/// entries are non-owning handles into the same arena.
#[derive(Debug, Clone)]
pub struct ValueData {
    pub opcode: Opcode,
    pub ty: Type,
    pub origin: Origin,
    pub operands: SmallVec<[ValueRef; 2]>,
    pub payload: Payload,
    /// Block this value currently sits in.
    pub block: BlockRef,
    /// Number of operand references to this value, maintained by every
    /// graph mutation and cross-checked by the verifier.
    pub use_count: u32,
}

impl ValueData {
    /// The node's memory footprint: the opcode's empty static template,
    /// or the ranges stored in the payload for memory and fence
    /// opcodes.
    pub fn effects(&self) -> Effects {
        let flags = self.opcode.flags();
        match self.payload {
            Payload::Memory(range) if flags.contains(OpcodeFlags::READS_MEM) => {
                Effects::read_only(range)
            }
            Payload::Memory(range) if flags.contains(OpcodeFlags::WRITES_MEM) => {
                Effects::write_only(range)
            }
            Payload::FenceRanges { read, write } => Effects::for_fence(read, write),
            _ => Effects::none(),
        }
    }

    /// Successor blocks named by a terminator's payload.
    pub fn targets(&self) -> SmallVec<[BlockRef; 2]> {
        match &self.payload {
            Payload::Target(block) => SmallVec::from_slice(&[*block]),
            Payload::Cond2 { on_true, on_false } => SmallVec::from_slice(&[*on_true, *on_false]),
            _ => SmallVec::new(),
        }
    }
}
