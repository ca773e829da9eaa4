//! The IR node model: types, opcodes, effects, values, blocks, and the
//! Procedure that owns them, plus the builder, verifier, and text
//! writer layered on top.

pub mod block;
pub mod builder;
pub mod checking;
pub mod cmp_cond;
pub mod opcode;
pub mod origin;
pub mod procedure;
pub mod ranges;
pub mod types;
pub mod value;
pub mod writer;

pub use self::{
    block::{BlockData, BlockRef},
    builder::ProcBuilder,
    checking::{CheckError, assert_procedure_valid, verify},
    cmp_cond::CmpCond,
    opcode::{Arity, Opcode, OpcodeFlags, OpcodeSig, OperandRule, PayloadKind, ResultRule},
    origin::Origin,
    procedure::Procedure,
    ranges::{Effects, HeapCatalog, HeapRange},
    types::{TupleTypeRef, Type},
    value::{Imm, Payload, ValueData, ValueRef},
    writer::write_procedure,
};

use thiserror::Error;

/// Construction-time IR violations: the opcode signature or a payload
/// constraint was broken. Fatal for the compilation; signals a bug in
/// whatever produced the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IrError {
    #[error("{opcode} takes {expected} operands, got {found}")]
    OperandCount { opcode: Opcode, expected: Arity, found: usize },

    #[error("operand {index} of {opcode} must be {expected}, got {found}")]
    OperandType { opcode: Opcode, index: usize, expected: &'static str, found: Type },

    #[error("{opcode} cannot produce {found}")]
    ResultType { opcode: Opcode, found: Type },

    #[error("{opcode} payload must be {expected:?}, got {found:?}")]
    PayloadKind { opcode: Opcode, expected: PayloadKind, found: PayloadKind },

    #[error("operand {operand} of {opcode} is not a live value of this procedure")]
    UnknownOperand { opcode: Opcode, operand: ValueRef },

    #[error("block {block} is not a live block of this procedure")]
    UnknownBlock { block: BlockRef },

    #[error("const of type {ty} carries a {imm_ty} immediate")]
    ImmTypeMismatch { ty: Type, imm_ty: Type },

    #[error("argument index {index} out of range for {count} parameters")]
    ArgumentOutOfRange { index: u32, count: usize },

    #[error("argument {index} is declared {expected}, node says {found}")]
    ArgumentType { index: u32, expected: Type, found: Type },

    #[error("phi has {operands} operands but {incoming} incoming blocks")]
    PhiIncomingCount { operands: usize, incoming: usize },

    #[error("{value} still has {use_count} uses")]
    StillReferenced { value: ValueRef, use_count: u32 },

    #[error("{value} is a {opcode}, not a phi")]
    NotAPhi { value: ValueRef, opcode: Opcode },

    #[error("block {block} is already an incoming edge of {phi}")]
    DuplicateIncoming { phi: ValueRef, block: BlockRef },
}
