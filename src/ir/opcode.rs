//! The opcode catalogue and its static signature table.
//!
//! One table drives everything: construction checks, the verifier, and
//! the passes all consult [`Opcode::signature`] instead of dispatching
//! on per-opcode node kinds. The catalogue is a usable JIT-tier subset,
//! not a full production set.

use crate::ir::Type;
use bitflags::bitflags;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Opcode {
    // Rewrite markers left behind by passes until the next sweep.
    Nop, Identity,
    // Leaves.
    Const, Argument,
    // Integer arithmetic and bitwise.
    Add, Sub, Mul, Neg,
    BitAnd, BitOr, BitXor, Shl, Lshr, Ashr,
    Icmp, Select,
    // Memory.
    Load, Store, Fence,
    // Terminators.
    Jump, Branch, Return, Unreachable,
    Phi,
}

bitflags! {
    /// Static per-opcode traits consulted by verifier and passes.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct OpcodeFlags: u8 {
        /// Ends its block; never has uses, never moves.
        const TERMINATOR = 1 << 0;
        /// Empty static effects template.
        const PURE       = 1 << 1;
        /// Reads the heap range stored in the payload.
        const READS_MEM  = 1 << 2;
        /// Writes the heap range stored in the payload.
        const WRITES_MEM = 1 << 3;
        /// Memory barrier; both ranges come from the payload.
        const FENCE      = 1 << 4;
        /// Operands pair with incoming blocks; lives in the leading
        /// segment of its block.
        const PHI        = 1 << 5;
    }
}

/// How many operands an opcode takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtMost(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn admits(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::AtMost(n) => count <= n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "exactly {n}"),
            Arity::AtMost(n) => write!(f, "at most {n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

/// Type constraints over the operand list as a whole.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandRule {
    /// No operands, nothing to check.
    None,
    /// Every operand has exactly the result type.
    AllSameAsResult,
    /// Two integer operands of one common type (`Icmp`).
    IntPair,
    /// `[cond: i32, then: result type, else: result type]` (`Select`).
    CondThenArms,
    /// `[address: i64]` (`Load`).
    Address,
    /// `[value: scalar, address: i64]` (`Store`).
    ValueThenAddress,
    /// `[cond: i32]` (`Branch`).
    Cond,
    /// Empty, or one scalar operand (`Return`).
    OptionalScalar,
}

/// What result type an opcode may declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultRule {
    Void,
    Int,
    Scalar,
    NonVoid,
    FixedInt32,
}

/// Which payload variant a node of this opcode must carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadKind {
    None,
    Imm,
    ArgIndex,
    Cond,
    Memory,
    FenceRanges,
    Target,
    Cond2,
    Incoming,
}

#[derive(Clone, Copy, Debug)]
pub struct OpcodeSig {
    pub arity: Arity,
    pub operands: OperandRule,
    pub result: ResultRule,
    pub payload: PayloadKind,
    pub flags: OpcodeFlags,
}

impl ResultRule {
    pub fn admits(self, ty: Type) -> bool {
        match self {
            ResultRule::Void => ty.is_void(),
            ResultRule::Int => ty.is_int(),
            ResultRule::Scalar => ty.is_scalar(),
            ResultRule::NonVoid => !ty.is_void(),
            ResultRule::FixedInt32 => ty == Type::Int32,
        }
    }
}

impl Opcode {
    pub fn signature(self) -> OpcodeSig {
        use Opcode::*;
        let (arity, operands, result, payload, flags) = match self {
            Nop => (Arity::Exact(0), OperandRule::None, ResultRule::Void, PayloadKind::None, OpcodeFlags::PURE),
            Identity => (Arity::Exact(1), OperandRule::AllSameAsResult, ResultRule::NonVoid, PayloadKind::None, OpcodeFlags::PURE),

            Const => (Arity::Exact(0), OperandRule::None, ResultRule::Scalar, PayloadKind::Imm, OpcodeFlags::PURE),
            Argument => (Arity::Exact(0), OperandRule::None, ResultRule::Scalar, PayloadKind::ArgIndex, OpcodeFlags::PURE),

            Add | Sub | Mul | BitAnd | BitOr | BitXor | Shl | Lshr | Ashr => {
                (Arity::Exact(2), OperandRule::AllSameAsResult, ResultRule::Int, PayloadKind::None, OpcodeFlags::PURE)
            }
            Neg => (Arity::Exact(1), OperandRule::AllSameAsResult, ResultRule::Int, PayloadKind::None, OpcodeFlags::PURE),
            Icmp => (Arity::Exact(2), OperandRule::IntPair, ResultRule::FixedInt32, PayloadKind::Cond, OpcodeFlags::PURE),
            Select => (Arity::Exact(3), OperandRule::CondThenArms, ResultRule::Scalar, PayloadKind::None, OpcodeFlags::PURE),

            Load => (Arity::Exact(1), OperandRule::Address, ResultRule::Scalar, PayloadKind::Memory, OpcodeFlags::READS_MEM),
            Store => (Arity::Exact(2), OperandRule::ValueThenAddress, ResultRule::Void, PayloadKind::Memory, OpcodeFlags::WRITES_MEM),
            Fence => (Arity::Exact(0), OperandRule::None, ResultRule::Void, PayloadKind::FenceRanges, OpcodeFlags::FENCE),

            Jump => (Arity::Exact(0), OperandRule::None, ResultRule::Void, PayloadKind::Target, OpcodeFlags::TERMINATOR),
            Branch => (Arity::Exact(1), OperandRule::Cond, ResultRule::Void, PayloadKind::Cond2, OpcodeFlags::TERMINATOR),
            Return => (Arity::AtMost(1), OperandRule::OptionalScalar, ResultRule::Void, PayloadKind::None, OpcodeFlags::TERMINATOR),
            Unreachable => (Arity::Exact(0), OperandRule::None, ResultRule::Void, PayloadKind::None, OpcodeFlags::TERMINATOR),

            Phi => (Arity::AtLeast(0), OperandRule::AllSameAsResult, ResultRule::NonVoid, PayloadKind::Incoming, OpcodeFlags::PURE.union(OpcodeFlags::PHI)),
        };
        OpcodeSig { arity, operands, result, payload, flags }
    }

    pub fn flags(self) -> OpcodeFlags {
        self.signature().flags
    }

    pub fn is_terminator(self) -> bool {
        self.flags().contains(OpcodeFlags::TERMINATOR)
    }
    pub fn is_pure(self) -> bool {
        self.flags().contains(OpcodeFlags::PURE)
    }
    pub fn is_fence(self) -> bool {
        self.flags().contains(OpcodeFlags::FENCE)
    }
    pub fn is_phi(self) -> bool {
        self.flags().contains(OpcodeFlags::PHI)
    }
    /// Whether effects come from the node payload rather than the
    /// empty static template.
    pub fn touches_memory(self) -> bool {
        self.flags()
            .intersects(OpcodeFlags::READS_MEM | OpcodeFlags::WRITES_MEM | OpcodeFlags::FENCE)
    }

    pub fn mnemonic(self) -> &'static str {
        use Opcode::*;
        match self {
            Nop => "nop",
            Identity => "identity",
            Const => "const",
            Argument => "argument",
            Add => "add",
            Sub => "sub",
            Mul => "mul",
            Neg => "neg",
            BitAnd => "and",
            BitOr => "or",
            BitXor => "xor",
            Shl => "shl",
            Lshr => "lshr",
            Ashr => "ashr",
            Icmp => "icmp",
            Select => "select",
            Load => "load",
            Store => "store",
            Fence => "fence",
            Jump => "jump",
            Branch => "br",
            Return => "ret",
            Unreachable => "unreachable",
            Phi => "phi",
        }
    }

    pub const ALL: [Opcode; 24] = {
        use Opcode::*;
        [
            Nop, Identity, Const, Argument, Add, Sub, Mul, Neg, BitAnd, BitOr, BitXor, Shl,
            Lshr, Ashr, Icmp, Select, Load, Store, Fence, Jump, Branch, Return, Unreachable, Phi,
        ]
    };
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}
