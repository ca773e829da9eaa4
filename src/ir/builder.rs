//! Convenience layer for emitting IR in program order.
//!
//! `ProcBuilder` keeps a focus block and a current origin so front-end
//! loops stay short; every helper is a thin wrapper over
//! [`Procedure::append_full`] and reports the same signature errors.

use crate::ir::{
    BlockRef, CmpCond, HeapRange, Imm, IrError, Opcode, Origin, Payload, Procedure, Type,
    ValueRef,
};
use smallvec::SmallVec;
use smol_str::SmolStr;

pub struct ProcBuilder {
    proc: Procedure,
    block: BlockRef,
    origin: Origin,
}

impl ProcBuilder {
    /// Fresh procedure with its entry block focused.
    pub fn new(name: impl Into<SmolStr>, arg_types: Vec<Type>) -> Self {
        let mut proc = Procedure::new(name, arg_types);
        let entry = proc.add_block();
        ProcBuilder { proc, block: entry, origin: Origin::none() }
    }

    pub fn add_block(&mut self) -> BlockRef {
        self.proc.add_block()
    }

    /// Focus `block`; later emits append there.
    pub fn switch_to(&mut self, block: BlockRef) {
        self.block = block;
    }

    pub fn current_block(&self) -> BlockRef {
        self.block
    }

    /// Origin stamped on everything emitted until the next call.
    pub fn set_origin(&mut self, origin: Origin) {
        self.origin = origin;
    }

    pub fn proc(&self) -> &Procedure {
        &self.proc
    }

    pub fn finish(self) -> Procedure {
        self.proc
    }

    fn emit(
        &mut self,
        opcode: Opcode,
        ty: Type,
        operands: &[ValueRef],
        payload: Payload,
    ) -> Result<ValueRef, IrError> {
        self.proc.append_full(self.block, opcode, ty, self.origin, operands, payload)
    }

    /* ---------------- leaves ---------------- */

    pub fn const32(&mut self, value: i32) -> Result<ValueRef, IrError> {
        self.emit(Opcode::Const, Type::Int32, &[], Payload::Imm(Imm::I32(value)))
    }
    pub fn const64(&mut self, value: i64) -> Result<ValueRef, IrError> {
        self.emit(Opcode::Const, Type::Int64, &[], Payload::Imm(Imm::I64(value)))
    }
    pub fn const_f32(&mut self, value: f32) -> Result<ValueRef, IrError> {
        self.emit(Opcode::Const, Type::Float32, &[], Payload::Imm(Imm::from_f32(value)))
    }
    pub fn const_f64(&mut self, value: f64) -> Result<ValueRef, IrError> {
        self.emit(Opcode::Const, Type::Float64, &[], Payload::Imm(Imm::from_f64(value)))
    }

    pub fn argument(&mut self, index: u32) -> Result<ValueRef, IrError> {
        let count = self.proc.arg_types().len();
        let Some(&ty) = self.proc.arg_types().get(index as usize) else {
            return Err(IrError::ArgumentOutOfRange { index, count });
        };
        self.emit(Opcode::Argument, ty, &[], Payload::ArgIndex(index))
    }

    /* ---------------- arithmetic ---------------- */

    fn binary(&mut self, opcode: Opcode, a: ValueRef, b: ValueRef) -> Result<ValueRef, IrError> {
        let ty = self.proc.value(a).ty;
        self.emit(opcode, ty, &[a, b], Payload::None)
    }

    pub fn add(&mut self, a: ValueRef, b: ValueRef) -> Result<ValueRef, IrError> {
        self.binary(Opcode::Add, a, b)
    }
    pub fn sub(&mut self, a: ValueRef, b: ValueRef) -> Result<ValueRef, IrError> {
        self.binary(Opcode::Sub, a, b)
    }
    pub fn mul(&mut self, a: ValueRef, b: ValueRef) -> Result<ValueRef, IrError> {
        self.binary(Opcode::Mul, a, b)
    }
    pub fn bit_and(&mut self, a: ValueRef, b: ValueRef) -> Result<ValueRef, IrError> {
        self.binary(Opcode::BitAnd, a, b)
    }
    pub fn bit_or(&mut self, a: ValueRef, b: ValueRef) -> Result<ValueRef, IrError> {
        self.binary(Opcode::BitOr, a, b)
    }
    pub fn bit_xor(&mut self, a: ValueRef, b: ValueRef) -> Result<ValueRef, IrError> {
        self.binary(Opcode::BitXor, a, b)
    }
    pub fn shl(&mut self, a: ValueRef, b: ValueRef) -> Result<ValueRef, IrError> {
        self.binary(Opcode::Shl, a, b)
    }
    pub fn lshr(&mut self, a: ValueRef, b: ValueRef) -> Result<ValueRef, IrError> {
        self.binary(Opcode::Lshr, a, b)
    }
    pub fn ashr(&mut self, a: ValueRef, b: ValueRef) -> Result<ValueRef, IrError> {
        self.binary(Opcode::Ashr, a, b)
    }

    pub fn neg(&mut self, a: ValueRef) -> Result<ValueRef, IrError> {
        let ty = self.proc.value(a).ty;
        self.emit(Opcode::Neg, ty, &[a], Payload::None)
    }

    pub fn icmp(&mut self, cond: CmpCond, a: ValueRef, b: ValueRef) -> Result<ValueRef, IrError> {
        self.emit(Opcode::Icmp, Type::Int32, &[a, b], Payload::Cond(cond))
    }

    pub fn select(
        &mut self,
        cond: ValueRef,
        on_true: ValueRef,
        on_false: ValueRef,
    ) -> Result<ValueRef, IrError> {
        let ty = self.proc.value(on_true).ty;
        self.emit(Opcode::Select, ty, &[cond, on_true, on_false], Payload::None)
    }

    /* ---------------- memory ---------------- */

    pub fn load(&mut self, ty: Type, addr: ValueRef, range: HeapRange) -> Result<ValueRef, IrError> {
        self.emit(Opcode::Load, ty, &[addr], Payload::Memory(range))
    }

    pub fn store(
        &mut self,
        value: ValueRef,
        addr: ValueRef,
        range: HeapRange,
    ) -> Result<ValueRef, IrError> {
        self.emit(Opcode::Store, Type::Void, &[value, addr], Payload::Memory(range))
    }

    /// Full barrier: read and write ranges both `top`.
    pub fn fence(&mut self) -> Result<ValueRef, IrError> {
        self.emit(Opcode::Fence, Type::Void, &[], Payload::None)
    }

    /// Scoped barrier ordering only accesses overlapping the given
    /// ranges.
    pub fn fence_scoped(&mut self, read: HeapRange, write: HeapRange) -> Result<ValueRef, IrError> {
        self.emit(Opcode::Fence, Type::Void, &[], Payload::FenceRanges { read, write })
    }

    /* ---------------- control flow ---------------- */

    pub fn jump(&mut self, target: BlockRef) -> Result<ValueRef, IrError> {
        self.emit(Opcode::Jump, Type::Void, &[], Payload::Target(target))
    }

    pub fn branch(
        &mut self,
        cond: ValueRef,
        on_true: BlockRef,
        on_false: BlockRef,
    ) -> Result<ValueRef, IrError> {
        self.emit(Opcode::Branch, Type::Void, &[cond], Payload::Cond2 { on_true, on_false })
    }

    pub fn ret(&mut self, value: ValueRef) -> Result<ValueRef, IrError> {
        self.emit(Opcode::Return, Type::Void, &[value], Payload::None)
    }
    pub fn ret_void(&mut self) -> Result<ValueRef, IrError> {
        self.emit(Opcode::Return, Type::Void, &[], Payload::None)
    }
    pub fn unreachable(&mut self) -> Result<ValueRef, IrError> {
        self.emit(Opcode::Unreachable, Type::Void, &[], Payload::None)
    }

    /* ---------------- phis ---------------- */

    /// Empty phi; pair incomings on with [`ProcBuilder::phi_incoming`].
    pub fn phi(&mut self, ty: Type) -> Result<ValueRef, IrError> {
        self.emit(Opcode::Phi, ty, &[], Payload::Incoming(SmallVec::new()))
    }

    pub fn phi_incoming(
        &mut self,
        phi: ValueRef,
        value: ValueRef,
        from_block: BlockRef,
    ) -> Result<(), IrError> {
        self.proc.phi_add_incoming(phi, value, from_block)
    }
}
