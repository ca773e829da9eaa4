//! The Procedure: sole owner of every block and value of one
//! compilation unit.
//!
//! All storage is slab arenas owned here, so a Procedure is torn down
//! or handed to the backend as one unit. Mutation is `&mut`-only; there
//! is no interior mutability, which keeps independent compilations free
//! to run on separate worker threads.
//!
//! Construction discipline: values are appended in program order and a
//! non-phi operand must be defined earlier in the same block. Dataflow
//! across blocks goes through `Phi` values whose operands pair with the
//! incoming predecessor listed in their payload. The verifier enforces
//! this; the mutators here enforce signatures and use-count
//! consistency.

use crate::{
    base::ArenaRef,
    ir::{
        BlockData, BlockRef, IrError, Opcode, OperandRule, Origin, Payload, Type, TupleTypeRef,
        ValueData, ValueRef,
    },
};
use slab::Slab;
use smallvec::SmallVec;
use smol_str::SmolStr;

pub struct Procedure {
    pub name: SmolStr,
    arg_types: Vec<Type>,
    values: Slab<ValueData>,
    blocks: Slab<BlockData>,
    block_order: Vec<BlockRef>,
    tuples: Vec<Vec<Type>>,
}

impl Procedure {
    pub fn new(name: impl Into<SmolStr>, arg_types: Vec<Type>) -> Self {
        Procedure {
            name: name.into(),
            arg_types,
            values: Slab::new(),
            blocks: Slab::new(),
            block_order: Vec::new(),
            tuples: Vec::new(),
        }
    }

    pub fn arg_types(&self) -> &[Type] {
        &self.arg_types
    }

    /* ---------------- blocks ---------------- */

    pub fn add_block(&mut self) -> BlockRef {
        let block = BlockRef::alloc(&mut self.blocks, BlockData::new());
        self.block_order.push(block);
        block
    }

    /// First block in program order; where execution enters.
    pub fn entry(&self) -> Option<BlockRef> {
        self.block_order.first().copied()
    }

    /// Blocks in program order.
    pub fn blocks(&self) -> impl Iterator<Item = BlockRef> + '_ {
        self.block_order.iter().copied()
    }

    pub fn block_count(&self) -> usize {
        self.block_order.len()
    }

    pub fn block(&self, block: BlockRef) -> &BlockData {
        block.to_data(&self.blocks)
    }

    pub fn is_block_alive(&self, block: BlockRef) -> bool {
        block.is_alive(&self.blocks)
    }

    /// Values of `block` in program order.
    pub fn block_values(&self, block: BlockRef) -> &[ValueRef] {
        &self.block(block).values
    }

    /// The block's terminator, once it has one.
    pub fn terminator(&self, block: BlockRef) -> Option<ValueRef> {
        let last = self.block(block).last_value()?;
        self.value(last).opcode.is_terminator().then_some(last)
    }

    /// Blocks whose terminator targets `block`, deduplicated, in
    /// program order. A branch with both arms on one block counts as a
    /// single predecessor edge.
    pub fn predecessors(&self, block: BlockRef) -> SmallVec<[BlockRef; 4]> {
        let mut preds = SmallVec::new();
        for pred in self.blocks() {
            let Some(term) = self.terminator(pred) else { continue };
            if self.value(term).targets().contains(&block) && !preds.contains(&pred) {
                preds.push(pred);
            }
        }
        preds
    }

    /// Replace `block`'s value list with a permutation of itself. The
    /// scheduler uses this; callers must pass the same values.
    pub(crate) fn set_block_values(&mut self, block: BlockRef, values: Vec<ValueRef>) {
        debug_assert!({
            let mut old = self.block(block).values.clone();
            let mut new = values.clone();
            old.sort_unstable();
            new.sort_unstable();
            old == new
        });
        block.to_data_mut(&mut self.blocks).values = values;
    }

    /* ---------------- values ---------------- */

    pub fn value(&self, value: ValueRef) -> &ValueData {
        value.to_data(&self.values)
    }

    pub(crate) fn value_mut(&mut self, value: ValueRef) -> &mut ValueData {
        value.to_data_mut(&mut self.values)
    }

    pub fn is_value_alive(&self, value: ValueRef) -> bool {
        value.is_alive(&self.values)
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// Every live value, in arena order.
    pub fn iter_values(&self) -> impl Iterator<Item = (ValueRef, &ValueData)> {
        self.values.iter().map(|(handle, data)| (ValueRef::from_handle(handle), data))
    }

    /// Append a payload-free value to the end of `block`.
    ///
    /// A `Fence` appended this way gets the default `top`/`top` ranges,
    /// the strongest barrier.
    pub fn append(
        &mut self,
        block: BlockRef,
        opcode: Opcode,
        ty: Type,
        origin: Origin,
        operands: &[ValueRef],
    ) -> Result<ValueRef, IrError> {
        self.append_full(block, opcode, ty, origin, operands, Payload::None)
    }

    /// Append a value carrying an explicit payload. Fails with
    /// [`IrError`] when the operand count, operand types, result type,
    /// or payload kind mismatch the opcode signature.
    pub fn append_full(
        &mut self,
        block: BlockRef,
        opcode: Opcode,
        ty: Type,
        origin: Origin,
        operands: &[ValueRef],
        payload: Payload,
    ) -> Result<ValueRef, IrError> {
        let payload = Self::normalize_payload(opcode, payload);
        self.check_signature(opcode, ty, operands, &payload)?;

        let data = ValueData {
            opcode,
            ty,
            origin,
            operands: SmallVec::from_slice(operands),
            payload,
            block,
            use_count: 0,
        };
        let value = ValueRef::alloc(&mut self.values, data);
        block.to_data_mut(&mut self.blocks).values.push(value);
        self.retain_operands(operands);
        Ok(value)
    }

    /// A fence constructed without explicit ranges is a full barrier.
    fn normalize_payload(opcode: Opcode, payload: Payload) -> Payload {
        use crate::ir::HeapRange;
        if opcode.is_fence() && payload == Payload::None {
            Payload::FenceRanges { read: HeapRange::top(), write: HeapRange::top() }
        } else {
            payload
        }
    }

    /// In-place rewrite keeping the value's identity and type. The new
    /// opcode, operands, and payload are signature-checked against the
    /// existing result type.
    pub fn replace(
        &mut self,
        value: ValueRef,
        opcode: Opcode,
        operands: &[ValueRef],
        payload: Payload,
    ) -> Result<(), IrError> {
        let ty = self.value(value).ty;
        let payload = Self::normalize_payload(opcode, payload);
        self.check_signature(opcode, ty, operands, &payload)?;

        let old_operands = std::mem::take(&mut self.value_mut(value).operands);
        self.release_operands(&old_operands);
        self.retain_operands(operands);

        let data = self.value_mut(value);
        data.opcode = opcode;
        data.operands = SmallVec::from_slice(operands);
        data.payload = payload;
        Ok(())
    }

    /// Rewrite `value` into `Identity(source)`: every remaining use now
    /// reads `source` after resolution, and the node stays addressable
    /// until a sweep removes it.
    pub fn replace_with_identity(
        &mut self,
        value: ValueRef,
        source: ValueRef,
    ) -> Result<(), IrError> {
        if !self.is_value_alive(source) {
            return Err(IrError::UnknownOperand { opcode: Opcode::Identity, operand: source });
        }
        self.replace(value, Opcode::Identity, &[source], Payload::None)
    }

    /// Rewrite a `Void` value into `Nop`, the removable placeholder.
    /// `Void` values can never be operands, so nothing dangles.
    pub fn replace_with_nop(&mut self, value: ValueRef) -> Result<(), IrError> {
        debug_assert_eq!(self.value(value).use_count, 0);
        self.replace(value, Opcode::Nop, &[], Payload::None)
    }

    /// Free a value. Only legal once nothing references it.
    pub fn remove(&mut self, value: ValueRef) -> Result<(), IrError> {
        let data = self.value(value);
        if data.use_count != 0 {
            return Err(IrError::StillReferenced { value, use_count: data.use_count });
        }
        let block = data.block;
        let operands = data.operands.clone();
        self.release_operands(&operands);

        let list = &mut block.to_data_mut(&mut self.blocks).values;
        if let Some(pos) = list.iter().position(|&v| v == value) {
            list.remove(pos);
        }
        self.values.remove(value.handle());
        Ok(())
    }

    /// Follow `Identity` chains to the value they forward. Bounded so a
    /// malformed graph cannot loop the walk.
    pub fn resolve(&self, mut value: ValueRef) -> ValueRef {
        let mut budget = self.values.len();
        loop {
            let data = self.value(value);
            if data.opcode != Opcode::Identity || budget == 0 {
                return value;
            }
            value = data.operands[0];
            budget -= 1;
        }
    }

    /// Point operand `index` of `value` somewhere else, keeping use
    /// counts straight. The replacement must have the old operand's
    /// type; passes only swap in resolved equivalents.
    pub(crate) fn set_operand(&mut self, value: ValueRef, index: usize, new_operand: ValueRef) {
        let old = self.value(value).operands[index];
        if old == new_operand {
            return;
        }
        debug_assert_eq!(self.value(old).ty, self.value(new_operand).ty);
        self.value_mut(old).use_count -= 1;
        self.value_mut(new_operand).use_count += 1;
        self.value_mut(value).operands[index] = new_operand;
    }

    /// Drop all operand references of `value` without freeing it. Used
    /// by the sweep to break reference cycles among dead values.
    pub(crate) fn strip_operands(&mut self, value: ValueRef) {
        let operands = std::mem::take(&mut self.value_mut(value).operands);
        self.release_operands(&operands);
    }

    /// Extend a phi with one `(value, from_block)` incoming pair. Each
    /// predecessor may appear once.
    pub fn phi_add_incoming(
        &mut self,
        phi: ValueRef,
        value: ValueRef,
        from_block: BlockRef,
    ) -> Result<(), IrError> {
        let phi_data = self.value(phi);
        if !phi_data.opcode.is_phi() {
            return Err(IrError::NotAPhi { value: phi, opcode: phi_data.opcode });
        }
        let phi_ty = phi_data.ty;
        let index = phi_data.operands.len();
        if !self.is_block_alive(from_block) {
            return Err(IrError::UnknownBlock { block: from_block });
        }
        if !self.is_value_alive(value) {
            return Err(IrError::UnknownOperand { opcode: Opcode::Phi, operand: value });
        }
        let incoming_ty = self.value(value).ty;
        if incoming_ty != phi_ty {
            return Err(IrError::OperandType {
                opcode: Opcode::Phi,
                index,
                expected: "result type",
                found: incoming_ty,
            });
        }

        {
            let data = self.value_mut(phi);
            let Payload::Incoming(blocks) = &mut data.payload else {
                return Err(IrError::NotAPhi { value: phi, opcode: Opcode::Phi });
            };
            if blocks.contains(&from_block) {
                return Err(IrError::DuplicateIncoming { phi, block: from_block });
            }
            blocks.push(from_block);
            data.operands.push(value);
        }
        self.value_mut(value).use_count += 1;
        Ok(())
    }

    /* ---------------- tuples ---------------- */

    /// Intern a tuple element list, reusing an existing entry when the
    /// same list was interned before.
    pub fn intern_tuple(&mut self, elems: Vec<Type>) -> TupleTypeRef {
        if let Some(pos) = self.tuples.iter().position(|t| *t == elems) {
            return TupleTypeRef(pos as u32);
        }
        self.tuples.push(elems);
        TupleTypeRef((self.tuples.len() - 1) as u32)
    }

    pub fn tuple_types(&self, tref: TupleTypeRef) -> &[Type] {
        &self.tuples[tref.index()]
    }

    pub fn is_tuple_interned(&self, tref: TupleTypeRef) -> bool {
        tref.index() < self.tuples.len()
    }

    /* ---------------- signature checking ---------------- */

    /// Validate (opcode, result type, operands, payload) against the
    /// static opcode table. Shared by construction, `replace`, and the
    /// verifier.
    pub(crate) fn check_signature(
        &self,
        opcode: Opcode,
        ty: Type,
        operands: &[ValueRef],
        payload: &Payload,
    ) -> Result<(), IrError> {
        let sig = opcode.signature();

        if !sig.arity.admits(operands.len()) {
            return Err(IrError::OperandCount {
                opcode,
                expected: sig.arity,
                found: operands.len(),
            });
        }
        if payload.kind() != sig.payload {
            return Err(IrError::PayloadKind {
                opcode,
                expected: sig.payload,
                found: payload.kind(),
            });
        }
        if !sig.result.admits(ty) {
            return Err(IrError::ResultType { opcode, found: ty });
        }

        let mut operand_tys: SmallVec<[Type; 3]> = SmallVec::new();
        for &op in operands {
            let Some(data) = op.as_data(&self.values) else {
                return Err(IrError::UnknownOperand { opcode, operand: op });
            };
            operand_tys.push(data.ty);
        }

        let expect = |index: usize, ok: bool, expected: &'static str| {
            if ok {
                Ok(())
            } else {
                Err(IrError::OperandType { opcode, index, expected, found: operand_tys[index] })
            }
        };
        match sig.operands {
            OperandRule::None => {}
            OperandRule::AllSameAsResult => {
                for (i, &oty) in operand_tys.iter().enumerate() {
                    expect(i, oty == ty, "result type")?;
                }
            }
            OperandRule::IntPair => {
                expect(0, operand_tys[0].is_int(), "integer")?;
                expect(1, operand_tys[1] == operand_tys[0], "first operand type")?;
            }
            OperandRule::CondThenArms => {
                expect(0, operand_tys[0] == Type::Int32, "i32")?;
                expect(1, operand_tys[1] == ty, "result type")?;
                expect(2, operand_tys[2] == ty, "result type")?;
            }
            OperandRule::Address => {
                expect(0, operand_tys[0] == Type::Int64, "i64 address")?;
            }
            OperandRule::ValueThenAddress => {
                expect(0, operand_tys[0].is_scalar(), "scalar")?;
                expect(1, operand_tys[1] == Type::Int64, "i64 address")?;
            }
            OperandRule::Cond => {
                expect(0, operand_tys[0] == Type::Int32, "i32")?;
            }
            OperandRule::OptionalScalar => {
                if !operand_tys.is_empty() {
                    expect(0, operand_tys[0].is_scalar(), "scalar")?;
                }
            }
        }

        match payload {
            Payload::Imm(imm) => {
                if imm.ty() != ty {
                    return Err(IrError::ImmTypeMismatch { ty, imm_ty: imm.ty() });
                }
            }
            Payload::ArgIndex(index) => {
                let Some(&arg_ty) = self.arg_types.get(*index as usize) else {
                    return Err(IrError::ArgumentOutOfRange {
                        index: *index,
                        count: self.arg_types.len(),
                    });
                };
                if arg_ty != ty {
                    return Err(IrError::ArgumentType { index: *index, expected: arg_ty, found: ty });
                }
            }
            Payload::Incoming(blocks) => {
                if blocks.len() != operands.len() {
                    return Err(IrError::PhiIncomingCount {
                        operands: operands.len(),
                        incoming: blocks.len(),
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }

    /* ---------------- use counts ---------------- */

    fn retain_operands(&mut self, operands: &[ValueRef]) {
        for &op in operands {
            self.value_mut(op).use_count += 1;
        }
    }

    fn release_operands(&mut self, operands: &[ValueRef]) {
        for &op in operands {
            self.value_mut(op).use_count -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{CmpCond, Effects, HeapRange, Imm};

    fn empty_proc() -> Procedure {
        Procedure::new("test", vec![Type::Int32, Type::Int64])
    }

    #[test]
    fn procedure_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Procedure>();
    }

    #[test]
    fn append_builds_program_order_and_use_counts() {
        let mut proc = empty_proc();
        let b = proc.add_block();
        assert_eq!(proc.entry(), Some(b));

        let one = proc
            .append_full(b, Opcode::Const, Type::Int32, Origin::new(0), &[], Payload::Imm(Imm::I32(1)))
            .unwrap();
        let two = proc
            .append_full(b, Opcode::Const, Type::Int32, Origin::new(1), &[], Payload::Imm(Imm::I32(2)))
            .unwrap();
        let sum = proc.append(b, Opcode::Add, Type::Int32, Origin::new(2), &[one, two]).unwrap();
        let ret = proc.append(b, Opcode::Return, Type::Void, Origin::new(3), &[sum]).unwrap();

        assert_eq!(proc.block_values(b), &[one, two, sum, ret]);
        assert_eq!(proc.value(one).use_count, 1);
        assert_eq!(proc.value(two).use_count, 1);
        assert_eq!(proc.value(sum).use_count, 1);
        assert_eq!(proc.value(ret).use_count, 0);
        assert_eq!(proc.terminator(b), Some(ret));
        assert_eq!(proc.value_count(), 4);
    }

    #[test]
    fn signature_violations_are_rejected() {
        let mut proc = empty_proc();
        let b = proc.add_block();
        let one = proc
            .append_full(b, Opcode::Const, Type::Int32, Origin::none(), &[], Payload::Imm(Imm::I32(1)))
            .unwrap();

        // Wrong arity.
        assert!(matches!(
            proc.append(b, Opcode::Add, Type::Int32, Origin::none(), &[one]),
            Err(IrError::OperandCount { opcode: Opcode::Add, found: 1, .. })
        ));
        // Operand type mismatching the result type.
        assert!(matches!(
            proc.append(b, Opcode::Add, Type::Int64, Origin::none(), &[one, one]),
            Err(IrError::OperandType { opcode: Opcode::Add, index: 0, .. })
        ));
        // Missing payload.
        assert!(matches!(
            proc.append(b, Opcode::Const, Type::Int32, Origin::none(), &[]),
            Err(IrError::PayloadKind { opcode: Opcode::Const, .. })
        ));
        // Immediate type disagreeing with the declared type.
        assert!(matches!(
            proc.append_full(b, Opcode::Const, Type::Int64, Origin::none(), &[], Payload::Imm(Imm::I32(1))),
            Err(IrError::ImmTypeMismatch { .. })
        ));
        // Result type a pure integer opcode cannot produce.
        assert!(matches!(
            proc.append(b, Opcode::Add, Type::Float32, Origin::none(), &[one, one]),
            Err(IrError::ResultType { opcode: Opcode::Add, found: Type::Float32 })
        ));
        // Argument index past the signature.
        assert!(matches!(
            proc.append_full(b, Opcode::Argument, Type::Int32, Origin::none(), &[], Payload::ArgIndex(7)),
            Err(IrError::ArgumentOutOfRange { index: 7, count: 2 })
        ));
        // Argument type disagreeing with the declared parameter type.
        assert!(matches!(
            proc.append_full(b, Opcode::Argument, Type::Int32, Origin::none(), &[], Payload::ArgIndex(1)),
            Err(IrError::ArgumentType { index: 1, .. })
        ));

        // Nothing half-appended.
        assert_eq!(proc.value_count(), 1);
        assert_eq!(proc.block_values(b).len(), 1);
    }

    #[test]
    fn plain_fence_defaults_to_a_full_barrier() {
        let mut proc = empty_proc();
        let b = proc.add_block();
        let fence = proc.append(b, Opcode::Fence, Type::Void, Origin::new(5), &[]).unwrap();

        let effects = proc.value(fence).effects();
        assert_eq!(effects, Effects::for_fence(HeapRange::top(), HeapRange::top()));
        assert!(proc.value(fence).operands.is_empty());
        assert!(proc.value(fence).ty.is_void());
    }

    #[test]
    fn scoped_fence_keeps_its_ranges() {
        let mut proc = empty_proc();
        let b = proc.add_block();
        let read = HeapRange::span(0, 4);
        let write = HeapRange::absolute();
        let fence = proc
            .append_full(
                b,
                Opcode::Fence,
                Type::Void,
                Origin::none(),
                &[],
                Payload::FenceRanges { read, write },
            )
            .unwrap();
        assert_eq!(proc.value(fence).effects(), Effects::for_fence(read, write));
    }

    #[test]
    fn replace_with_identity_moves_use_counts() {
        let mut proc = empty_proc();
        let b = proc.add_block();
        let x = proc
            .append_full(b, Opcode::Const, Type::Int32, Origin::none(), &[], Payload::Imm(Imm::I32(4)))
            .unwrap();
        let y = proc
            .append_full(b, Opcode::Const, Type::Int32, Origin::none(), &[], Payload::Imm(Imm::I32(4)))
            .unwrap();
        let sum = proc.append(b, Opcode::Add, Type::Int32, Origin::none(), &[x, y]).unwrap();

        proc.replace_with_identity(y, x).unwrap();
        assert_eq!(proc.value(y).opcode, Opcode::Identity);
        assert_eq!(proc.resolve(y), x);
        // x: used by sum and by y's identity. y: still used by sum.
        assert_eq!(proc.value(x).use_count, 2);
        assert_eq!(proc.value(y).use_count, 1);

        proc.set_operand(sum, 1, proc.resolve(y));
        assert_eq!(proc.value(y).use_count, 0);
        assert_eq!(proc.value(x).use_count, 3);
    }

    #[test]
    fn identity_type_mismatch_is_rejected() {
        let mut proc = empty_proc();
        let b = proc.add_block();
        let narrow = proc
            .append_full(b, Opcode::Const, Type::Int32, Origin::none(), &[], Payload::Imm(Imm::I32(0)))
            .unwrap();
        let wide = proc
            .append_full(b, Opcode::Const, Type::Int64, Origin::none(), &[], Payload::Imm(Imm::I64(0)))
            .unwrap();
        assert!(matches!(
            proc.replace_with_identity(wide, narrow),
            Err(IrError::OperandType { opcode: Opcode::Identity, .. })
        ));
    }

    #[test]
    fn remove_refuses_referenced_values() {
        let mut proc = empty_proc();
        let b = proc.add_block();
        let x = proc
            .append_full(b, Opcode::Const, Type::Int32, Origin::none(), &[], Payload::Imm(Imm::I32(9)))
            .unwrap();
        let neg = proc.append(b, Opcode::Neg, Type::Int32, Origin::none(), &[x]).unwrap();

        assert!(matches!(
            proc.remove(x),
            Err(IrError::StillReferenced { use_count: 1, .. })
        ));

        proc.remove(neg).unwrap();
        proc.remove(x).unwrap();
        assert_eq!(proc.value_count(), 0);
        assert!(proc.block_values(b).is_empty());
        assert!(!proc.is_value_alive(x));
    }

    #[test]
    fn resolve_follows_identity_chains() {
        let mut proc = empty_proc();
        let b = proc.add_block();
        let root = proc
            .append_full(b, Opcode::Const, Type::Int32, Origin::none(), &[], Payload::Imm(Imm::I32(3)))
            .unwrap();
        let mid = proc
            .append_full(b, Opcode::Const, Type::Int32, Origin::none(), &[], Payload::Imm(Imm::I32(3)))
            .unwrap();
        let top = proc
            .append_full(b, Opcode::Const, Type::Int32, Origin::none(), &[], Payload::Imm(Imm::I32(3)))
            .unwrap();
        proc.replace_with_identity(mid, root).unwrap();
        proc.replace_with_identity(top, mid).unwrap();

        assert_eq!(proc.resolve(top), root);
        assert_eq!(proc.resolve(mid), root);
        assert_eq!(proc.resolve(root), root);
    }

    #[test]
    fn phi_incoming_pairs_and_rejects_duplicates() {
        let mut proc = empty_proc();
        let header = proc.add_block();
        let left = proc.add_block();
        let right = proc.add_block();

        let a = proc
            .append_full(left, Opcode::Const, Type::Int32, Origin::none(), &[], Payload::Imm(Imm::I32(1)))
            .unwrap();
        let b = proc
            .append_full(right, Opcode::Const, Type::Int32, Origin::none(), &[], Payload::Imm(Imm::I32(2)))
            .unwrap();

        let phi = proc
            .append_full(
                header,
                Opcode::Phi,
                Type::Int32,
                Origin::none(),
                &[],
                Payload::Incoming(SmallVec::new()),
            )
            .unwrap();
        proc.phi_add_incoming(phi, a, left).unwrap();
        proc.phi_add_incoming(phi, b, right).unwrap();

        assert_eq!(proc.value(phi).operands.as_slice(), &[a, b]);
        assert_eq!(proc.value(a).use_count, 1);
        assert!(matches!(
            proc.phi_add_incoming(phi, a, left),
            Err(IrError::DuplicateIncoming { .. })
        ));
        assert!(matches!(
            proc.phi_add_incoming(a, b, left),
            Err(IrError::NotAPhi { .. })
        ));
    }

    #[test]
    fn tuples_intern_once() {
        let mut proc = empty_proc();
        let t1 = proc.intern_tuple(vec![Type::Int32, Type::Int64]);
        let t2 = proc.intern_tuple(vec![Type::Int32, Type::Int64]);
        let t3 = proc.intern_tuple(vec![Type::Float64]);

        assert_eq!(t1, t2);
        assert_ne!(t1, t3);
        assert_eq!(proc.tuple_types(t1), &[Type::Int32, Type::Int64]);
        assert!(proc.is_tuple_interned(t3));
    }

    #[test]
    fn branch_with_equal_arms_is_one_predecessor() {
        let mut proc = empty_proc();
        let entry = proc.add_block();
        let next = proc.add_block();

        let cond = proc
            .append_full(entry, Opcode::Const, Type::Int32, Origin::none(), &[], Payload::Imm(Imm::I32(1)))
            .unwrap();
        proc.append_full(
            entry,
            Opcode::Branch,
            Type::Void,
            Origin::none(),
            &[cond],
            Payload::Cond2 { on_true: next, on_false: next },
        )
        .unwrap();
        proc.append(next, Opcode::Return, Type::Void, Origin::none(), &[]).unwrap();

        assert_eq!(proc.predecessors(next).as_slice(), &[entry]);
        assert!(proc.predecessors(entry).is_empty());
    }

    #[test]
    fn icmp_checks_operand_pairing() {
        let mut proc = empty_proc();
        let b = proc.add_block();
        let x = proc
            .append_full(b, Opcode::Const, Type::Int32, Origin::none(), &[], Payload::Imm(Imm::I32(1)))
            .unwrap();
        let y = proc
            .append_full(b, Opcode::Const, Type::Int64, Origin::none(), &[], Payload::Imm(Imm::I64(1)))
            .unwrap();

        let ok = proc.append_full(
            b,
            Opcode::Icmp,
            Type::Int32,
            Origin::none(),
            &[x, x],
            Payload::Cond(CmpCond::LT | CmpCond::SIGNED),
        );
        assert!(ok.is_ok());

        assert!(matches!(
            proc.append_full(
                b,
                Opcode::Icmp,
                Type::Int32,
                Origin::none(),
                &[x, y],
                Payload::Cond(CmpCond::EQ),
            ),
            Err(IrError::OperandType { opcode: Opcode::Icmp, index: 1, .. })
        ));
    }
}
