//! Graph verifier. Returns an error as soon as any invariant is
//! violated.
//!
//! Run after construction and, when the pipeline is configured for it,
//! after every pass. A failure is fatal for the compilation and points
//! at a bug in whatever produced or rewrote the graph; diagnostics name
//! the offending value, its opcode, and its origin so the report can be
//! traced back to source bytecode.
//!
//! Checked invariants:
//! - every block ends in exactly one terminator, with none earlier;
//! - phis sit in the leading segment of their block;
//! - every value sits in exactly one block list, the one its `block`
//!   field names;
//! - operand handles are live; a non-phi operand is defined earlier in
//!   the same block; phi operand *i* is defined in incoming block *i*;
//! - phi incoming lists match the block's actual predecessors exactly;
//! - every value satisfies its opcode signature (arity, operand types,
//!   result type, payload kind);
//! - terminator targets are live blocks;
//! - stored use counts equal the recomputed reference counts;
//! - tuple-typed values refer to interned tuple entries.

use crate::ir::{BlockRef, IrError, Opcode, Origin, Payload, Procedure, Type, ValueRef};
use std::collections::HashMap;
use thiserror::Error;

/// A broken graph invariant. Fatal; never silently ignored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    #[error("{block} has no terminator")]
    NoTerminator { block: BlockRef },

    #[error("{block} lists dead value {value}")]
    DeadValueInBlock { block: BlockRef, value: ValueRef },

    #[error("{value} ({opcode}, {origin}) terminates {block} before its end")]
    TerminatorInside { block: BlockRef, value: ValueRef, opcode: Opcode, origin: Origin },

    #[error("phi {value} ({origin}) appears after non-phi values in {block}")]
    LatePhi { block: BlockRef, value: ValueRef, origin: Origin },

    #[error("{value} ({opcode}, {origin}): {source}")]
    Signature {
        value: ValueRef,
        opcode: Opcode,
        origin: Origin,
        #[source]
        source: IrError,
    },

    #[error("{value} ({opcode}, {origin}) references dead value {operand}")]
    DeadOperand { value: ValueRef, opcode: Opcode, origin: Origin, operand: ValueRef },

    #[error("{value} ({opcode}, {origin}) uses {operand}, which is not defined earlier in the same block")]
    OperandNotAvailable { value: ValueRef, opcode: Opcode, origin: Origin, operand: ValueRef },

    #[error("phi {value} ({origin}) operand {operand} is not defined in its incoming block {incoming}")]
    PhiOperandElsewhere { value: ValueRef, origin: Origin, operand: ValueRef, incoming: BlockRef },

    #[error("phi {value} ({origin}) has no incoming edge for predecessor {pred}")]
    PhiMissingIncoming { value: ValueRef, origin: Origin, pred: BlockRef },

    #[error("phi {value} ({origin}) names {block}, which is not a predecessor of its block")]
    PhiStrayIncoming { value: ValueRef, origin: Origin, block: BlockRef },

    #[error("phi {value} ({origin}) names incoming block {block} twice")]
    PhiDuplicateIncoming { value: ValueRef, origin: Origin, block: BlockRef },

    #[error("{value} ({opcode}, {origin}) targets dead block {target}")]
    DeadTarget { value: ValueRef, opcode: Opcode, origin: Origin, target: BlockRef },

    #[error("{value} ({opcode}, {origin}) is not placed in the one block that owns it")]
    StrayValue { value: ValueRef, opcode: Opcode, origin: Origin },

    #[error("{value} ({opcode}, {origin}) stores use count {stored}, but {actual} references exist")]
    UseCountDrift { value: ValueRef, opcode: Opcode, origin: Origin, stored: u32, actual: u32 },

    #[error("{value} ({opcode}, {origin}) has a tuple type that was never interned")]
    UninternedTuple { value: ValueRef, opcode: Opcode, origin: Origin },
}

pub type CheckResult = Result<(), CheckError>;

/// Check every invariant of `proc`, reporting the first violation.
pub fn verify(proc: &Procedure) -> CheckResult {
    Checker::new(proc)?.run()
}

/// Panic with a diagnostic and a full dump when `proc` is invalid.
/// Meant for tests and debug builds; release pipelines propagate
/// [`CheckError`] instead.
pub fn assert_procedure_valid(proc: &Procedure) {
    if let Err(err) = verify(proc) {
        panic!("procedure `{}` failed verification: {err}\n{proc}", proc.name);
    }
}

struct Checker<'p> {
    proc: &'p Procedure,
    /// Where each value actually sits: owning block and position.
    placement: HashMap<ValueRef, (BlockRef, usize)>,
}

impl<'p> Checker<'p> {
    /// Builds the placement index; fails already when some value is
    /// listed twice or a list entry is a dead handle.
    fn new(proc: &'p Procedure) -> Result<Self, CheckError> {
        let mut placement = HashMap::with_capacity(proc.value_count());
        for block in proc.blocks() {
            for (position, &value) in proc.block_values(block).iter().enumerate() {
                if !proc.is_value_alive(value) {
                    return Err(CheckError::DeadValueInBlock { block, value });
                }
                let data = proc.value(value);
                if placement.insert(value, (block, position)).is_some() || data.block != block {
                    return Err(CheckError::StrayValue {
                        value,
                        opcode: data.opcode,
                        origin: data.origin,
                    });
                }
            }
        }
        Ok(Checker { proc, placement })
    }

    fn run(&self) -> CheckResult {
        for block in self.proc.blocks() {
            self.check_block_shape(block)?;
            for &value in self.proc.block_values(block) {
                self.check_value(block, value)?;
            }
        }
        self.check_no_detached_values()?;
        self.check_use_counts()
    }

    /// Terminator present, last, unique; phis only in the leading
    /// segment.
    fn check_block_shape(&self, block: BlockRef) -> CheckResult {
        let proc = self.proc;
        let values = proc.block_values(block);

        let terminated = values
            .last()
            .is_some_and(|&last| proc.value(last).opcode.is_terminator());
        if !terminated {
            return Err(CheckError::NoTerminator { block });
        }

        let mut phis_done = false;
        for (position, &value) in values.iter().enumerate() {
            let data = proc.value(value);
            if data.opcode.is_terminator() && position + 1 != values.len() {
                return Err(CheckError::TerminatorInside {
                    block,
                    value,
                    opcode: data.opcode,
                    origin: data.origin,
                });
            }
            if data.opcode.is_phi() {
                if phis_done {
                    return Err(CheckError::LatePhi { block, value, origin: data.origin });
                }
            } else {
                phis_done = true;
            }
        }
        Ok(())
    }

    fn check_value(&self, block: BlockRef, value: ValueRef) -> CheckResult {
        let proc = self.proc;
        let data = proc.value(value);
        let opcode = data.opcode;
        let origin = data.origin;

        proc.check_signature(opcode, data.ty, &data.operands, &data.payload)
            .map_err(|source| CheckError::Signature { value, opcode, origin, source })?;

        if let Type::Tuple(tref) = data.ty
            && !proc.is_tuple_interned(tref)
        {
            return Err(CheckError::UninternedTuple { value, opcode, origin });
        }

        if opcode.is_phi() {
            self.check_phi(block, value)?;
        } else {
            // Construction discipline: a plain operand is defined
            // earlier in the same block. Cross-block dataflow goes
            // through phis.
            let position = self.placement[&value].1;
            for &operand in &data.operands {
                if !proc.is_value_alive(operand) {
                    return Err(CheckError::DeadOperand { value, opcode, origin, operand });
                }
                let available = self
                    .placement
                    .get(&operand)
                    .is_some_and(|&(def_block, def_pos)| def_block == block && def_pos < position);
                if !available {
                    return Err(CheckError::OperandNotAvailable { value, opcode, origin, operand });
                }
            }
        }

        for target in data.targets() {
            if !proc.is_block_alive(target) {
                return Err(CheckError::DeadTarget { value, opcode, origin, target });
            }
        }
        Ok(())
    }

    /// Incoming blocks must be exactly the block's predecessors, each
    /// once, and operand *i* must be defined in incoming block *i* so
    /// it is available at that block's end.
    fn check_phi(&self, block: BlockRef, value: ValueRef) -> CheckResult {
        let proc = self.proc;
        let data = proc.value(value);
        let origin = data.origin;
        let Payload::Incoming(incoming) = &data.payload else {
            unreachable!("signature check admits phis with incoming payloads only");
        };

        let preds = proc.predecessors(block);
        for (index, &from_block) in incoming.iter().enumerate() {
            if incoming[..index].contains(&from_block) {
                return Err(CheckError::PhiDuplicateIncoming { value, origin, block: from_block });
            }
            if !preds.contains(&from_block) {
                return Err(CheckError::PhiStrayIncoming { value, origin, block: from_block });
            }

            let operand = data.operands[index];
            if !proc.is_value_alive(operand) {
                return Err(CheckError::DeadOperand {
                    value,
                    opcode: Opcode::Phi,
                    origin,
                    operand,
                });
            }
            let defined_there = self
                .placement
                .get(&operand)
                .is_some_and(|&(def_block, _)| def_block == from_block);
            if !defined_there {
                return Err(CheckError::PhiOperandElsewhere {
                    value,
                    origin,
                    operand,
                    incoming: from_block,
                });
            }
        }
        for &pred in &preds {
            if !incoming.contains(&pred) {
                return Err(CheckError::PhiMissingIncoming { value, origin, pred });
            }
        }
        Ok(())
    }

    /// Every live arena value must have shown up in some block list.
    fn check_no_detached_values(&self) -> CheckResult {
        for (value, data) in self.proc.iter_values() {
            if !self.placement.contains_key(&value) {
                return Err(CheckError::StrayValue {
                    value,
                    opcode: data.opcode,
                    origin: data.origin,
                });
            }
        }
        Ok(())
    }

    fn check_use_counts(&self) -> CheckResult {
        let proc = self.proc;
        let mut actual: HashMap<ValueRef, u32> = HashMap::with_capacity(proc.value_count());
        for (_, data) in proc.iter_values() {
            for &operand in &data.operands {
                *actual.entry(operand).or_default() += 1;
            }
        }
        for (value, data) in proc.iter_values() {
            let counted = actual.get(&value).copied().unwrap_or(0);
            if data.use_count != counted {
                return Err(CheckError::UseCountDrift {
                    value,
                    opcode: data.opcode,
                    origin: data.origin,
                    stored: data.use_count,
                    actual: counted,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{CmpCond, HeapRange, Imm, ProcBuilder};

    fn ret_42() -> (Procedure, ValueRef) {
        let mut b = ProcBuilder::new("ret42", vec![]);
        let forty_two = b.const32(42).unwrap();
        b.ret(forty_two).unwrap();
        (b.finish(), forty_two)
    }

    #[test]
    fn valid_procedures_pass() {
        let (proc, _) = ret_42();
        verify(&proc).unwrap();
        assert_procedure_valid(&proc);
    }

    #[test]
    fn missing_terminator_is_reported() {
        let mut b = ProcBuilder::new("open", vec![]);
        b.const32(1).unwrap();
        let proc = b.finish();
        assert!(matches!(verify(&proc), Err(CheckError::NoTerminator { .. })));
    }

    #[test]
    fn empty_block_is_reported() {
        let mut b = ProcBuilder::new("hollow", vec![]);
        b.ret_void().unwrap();
        b.add_block();
        let proc = b.finish();
        assert!(matches!(verify(&proc), Err(CheckError::NoTerminator { .. })));
    }

    #[test]
    fn mid_block_terminator_is_reported() {
        let mut b = ProcBuilder::new("twice", vec![]);
        b.ret_void().unwrap();
        b.ret_void().unwrap();
        let proc = b.finish();
        assert!(matches!(
            verify(&proc),
            Err(CheckError::TerminatorInside { opcode: Opcode::Return, .. })
        ));
    }

    #[test]
    fn late_phi_is_reported() {
        let mut b = ProcBuilder::new("latephi", vec![]);
        b.const32(0).unwrap();
        b.phi(crate::ir::Type::Int32).unwrap();
        b.ret_void().unwrap();
        let proc = b.finish();
        assert!(matches!(verify(&proc), Err(CheckError::LatePhi { .. })));
    }

    #[test]
    fn use_after_def_only() {
        // Swap a value above its operand via the internal permutation
        // hook; availability must fail.
        let mut b = ProcBuilder::new("swapped", vec![]);
        let one = b.const32(1).unwrap();
        let neg = b.neg(one).unwrap();
        b.ret(neg).unwrap();
        let mut proc = b.finish();
        verify(&proc).unwrap();

        let block = proc.entry().unwrap();
        let mut values = proc.block_values(block).to_vec();
        values.swap(0, 1);
        proc.set_block_values(block, values);
        assert!(matches!(
            verify(&proc),
            Err(CheckError::OperandNotAvailable { operand, .. }) if operand == one
        ));
    }

    #[test]
    fn cross_block_operand_without_phi_is_reported() {
        let mut b = ProcBuilder::new("leak", vec![]);
        let next = b.add_block();
        let one = b.const32(1).unwrap();
        b.jump(next).unwrap();
        b.switch_to(next);
        b.neg(one).unwrap();
        b.ret_void().unwrap();
        let proc = b.finish();
        assert!(matches!(
            verify(&proc),
            Err(CheckError::OperandNotAvailable { opcode: Opcode::Neg, .. })
        ));
    }

    #[test]
    fn phi_incoming_must_match_predecessors() {
        let mut b = ProcBuilder::new("halfphi", vec![]);
        let left = b.add_block();
        let right = b.add_block();
        let join = b.add_block();

        let cond = b.const32(1).unwrap();
        b.branch(cond, left, right).unwrap();

        b.switch_to(left);
        let x = b.const32(10).unwrap();
        b.jump(join).unwrap();

        b.switch_to(right);
        b.jump(join).unwrap();

        b.switch_to(join);
        let phi = b.phi(crate::ir::Type::Int32).unwrap();
        b.phi_incoming(phi, x, left).unwrap();
        b.ret(phi).unwrap();

        let proc = b.finish();
        assert!(matches!(
            verify(&proc),
            Err(CheckError::PhiMissingIncoming { pred, .. }) if pred == right
        ));
    }

    #[test]
    fn phi_operand_must_live_in_its_incoming_block() {
        let mut b = ProcBuilder::new("wrongside", vec![]);
        let left = b.add_block();
        let right = b.add_block();
        let join = b.add_block();

        let cond = b.const32(0).unwrap();
        b.branch(cond, left, right).unwrap();

        b.switch_to(left);
        let x = b.const32(1).unwrap();
        b.jump(join).unwrap();

        b.switch_to(right);
        let y = b.const32(2).unwrap();
        b.jump(join).unwrap();

        b.switch_to(join);
        let phi = b.phi(crate::ir::Type::Int32).unwrap();
        // x belongs to `left`, yet is claimed to arrive from `right`.
        b.phi_incoming(phi, x, right).unwrap();
        b.phi_incoming(phi, y, left).unwrap();
        b.ret(phi).unwrap();

        let proc = b.finish();
        assert!(matches!(
            verify(&proc),
            Err(CheckError::PhiOperandElsewhere { operand, .. }) if operand == x
        ));
    }

    #[test]
    fn drifted_use_count_is_reported() {
        let (mut proc, forty_two) = ret_42();
        proc.value_mut(forty_two).use_count = 5;
        assert!(matches!(
            verify(&proc),
            Err(CheckError::UseCountDrift { stored: 5, actual: 1, .. })
        ));
    }

    #[test]
    fn corrupted_payload_is_a_signature_error() {
        let (mut proc, forty_two) = ret_42();
        proc.value_mut(forty_two).payload = Payload::Cond(CmpCond::EQ);
        let err = verify(&proc).unwrap_err();
        assert!(matches!(
            err,
            CheckError::Signature { opcode: Opcode::Const, source: IrError::PayloadKind { .. }, .. }
        ));
        // The diagnostic names the value and its origin.
        let message = err.to_string();
        assert!(message.contains("const"), "{message}");
    }

    #[test]
    fn fence_with_operands_is_rejected() {
        let mut b = ProcBuilder::new("fatfence", vec![]);
        let one = b.const32(1).unwrap();
        let fence = b.fence().unwrap();
        b.ret_void().unwrap();
        let mut proc = b.finish();

        proc.value_mut(fence).operands.push(one);
        proc.value_mut(one).use_count += 1;
        assert!(matches!(
            verify(&proc),
            Err(CheckError::Signature { opcode: Opcode::Fence, source: IrError::OperandCount { .. }, .. })
        ));
    }

    #[test]
    fn memory_graph_with_fence_verifies() {
        let mut b = ProcBuilder::new("roundtrip", vec![crate::ir::Type::Int64]);
        let addr = b.argument(0).unwrap();
        b.load(crate::ir::Type::Int32, addr, HeapRange::span(0, 4)).unwrap();
        b.fence().unwrap();
        let v = b.const32(7).unwrap();
        b.store(v, addr, HeapRange::span(4, 8)).unwrap();
        b.ret_void().unwrap();
        verify(&b.finish()).unwrap();
    }

    #[test]
    fn diagnostics_name_value_opcode_and_origin() {
        let mut b = ProcBuilder::new("diag", vec![]);
        b.set_origin(Origin::new(12));
        let one = b.const32(1).unwrap();
        b.ret(one).unwrap();
        b.ret_void().unwrap();
        let proc = b.finish();

        let err = verify(&proc).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("ret"), "{message}");
        assert!(message.contains("bc@12"), "{message}");
    }

    #[test]
    fn value_count_checks_ignore_immediates() {
        // Imm payloads are not references; they must not show up in
        // use counting.
        let mut b = ProcBuilder::new("imms", vec![]);
        let x = b.const32(3).unwrap();
        let y = b.const32(3).unwrap();
        let sum = b.add(x, y).unwrap();
        b.ret(sum).unwrap();
        let proc = b.finish();
        verify(&proc).unwrap();
        assert_eq!(proc.value(x).payload, Payload::Imm(Imm::I32(3)));
    }
}
