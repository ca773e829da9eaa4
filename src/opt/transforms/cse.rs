//! Common-subexpression elimination, one block at a time.

use crate::{
    ir::{CheckError, Opcode, Payload, Procedure, Type, ValueRef},
    opt::TransformPass,
};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Forward scan per block over an available-expression table.
///
/// A later value whose key matches a table entry is rewritten to
/// `Identity(first)`, or straight to `Nop` when it is `Void` and so can
/// have no uses to forward. Afterwards every operand list in the
/// procedure is forwarded through identity chains, leaving the marks
/// unreferenced for the next sweep.
///
/// A table entry with a memory footprint is dropped as soon as a
/// scanned value's effects require ordering against it; merging across
/// such a value would move the reload or re-store to the wrong side of
/// it. Pure entries stay available for the whole block.
#[derive(Debug, Default)]
pub struct LocalCse {
    pub merged: usize,
    pub forwarded: usize,
}

/// Everything that decides whether two values compute the same result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ExprKey {
    opcode: Opcode,
    ty: Type,
    operands: SmallVec<[ValueRef; 2]>,
    payload: Payload,
}

fn enters_table(opcode: Opcode) -> bool {
    !(opcode.is_terminator()
        || opcode.is_phi()
        || opcode.is_fence()
        || matches!(opcode, Opcode::Nop | Opcode::Identity))
}

impl TransformPass for LocalCse {
    fn name(&self) -> &'static str {
        "LocalCse"
    }

    fn run(&mut self, proc: &mut Procedure) -> Result<bool, CheckError> {
        let before = self.merged + self.forwarded;
        let blocks: Vec<_> = proc.blocks().collect();
        for block in blocks {
            self.scan_block(proc, block);
        }
        self.forward_all(proc);
        log::debug!(
            "LocalCse on `{}`: {} merged, {} operands forwarded",
            proc.name,
            self.merged,
            self.forwarded
        );
        Ok(self.merged + self.forwarded != before)
    }
}

impl LocalCse {
    fn scan_block(&mut self, proc: &mut Procedure, block: crate::ir::BlockRef) {
        let mut table: HashMap<ExprKey, ValueRef> = HashMap::new();

        let order = proc.block_values(block).to_vec();
        for value in order {
            // Canonicalize operands first so keys compare resolved
            // identities.
            for index in 0..proc.value(value).operands.len() {
                let operand = proc.value(value).operands[index];
                let resolved = proc.resolve(operand);
                if resolved != operand {
                    proc.set_operand(value, index, resolved);
                    self.forwarded += 1;
                }
            }

            let data = proc.value(value);
            let opcode = data.opcode;
            let effects = data.effects();

            if enters_table(opcode) {
                let key = ExprKey {
                    opcode,
                    ty: data.ty,
                    operands: data.operands.clone(),
                    payload: data.payload.clone(),
                };
                if let Some(&first) = table.get(&key) {
                    if data.ty.is_void() {
                        proc.replace_with_nop(value).expect("LocalCse: nop rewrite");
                    } else {
                        proc.replace_with_identity(value, first)
                            .expect("LocalCse: identity rewrite");
                    }
                    self.merged += 1;
                    // The mark has no effects left; nothing to evict.
                    continue;
                }
                if effects.touches_memory() {
                    Self::evict_interfering(proc, &mut table, effects);
                }
                table.insert(key, value);
            } else if effects.touches_memory() {
                Self::evict_interfering(proc, &mut table, effects);
            }
        }
    }

    fn evict_interfering(
        proc: &Procedure,
        table: &mut HashMap<ExprKey, ValueRef>,
        effects: crate::ir::Effects,
    ) {
        table.retain(|_, &mut candidate| {
            let held = proc.value(candidate).effects();
            held.is_pure() || !held.must_stay_ordered_with(effects)
        });
    }

    /// Point every operand in the procedure at its resolution. Phi
    /// operands included: an identity shares its source's block, so
    /// incoming-block pairing survives the rewrite.
    fn forward_all(&mut self, proc: &mut Procedure) {
        let mut planned: Vec<(ValueRef, usize, ValueRef)> = Vec::new();
        for (value, data) in proc.iter_values() {
            for (index, &operand) in data.operands.iter().enumerate() {
                let resolved = proc.resolve(operand);
                if resolved != operand {
                    planned.push((value, index, resolved));
                }
            }
        }
        for (value, index, resolved) in planned {
            proc.set_operand(value, index, resolved);
            self.forwarded += 1;
        }
    }
}
