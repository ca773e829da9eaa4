//! Within-block scheduling: sink low-priority work, keep every
//! ordering constraint.

use crate::{
    ir::{BlockRef, CheckError, Effects, Procedure, ValueRef},
    opt::TransformPass,
};
use std::collections::HashMap;

/// List scheduler over the segment between a block's phi prefix and
/// its terminator.
///
/// Two kinds of edges constrain the order: operand references, and
/// effect interference between the memory-touching values of the
/// segment (a fence interferes with everything overlapping its
/// ranges, so a `top`/`top` fence never moves past a memory access).
/// Values are then laid out by decreasing critical-path height with
/// the original index as tie-break, which sinks dependency-free work
/// toward the terminator. The same input always yields the same
/// order, and a scheduled block is a fixpoint.
#[derive(Debug, Default)]
pub struct BlockSchedule {
    pub reordered: usize,
}

impl TransformPass for BlockSchedule {
    fn name(&self) -> &'static str {
        "BlockSchedule"
    }

    fn run(&mut self, proc: &mut Procedure) -> Result<bool, CheckError> {
        let mut changed = false;
        let blocks: Vec<_> = proc.blocks().collect();
        for block in blocks {
            changed |= self.schedule_block(proc, block);
        }
        log::debug!("BlockSchedule on `{}`: {} blocks reordered", proc.name, self.reordered);
        Ok(changed)
    }
}

impl BlockSchedule {
    fn schedule_block(&mut self, proc: &mut Procedure, block: BlockRef) -> bool {
        let values: Vec<ValueRef> = proc.block_values(block).to_vec();
        let Some(term_at) = values.len().checked_sub(1) else { return false };
        let phi_end = values.iter().take_while(|&&v| proc.value(v).opcode.is_phi()).count();
        if phi_end >= term_at {
            return false;
        }
        let middle = &values[phi_end..term_at];
        let n = middle.len();
        if n < 2 {
            return false;
        }

        let index_of: HashMap<ValueRef, usize> =
            middle.iter().enumerate().map(|(index, &v)| (v, index)).collect();
        let effects: Vec<Effects> = middle.iter().map(|&v| proc.value(v).effects()).collect();

        // succs[i] holds j > i that must stay after i.
        let mut succs: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (j, &value) in middle.iter().enumerate() {
            for &operand in &proc.value(value).operands {
                if let Some(&i) = index_of.get(&operand) {
                    succs[i].push(j);
                }
            }
        }
        for i in 0..n {
            if effects[i].is_pure() {
                continue;
            }
            for j in (i + 1)..n {
                if !effects[j].is_pure() && effects[i].must_stay_ordered_with(effects[j]) {
                    succs[i].push(j);
                }
            }
        }

        // Program order is already topological, so one reverse sweep
        // settles every height.
        let mut height = vec![1usize; n];
        for i in (0..n).rev() {
            for &j in &succs[i] {
                height[i] = height[i].max(height[j] + 1);
            }
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&i| (std::cmp::Reverse(height[i]), i));
        if order.iter().enumerate().all(|(position, &i)| position == i) {
            return false;
        }

        let mut rebuilt = Vec::with_capacity(values.len());
        rebuilt.extend_from_slice(&values[..phi_end]);
        rebuilt.extend(order.iter().map(|&i| middle[i]));
        rebuilt.push(values[term_at]);
        proc.set_block_values(block, rebuilt);
        self.reordered += 1;
        true
    }
}
