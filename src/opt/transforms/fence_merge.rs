//! Fence coalescing and retirement.

use crate::{
    ir::{BlockRef, CheckError, Effects, HeapRange, Opcode, Payload, Procedure, ValueRef},
    opt::TransformPass,
};

/// Merges fence pairs and retires fences with nothing to order.
///
/// Two fences in one block merge when no value between them needs
/// ordering against either one; the earlier fence keeps its identity
/// and origin and takes the union of both range pairs, the later one
/// becomes `Nop`. A fence is retired once no non-fence value anywhere
/// in the procedure has effects overlapping its ranges. The window is
/// the whole procedure: a barrier also orders accesses sitting in
/// other blocks, so a narrower window would drop live barriers.
#[derive(Debug, Default)]
pub struct FenceReduction {
    pub merged: usize,
    pub retired: usize,
}

impl TransformPass for FenceReduction {
    fn name(&self) -> &'static str {
        "FenceReduction"
    }

    fn run(&mut self, proc: &mut Procedure) -> Result<bool, CheckError> {
        let before = self.merged + self.retired;
        let blocks: Vec<_> = proc.blocks().collect();
        for block in blocks {
            self.merge_in_block(proc, block);
        }
        self.retire_unneeded(proc);
        log::debug!(
            "FenceReduction on `{}`: {} merged, {} retired",
            proc.name,
            self.merged,
            self.retired
        );
        Ok(self.merged + self.retired != before)
    }
}

impl FenceReduction {
    fn merge_in_block(&mut self, proc: &mut Procedure, block: BlockRef) {
        loop {
            let Some((first, second)) = Self::find_mergeable_pair(proc, block) else {
                return;
            };
            let (r1, w1) = Self::fence_ranges(proc, first);
            let (r2, w2) = Self::fence_ranges(proc, second);
            proc.replace(
                first,
                Opcode::Fence,
                &[],
                Payload::FenceRanges { read: r1 | r2, write: w1 | w2 },
            )
            .expect("FenceReduction: widening rewrite");
            proc.replace_with_nop(second).expect("FenceReduction: nop rewrite");
            self.merged += 1;
        }
    }

    /// Closest fence pair with no intervening value ordering against
    /// either of them.
    fn find_mergeable_pair(proc: &Procedure, block: BlockRef) -> Option<(ValueRef, ValueRef)> {
        let values = proc.block_values(block);
        let fences: Vec<usize> = values
            .iter()
            .enumerate()
            .filter(|&(_, &v)| proc.value(v).opcode.is_fence())
            .map(|(index, _)| index)
            .collect();

        'pairs: for pair in fences.windows(2) {
            let (i, j) = (pair[0], pair[1]);
            let first_effects = proc.value(values[i]).effects();
            let second_effects = proc.value(values[j]).effects();
            for &between in &values[i + 1..j] {
                let held = proc.value(between).effects();
                if held.must_stay_ordered_with(first_effects)
                    || held.must_stay_ordered_with(second_effects)
                {
                    continue 'pairs;
                }
            }
            return Some((values[i], values[j]));
        }
        None
    }

    fn fence_ranges(proc: &Procedure, fence: ValueRef) -> (HeapRange, HeapRange) {
        let &Payload::FenceRanges { read, write } = &proc.value(fence).payload else {
            unreachable!("fence payloads are range pairs");
        };
        (read, write)
    }

    fn retire_unneeded(&mut self, proc: &mut Procedure) {
        let footprints: Vec<Effects> = proc
            .iter_values()
            .filter(|(_, data)| !data.opcode.is_fence())
            .map(|(_, data)| data.effects())
            .filter(|effects| effects.touches_memory())
            .collect();

        let fences: Vec<(ValueRef, Effects)> = proc
            .iter_values()
            .filter(|(_, data)| data.opcode.is_fence())
            .map(|(value, data)| (value, data.effects()))
            .collect();

        for (fence, effects) in fences {
            let needed = footprints.iter().any(|held| held.must_stay_ordered_with(effects));
            if !needed {
                proc.replace_with_nop(fence).expect("FenceReduction: retire rewrite");
                self.retired += 1;
            }
        }
    }
}
