//! Dead-code elimination over the whole procedure.

use crate::{
    ir::{CheckError, Procedure, ValueRef},
    opt::TransformPass,
};
use std::collections::{BTreeSet, VecDeque};

/// Worklist mark from effect roots, then sweep.
///
/// Roots are terminators, fences, and every value whose write range is
/// not `absolute()`: a non-absolute write may be externally observable,
/// so it stays even at zero uses. Marking follows operand edges, so a
/// root keeps its whole input cone alive. Everything unmarked is freed,
/// `Nop`s and orphaned `Identity`s included.
#[derive(Debug, Default)]
pub struct DeadCodeElim {
    pub removed: usize,
}

#[derive(Debug, Default)]
struct LiveMarker {
    live: BTreeSet<ValueRef>,
    queue: VecDeque<ValueRef>,
}

impl LiveMarker {
    fn init_roots(&mut self, proc: &Procedure) {
        for (value, data) in proc.iter_values() {
            let rooted = data.opcode.is_terminator() || {
                let effects = data.effects();
                effects.fence || !effects.writes.is_absolute()
            };
            if rooted {
                self.push_mark(value);
            }
        }
    }

    fn push_mark(&mut self, value: ValueRef) {
        if self.live.insert(value) {
            self.queue.push_back(value);
        }
    }

    fn mark_all(&mut self, proc: &Procedure) {
        while let Some(value) = self.queue.pop_front() {
            for &operand in &proc.value(value).operands {
                self.push_mark(operand);
            }
        }
    }
}

impl TransformPass for DeadCodeElim {
    fn name(&self) -> &'static str {
        "DeadCodeElim"
    }

    fn run(&mut self, proc: &mut Procedure) -> Result<bool, CheckError> {
        let mut marker = LiveMarker::default();
        marker.init_roots(proc);
        marker.mark_all(proc);

        let dead: Vec<ValueRef> = proc
            .iter_values()
            .map(|(value, _)| value)
            .filter(|value| !marker.live.contains(value))
            .collect();

        // A dead value may still be referenced by another dead value;
        // break those edges before freeing anything.
        for &value in &dead {
            proc.strip_operands(value);
        }
        for &value in &dead {
            proc.remove(value).expect("DeadCodeElim: dead value still referenced");
        }

        self.removed += dead.len();
        log::debug!("DeadCodeElim on `{}`: {} values removed", proc.name, dead.len());
        Ok(!dead.is_empty())
    }
}
