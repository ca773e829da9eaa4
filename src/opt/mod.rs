//! Effect-aware transform passes and the pipeline driving them.
//!
//! Every pass mutates the Procedure in place and relies on the
//! Identity/Nop rewrite protocol instead of eager deletion; dead-code
//! elimination at the end of each round is the sweep that actually
//! frees nodes. The pipeline re-runs the verifier between passes when
//! configured, so a pass that breaks a graph invariant is caught at the
//! pass boundary, not three passes later.

pub mod transforms;

pub use self::transforms::{BlockSchedule, DeadCodeElim, FenceReduction, LocalCse};

use crate::ir::{CheckError, Procedure, verify};

/// One graph-rewriting pass over a Procedure.
pub trait TransformPass {
    fn name(&self) -> &'static str;

    /// Rewrite `proc`, reporting whether anything changed. The graph
    /// must be verifier-valid again when the pass returns.
    fn run(&mut self, proc: &mut Procedure) -> Result<bool, CheckError>;
}

/// Pipeline tuning knobs. No global state; callers hand a config to
/// [`optimize_procedure`] per compilation.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Re-verify the graph after every pass. On by default in debug
    /// builds; release pipelines usually verify once up front only.
    pub verify_each_pass: bool,
    /// Upper bound on optimize rounds; the pipeline stops earlier at
    /// the first round that changes nothing.
    pub max_rounds: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig { verify_each_pass: cfg!(debug_assertions), max_rounds: 4 }
    }
}

/// Run the fixed pipeline over `proc` until a round changes nothing or
/// `max_rounds` is hit. Returns whether any pass changed the graph.
///
/// A verifier failure is the fault of the pass that just ran; it is
/// reported with that pass's name and aborts the compilation.
pub fn optimize_procedure(
    proc: &mut Procedure,
    config: &PipelineConfig,
) -> Result<bool, CheckError> {
    if config.verify_each_pass {
        verify(proc)?;
    }

    let mut passes: [Box<dyn TransformPass>; 4] = [
        Box::new(LocalCse::default()),
        Box::new(FenceReduction::default()),
        Box::new(BlockSchedule::default()),
        Box::new(DeadCodeElim::default()),
    ];

    let mut any_change = false;
    for round in 0..config.max_rounds {
        let mut round_changed = false;
        for pass in &mut passes {
            let changed = pass.run(proc)?;
            log::debug!(
                "round {round}: {} {} `{}`",
                pass.name(),
                if changed { "changed" } else { "left" },
                proc.name
            );
            if config.verify_each_pass
                && let Err(err) = verify(proc)
            {
                log::error!("{} broke procedure `{}`: {err}", pass.name(), proc.name);
                return Err(err);
            }
            round_changed |= changed;
        }
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("after round {round}:\n{proc}");
        }
        any_change |= round_changed;
        if !round_changed {
            break;
        }
    }
    Ok(any_change)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{HeapRange, Opcode};
    use crate::testing::cases::{self, MemoryRoundtrip, StoreThenLoad};

    fn full_checking() -> PipelineConfig {
        PipelineConfig { verify_each_pass: true, ..PipelineConfig::default() }
    }

    fn count_opcode(proc: &Procedure, opcode: Opcode) -> usize {
        proc.iter_values().filter(|(_, data)| data.opcode == opcode).count()
    }

    #[test]
    fn load_fence_store_keeps_its_fence() {
        let MemoryRoundtrip { mut proc, load, fence, store } = cases::memory_roundtrip();

        optimize_procedure(&mut proc, &full_checking()).unwrap();
        verify(&proc).unwrap();

        assert_eq!(count_opcode(&proc, Opcode::Fence), 1);
        assert_eq!(count_opcode(&proc, Opcode::Load), 1);
        assert_eq!(count_opcode(&proc, Opcode::Store), 1);
        let order = proc.block_values(proc.entry().unwrap());
        let at = |v| order.iter().position(|&x| x == v).unwrap();
        assert!(at(load) < at(fence) && at(fence) < at(store), "{proc}");
    }

    #[test]
    fn overlapping_store_load_order_survives_the_pipeline() {
        let StoreThenLoad { mut proc, store, load } =
            cases::store_then_load(HeapRange::span(0, 8));

        optimize_procedure(&mut proc, &full_checking()).unwrap();
        verify(&proc).unwrap();

        let order = proc.block_values(proc.entry().unwrap());
        let store_at = order.iter().position(|&v| v == store).unwrap();
        let load_at = order.iter().position(|&v| v == load).unwrap();
        assert!(store_at < load_at, "{proc}");
    }

    #[test]
    fn disjoint_store_and_load_both_survive() {
        let StoreThenLoad { mut proc, store, load } =
            cases::store_then_load(HeapRange::span(64, 72));

        optimize_procedure(&mut proc, &full_checking()).unwrap();
        verify(&proc).unwrap();

        assert_eq!(proc.value(store).opcode, Opcode::Store);
        assert_eq!(proc.value(load).opcode, Opcode::Load);
    }

    #[test]
    fn pipeline_reaches_a_fixpoint() {
        let mut proc = cases::duplicate_sums();

        let config = full_checking();
        let changed = optimize_procedure(&mut proc, &config).unwrap();
        assert!(changed);
        // The duplicate sum is merged and swept.
        assert_eq!(count_opcode(&proc, Opcode::Add), 1);
        assert_eq!(count_opcode(&proc, Opcode::Mul), 1);
        assert_eq!(count_opcode(&proc, Opcode::Identity), 0);
        assert_eq!(count_opcode(&proc, Opcode::Nop), 0);

        let settled = proc.to_string();
        let changed_again = optimize_procedure(&mut proc, &config).unwrap();
        assert!(!changed_again);
        assert_eq!(proc.to_string(), settled);
    }

    #[test]
    fn already_scheduled_loop_is_left_alone() {
        let mut proc = cases::counting_loop();
        let before = proc.to_string();

        let changed = optimize_procedure(&mut proc, &full_checking()).unwrap();
        assert!(!changed, "{proc}");
        assert_eq!(proc.to_string(), before);
        assert_eq!(count_opcode(&proc, Opcode::Phi), 3);
    }

    #[test]
    fn rounds_are_bounded() {
        let mut proc = cases::duplicate_sums();

        let config = PipelineConfig { verify_each_pass: true, max_rounds: 0 };
        let changed = optimize_procedure(&mut proc, &config).unwrap();
        assert!(!changed);
        assert_eq!(count_opcode(&proc, Opcode::Add), 2);
    }
}
