//! The four pipeline passes. Each is a standalone [`TransformPass`]
//! with public counters, usable outside the pipeline too.
//!
//! [`TransformPass`]: crate::opt::TransformPass

pub mod cse;
pub mod dce;
pub mod fence_merge;
pub mod schedule;

pub use self::{
    cse::LocalCse, dce::DeadCodeElim, fence_merge::FenceReduction, schedule::BlockSchedule,
};
