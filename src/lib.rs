//! # Opal-IR
//!
//! An effect-aware SSA intermediate representation for an optimizing JIT
//! backend: typed value nodes in slab arenas, a heap-range effect lattice,
//! and the transform passes (CSE, DCE, scheduling, fence reduction) that
//! consult it.

pub mod base;
pub mod ir;
pub mod opt;
pub mod testing;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
