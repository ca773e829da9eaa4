//! Shared hand-built procedures for tests across the crate.

pub mod cases;
