//! Provenance tokens linking IR values back to source bytecode.
//!
//! An `Origin` is attached at construction and never mutated. The IR
//! core carries it for diagnostics and for the runtime to rebuild
//! interpreter state when compiled code is abandoned; it never
//! interprets the offset itself.

/// Bytecode offset a value originated from, or `Origin::none()` for
/// values synthesized by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Origin(u32);

impl Origin {
    const NONE: u32 = u32::MAX;

    pub fn new(bytecode_offset: u32) -> Self {
        Origin(bytecode_offset)
    }
    pub fn none() -> Self {
        Origin(Self::NONE)
    }

    pub fn is_none(self) -> bool {
        self.0 == Self::NONE
    }
    pub fn bytecode_offset(self) -> Option<u32> {
        if self.is_none() { None } else { Some(self.0) }
    }
}

impl Default for Origin {
    fn default() -> Self {
        Origin::none()
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.bytecode_offset() {
            Some(off) => write!(f, "bc@{off}"),
            None => write!(f, "<none>"),
        }
    }
}
