//! Basic blocks: ordered value lists ending in a terminator.

use crate::{impl_arena_ref, ir::ValueRef};

/// Handle of a block inside its owning Procedure's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockRef(usize);

impl_arena_ref!(BlockRef, BlockData, "b");

/// One basic block. The value list is program order; the last entry
/// must be the block's single terminator once construction finishes.
#[derive(Debug, Clone, Default)]
pub struct BlockData {
    pub values: Vec<ValueRef>,
}

impl BlockData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value in program order, the terminator of a finished block.
    pub fn last_value(&self) -> Option<ValueRef> {
        self.values.last().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Position of `value` in this block, if present.
    pub fn position_of(&self, value: ValueRef) -> Option<usize> {
        self.values.iter().position(|&v| v == value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::ArenaRef;

    #[test]
    fn value_order_is_preserved() {
        let mut block = BlockData::new();
        assert!(block.is_empty());
        assert_eq!(block.last_value(), None);

        let vals: Vec<ValueRef> = (0..3).map(ValueRef::from_handle).collect();
        block.values.extend(&vals);

        assert_eq!(block.len(), 3);
        assert_eq!(block.last_value(), Some(vals[2]));
        assert_eq!(block.position_of(vals[1]), Some(1));
        assert_eq!(block.position_of(ValueRef::from_handle(9)), None);
    }
}
