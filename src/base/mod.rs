//! Arena reference infrastructure shared by every IR entity kind.
//!
//! All cross-references inside a procedure are typed handles into
//! `slab::Slab` arenas, never pointers. A handle stays valid until the
//! owning procedure frees the entry; dereferencing a freed handle is a
//! compiler bug and panics.

use slab::Slab;

pub trait ArenaRef: Copy + Eq + std::fmt::Debug {
    type Data: Sized;

    fn from_handle(handle: usize) -> Self;
    fn handle(self) -> usize;

    /// Allocate `data` and return the handle pointing at it.
    fn alloc(arena: &mut Slab<Self::Data>, data: Self::Data) -> Self {
        Self::from_handle(arena.insert(data))
    }

    fn is_alive(self, arena: &Slab<Self::Data>) -> bool {
        arena.contains(self.handle())
    }

    fn as_data(self, arena: &Slab<Self::Data>) -> Option<&Self::Data> {
        arena.get(self.handle())
    }
    fn as_data_mut(self, arena: &mut Slab<Self::Data>) -> Option<&mut Self::Data> {
        arena.get_mut(self.handle())
    }

    fn to_data(self, arena: &Slab<Self::Data>) -> &Self::Data {
        match arena.get(self.handle()) {
            Some(data) => data,
            None => panic!("stale arena handle {} (use after free?)", self.handle()),
        }
    }
    fn to_data_mut(self, arena: &mut Slab<Self::Data>) -> &mut Self::Data {
        match arena.get_mut(self.handle()) {
            Some(data) => data,
            None => panic!("stale arena handle {} (use after free?)", self.handle()),
        }
    }
}

/// Stamp out an [`ArenaRef`] impl (plus `Display`) for a
/// `struct Ref(usize)` newtype. The prefix is what dumps print before
/// the handle, e.g. `v42` or `b3`.
#[macro_export]
macro_rules! impl_arena_ref {
    ($ref_ty:ident, $data_ty:ident, $prefix:literal) => {
        impl $crate::base::ArenaRef for $ref_ty {
            type Data = $data_ty;

            fn from_handle(handle: usize) -> Self {
                Self(handle)
            }
            fn handle(self) -> usize {
                self.0
            }
        }

        impl std::fmt::Display for $ref_ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct NodeRef(usize);

    struct Node {
        number: usize,
    }

    impl_arena_ref!(NodeRef, Node, "n");

    #[test]
    fn alloc_and_deref() {
        let mut arena = Slab::new();
        let a = NodeRef::alloc(&mut arena, Node { number: 4 });
        let b = NodeRef::alloc(&mut arena, Node { number: 7 });
        assert_ne!(a, b);
        assert_eq!(a.to_data(&arena).number, 4);
        assert_eq!(b.to_data(&arena).number, 7);
        assert_eq!(format!("{a}"), format!("n{}", a.handle()));

        b.to_data_mut(&mut arena).number = 8;
        assert_eq!(b.to_data(&arena).number, 8);
    }

    #[test]
    fn freed_handle_is_dead() {
        let mut arena = Slab::new();
        let a = NodeRef::alloc(&mut arena, Node { number: 1 });
        assert!(a.is_alive(&arena));
        arena.remove(a.handle());
        assert!(!a.is_alive(&arena));
        assert!(a.as_data(&arena).is_none());
    }

    #[test]
    #[should_panic(expected = "stale arena handle")]
    fn stale_handle_panics() {
        let mut arena = Slab::new();
        let a = NodeRef::alloc(&mut arena, Node { number: 1 });
        arena.remove(a.handle());
        let _ = a.to_data(&arena);
    }
}
