//! Result types of IR values.
//!
//! The catalogue is deliberately small: the scalar shapes a JIT tier
//! actually materializes in registers, plus `Void` for values that
//! produce nothing and `Tuple` for multi-result nodes. Tuple element
//! lists are interned in the owning [`Procedure`](crate::ir::Procedure);
//! a [`TupleTypeRef`] is an index into that table.

/// Index of an interned tuple-element list inside one Procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TupleTypeRef(pub u32);

impl TupleTypeRef {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Type {
    #[default]
    Void,
    Int32,
    Int64,
    Float32,
    Float64,
    Tuple(TupleTypeRef),
}

impl Type {
    pub fn is_void(self) -> bool {
        self == Type::Void
    }
    pub fn is_int(self) -> bool {
        matches!(self, Type::Int32 | Type::Int64)
    }
    pub fn is_float(self) -> bool {
        matches!(self, Type::Float32 | Type::Float64)
    }
    pub fn is_tuple(self) -> bool {
        matches!(self, Type::Tuple(_))
    }
    /// A single-register value: integer or float, not `Void` or a tuple.
    pub fn is_scalar(self) -> bool {
        self.is_int() || self.is_float()
    }

    /// Bit width of a scalar type, `None` for `Void` and tuples.
    pub fn bits(self) -> Option<u32> {
        match self {
            Type::Int32 | Type::Float32 => Some(32),
            Type::Int64 | Type::Float64 => Some(64),
            Type::Void | Type::Tuple(_) => None,
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Int32 => write!(f, "i32"),
            Type::Int64 => write!(f, "i64"),
            Type::Float32 => write!(f, "f32"),
            Type::Float64 => write!(f, "f64"),
            Type::Tuple(tref) => write!(f, "tuple#{}", tref.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates_partition_the_catalogue() {
        assert!(Type::Void.is_void());
        assert!(!Type::Void.is_scalar());

        for ty in [Type::Int32, Type::Int64] {
            assert!(ty.is_int() && ty.is_scalar() && !ty.is_float());
        }
        for ty in [Type::Float32, Type::Float64] {
            assert!(ty.is_float() && ty.is_scalar() && !ty.is_int());
        }

        let tup = Type::Tuple(TupleTypeRef(0));
        assert!(tup.is_tuple() && !tup.is_scalar() && !tup.is_void());
    }

    #[test]
    fn display_names() {
        assert_eq!(Type::Void.to_string(), "void");
        assert_eq!(Type::Int32.to_string(), "i32");
        assert_eq!(Type::Int64.to_string(), "i64");
        assert_eq!(Type::Float32.to_string(), "f32");
        assert_eq!(Type::Float64.to_string(), "f64");
        assert_eq!(Type::Tuple(TupleTypeRef(3)).to_string(), "tuple#3");
    }

    #[test]
    fn scalar_bit_widths() {
        assert_eq!(Type::Int32.bits(), Some(32));
        assert_eq!(Type::Float64.bits(), Some(64));
        assert_eq!(Type::Void.bits(), None);
    }
}
