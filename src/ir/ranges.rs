//! The heap-range lattice and per-node effect descriptors.
//!
//! A [`HeapRange`] names a set of abstract heap locations as a half-open
//! interval of `u32` positions. The front-end assigns disjoint positions
//! to the location classes it distinguishes (object fields, typed-array
//! contents, stack slots, ...), usually through a [`HeapCatalog`]. Since
//! assigned sub-ranges are disjoint, the interval hull used for union is
//! a sound over-approximation.
//!
//! The lattice has `top` (may overlap anything, the conservative choice
//! whenever alias information is missing) and `absolute` (touches
//! nothing, the footprint of pure operations).

use smol_str::SmolStr;

/// A set of abstract heap locations, `[begin, end)`.
///
/// `top()` covers every location and overlaps everything, including
/// itself. `absolute()` is empty and overlaps nothing. Empty ranges are
/// normalized to `0..0` so equality works.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeapRange {
    begin: u32,
    end: u32,
}

impl HeapRange {
    /// The empty range: touches nothing.
    pub const fn absolute() -> Self {
        HeapRange { begin: 0, end: 0 }
    }

    /// The universal range: may touch anything.
    pub const fn top() -> Self {
        HeapRange { begin: 0, end: u32::MAX }
    }

    /// A single abstract location.
    pub fn unit(position: u32) -> Self {
        debug_assert!(position < u32::MAX, "unit position out of lattice");
        HeapRange { begin: position, end: position + 1 }
    }

    /// The locations `[begin, end)`. An empty span collapses to
    /// `absolute()`.
    pub fn span(begin: u32, end: u32) -> Self {
        debug_assert!(begin <= end, "inverted heap range {begin}..{end}");
        if begin >= end { Self::absolute() } else { HeapRange { begin, end } }
    }

    pub fn begin(self) -> u32 {
        self.begin
    }
    pub fn end(self) -> u32 {
        self.end
    }

    pub fn is_absolute(self) -> bool {
        self.begin == self.end
    }
    pub fn is_top(self) -> bool {
        self == Self::top()
    }

    /// Whether the two location sets intersect. Empty ranges overlap
    /// nothing; `top` overlaps every non-empty range.
    pub fn overlaps(self, other: HeapRange) -> bool {
        self.begin < other.end && other.begin < self.end
    }
}

/// Union: the smallest range covering both operands. Associative and
/// commutative with `absolute()` as identity.
impl std::ops::BitOr for HeapRange {
    type Output = HeapRange;

    fn bitor(self, rhs: HeapRange) -> HeapRange {
        if self.is_absolute() {
            return rhs;
        }
        if rhs.is_absolute() {
            return self;
        }
        HeapRange { begin: self.begin.min(rhs.begin), end: self.end.max(rhs.end) }
    }
}

impl std::ops::BitOrAssign for HeapRange {
    fn bitor_assign(&mut self, rhs: HeapRange) {
        *self = *self | rhs;
    }
}

impl std::fmt::Display for HeapRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_absolute() {
            write!(f, "none")
        } else if self.is_top() {
            write!(f, "top")
        } else {
            write!(f, "{}..{}", self.begin, self.end)
        }
    }
}

/// What a value does to the heap: the locations it may read, the
/// locations it may write, and whether it is a fence.
///
/// A fence orders every memory access overlapping its ranges, loads
/// included, so interference checks against a fence cover all four
/// read/write pairings instead of only the write-involving ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Effects {
    pub reads: HeapRange,
    pub writes: HeapRange,
    pub fence: bool,
}

impl Effects {
    /// No effect at all: the footprint of pure operations.
    pub const fn none() -> Self {
        Effects { reads: HeapRange::absolute(), writes: HeapRange::absolute(), fence: false }
    }

    pub fn read_only(reads: HeapRange) -> Self {
        Effects { reads, ..Self::none() }
    }
    pub fn write_only(writes: HeapRange) -> Self {
        Effects { writes, ..Self::none() }
    }
    pub fn for_fence(read: HeapRange, write: HeapRange) -> Self {
        Effects { reads: read, writes: write, fence: true }
    }

    pub fn is_pure(self) -> bool {
        self.reads.is_absolute() && self.writes.is_absolute() && !self.fence
    }

    pub fn touches_memory(self) -> bool {
        !self.is_pure()
    }

    /// Whether program order between two values must be preserved.
    ///
    /// Plain memory operations stay ordered when a write on one side
    /// overlaps a read or write on the other; two reads of the same
    /// location may reorder freely. When either side is a fence, a
    /// read/read overlap pins the order too.
    pub fn must_stay_ordered_with(self, other: Effects) -> bool {
        if self.writes.overlaps(other.writes)
            || self.writes.overlaps(other.reads)
            || self.reads.overlaps(other.writes)
        {
            return true;
        }
        (self.fence || other.fence) && self.reads.overlaps(other.reads)
    }
}

impl Default for Effects {
    fn default() -> Self {
        Effects::none()
    }
}

impl std::fmt::Display for Effects {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "reads:{} writes:{}", self.reads, self.writes)?;
        if self.fence {
            write!(f, " fence")?;
        }
        Ok(())
    }
}

/// Front-end name table handing out stable disjoint unit ranges.
///
/// Registering the same name twice returns the same range. The IR core
/// never interprets the names; they exist so front-end code and dumps
/// can speak about "object field" instead of a bare position.
#[derive(Debug, Default)]
pub struct HeapCatalog {
    entries: Vec<(SmolStr, HeapRange)>,
}

impl HeapCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Range for `name`, allocating the next free position on first use.
    pub fn declare(&mut self, name: &str) -> HeapRange {
        if let Some(range) = self.lookup(name) {
            return range;
        }
        let range = HeapRange::unit(self.entries.len() as u32);
        self.entries.push((SmolStr::new(name), range));
        range
    }

    pub fn lookup(&self, name: &str) -> Option<HeapRange> {
        self.entries.iter().find(|(n, _)| n == name).map(|&(_, r)| r)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, HeapRange)> {
        self.entries.iter().map(|(n, r)| (n.as_str(), *r))
    }
}
