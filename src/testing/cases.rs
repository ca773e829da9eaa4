//! No front end targets this IR yet, so the shared test procedures are
//! built by hand here. Each builder carries the text form of what it
//! constructs; pass tests assert against the handles the case structs
//! hand back instead of re-deriving them.

use crate::ir::{CmpCond, HeapRange, ProcBuilder, Procedure, Type, ValueRef};

/// Handles into the procedure built by [`memory_roundtrip`].
pub struct MemoryRoundtrip {
    pub proc: Procedure,
    pub load: ValueRef,
    pub fence: ValueRef,
    pub store: ValueRef,
}

/// Load one field, full fence, store into a disjoint field. Only the
/// fence keeps the two accesses ordered.
///
/// ``` opal-ir
/// proc @roundtrip(i64) {
/// b0:
///   v0 = argument i64 #0
///   v1 = load i32 v0, heap 0..8
///   fence read top, write top
///   store v1, v0, heap 16..24
///   ret v1
/// }
/// ```
pub fn memory_roundtrip() -> MemoryRoundtrip {
    let mut b = ProcBuilder::new("roundtrip", vec![Type::Int64]);
    let addr = b.argument(0).unwrap();
    let load = b.load(Type::Int32, addr, HeapRange::span(0, 8)).unwrap();
    let fence = b.fence().unwrap();
    let store = b.store(load, addr, HeapRange::span(16, 24)).unwrap();
    b.ret(load).unwrap();
    MemoryRoundtrip { proc: b.finish(), load, fence, store }
}

/// Handles into the procedure built by [`store_then_load`].
pub struct StoreThenLoad {
    pub proc: Procedure,
    pub store: ValueRef,
    pub load: ValueRef,
}

/// Store a constant into `0..8`, then load `load_range` through the
/// same base pointer. Text form with `load_range = 0..8`:
///
/// ``` opal-ir
/// proc @storeload(i64) {
/// b0:
///   v0 = argument i64 #0
///   v1 = const i32 7
///   store v1, v0, heap 0..8
///   v3 = load i32 v0, heap 0..8
///   ret v3
/// }
/// ```
pub fn store_then_load(load_range: HeapRange) -> StoreThenLoad {
    let mut b = ProcBuilder::new("storeload", vec![Type::Int64]);
    let addr = b.argument(0).unwrap();
    let seven = b.const32(7).unwrap();
    let store = b.store(seven, addr, HeapRange::span(0, 8)).unwrap();
    let load = b.load(Type::Int32, addr, load_range).unwrap();
    b.ret(load).unwrap();
    StoreThenLoad { proc: b.finish(), store, load }
}

/// The same sum computed twice, both copies feeding the result.
///
/// ``` opal-ir
/// proc @twice(i32, i32) {
/// b0:
///   v0 = argument i32 #0
///   v1 = argument i32 #1
///   v2 = add i32 v0, v1
///   v3 = add i32 v0, v1
///   v4 = mul i32 v2, v3
///   ret v4
/// }
/// ```
pub fn duplicate_sums() -> Procedure {
    let mut b = ProcBuilder::new("twice", vec![Type::Int32, Type::Int32]);
    let x = b.argument(0).unwrap();
    let y = b.argument(1).unwrap();
    let first = b.add(x, y).unwrap();
    let second = b.add(x, y).unwrap();
    let product = b.mul(first, second).unwrap();
    b.ret(product).unwrap();
    b.finish()
}

/// Counting loop with a loop-carried phi. The body reads the header's
/// phi through a phi of its own, so every cross-block edge goes
/// through an incoming list.
///
/// ``` opal-ir
/// proc @count_to_ten() {
/// b0:
///   v0 = const i32 0
///   jump b1
/// b1:
///   v2 = phi i32 [v0, b0], [v8, b2]
///   v3 = const i32 10
///   v4 = icmp slt i32 v2, v3
///   br v4, b2, b3
/// b2:
///   v6 = phi i32 [v2, b1]
///   v7 = const i32 1
///   v8 = add i32 v6, v7
///   jump b1
/// b3:
///   v10 = phi i32 [v2, b1]
///   ret v10
/// }
/// ```
pub fn counting_loop() -> Procedure {
    let mut b = ProcBuilder::new("count_to_ten", vec![]);
    let entry = b.current_block();
    let header = b.add_block();
    let body = b.add_block();
    let exit = b.add_block();

    let zero = b.const32(0).unwrap();
    b.jump(header).unwrap();

    b.switch_to(header);
    let counter = b.phi(Type::Int32).unwrap();
    let limit = b.const32(10).unwrap();
    let more = b.icmp(CmpCond::LT | CmpCond::SIGNED, counter, limit).unwrap();
    b.branch(more, body, exit).unwrap();

    b.switch_to(body);
    let carried = b.phi(Type::Int32).unwrap();
    b.phi_incoming(carried, counter, header).unwrap();
    let one = b.const32(1).unwrap();
    let next = b.add(carried, one).unwrap();
    b.jump(header).unwrap();

    b.phi_incoming(counter, zero, entry).unwrap();
    b.phi_incoming(counter, next, body).unwrap();

    b.switch_to(exit);
    let result = b.phi(Type::Int32).unwrap();
    b.phi_incoming(result, counter, header).unwrap();
    b.ret(result).unwrap();

    b.finish()
}
