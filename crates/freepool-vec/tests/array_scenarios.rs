//! End-to-end behaviour of `DynArray` over the pool and a heap mock.

use freepool_arena::{ArenaRegistry, PoolAllocator, PoolConfig};
use freepool_core::ArrayError;
use freepool_test_utils::{DropLog, HeapAllocator, PanicOnClone};
use freepool_vec::DynArray;

fn pool<T: 'static>(registry: &ArenaRegistry) -> PoolAllocator<T> {
    PoolAllocator::from_registry(registry).unwrap()
}

// ── Construction ────────────────────────────────────────────────

#[test]
fn default_construction() {
    let v = DynArray::<i32>::new();
    assert_eq!(v.len(), 0);
    assert_eq!(v.capacity(), 0);
}

#[test]
fn sized_construction() {
    let v = DynArray::<i32>::with_len(5).unwrap();
    assert_eq!(v.len(), 5);
    assert!(v.capacity() >= 5);
}

#[test]
fn value_construction() {
    let v = DynArray::from_elem(5, &1).unwrap();
    assert_eq!(v.len(), 5);
    assert!(v.capacity() >= 5);
    assert!(v.iter().all(|&x| x == 1));
}

#[test]
fn range_construction() {
    let src = DynArray::from_elem(5, &1).unwrap();
    let copy = DynArray::try_from_iter(src.iter().copied()).unwrap();
    assert_eq!(copy.len(), 5);
    assert_eq!(copy, src);
}

#[test]
fn copy_and_move_construction() {
    let src = DynArray::from_elem(5, &1).unwrap();
    let copy = src.clone();
    assert_eq!(copy, src);
    assert_eq!(copy.len(), 5);

    let mut src = src;
    let moved = src.take();
    assert_eq!(moved.len(), 5);
    assert!(src.is_empty());
}

// ── Mutation scenarios ──────────────────────────────────────────

#[test]
fn push_then_pop_everything() {
    let mut v = DynArray::new();
    for i in 0..1000u32 {
        v.push(i).unwrap();
    }
    assert_eq!(v.len(), 1000);
    assert_eq!(v.back(), Some(&999));
    let mut expected = 1000;
    while let Some(x) = v.pop() {
        expected -= 1;
        assert_eq!(x, expected);
    }
    assert!(v.is_empty());
}

#[test]
fn insert_at_cursor_position() {
    let mut v = DynArray::from_slice(&[1, 2, 4, 5]).unwrap();
    let pos = v.index_of(v.begin() + 2).unwrap();
    v.insert(pos, 3).unwrap();
    assert_eq!(v, [1, 2, 3, 4, 5]);
}

#[test]
fn erase_first_element() {
    let mut v = DynArray::from_slice(&[1, 2, 3, 4, 5]).unwrap();
    let next = v.erase(0).unwrap();
    assert_eq!(v.len(), 4);
    assert_eq!(v[next], 2);
}

#[test]
fn reserve_then_shrink() {
    let mut v = DynArray::from_slice(&[1, 2, 3, 4, 5]).unwrap();
    v.reserve(20).unwrap();
    assert!(v.capacity() >= 20);
    v.shrink_to_fit().unwrap();
    assert!(v.capacity() >= v.len());
    assert!(v.capacity() <= v.len() + 1);
    assert_eq!(v, [1, 2, 3, 4, 5]);
}

#[test]
fn resize_up_and_down() {
    let mut v = DynArray::from_slice(&[1, 2, 3]).unwrap();
    v.resize_default(5).unwrap();
    assert_eq!(v, [1, 2, 3, 0, 0]);
    v.resize_fill(2, &7).unwrap();
    assert_eq!(v, [7, 7]);
}

#[test]
fn by_value_iteration_moves_elements_out() {
    let v = DynArray::from_slice(&["x".to_string(), "y".to_string()]).unwrap();
    let collected: Vec<String> = v.into_iter().rev().collect();
    assert_eq!(collected, ["y", "x"]);
}

// ── Allocator interplay ─────────────────────────────────────────

#[test]
fn storage_round_trips_through_pool() {
    let registry = ArenaRegistry::with_config(PoolConfig::new(1024));
    let alloc = pool::<u64>(&registry);
    {
        let mut a = DynArray::new_in(alloc.clone());
        let mut b = DynArray::new_in(alloc.clone());
        for i in 0..100 {
            a.push(i).unwrap();
            b.insert(0, i).unwrap();
        }
        a.erase_range(10..90).unwrap();
        b.shrink_to_fit().unwrap();
        assert_eq!(a.len(), 20);
        assert_eq!(b.len(), 100);
        let arena = registry.arena::<u64>().unwrap();
        arena.check_invariants().unwrap();
        assert_eq!(arena.stats().used, a.capacity() + b.capacity());
    }
    let stats = alloc.stats().unwrap();
    assert_eq!(stats.used, 0);
    assert_eq!(stats.block_count, 1);
    assert_eq!(stats.allocations, stats.deallocations);
}

#[test]
fn exhausted_pool_leaves_array_intact() {
    let registry = ArenaRegistry::with_config(PoolConfig::new(16));
    let mut v = DynArray::new_in(pool::<u32>(&registry));
    v.assign_slice(&[1, 2, 3]).unwrap();
    let cap = v.capacity();
    let err = v.reserve(100).unwrap_err();
    assert!(matches!(err, ArrayError::Alloc(_)));
    assert_eq!(v, [1, 2, 3]);
    assert_eq!(v.capacity(), cap);
    let err = v.insert_fill(1, 50, &0).unwrap_err();
    assert!(matches!(err, ArrayError::Alloc(_)));
    assert_eq!(v, [1, 2, 3]);
}

#[test]
fn arrays_on_other_allocators() {
    let heap = HeapAllocator::new();
    {
        let mut v = DynArray::new_in(heap.clone());
        v.extend_from_iter(0..50u16).unwrap();
        v.insert_iter(25, [100, 101]).unwrap();
        assert_eq!(v.len(), 52);
        assert_eq!(v[25], 100);
        assert!(heap.live_slots() >= 52);
    }
    assert_eq!(heap.live_slots(), 0);
    assert_eq!(heap.allocations(), heap.deallocations());
}

#[test]
fn budgeted_heap_reports_out_of_memory() {
    let heap = HeapAllocator::with_budget(10);
    let mut v = DynArray::new_in(heap.clone());
    let err = v.assign_fill(6, &1u8).unwrap_err();
    assert!(matches!(err, ArrayError::Alloc(_)));
    assert!(v.is_empty());
    assert_eq!(heap.live_slots(), 0);
}

#[test]
fn swap_exchanges_allocators_too() {
    let h1 = HeapAllocator::new();
    let h2 = HeapAllocator::new();
    let mut a = DynArray::from_slice_in(&[1], h1.clone()).unwrap();
    let mut b = DynArray::from_slice_in(&[2, 3], h2.clone()).unwrap();
    a.swap_with(&mut b);
    assert_eq!(a.allocator(), &h2);
    assert_eq!(b.allocator(), &h1);
    drop(a);
    assert_eq!(h2.live_slots(), 0);
    assert!(h1.live_slots() > 0);
}

// ── Element lifecycle ───────────────────────────────────────────

#[test]
fn every_element_dropped_once() {
    let log = DropLog::new();
    {
        let mut v = DynArray::new_in(HeapAllocator::new());
        for id in 0..20 {
            v.push(log.track(id)).unwrap();
        }
        v.erase_range(5..10).unwrap();
        let last = v.len() - 1;
        v.erase(last).unwrap();
        let copy = v.try_clone().unwrap();
        assert_eq!(copy, v);
        v.clear();
        assert_eq!(log.live(20), Some(copy.len()));
    }
    assert_eq!(log.live(20), Some(0));
}

#[test]
fn clone_failure_mid_fill_is_reported() {
    let seed = PanicOnClone::new(1, 3);
    let mut v = DynArray::new_in(HeapAllocator::new());
    let err = v.assign_fill(5, &seed).unwrap_err();
    assert_eq!(
        err,
        ArrayError::TransferFailed {
            completed: 3,
            requested: 5
        }
    );
    assert_eq!(v.len(), 3);
    assert!(v.iter().all(|x| x.value == 1));
}

#[test]
fn clone_failure_during_insert_rolls_back() {
    let seed = PanicOnClone::new(9, 2);
    let mut v = DynArray::new_in(HeapAllocator::new());
    v.push(PanicOnClone::new(0, 0)).unwrap();
    v.push(PanicOnClone::new(1, 0)).unwrap();
    let err = v.insert_fill(1, 4, &seed).unwrap_err();
    assert!(matches!(err, ArrayError::TransferFailed { completed: 2, requested: 4 }));
    let values: Vec<u32> = v.iter().map(|x| x.value).collect();
    assert_eq!(values, [0, 1]);
}
