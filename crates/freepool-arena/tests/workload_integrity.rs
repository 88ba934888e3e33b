//! Seeded allocate/release workloads against a real arena.
//!
//! After every step the ledger must stay gap-free with no adjacent free
//! blocks, outstanding runs must not overlap, and each run must still
//! hold the values written into it when it was claimed.

use std::ptr::NonNull;

use freepool_arena::{Arena, ArenaRegistry, Block, PoolAllocator, PoolConfig};
use freepool_core::{AllocError, ElementAllocator};
use freepool_test_utils::{LedgerOp, Workload};

struct Live {
    ptr: NonNull<u64>,
    len: usize,
    tag: u64,
}

fn stamp(live: &Live) {
    for i in 0..live.len {
        unsafe { live.ptr.as_ptr().add(i).write(live.tag) };
    }
}

fn verify(live: &Live) {
    for i in 0..live.len {
        assert_eq!(unsafe { live.ptr.as_ptr().add(i).read() }, live.tag);
    }
}

fn run_workload(seed: u64, capacity: usize, max_len: usize, steps: usize) {
    let arena = Arena::<u64>::with_capacity(capacity).unwrap();
    let mut live: Vec<Live> = Vec::new();
    let mut tag = 0u64;

    for op in Workload::new(seed, max_len).take(steps) {
        match op {
            LedgerOp::Acquire { len } => match arena.allocate(len) {
                Ok(ptr) => {
                    tag += 1;
                    let run = Live { ptr, len, tag };
                    stamp(&run);
                    live.push(run);
                }
                Err(AllocError::OutOfMemory { largest_free, .. }) => {
                    assert!(largest_free < len, "seed {seed}: refused a request that fit");
                }
                Err(other) => panic!("seed {seed}: unexpected error {other}"),
            },
            LedgerOp::Release { pick } => {
                if live.is_empty() {
                    continue;
                }
                let run = live.swap_remove(pick % live.len());
                verify(&run);
                unsafe { arena.deallocate(run.ptr.as_ptr(), run.len) };
            }
        }
        arena
            .check_invariants()
            .unwrap_or_else(|v| panic!("seed {seed}: {v}"));
        let outstanding: usize = live.iter().map(|r| r.len).sum();
        assert_eq!(arena.stats().used, outstanding, "seed {seed}");
    }

    for run in &live {
        verify(run);
    }
    for run in live.drain(..) {
        unsafe { arena.deallocate(run.ptr.as_ptr(), run.len) };
    }
    let blocks = arena.blocks();
    assert_eq!(blocks.len(), 1, "seed {seed}: arena did not coalesce back");
    assert!(blocks[0].is_free);
    assert_eq!(blocks[0].len, capacity);
}

#[test]
fn random_workloads_keep_ledger_consistent() {
    for seed in 0..16 {
        run_workload(seed, 256, 24, 400);
    }
}

#[test]
fn tight_arena_exercises_exhaustion() {
    for seed in 100..108 {
        run_workload(seed, 32, 12, 300);
    }
}

#[test]
fn first_allocation_carved_from_low_end() {
    let arena = Arena::<u32>::with_capacity(100).unwrap();
    let p = arena.allocate(10).unwrap();
    assert_eq!(
        arena.blocks(),
        vec![Block::occupied(0, 10), Block::free(10, 90)]
    );
    assert_eq!(arena.allocation_len(p.as_ptr()), Some(10));

    // The next request is carved from the low end of the same free block.
    let q = arena.allocate(5).unwrap();
    assert_eq!(unsafe { q.as_ptr().offset_from(p.as_ptr()) }, 10);
    assert_eq!(
        arena.blocks(),
        vec![
            Block::occupied(0, 10),
            Block::occupied(10, 5),
            Block::free(15, 85)
        ]
    );
    unsafe {
        arena.deallocate(q.as_ptr(), 5);
        arena.deallocate(p.as_ptr(), 10);
    }
    assert_eq!(arena.blocks(), vec![Block::free(0, 100)]);
}

#[test]
fn fragmentation_blocks_large_requests() {
    let arena = Arena::<u8>::with_capacity(40).unwrap();
    let runs: Vec<_> = (0..4).map(|_| arena.allocate(10).unwrap()).collect();
    // Free alternate runs: 20 slots free in two separate holes of 10.
    unsafe {
        arena.deallocate(runs[0].as_ptr(), 10);
        arena.deallocate(runs[2].as_ptr(), 10);
    }
    let stats = arena.stats();
    assert_eq!(stats.free, 20);
    assert_eq!(stats.largest_free_block, 10);
    let err = arena.allocate(15).unwrap_err();
    assert!(err.is_fragmentation(stats.free));

    // Freeing the run between the holes merges all three.
    unsafe { arena.deallocate(runs[1].as_ptr(), 10) };
    assert_eq!(arena.stats().largest_free_block, 30);
    let big = arena.allocate(30).unwrap();
    unsafe {
        arena.deallocate(big.as_ptr(), 30);
        arena.deallocate(runs[3].as_ptr(), 10);
    }
    assert_eq!(arena.blocks().len(), 1);
}

#[test]
fn mismatched_release_leaves_ledger_untouched() {
    let arena = Arena::<u32>::with_capacity(16).unwrap();
    let p = arena.allocate(4).unwrap();
    let before = arena.blocks();
    unsafe { arena.deallocate(p.as_ptr(), 3) };
    assert_eq!(arena.blocks(), before);
    assert_eq!(arena.stats().mismatched_deallocations, 1);
    unsafe { arena.deallocate(p.as_ptr(), 4) };
    assert_eq!(arena.stats().used, 0);
}

#[test]
fn allocator_handles_share_registry_arena() {
    let registry = ArenaRegistry::with_config(PoolConfig::new(64));
    let a = PoolAllocator::<u64>::from_registry(&registry).unwrap();
    let b = a.clone();
    let p = a.allocate(8).unwrap();
    assert_eq!(b.stats().map(|s| s.used), Some(8));
    unsafe { b.deallocate(p.as_ptr(), 8) };
    assert_eq!(a.stats().map(|s| s.used), Some(0));
}
