//! Benchmark profiles and utilities for freepool.
//!
//! Provides pre-built workloads shared by the criterion benches:
//!
//! - [`BenchProfile`]: element counts for the pool-vs-`Vec` comparisons
//! - [`bench_registry`]: a registry whose arenas fit a profile
//! - [`random_positions`]: deterministic insertion points via seed
//! - [`fragmented_arena`]: an arena pre-churned into many small holes

#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use freepool_arena::{Arena, ArenaRegistry, PoolConfig};
use freepool_core::AllocError;

/// Element counts for one benchmark run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BenchProfile {
    /// Elements appended in push benchmarks.
    pub push_count: usize,
    /// Elements inserted at random positions.
    pub insert_count: usize,
    /// Element count for bulk construction.
    pub fill_count: usize,
}

impl BenchProfile {
    /// Small profile matching the classic pool-vs-std comparison sizes.
    pub const REFERENCE: Self = Self {
        push_count: 10_000,
        insert_count: 1_000,
        fill_count: 10_000,
    };

    /// Ten times the reference sizes.
    pub const STRESS: Self = Self {
        push_count: 100_000,
        insert_count: 10_000,
        fill_count: 100_000,
    };

    /// Arena slots needed for the largest array this profile builds,
    /// including the transient old+new buffers during one reallocation.
    pub fn arena_capacity(&self) -> usize {
        let largest = self.push_count.max(self.fill_count).max(self.insert_count);
        // New buffer of 2 × (len + 1) plus the old one during the copy.
        (largest + 1) * 4
    }
}

/// A registry whose arenas are sized for `profile`.
pub fn bench_registry(profile: BenchProfile) -> ArenaRegistry {
    ArenaRegistry::with_config(PoolConfig::new(profile.arena_capacity()))
}

/// `n` insertion points, each valid for an array that has grown by one
/// element per previous point.
pub fn random_positions(seed: u64, n: usize) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n).map(|len| rng.random_range(0..=len)).collect()
}

/// An arena of `capacity` slots churned so that roughly half its slots
/// are free, scattered over many small holes.
///
/// Runs of 1..=8 slots are claimed until the arena is full, then every
/// other run is released. The surviving runs are leaked into the arena
/// for the benchmark's lifetime.
///
/// # Errors
///
/// Returns [`AllocError::InvalidConfig`] if `capacity` is zero.
#[allow(unsafe_code)]
pub fn fragmented_arena(seed: u64, capacity: usize) -> Result<Arena<u64>, AllocError> {
    let arena = Arena::<u64>::with_capacity(capacity)?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut runs = Vec::new();
    loop {
        let len = rng.random_range(1..=8usize);
        match arena.allocate(len) {
            Ok(ptr) => runs.push((ptr, len)),
            Err(_) if arena.stats().free == 0 => break,
            Err(_) => continue,
        }
    }
    for (ptr, len) in runs.into_iter().step_by(2) {
        // SAFETY: each run came from this arena and is released once.
        unsafe { arena.deallocate(ptr.as_ptr(), len) };
    }
    Ok(arena)
}
