//! Seeded allocate/release workloads.
//!
//! A [`Workload`] is a deterministic stream of [`LedgerOp`]s. The same seed
//! always yields the same stream, so a failing run can be replayed from
//! its seed alone.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// One step of an allocation workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerOp {
    /// Request a run of `len` slots.
    Acquire { len: usize },
    /// Release the live allocation at position `pick % live.len()` of the
    /// caller's outstanding set. Ignored when nothing is outstanding.
    Release { pick: usize },
}

/// Deterministic generator of [`LedgerOp`]s.
pub struct Workload {
    rng: ChaCha8Rng,
    max_len: usize,
    acquire_bias: f64,
}

impl Workload {
    /// Default probability that a step is an acquisition.
    pub const DEFAULT_ACQUIRE_BIAS: f64 = 0.6;

    /// A workload requesting runs of `1..=max_len` slots.
    pub fn new(seed: u64, max_len: usize) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            max_len: max_len.max(1),
            acquire_bias: Self::DEFAULT_ACQUIRE_BIAS,
        }
    }

    /// Set the probability (clamped to `[0, 1]`) that a step acquires.
    pub fn acquire_bias(mut self, bias: f64) -> Self {
        self.acquire_bias = bias.clamp(0.0, 1.0);
        self
    }

    /// A random length in `1..=max_len`, for callers mixing their own ops.
    pub fn next_len(&mut self) -> usize {
        self.rng.random_range(1..=self.max_len)
    }
}

impl Iterator for Workload {
    type Item = LedgerOp;

    fn next(&mut self) -> Option<LedgerOp> {
        let op = if self.rng.random_bool(self.acquire_bias) {
            LedgerOp::Acquire {
                len: self.next_len(),
            }
        } else {
            LedgerOp::Release {
                pick: self.rng.random_range(0..usize::MAX),
            }
        };
        Some(op)
    }
}
