//! Address-ordered block ledger with last-fit search and coalescing.
//!
//! A [`BlockLedger`] partitions `0..capacity` into [`Block`]s. It works on
//! slot offsets only and never touches memory, so it can be driven and
//! checked in isolation from any real storage.
//!
//! ```text
//! acquire(3) on [0..4) used | [4..10) free
//!            → [0..4) used | [4..7) used | [7..10) free
//! ```

use std::fmt;

use crate::block::Block;

/// Cumulative operation counters for a ledger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LedgerCounters {
    /// Successful `acquire` calls.
    pub acquisitions: u64,
    /// `acquire` calls that found no fitting block.
    pub failed_acquisitions: u64,
    /// Successful `release` calls.
    pub releases: u64,
    /// `release` calls whose range matched no occupied block.
    pub mismatched_releases: u64,
    /// Free blocks split to satisfy a smaller request.
    pub splits: u64,
    /// Neighbouring free blocks absorbed during coalescing.
    pub merges: u64,
}

/// A broken ledger invariant, reported by [`BlockLedger::check_invariants`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerViolation {
    /// The ledger holds no blocks at all.
    Empty,
    /// The first block does not start at slot zero.
    BadStart {
        /// Where the first block starts.
        begin: usize,
    },
    /// A block has zero length.
    ZeroLength {
        /// Position of the block in the ledger.
        index: usize,
    },
    /// Two consecutive blocks leave a gap or overlap.
    Discontiguous {
        /// Position of the first of the two blocks.
        index: usize,
        /// End of the first block.
        end: usize,
        /// Start of the second block.
        next_begin: usize,
    },
    /// Two consecutive blocks are both free.
    AdjacentFree {
        /// Position of the first of the two blocks.
        index: usize,
    },
    /// Block lengths do not add up to the capacity.
    LengthMismatch {
        /// Sum of all block lengths.
        total: usize,
        /// Configured capacity.
        capacity: usize,
    },
}

impl fmt::Display for LedgerViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "ledger has no blocks"),
            Self::BadStart { begin } => write!(f, "first block starts at {begin}, not 0"),
            Self::ZeroLength { index } => write!(f, "block {index} has zero length"),
            Self::Discontiguous {
                index,
                end,
                next_begin,
            } => write!(
                f,
                "block {index} ends at {end} but block {} begins at {next_begin}",
                index + 1
            ),
            Self::AdjacentFree { index } => {
                write!(f, "blocks {index} and {} are both free", index + 1)
            }
            Self::LengthMismatch { total, capacity } => {
                write!(f, "block lengths sum to {total}, capacity is {capacity}")
            }
        }
    }
}

impl std::error::Error for LedgerViolation {}

/// Ordered, gap-free partition of an arena into free and occupied blocks.
///
/// Invariants, maintained by every operation:
/// - blocks are sorted by `begin` and `block[i].end() == block[i + 1].begin`
/// - lengths are non-zero and sum to `capacity`
/// - no two adjacent blocks are both free
#[derive(Clone, Debug)]
pub struct BlockLedger {
    blocks: Vec<Block>,
    capacity: usize,
    counters: LedgerCounters,
}

impl BlockLedger {
    /// Create a ledger holding a single free block of `capacity` slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Arena configs are validated before a
    /// ledger is built.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ledger capacity must be non-zero");
        Self {
            blocks: vec![Block::free(0, capacity)],
            capacity,
            counters: LedgerCounters::default(),
        }
    }

    /// Claim `n` contiguous slots, returning the offset of the first.
    ///
    /// Blocks are scanned from the highest address down. The first free
    /// block of at least `n` slots wins: an exact fit is taken whole, a
    /// larger block is split with the claimed run carved from its low end
    /// and the free remainder left above it.
    ///
    /// Returns `None` if `n` is zero or no free block is large enough.
    pub fn acquire(&mut self, n: usize) -> Option<usize> {
        if n == 0 {
            return None;
        }
        for idx in (0..self.blocks.len()).rev() {
            let block = self.blocks[idx];
            if !block.is_free || block.len < n {
                continue;
            }
            if block.len > n {
                self.blocks.insert(idx, Block::occupied(block.begin, n));
                let rest = &mut self.blocks[idx + 1];
                rest.begin += n;
                rest.len -= n;
                self.counters.splits += 1;
            } else {
                self.blocks[idx].is_free = false;
            }
            self.counters.acquisitions += 1;
            return Some(block.begin);
        }
        self.counters.failed_acquisitions += 1;
        None
    }

    /// Free the occupied block covering exactly `offset..offset + n` and
    /// merge it with free neighbours on both sides.
    ///
    /// Returns `false` and leaves the ledger untouched if no occupied block
    /// matches the range exactly.
    pub fn release(&mut self, offset: usize, n: usize) -> bool {
        let idx = match self.blocks.binary_search_by_key(&offset, |b| b.begin) {
            Ok(idx) => idx,
            Err(_) => {
                self.counters.mismatched_releases += 1;
                return false;
            }
        };
        let block = self.blocks[idx];
        if block.is_free || block.len != n {
            self.counters.mismatched_releases += 1;
            return false;
        }
        self.blocks[idx].is_free = true;
        self.counters.releases += 1;

        let mut first = idx;
        while first > 0 && self.blocks[first - 1].is_free {
            first -= 1;
        }
        let mut last = idx + 1;
        while last < self.blocks.len() && self.blocks[last].is_free {
            last += 1;
        }
        if last - first > 1 {
            let begin = self.blocks[first].begin;
            let len = self.blocks[first..last].iter().map(|b| b.len).sum();
            self.blocks[first] = Block::free(begin, len);
            self.blocks.drain(first + 1..last);
            self.counters.merges += (last - first - 1) as u64;
        }
        true
    }

    /// The occupied block starting at `offset`, if any.
    pub fn occupied_at(&self, offset: usize) -> Option<&Block> {
        let idx = self.blocks.binary_search_by_key(&offset, |b| b.begin).ok()?;
        let block = &self.blocks[idx];
        (!block.is_free).then_some(block)
    }

    /// All blocks in address order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Number of blocks (free and occupied).
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Number of free blocks.
    pub fn free_block_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_free).count()
    }

    /// Total slots covered by the ledger.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total free slots across all free blocks.
    pub fn free_slots(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_free).map(|b| b.len).sum()
    }

    /// Total occupied slots.
    pub fn used_slots(&self) -> usize {
        self.capacity - self.free_slots()
    }

    /// Length of the largest free block, or zero if none is free.
    pub fn largest_free(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| b.is_free)
            .map(|b| b.len)
            .max()
            .unwrap_or(0)
    }

    /// Cumulative operation counters.
    pub fn counters(&self) -> LedgerCounters {
        self.counters
    }

    /// Verify every structural invariant, reporting the first violation.
    pub fn check_invariants(&self) -> Result<(), LedgerViolation> {
        let first = self.blocks.first().ok_or(LedgerViolation::Empty)?;
        if first.begin != 0 {
            return Err(LedgerViolation::BadStart { begin: first.begin });
        }
        let mut total = 0usize;
        for (index, block) in self.blocks.iter().enumerate() {
            if block.len == 0 {
                return Err(LedgerViolation::ZeroLength { index });
            }
            total += block.len;
            let Some(next) = self.blocks.get(index + 1) else {
                continue;
            };
            if !block.abuts(next) {
                return Err(LedgerViolation::Discontiguous {
                    index,
                    end: block.end(),
                    next_begin: next.begin,
                });
            }
            if block.is_free && next.is_free {
                return Err(LedgerViolation::AdjacentFree { index });
            }
        }
        if total != self.capacity {
            return Err(LedgerViolation::LengthMismatch {
                total,
                capacity: self.capacity,
            });
        }
        Ok(())
    }
}
