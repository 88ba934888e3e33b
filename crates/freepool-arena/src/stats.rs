//! Point-in-time occupancy and cumulative operation metrics for an arena.
//!
//! [`ArenaStats`] is a plain snapshot: callers (tests, benches, telemetry)
//! read it after the fact. Nothing in the allocation path depends on it.

/// Occupancy and counter snapshot for a single arena.
///
/// Slot quantities are in elements of the arena's type, not bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Fixed slot capacity of the arena.
    pub capacity: usize,
    /// Slots currently handed out.
    pub used: usize,
    /// Slots currently free.
    pub free: usize,
    /// Blocks in the ledger (free and occupied).
    pub block_count: usize,
    /// Free blocks in the ledger.
    pub free_block_count: usize,
    /// Length of the largest free block.
    pub largest_free_block: usize,
    /// Bytes reserved for the arena's backing storage.
    pub storage_bytes: usize,
    /// Cumulative successful allocations (zero-slot requests excluded).
    pub allocations: u64,
    /// Cumulative successful deallocations.
    pub deallocations: u64,
    /// Cumulative allocation requests that failed with out-of-memory.
    pub failed_allocations: u64,
    /// Cumulative deallocations that matched no occupied block.
    pub mismatched_deallocations: u64,
    /// Cumulative free-block splits.
    pub splits: u64,
    /// Cumulative free-block merges.
    pub merges: u64,
}

impl ArenaStats {
    /// Share of free space unusable for a single request of the largest
    /// possible size: `1 - largest_free_block / free`.
    ///
    /// `0.0` means all free space is one block (or nothing is free);
    /// values near `1.0` mean free space is shattered into small pieces.
    pub fn fragmentation(&self) -> f64 {
        if self.free == 0 {
            return 0.0;
        }
        1.0 - self.largest_free_block as f64 / self.free as f64
    }

    /// Fraction of capacity currently in use.
    pub fn utilisation(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.used as f64 / self.capacity as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        let s = ArenaStats::default();
        assert_eq!(s.capacity, 0);
        assert_eq!(s.allocations, 0);
        assert_eq!(s.fragmentation(), 0.0);
        assert_eq!(s.utilisation(), 0.0);
    }

    #[test]
    fn single_free_block_is_unfragmented() {
        let s = ArenaStats {
            capacity: 100,
            used: 40,
            free: 60,
            largest_free_block: 60,
            ..Default::default()
        };
        assert_eq!(s.fragmentation(), 0.0);
        assert!((s.utilisation() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn split_free_space_reports_fragmentation() {
        let s = ArenaStats {
            capacity: 100,
            used: 20,
            free: 80,
            largest_free_block: 20,
            ..Default::default()
        };
        assert!((s.fragmentation() - 0.75).abs() < 1e-12);
    }
}
