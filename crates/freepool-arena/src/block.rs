//! Block records: the unit of ledger bookkeeping.

use std::fmt;

/// A contiguous run of arena slots, tagged free or occupied.
///
/// `begin` is an element offset from the start of the arena storage, so a
/// block covers slots `begin..begin + len`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
    /// First slot of the block.
    pub begin: usize,
    /// Number of slots in the block. Never zero inside a ledger.
    pub len: usize,
    /// Whether the block is available for allocation.
    pub is_free: bool,
}

impl Block {
    /// A free block covering `begin..begin + len`.
    pub fn free(begin: usize, len: usize) -> Self {
        Self {
            begin,
            len,
            is_free: true,
        }
    }

    /// An occupied block covering `begin..begin + len`.
    pub fn occupied(begin: usize, len: usize) -> Self {
        Self {
            begin,
            len,
            is_free: false,
        }
    }

    /// One past the last slot of the block.
    pub fn end(&self) -> usize {
        self.begin + self.len
    }

    /// Whether `other` starts exactly where this block ends.
    pub fn abuts(&self, other: &Block) -> bool {
        self.end() == other.begin
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = if self.is_free { "free" } else { "used" };
        write!(f, "[{}..{}) {tag}", self.begin, self.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_is_exclusive() {
        let b = Block::occupied(10, 5);
        assert_eq!(b.end(), 15);
        assert!(!b.is_free);
    }

    #[test]
    fn abutting_blocks() {
        let a = Block::free(0, 4);
        let b = Block::occupied(4, 2);
        let c = Block::free(7, 1);
        assert!(a.abuts(&b));
        assert!(!b.abuts(&c));
    }

    #[test]
    fn display_shows_range_and_state() {
        assert_eq!(Block::free(3, 2).to_string(), "[3..5) free");
        assert_eq!(Block::occupied(0, 3).to_string(), "[0..3) used");
    }
}
