//! Error types for the freepool workspace.
//!
//! Organized by layer: [`AllocError`] is the only failure the allocator
//! front-end raises, [`ArrayError`] covers everything a dynamic array
//! operation can report (including wrapped allocation failures).

use std::error::Error;
use std::fmt;

/// Errors raised by an allocator when a request cannot be satisfied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// No free block can hold the request. Either the arena is exhausted
    /// or its free space is fragmented into pieces that are all too small.
    OutOfMemory {
        /// Number of element slots requested.
        requested: usize,
        /// Largest single free block at the time of the request.
        largest_free: usize,
        /// Fixed capacity of the arena in element slots.
        capacity: usize,
    },
    /// The arena configuration cannot back a real allocation.
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
}

impl AllocError {
    /// Whether the failure was caused by fragmentation rather than
    /// exhaustion, i.e. enough total free space existed but no single
    /// block was large enough.
    ///
    /// Only meaningful for [`AllocError::OutOfMemory`]; `free_total` is
    /// the arena's total free slot count at the time of failure.
    pub fn is_fragmentation(&self, free_total: usize) -> bool {
        match self {
            Self::OutOfMemory { requested, .. } => free_total >= *requested,
            Self::InvalidConfig { .. } => false,
        }
    }
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory {
                requested,
                largest_free,
                capacity,
            } => {
                write!(
                    f,
                    "out of memory: requested {requested} slots, largest free block {largest_free}, capacity {capacity}"
                )
            }
            Self::InvalidConfig { reason } => write!(f, "invalid pool config: {reason}"),
        }
    }
}

impl Error for AllocError {}

/// Errors from dynamic array operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArrayError {
    /// The backing allocator could not provide storage.
    Alloc(AllocError),
    /// A checked index or position was not within the array.
    OutOfRange {
        /// The offending index.
        index: usize,
        /// The array length at the time of the call.
        len: usize,
    },
    /// Constructing an element panicked while populating storage.
    ///
    /// Elements constructed before the failure remain owned by the array.
    TransferFailed {
        /// Elements successfully constructed before the failure.
        completed: usize,
        /// Elements the operation set out to construct.
        requested: usize,
    },
    /// A length computation overflowed `usize` or exceeded `max_size()`.
    CapacityOverflow,
}

impl fmt::Display for ArrayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alloc(e) => write!(f, "allocation failed: {e}"),
            Self::OutOfRange { index, len } => {
                write!(f, "index {index} out of range for array of length {len}")
            }
            Self::TransferFailed {
                completed,
                requested,
            } => {
                write!(
                    f,
                    "element transfer failed after {completed} of {requested} elements"
                )
            }
            Self::CapacityOverflow => write!(f, "capacity overflow"),
        }
    }
}

impl Error for ArrayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Alloc(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AllocError> for ArrayError {
    fn from(e: AllocError) -> Self {
        Self::Alloc(e)
    }
}
