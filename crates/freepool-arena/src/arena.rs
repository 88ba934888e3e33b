//! Fixed-capacity typed arena: raw storage plus its block ledger.
//!
//! An [`Arena<T>`] reserves `capacity` slots of `T` once and hands out
//! contiguous runs of them. The [`BlockLedger`] decides where; the arena
//! translates ledger offsets to pointers and back.

#![allow(unsafe_code)]

use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::ptr::NonNull;

use freepool_core::AllocError;

use crate::block::Block;
use crate::config::PoolConfig;
use crate::ledger::{BlockLedger, LedgerViolation};
use crate::raw::RawStorage;
use crate::stats::ArenaStats;

/// A single pre-reserved region of `T` slots with free-list bookkeeping.
///
/// The arena never grows, never compacts, and never drops elements: slots
/// are uninitialised memory whose contents belong to the allocating caller.
/// Interior mutability makes it usable through shared handles; it is
/// neither `Send` nor `Sync`.
///
/// Zero-sized types need no storage, so allocations of them bypass the
/// ledger entirely.
pub struct Arena<T> {
    storage: RawStorage<T>,
    ledger: RefCell<BlockLedger>,
    config: PoolConfig,
}

impl<T> Arena<T> {
    /// Reserve an arena according to `config`.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::InvalidConfig`] if `config` fails validation
    /// for `T`.
    pub fn new(config: PoolConfig) -> Result<Self, AllocError> {
        config.validate::<T>()?;
        Ok(Self {
            storage: RawStorage::reserve(config.capacity)?,
            ledger: RefCell::new(BlockLedger::new(config.capacity)),
            config,
        })
    }

    /// Reserve an arena with room for `capacity` slots.
    ///
    /// # Errors
    ///
    /// See [`Arena::new`].
    pub fn with_capacity(capacity: usize) -> Result<Self, AllocError> {
        Self::new(PoolConfig::new(capacity))
    }

    /// Claim `n` contiguous uninitialised slots.
    ///
    /// Zero-slot requests and zero-sized `T` return a dangling pointer
    /// without consulting the ledger.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::OutOfMemory`] if no single free block holds
    /// `n` slots.
    pub fn allocate(&self, n: usize) -> Result<NonNull<T>, AllocError> {
        if n == 0 || mem::size_of::<T>() == 0 {
            return Ok(NonNull::dangling());
        }
        let mut ledger = self.ledger.borrow_mut();
        match ledger.acquire(n) {
            Some(offset) => Ok(self.storage.slot(offset)),
            None => Err(AllocError::OutOfMemory {
                requested: n,
                largest_free: ledger.largest_free(),
                capacity: ledger.capacity(),
            }),
        }
    }

    /// Return the `n`-slot run at `ptr` to the free list, merging it with
    /// free neighbours.
    ///
    /// Null pointers, zero-slot runs, and zero-sized `T` are no-ops. A run
    /// that matches no occupied block is ignored (and reported on stderr
    /// in debug builds).
    ///
    /// # Safety
    ///
    /// `(ptr, n)` must come from [`Arena::allocate`] on this arena and no
    /// live reference into the run may outlast this call: the slots can
    /// be handed to another owner immediately.
    pub unsafe fn deallocate(&self, ptr: *mut T, n: usize) {
        if ptr.is_null() || n == 0 || mem::size_of::<T>() == 0 {
            return;
        }
        let offset = self.storage.offset_of(ptr);
        let released = match offset {
            Some(offset) => self.ledger.borrow_mut().release(offset, n),
            None => false,
        };
        if !released {
            #[cfg(debug_assertions)]
            eprintln!(
                "freepool: deallocate of {n} slots at {ptr:p} (slot {offset:?}) matched no occupied block"
            );
        }
    }

    /// Length of the occupied run starting at `ptr`, if there is one.
    pub fn allocation_len(&self, ptr: *const T) -> Option<usize> {
        let offset = self.storage.offset_of(ptr)?;
        self.ledger.borrow().occupied_at(offset).map(|b| b.len)
    }

    /// Whether `ptr` points at a slot of this arena.
    pub fn contains(&self, ptr: *const T) -> bool {
        self.storage.contains(ptr)
    }

    /// Fixed slot capacity.
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// The config this arena was built from.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Copy of the ledger's blocks in address order.
    pub fn blocks(&self) -> Vec<Block> {
        self.ledger.borrow().blocks().to_vec()
    }

    /// Verify the ledger's structural invariants.
    ///
    /// # Errors
    ///
    /// Returns the first [`LedgerViolation`] found.
    pub fn check_invariants(&self) -> Result<(), LedgerViolation> {
        self.ledger.borrow().check_invariants()
    }

    /// Occupancy and counter snapshot.
    pub fn stats(&self) -> ArenaStats {
        let ledger = self.ledger.borrow();
        let counters = ledger.counters();
        let free = ledger.free_slots();
        ArenaStats {
            capacity: ledger.capacity(),
            used: ledger.capacity() - free,
            free,
            block_count: ledger.block_count(),
            free_block_count: ledger.free_block_count(),
            largest_free_block: ledger.largest_free(),
            storage_bytes: self.storage.bytes(),
            allocations: counters.acquisitions,
            deallocations: counters.releases,
            failed_allocations: counters.failed_acquisitions,
            mismatched_deallocations: counters.mismatched_releases,
            splits: counters.splits,
            merges: counters.merges,
        }
    }
}

impl<T> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ledger = self.ledger.borrow();
        f.debug_struct("Arena")
            .field("element", &std::any::type_name::<T>())
            .field("capacity", &ledger.capacity())
            .field("blocks", &ledger.block_count())
            .field("free", &ledger.free_slots())
            .finish()
    }
}
