//! Global-heap allocator mock with live-allocation accounting.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::cell::Cell;
use std::ptr::NonNull;
use std::rc::Rc;

use freepool_core::{AllocError, ElementAllocator};

#[derive(Default)]
struct Ledger {
    live_slots: Cell<usize>,
    allocations: Cell<u64>,
    deallocations: Cell<u64>,
    /// Remaining slots before `allocate` starts failing.
    budget: Cell<Option<usize>>,
}

/// Allocates from the global heap and counts what is outstanding.
///
/// Clones share one ledger and compare equal; independently created
/// allocators do not. An optional slot budget makes allocation fail
/// deterministically, for exercising error paths without an arena.
#[derive(Clone, Default)]
pub struct HeapAllocator {
    ledger: Rc<Ledger>,
}

impl HeapAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// An allocator that refuses requests once `slots` are outstanding.
    pub fn with_budget(slots: usize) -> Self {
        let alloc = Self::new();
        alloc.ledger.budget.set(Some(slots));
        alloc
    }

    /// Slots currently allocated and not yet released.
    pub fn live_slots(&self) -> usize {
        self.ledger.live_slots.get()
    }

    pub fn allocations(&self) -> u64 {
        self.ledger.allocations.get()
    }

    pub fn deallocations(&self) -> u64 {
        self.ledger.deallocations.get()
    }
}

impl PartialEq for HeapAllocator {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.ledger, &other.ledger)
    }
}

impl std::fmt::Debug for HeapAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapAllocator")
            .field("live_slots", &self.live_slots())
            .finish()
    }
}

impl<T> ElementAllocator<T> for HeapAllocator {
    fn allocate(&self, n: usize) -> Result<NonNull<T>, AllocError> {
        if n == 0 {
            return Ok(NonNull::dangling());
        }
        let live = self.ledger.live_slots.get();
        if let Some(budget) = self.ledger.budget.get() {
            if live + n > budget {
                return Err(AllocError::OutOfMemory {
                    requested: n,
                    largest_free: budget.saturating_sub(live),
                    capacity: budget,
                });
            }
        }
        let layout = Layout::array::<T>(n).map_err(|_| AllocError::InvalidConfig {
            reason: format!("{n} slots overflow the address space"),
        })?;
        let ptr = if layout.size() == 0 {
            NonNull::dangling()
        } else {
            // SAFETY: `layout` has non-zero size.
            let raw = unsafe { alloc::alloc(layout) };
            NonNull::new(raw.cast::<T>()).unwrap_or_else(|| alloc::handle_alloc_error(layout))
        };
        self.ledger.live_slots.set(live + n);
        self.ledger.allocations.set(self.ledger.allocations.get() + 1);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: *mut T, n: usize) {
        if ptr.is_null() || n == 0 {
            return;
        }
        self.ledger.live_slots.set(self.ledger.live_slots.get() - n);
        self.ledger
            .deallocations
            .set(self.ledger.deallocations.get() + 1);
        if let Ok(layout) = Layout::array::<T>(n) {
            if layout.size() != 0 {
                // SAFETY: caller guarantees `(ptr, n)` came from `allocate`
                // with this same layout.
                unsafe { alloc::dealloc(ptr.cast::<u8>(), layout) };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_outstanding_slots() {
        let alloc = HeapAllocator::new();
        let p: NonNull<u64> = alloc.allocate(6).unwrap();
        assert_eq!(alloc.live_slots(), 6);
        unsafe { ElementAllocator::<u64>::deallocate(&alloc, p.as_ptr(), 6) };
        assert_eq!(alloc.live_slots(), 0);
        assert_eq!(alloc.allocations(), 1);
        assert_eq!(alloc.deallocations(), 1);
    }

    #[test]
    fn budget_refuses_overcommit() {
        let alloc = HeapAllocator::with_budget(4);
        let p: NonNull<u8> = alloc.allocate(3).unwrap();
        let refused = ElementAllocator::<u8>::allocate(&alloc, 2);
        assert!(matches!(refused, Err(AllocError::OutOfMemory { largest_free: 1, .. })));
        unsafe { ElementAllocator::<u8>::deallocate(&alloc, p.as_ptr(), 3) };
    }

    #[test]
    fn clones_compare_equal() {
        let a = HeapAllocator::new();
        assert_eq!(a, a.clone());
        assert_ne!(a, HeapAllocator::new());
    }
}
