//! Low-level backing storage for arenas.
//!
//! The only module in this crate that touches raw memory. Every `unsafe`
//! block carries a `// SAFETY:` comment.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::mem;
use std::ptr::NonNull;

use freepool_core::AllocError;

/// An uninitialised, fixed-size buffer of `capacity` slots of `T`.
///
/// The buffer is reserved once and released on drop. It never runs element
/// destructors: slot contents are owned by whoever allocated them.
pub(crate) struct RawStorage<T> {
    base: NonNull<T>,
    capacity: usize,
    layout: Layout,
}

impl<T> RawStorage<T> {
    /// Reserve storage for `capacity` slots.
    ///
    /// Aborts through [`alloc::handle_alloc_error`] if the system
    /// allocator refuses the reservation.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::InvalidConfig`] if `capacity` slots of `T`
    /// have no valid layout.
    pub(crate) fn reserve(capacity: usize) -> Result<Self, AllocError> {
        let layout = Layout::array::<T>(capacity).map_err(|_| AllocError::InvalidConfig {
            reason: format!("{capacity} slots exceed the addressable size"),
        })?;
        let base = if layout.size() == 0 {
            NonNull::dangling()
        } else {
            // SAFETY: `layout` has non-zero size.
            let raw = unsafe { alloc::alloc(layout) } as *mut T;
            match NonNull::new(raw) {
                Some(p) => p,
                None => alloc::handle_alloc_error(layout),
            }
        };
        Ok(Self {
            base,
            capacity,
            layout,
        })
    }

    /// Pointer to slot `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset > capacity` (one-past-the-end is allowed).
    pub(crate) fn slot(&self, offset: usize) -> NonNull<T> {
        assert!(offset <= self.capacity, "slot {offset} outside arena");
        // SAFETY: `offset <= capacity`, so the result stays within (or one
        // past the end of) the reserved allocation.
        unsafe { self.base.add(offset) }
    }

    /// Slot offset of `ptr`, or `None` if it does not point at a slot
    /// boundary inside this storage.
    ///
    /// Always `None` for zero-sized `T`, whose slots share one address.
    pub(crate) fn offset_of(&self, ptr: *const T) -> Option<usize> {
        let size = mem::size_of::<T>();
        if size == 0 {
            return None;
        }
        let base = self.base.as_ptr() as usize;
        let addr = ptr as usize;
        let bytes = addr.checked_sub(base)?;
        if bytes % size != 0 {
            return None;
        }
        let offset = bytes / size;
        (offset < self.capacity).then_some(offset)
    }

    /// Whether `ptr` lies inside the reserved region.
    pub(crate) fn contains(&self, ptr: *const T) -> bool {
        self.offset_of(ptr).is_some()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn bytes(&self) -> usize {
        self.layout.size()
    }
}

impl<T> Drop for RawStorage<T> {
    fn drop(&mut self) {
        if self.layout.size() != 0 {
            // SAFETY: `base` came from `alloc::alloc` with this exact layout
            // and is released exactly once.
            unsafe { alloc::dealloc(self.base.as_ptr() as *mut u8, self.layout) }
        }
    }
}
