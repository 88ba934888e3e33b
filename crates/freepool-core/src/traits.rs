//! The allocation capability set containers are generic over.

#![allow(unsafe_code)]

use std::ptr::{self, NonNull};

use crate::error::AllocError;

/// Typed element allocator: the minimal surface a container needs.
///
/// Storage and element lifetime are managed separately. `allocate` and
/// `deallocate` move raw, uninitialised slots in and out of the backing
/// pool; `construct` and `destroy` begin and end the life of a single
/// element inside slots that are already allocated.
///
/// Handles are cheap to clone. Two handles compare equal exactly when
/// storage allocated through one may be released through the other.
pub trait ElementAllocator<T>: Clone + PartialEq {
    /// Reserve `n` contiguous uninitialised slots.
    ///
    /// A request for zero slots succeeds with a dangling, well-aligned
    /// pointer that must not be dereferenced.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::OutOfMemory`] when no free region can hold
    /// `n` slots.
    fn allocate(&self, n: usize) -> Result<NonNull<T>, AllocError>;

    /// Return `n` slots starting at `ptr` to the pool.
    ///
    /// A null `ptr` or `n == 0` is a no-op.
    ///
    /// # Safety
    ///
    /// `(ptr, n)` must exactly describe a region previously returned by
    /// `allocate` on an equal handle and not yet released. Any elements
    /// still live in the region are not dropped.
    unsafe fn deallocate(&self, ptr: *mut T, n: usize);

    /// Move `value` into the uninitialised slot at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must point into a live allocation of this allocator and the
    /// slot must not currently hold an element.
    unsafe fn construct(&self, ptr: NonNull<T>, value: T) {
        // SAFETY: caller guarantees `ptr` is allocated, aligned, and vacant.
        unsafe { ptr.as_ptr().write(value) }
    }

    /// Build an element in place from `make`.
    ///
    /// If `make` panics the slot stays uninitialised.
    ///
    /// # Safety
    ///
    /// Same contract as [`ElementAllocator::construct`].
    unsafe fn construct_with<F>(&self, ptr: NonNull<T>, make: F)
    where
        F: FnOnce() -> T,
    {
        let value = make();
        // SAFETY: forwarded caller contract.
        unsafe { self.construct(ptr, value) }
    }

    /// Run the destructor of the element at `ptr`, leaving the slot
    /// allocated but uninitialised.
    ///
    /// # Safety
    ///
    /// `ptr` must point at a live element owned by the caller. The slot
    /// must not be read again until re-constructed.
    unsafe fn destroy(&self, ptr: NonNull<T>) {
        // SAFETY: caller guarantees a live element at `ptr`.
        unsafe { ptr::drop_in_place(ptr.as_ptr()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::alloc::{alloc, dealloc, Layout};
    use std::cell::Cell;
    use std::rc::Rc;

    /// Global-heap allocator used to exercise the provided methods.
    #[derive(Clone, PartialEq)]
    struct Heap;

    impl<T> ElementAllocator<T> for Heap {
        fn allocate(&self, n: usize) -> Result<NonNull<T>, AllocError> {
            let layout = Layout::array::<T>(n).map_err(|_| AllocError::InvalidConfig {
                reason: "layout overflow".into(),
            })?;
            if layout.size() == 0 {
                return Ok(NonNull::dangling());
            }
            // SAFETY: non-zero layout.
            NonNull::new(unsafe { alloc(layout) } as *mut T).ok_or(AllocError::OutOfMemory {
                requested: n,
                largest_free: 0,
                capacity: 0,
            })
        }

        unsafe fn deallocate(&self, ptr: *mut T, n: usize) {
            let layout = Layout::array::<T>(n).expect("allocated with this layout");
            if ptr.is_null() || layout.size() == 0 {
                return;
            }
            // SAFETY: caller contract.
            unsafe { dealloc(ptr as *mut u8, layout) }
        }
    }

    struct Tracked(Rc<Cell<u32>>);

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn construct_then_destroy_runs_drop_once() {
        let drops = Rc::new(Cell::new(0));
        let heap = Heap;
        let p: NonNull<Tracked> = heap.allocate(1).unwrap();
        unsafe {
            heap.construct(p, Tracked(Rc::clone(&drops)));
            assert_eq!(drops.get(), 0);
            heap.destroy(p);
            assert_eq!(drops.get(), 1);
            heap.deallocate(p.as_ptr(), 1);
        }
        assert_eq!(drops.get(), 1, "deallocate never drops elements");
    }

    #[test]
    fn construct_with_builds_in_place() {
        let heap = Heap;
        let p: NonNull<u64> = heap.allocate(2).unwrap();
        unsafe {
            heap.construct_with(p, || 7);
            heap.construct_with(p.add(1), || 9);
            assert_eq!(*p.as_ptr(), 7);
            assert_eq!(*p.as_ptr().add(1), 9);
            heap.deallocate(p.as_ptr(), 2);
        }
    }

    #[test]
    fn zero_slot_request_is_dangling() {
        let heap = Heap;
        let p: NonNull<u32> = heap.allocate(0).unwrap();
        assert_eq!(p, NonNull::dangling());
        unsafe { heap.deallocate(p.as_ptr(), 0) };
    }

    #[test]
    fn null_deallocate_is_noop() {
        let heap = Heap;
        unsafe { ElementAllocator::<u32>::deallocate(&heap, ptr::null_mut(), 16) };
    }
}
