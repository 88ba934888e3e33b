//! Contiguous, growable array over an [`ElementAllocator`].
//!
//! [`DynArray`] owns one allocation `[begin, end)` of `capacity` slots, of
//! which the first `len` hold live elements:
//!
//! ```text
//! begin             last              end
//!   │  live elements  │  uninitialised  │
//!   └─────────────────┴─────────────────┘
//!   ptr              ptr+len          ptr+cap
//! ```
//!
//! Every capacity change is a transaction against the allocator: request a
//! new run of `2 × requested` slots, move the live elements across, release
//! the old run, adopt the new one. The new run is requested before the old
//! one is released, so the two never alias.

#![allow(unsafe_code)]

use std::fmt;
use std::marker::PhantomData;
use std::mem::{self, ManuallyDrop};
use std::ops::{Bound, Deref, DerefMut, RangeBounds};
use std::panic::{self, AssertUnwindSafe};
use std::ptr::{self, NonNull};
use std::slice;

use smallvec::SmallVec;

use freepool_arena::PoolAllocator;
use freepool_core::{ArrayError, ElementAllocator};

use crate::cursor::Cursor;
use crate::iter::IntoIter;

/// Storage requested on growth is this multiple of the requested length.
pub const OVER_ALLOCATION: usize = 2;

/// Staging buffer for iterator sources whose length is not known upfront.
type Staging<T> = SmallVec<[T; 16]>;

/// A contiguous, growable sequence of `T` backed by allocator `A`.
///
/// Capacity-changing operations are fallible: the default allocator draws
/// from a fixed-size arena and reports exhaustion instead of aborting.
///
/// # Growth
///
/// When a requested length `s` exceeds the capacity, the array requests
/// `2 × s` slots. `push` and `emplace_back` grow one element early, when
/// `len + 1` reaches the capacity.
///
/// # Cursors
///
/// [`begin`](DynArray::begin) and [`end`](DynArray::end) return raw
/// [`Cursor`]s that are invalidated by any reallocating, shifting, or
/// destroying operation.
pub struct DynArray<T, A: ElementAllocator<T> = PoolAllocator<T>> {
    ptr: NonNull<T>,
    len: usize,
    cap: usize,
    alloc: A,
    _owns: PhantomData<T>,
}

impl<T: 'static> DynArray<T> {
    /// An empty array on the shared arena for `T`. Allocates nothing.
    pub fn new() -> Self {
        Self::new_in(PoolAllocator::new())
    }

    /// `n` default-constructed elements on the shared arena.
    ///
    /// # Errors
    ///
    /// See [`DynArray::with_len_in`].
    pub fn with_len(n: usize) -> Result<Self, ArrayError>
    where
        T: Default,
    {
        Self::with_len_in(n, PoolAllocator::new())
    }

    /// `n` clones of `value` on the shared arena.
    ///
    /// # Errors
    ///
    /// See [`DynArray::from_elem_in`].
    pub fn from_elem(n: usize, value: &T) -> Result<Self, ArrayError>
    where
        T: Clone,
    {
        Self::from_elem_in(n, value, PoolAllocator::new())
    }

    /// Clones of every element of `items`, in order, on the shared arena.
    ///
    /// # Errors
    ///
    /// See [`DynArray::from_slice_in`].
    pub fn from_slice(items: &[T]) -> Result<Self, ArrayError>
    where
        T: Clone,
    {
        Self::from_slice_in(items, PoolAllocator::new())
    }

    /// Every item of `iter`, in order, on the shared arena.
    ///
    /// # Errors
    ///
    /// See [`DynArray::from_iter_in`].
    pub fn try_from_iter<I>(iter: I) -> Result<Self, ArrayError>
    where
        I: IntoIterator<Item = T>,
    {
        Self::from_iter_in(iter, PoolAllocator::new())
    }
}

impl<T: 'static> Default for DynArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: ElementAllocator<T>> DynArray<T, A> {
    /// An empty array that will allocate through `alloc`.
    pub fn new_in(alloc: A) -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            cap: 0,
            alloc,
            _owns: PhantomData,
        }
    }

    /// `n` default-constructed elements.
    ///
    /// # Errors
    ///
    /// [`ArrayError::Alloc`] if storage cannot be obtained;
    /// [`ArrayError::TransferFailed`] if `T::default` panics.
    pub fn with_len_in(n: usize, alloc: A) -> Result<Self, ArrayError>
    where
        T: Default,
    {
        let mut array = Self::new_in(alloc);
        array.grow_to(n)?;
        array.fill_spare(n, |_| T::default())?;
        Ok(array)
    }

    /// `n` clones of `value`.
    ///
    /// # Errors
    ///
    /// [`ArrayError::Alloc`] if storage cannot be obtained;
    /// [`ArrayError::TransferFailed`] if cloning panics.
    pub fn from_elem_in(n: usize, value: &T, alloc: A) -> Result<Self, ArrayError>
    where
        T: Clone,
    {
        let mut array = Self::new_in(alloc);
        array.assign_fill(n, value)?;
        Ok(array)
    }

    /// Clones of every element of `items`, in order.
    ///
    /// # Errors
    ///
    /// As for [`DynArray::from_elem_in`].
    pub fn from_slice_in(items: &[T], alloc: A) -> Result<Self, ArrayError>
    where
        T: Clone,
    {
        let mut array = Self::new_in(alloc);
        array.assign_slice(items)?;
        Ok(array)
    }

    /// Every item of `iter`, in order.
    ///
    /// # Errors
    ///
    /// [`ArrayError::Alloc`] if storage cannot be obtained. A panicking
    /// iterator propagates its panic.
    pub fn from_iter_in<I>(iter: I, alloc: A) -> Result<Self, ArrayError>
    where
        I: IntoIterator<Item = T>,
    {
        let mut array = Self::new_in(alloc);
        array.assign_iter(iter)?;
        Ok(array)
    }

    /// Deep copy into fresh storage from the same allocator.
    ///
    /// The copy's capacity follows the growth policy for `self.len()`.
    ///
    /// # Errors
    ///
    /// [`ArrayError::Alloc`] if storage cannot be obtained;
    /// [`ArrayError::TransferFailed`] if cloning an element panics (the
    /// partial copy is dropped).
    pub fn try_clone(&self) -> Result<Self, ArrayError>
    where
        T: Clone,
    {
        let mut copy = Self::new_in(self.alloc.clone());
        copy.grow_to(self.len)?;
        copy.fill_spare(self.len, |i| self[i].clone())?;
        Ok(copy)
    }

    /// Move the contents out, leaving `self` empty with no storage.
    ///
    /// Constant time: the storage itself changes owner.
    pub fn take(&mut self) -> Self {
        let empty = Self::new_in(self.alloc.clone());
        mem::replace(self, empty)
    }

    // ── Capacity ────────────────────────────────────────────────────

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Number of slots in the current allocation.
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Whether the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Largest element count addressable for `T`.
    pub fn max_size(&self) -> usize {
        match mem::size_of::<T>() {
            0 => usize::MAX,
            size => isize::MAX as usize / size,
        }
    }

    /// Ensure `capacity() >= n`. Never shrinks; a no-op when satisfied.
    ///
    /// # Errors
    ///
    /// [`ArrayError::Alloc`] if growth fails; the array is unchanged.
    pub fn reserve(&mut self, n: usize) -> Result<(), ArrayError> {
        self.grow_to(n)
    }

    /// Reallocate for half the current length before the growth doubling,
    /// so the resulting capacity is `len` rounded up to even.
    ///
    /// An empty array releases its storage entirely.
    ///
    /// # Errors
    ///
    /// [`ArrayError::Alloc`] if the new run cannot be obtained; the array
    /// keeps its old storage.
    pub fn shrink_to_fit(&mut self) -> Result<(), ArrayError> {
        self.reallocate(self.len.div_ceil(OVER_ALLOCATION))
    }

    // ── Element access ──────────────────────────────────────────────

    /// Pointer to the first slot. Dangling when there is no storage.
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Mutable pointer to the first slot.
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// The live elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `[ptr, ptr + len)` holds initialised elements; `ptr` is
        // non-null and aligned even when dangling.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// The live elements as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as for `as_slice`, with unique access through `&mut self`.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Bounds-checked access.
    ///
    /// # Errors
    ///
    /// [`ArrayError::OutOfRange`] if `index >= len()`.
    pub fn at(&self, index: usize) -> Result<&T, ArrayError> {
        let len = self.len;
        self.as_slice()
            .get(index)
            .ok_or(ArrayError::OutOfRange { index, len })
    }

    /// Bounds-checked mutable access.
    ///
    /// # Errors
    ///
    /// [`ArrayError::OutOfRange`] if `index >= len()`.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, ArrayError> {
        let len = self.len;
        self.as_mut_slice()
            .get_mut(index)
            .ok_or(ArrayError::OutOfRange { index, len })
    }

    /// First element, if any.
    pub fn front(&self) -> Option<&T> {
        self.as_slice().first()
    }

    /// Last element, if any.
    pub fn back(&self) -> Option<&T> {
        self.as_slice().last()
    }

    /// Mutable first element, if any.
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().first_mut()
    }

    /// Mutable last element, if any.
    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().last_mut()
    }

    /// The allocator handle in use.
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    // ── Cursors ─────────────────────────────────────────────────────

    /// Cursor at the first element.
    pub fn begin(&self) -> Cursor<T> {
        Cursor::new(self.ptr.as_ptr())
    }

    /// Cursor one past the last element.
    pub fn end(&self) -> Cursor<T> {
        self.begin() + self.len as isize
    }

    /// Index of the element `cursor` points at, or `None` if it lies
    /// outside `[begin, end)`.
    pub fn index_of(&self, cursor: Cursor<T>) -> Option<usize> {
        let offset = cursor - self.begin();
        usize::try_from(offset).ok().filter(|&i| i < self.len)
    }

    // ── Whole-content replacement ───────────────────────────────────

    /// Replace the contents with `n` clones of `value`.
    ///
    /// Existing elements are dropped first; storage is reallocated only if
    /// the capacity is insufficient.
    ///
    /// # Errors
    ///
    /// [`ArrayError::Alloc`] if growth fails (the array is left empty);
    /// [`ArrayError::TransferFailed`] if cloning panics (the clones made so
    /// far remain).
    pub fn assign_fill(&mut self, n: usize, value: &T) -> Result<(), ArrayError>
    where
        T: Clone,
    {
        self.destroy_from(0);
        self.grow_to(n)?;
        self.fill_spare(n, |_| value.clone())
    }

    /// Replace the contents with clones of `items`.
    ///
    /// # Errors
    ///
    /// As for [`DynArray::assign_fill`].
    pub fn assign_slice(&mut self, items: &[T]) -> Result<(), ArrayError>
    where
        T: Clone,
    {
        self.destroy_from(0);
        self.grow_to(items.len())?;
        self.fill_spare(items.len(), |i| items[i].clone())
    }

    /// Replace the contents with the items of `iter`.
    ///
    /// The iterator is drained before the current elements are dropped.
    ///
    /// # Errors
    ///
    /// [`ArrayError::Alloc`] if growth fails (the array is left empty and
    /// the drained items are dropped).
    pub fn assign_iter<I>(&mut self, iter: I) -> Result<(), ArrayError>
    where
        I: IntoIterator<Item = T>,
    {
        let staged: Staging<T> = iter.into_iter().collect();
        self.destroy_from(0);
        self.grow_to(staged.len())?;
        self.append_staged(staged);
        Ok(())
    }

    // ── Back insertion and removal ──────────────────────────────────

    /// Append `value`.
    ///
    /// # Errors
    ///
    /// [`ArrayError::Alloc`] if growth fails; `value` is dropped and the
    /// array is unchanged.
    pub fn push(&mut self, value: T) -> Result<(), ArrayError> {
        self.grow_for_push()?;
        // SAFETY: `len < cap` after growth; the slot is vacant.
        unsafe { self.alloc.construct(self.slot(self.len), value) };
        self.len += 1;
        Ok(())
    }

    /// Append a clone of `value`.
    ///
    /// # Errors
    ///
    /// [`ArrayError::TransferFailed`] if cloning panics; otherwise as for
    /// [`DynArray::push`].
    pub fn push_clone(&mut self, value: &T) -> Result<(), ArrayError>
    where
        T: Clone,
    {
        let copy = panic::catch_unwind(AssertUnwindSafe(|| value.clone())).map_err(|_| {
            ArrayError::TransferFailed {
                completed: 0,
                requested: 1,
            }
        })?;
        self.push(copy)
    }

    /// Construct an element at the back from `make`.
    ///
    /// Growth happens first; `make` then builds the element directly in
    /// its slot. A panicking `make` leaves the elements untouched.
    ///
    /// # Errors
    ///
    /// [`ArrayError::Alloc`] if growth fails; `make` is not called.
    pub fn emplace_back<F>(&mut self, make: F) -> Result<&mut T, ArrayError>
    where
        F: FnOnce() -> T,
    {
        self.grow_for_push()?;
        let slot = self.slot(self.len);
        // SAFETY: `len < cap` after growth; the slot is vacant.
        unsafe { self.alloc.construct_with(slot, make) };
        self.len += 1;
        // SAFETY: the slot was just initialised and is uniquely borrowed.
        Ok(unsafe { &mut *slot.as_ptr() })
    }

    /// Remove and return the last element.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: the slot held a live element and is now outside `len`,
        // so ownership moves to the caller exactly once.
        Some(unsafe { ptr::read(self.slot(self.len).as_ptr()) })
    }

    /// Append every item of `iter`.
    ///
    /// # Errors
    ///
    /// [`ArrayError::Alloc`] if growth fails; the drained items are dropped
    /// and the array is unchanged.
    pub fn extend_from_iter<I>(&mut self, iter: I) -> Result<(), ArrayError>
    where
        I: IntoIterator<Item = T>,
    {
        let end = self.len;
        self.insert_iter(end, iter).map(|_| ())
    }

    // ── Positional insertion ────────────────────────────────────────

    /// Insert `value` before `index`, shifting later elements up.
    ///
    /// Returns the index of the inserted element.
    ///
    /// # Errors
    ///
    /// [`ArrayError::OutOfRange`] if `index > len()`; [`ArrayError::Alloc`]
    /// if growth fails. The array is unchanged on error.
    pub fn insert(&mut self, index: usize, value: T) -> Result<usize, ArrayError> {
        self.check_position(index)?;
        self.grow_to(self.len + 1)?;
        self.open_gap(index, 1);
        // SAFETY: `open_gap` vacated `index`.
        unsafe { self.alloc.construct(self.slot(index), value) };
        self.len += 1;
        Ok(index)
    }

    /// Construct an element before `index` from `make`.
    ///
    /// `make` runs after growth but before any element moves, so a panic
    /// leaves the contents untouched.
    ///
    /// # Errors
    ///
    /// As for [`DynArray::insert`]; `make` is not called on error.
    pub fn emplace<F>(&mut self, index: usize, make: F) -> Result<usize, ArrayError>
    where
        F: FnOnce() -> T,
    {
        self.check_position(index)?;
        self.grow_to(self.len + 1)?;
        let value = make();
        self.open_gap(index, 1);
        // SAFETY: `open_gap` vacated `index`.
        unsafe { self.alloc.construct(self.slot(index), value) };
        self.len += 1;
        Ok(index)
    }

    /// Insert `n` clones of `value` before `index`.
    ///
    /// Returns the index of the first inserted element.
    ///
    /// # Errors
    ///
    /// [`ArrayError::OutOfRange`], [`ArrayError::CapacityOverflow`] or
    /// [`ArrayError::Alloc`] leave the array unchanged.
    /// [`ArrayError::TransferFailed`] drops the clones already made and
    /// restores the original contents.
    pub fn insert_fill(&mut self, index: usize, n: usize, value: &T) -> Result<usize, ArrayError>
    where
        T: Clone,
    {
        self.insert_with(index, n, |_| value.clone())
    }

    /// Insert clones of `items` before `index`.
    ///
    /// # Errors
    ///
    /// As for [`DynArray::insert_fill`].
    pub fn insert_slice(&mut self, index: usize, items: &[T]) -> Result<usize, ArrayError>
    where
        T: Clone,
    {
        self.insert_with(index, items.len(), |i| items[i].clone())
    }

    /// Insert the items of `iter` before `index`, preserving their order.
    ///
    /// # Errors
    ///
    /// [`ArrayError::OutOfRange`], [`ArrayError::CapacityOverflow`] or
    /// [`ArrayError::Alloc`]; the drained items are dropped and the array
    /// is unchanged.
    pub fn insert_iter<I>(&mut self, index: usize, iter: I) -> Result<usize, ArrayError>
    where
        I: IntoIterator<Item = T>,
    {
        self.check_position(index)?;
        let staged: Staging<T> = iter.into_iter().collect();
        let n = staged.len();
        let required = self.len.checked_add(n).ok_or(ArrayError::CapacityOverflow)?;
        self.grow_to(required)?;
        self.append_staged(staged);
        self.as_mut_slice()[index..].rotate_right(n);
        Ok(index)
    }

    // ── Removal ─────────────────────────────────────────────────────

    /// Remove and return the element at `index`, shifting later elements
    /// down.
    ///
    /// # Errors
    ///
    /// [`ArrayError::OutOfRange`] if `index >= len()`.
    pub fn remove(&mut self, index: usize) -> Result<T, ArrayError> {
        if index >= self.len {
            return Err(ArrayError::OutOfRange {
                index,
                len: self.len,
            });
        }
        let hole = self.slot(index).as_ptr();
        // SAFETY: `index < len`; the element is read out once, then the
        // tail `[index + 1, len)` slides down over the vacated slot.
        let value = unsafe {
            let value = ptr::read(hole);
            ptr::copy(hole.add(1), hole, self.len - index - 1);
            value
        };
        self.len -= 1;
        Ok(value)
    }

    /// Destroy the element at `index` and close the gap.
    ///
    /// Returns the index now occupied by the element that followed the
    /// erased one (equal to `len()` if the last element was erased).
    ///
    /// # Errors
    ///
    /// [`ArrayError::OutOfRange`] if `index >= len()`.
    pub fn erase(&mut self, index: usize) -> Result<usize, ArrayError> {
        drop(self.remove(index)?);
        Ok(index)
    }

    /// Destroy the elements in `range` and close the gap.
    ///
    /// Capacity is unchanged. Returns the start of the range, which now
    /// holds the first element after it (or equals `len()`).
    ///
    /// # Errors
    ///
    /// [`ArrayError::OutOfRange`] if the range is inverted or extends past
    /// `len()`.
    pub fn erase_range<R>(&mut self, range: R) -> Result<usize, ArrayError>
    where
        R: RangeBounds<usize>,
    {
        let (start, end) = self.resolve_range(range)?;
        let tail = self.len - end;
        // Shrink first: if a destructor panics the tail leaks rather than
        // being dropped twice.
        self.len = start;
        for i in start..end {
            // SAFETY: `[start, end)` were live and are destroyed once.
            unsafe { self.alloc.destroy(self.slot(i)) };
        }
        // SAFETY: moves the live tail `[end, end + tail)` down to `start`.
        unsafe { ptr::copy(self.slot(end).as_ptr(), self.slot(start).as_ptr(), tail) };
        self.len = start + tail;
        Ok(start)
    }

    // ── Resizing ────────────────────────────────────────────────────

    /// Resize to `n`, default-constructing new trailing elements or
    /// dropping excess ones. The retained prefix is untouched.
    ///
    /// # Errors
    ///
    /// [`ArrayError::Alloc`] if growth fails (array unchanged);
    /// [`ArrayError::TransferFailed`] if `T::default` panics (the elements
    /// built so far remain).
    pub fn resize_default(&mut self, n: usize) -> Result<(), ArrayError>
    where
        T: Default,
    {
        if n <= self.len {
            self.destroy_from(n);
            return Ok(());
        }
        self.grow_to(n)?;
        let missing = n - self.len;
        self.fill_spare(missing, |_| T::default())
    }

    /// Drop every element, then fill with `n` clones of `value`.
    ///
    /// Unlike [`DynArray::resize_default`], no existing element survives:
    /// the result is always `n` copies of `value`.
    ///
    /// # Errors
    ///
    /// As for [`DynArray::assign_fill`].
    pub fn resize_fill(&mut self, n: usize, value: &T) -> Result<(), ArrayError>
    where
        T: Clone,
    {
        self.destroy_from(0);
        self.assign_fill(n, value)
    }

    /// Exchange contents and allocators with `other` in constant time.
    pub fn swap_with(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Drop every element and release the storage. Capacity becomes zero.
    pub fn clear(&mut self) {
        self.destroy_from(0);
        self.release_storage();
    }

    // ── Internals ───────────────────────────────────────────────────

    /// Pointer to slot `index`; valid for `index <= cap`.
    fn slot(&self, index: usize) -> NonNull<T> {
        debug_assert!(index <= self.cap);
        // SAFETY: `index <= cap` stays within (or one past) the allocation.
        unsafe { self.ptr.add(index) }
    }

    fn check_position(&self, index: usize) -> Result<(), ArrayError> {
        if index > self.len {
            return Err(ArrayError::OutOfRange {
                index,
                len: self.len,
            });
        }
        Ok(())
    }

    fn resolve_range<R>(&self, range: R) -> Result<(usize, usize), ArrayError>
    where
        R: RangeBounds<usize>,
    {
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.checked_add(1).ok_or(ArrayError::CapacityOverflow)?,
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => e.checked_add(1).ok_or(ArrayError::CapacityOverflow)?,
            Bound::Excluded(&e) => e,
            Bound::Unbounded => self.len,
        };
        if end > self.len {
            return Err(ArrayError::OutOfRange {
                index: end,
                len: self.len,
            });
        }
        if start > end {
            return Err(ArrayError::OutOfRange {
                index: start,
                len: self.len,
            });
        }
        Ok((start, end))
    }

    /// Reallocate if `required` exceeds the capacity.
    fn grow_to(&mut self, required: usize) -> Result<(), ArrayError> {
        if required > self.cap {
            self.reallocate(required)?;
        }
        Ok(())
    }

    fn grow_for_push(&mut self) -> Result<(), ArrayError> {
        let required = self.len.checked_add(1).ok_or(ArrayError::CapacityOverflow)?;
        if required >= self.cap {
            self.reallocate(required)?;
        }
        Ok(())
    }

    /// Move the live elements into a fresh run of `requested × 2` slots.
    ///
    /// The new run is obtained before the old one is released; on failure
    /// nothing changes.
    fn reallocate(&mut self, requested: usize) -> Result<(), ArrayError> {
        let new_cap = requested
            .checked_mul(OVER_ALLOCATION)
            .filter(|&cap| cap <= self.max_size())
            .ok_or(ArrayError::CapacityOverflow)?;
        debug_assert!(new_cap >= self.len, "reallocation must hold every live element");
        let new_ptr = self.alloc.allocate(new_cap)?;
        // SAFETY: both runs are distinct live allocations of at least `len`
        // slots; elements are moved bitwise and the old slots are then
        // treated as uninitialised.
        unsafe { ptr::copy_nonoverlapping(self.ptr.as_ptr(), new_ptr.as_ptr(), self.len) };
        self.release_storage_keep_len();
        self.ptr = new_ptr;
        self.cap = new_cap;
        Ok(())
    }

    /// Slide `[index, len)` up by `n` slots. Capacity must already fit.
    fn open_gap(&mut self, index: usize, n: usize) {
        debug_assert!(self.len + n <= self.cap);
        let src = self.slot(index).as_ptr();
        // SAFETY: source and destination lie within the allocation; `copy`
        // handles the overlap.
        unsafe { ptr::copy(src, src.add(n), self.len - index) };
    }

    /// Construct `count` elements from `make(i)` into `[len, len + count)`.
    ///
    /// Capacity must already fit. `len` advances per element, so a panic in
    /// `make` leaves the array holding exactly the elements built so far;
    /// the panic is reported as [`ArrayError::TransferFailed`].
    fn fill_spare<F>(&mut self, count: usize, mut make: F) -> Result<(), ArrayError>
    where
        F: FnMut(usize) -> T,
    {
        debug_assert!(self.len + count <= self.cap);
        let start = self.len;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            for i in 0..count {
                let value = make(i);
                // SAFETY: slot `len < cap` is vacant.
                unsafe { self.alloc.construct(self.slot(self.len), value) };
                self.len += 1;
            }
        }));
        outcome.map_err(|_| ArrayError::TransferFailed {
            completed: self.len - start,
            requested: count,
        })
    }

    /// Shared path of `insert_fill` / `insert_slice`: build at the back,
    /// then rotate into place. A failed build is rolled back.
    fn insert_with<F>(&mut self, index: usize, n: usize, make: F) -> Result<usize, ArrayError>
    where
        F: FnMut(usize) -> T,
    {
        self.check_position(index)?;
        let old_len = self.len;
        let required = old_len.checked_add(n).ok_or(ArrayError::CapacityOverflow)?;
        self.grow_to(required)?;
        if let Err(e) = self.fill_spare(n, make) {
            self.destroy_from(old_len);
            return Err(e);
        }
        self.as_mut_slice()[index..].rotate_right(n);
        Ok(index)
    }

    /// Move staged items into spare capacity. Capacity must already fit.
    fn append_staged(&mut self, staged: Staging<T>) {
        debug_assert!(self.len + staged.len() <= self.cap);
        for value in staged {
            // SAFETY: slot `len < cap` is vacant.
            unsafe { self.alloc.construct(self.slot(self.len), value) };
            self.len += 1;
        }
    }

    /// Destroy elements `[from, len)` and set `len = from`.
    fn destroy_from(&mut self, from: usize) {
        let old_len = self.len;
        if from >= old_len {
            return;
        }
        self.len = from;
        for i in from..old_len {
            // SAFETY: `[from, old_len)` were live and are destroyed once.
            unsafe { self.alloc.destroy(self.slot(i)) };
        }
    }

    /// Return the allocation to the allocator. Elements must already be
    /// destroyed.
    fn release_storage(&mut self) {
        debug_assert_eq!(self.len, 0);
        self.release_storage_keep_len();
        self.ptr = NonNull::dangling();
        self.cap = 0;
    }

    fn release_storage_keep_len(&mut self) {
        if self.cap > 0 {
            // SAFETY: `(ptr, cap)` is exactly the run obtained from this
            // allocator; callers no longer use the old slots.
            unsafe { self.alloc.deallocate(self.ptr.as_ptr(), self.cap) };
        }
    }

    /// Decompose into raw parts without running `Drop`.
    pub(crate) fn into_raw_parts(self) -> (NonNull<T>, usize, usize, A) {
        let me = ManuallyDrop::new(self);
        // SAFETY: `me` is never used again, so the allocator is moved out
        // exactly once.
        let alloc = unsafe { ptr::read(&me.alloc) };
        (me.ptr, me.len, me.cap, alloc)
    }
}

impl<T, A: ElementAllocator<T>> Drop for DynArray<T, A> {
    fn drop(&mut self) {
        self.destroy_from(0);
        self.release_storage();
    }
}

impl<T, A: ElementAllocator<T>> Deref for DynArray<T, A> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, A: ElementAllocator<T>> DerefMut for DynArray<T, A> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, A: ElementAllocator<T>> AsRef<[T]> for DynArray<T, A> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, A: ElementAllocator<T>> AsMut<[T]> for DynArray<T, A> {
    fn as_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

/// Deep copy.
///
/// # Panics
///
/// Panics if the copy cannot be allocated or an element clone panics; use
/// [`DynArray::try_clone`] to handle those cases.
impl<T: Clone, A: ElementAllocator<T>> Clone for DynArray<T, A> {
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(copy) => copy,
            Err(e) => panic!("DynArray clone failed: {e}"),
        }
    }
}

impl<T: fmt::Debug, A: ElementAllocator<T>> fmt::Debug for DynArray<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, U, A, B> PartialEq<DynArray<U, B>> for DynArray<T, A>
where
    T: PartialEq<U>,
    A: ElementAllocator<T>,
    B: ElementAllocator<U>,
{
    fn eq(&self, other: &DynArray<U, B>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq, A: ElementAllocator<T>> Eq for DynArray<T, A> {}

impl<T, U, A> PartialEq<[U]> for DynArray<T, A>
where
    T: PartialEq<U>,
    A: ElementAllocator<T>,
{
    fn eq(&self, other: &[U]) -> bool {
        self.as_slice() == other
    }
}

impl<T, U, A> PartialEq<&[U]> for DynArray<T, A>
where
    T: PartialEq<U>,
    A: ElementAllocator<T>,
{
    fn eq(&self, other: &&[U]) -> bool {
        self.as_slice() == *other
    }
}

impl<T, U, A, const N: usize> PartialEq<[U; N]> for DynArray<T, A>
where
    T: PartialEq<U>,
    A: ElementAllocator<T>,
{
    fn eq(&self, other: &[U; N]) -> bool {
        self.as_slice() == &other[..]
    }
}

impl<'a, T, A: ElementAllocator<T>> IntoIterator for &'a DynArray<T, A> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, A: ElementAllocator<T>> IntoIterator for &'a mut DynArray<T, A> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T, A: ElementAllocator<T>> IntoIterator for DynArray<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}
