//! Random-access positions into a dynamic array's storage.
//!
//! A [`Cursor`] is a bare address: it carries no length, no owner, and no
//! generation, so it cannot tell when it has gone stale. Any operation on
//! the owning array that reallocates, shifts, or destroys elements
//! invalidates every cursor into it. Arithmetic and comparison are always
//! safe; only dereferencing is `unsafe`.
//!
//! For checked access, convert a cursor back to an index with
//! [`DynArray::index_of`](crate::DynArray::index_of) and use the array's
//! bounds-checked accessors.

#![allow(unsafe_code)]

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::ptr::NonNull;

/// A position in contiguous storage of `T`.
pub struct Cursor<T> {
    ptr: *mut T,
}

impl<T> Cursor<T> {
    pub(crate) fn new(ptr: *mut T) -> Self {
        Self { ptr }
    }

    /// The raw address this cursor points at.
    pub fn as_ptr(self) -> *mut T {
        self.ptr
    }

    /// Advance by one element.
    pub fn inc(&mut self) -> &mut Self {
        *self += 1;
        self
    }

    /// Step back by one element.
    pub fn dec(&mut self) -> &mut Self {
        *self -= 1;
        self
    }

    /// Signed element distance from `origin` to `self`.
    pub fn offset_from(self, origin: Cursor<T>) -> isize {
        let bytes = (self.ptr as isize).wrapping_sub(origin.ptr as isize);
        match mem::size_of::<T>() {
            0 => bytes,
            size => bytes / size as isize,
        }
    }

    /// Borrow the element at this position.
    ///
    /// # Safety
    ///
    /// The cursor must point at a live element of an array that has not
    /// been reallocated, shifted, or destroyed since the cursor was
    /// obtained, and the returned reference must not outlive that element
    /// or coexist with a mutable borrow of it.
    pub unsafe fn get<'a>(self) -> &'a T {
        // SAFETY: caller guarantees a live element; zero-sized elements
        // are read through a dangling but aligned pointer.
        unsafe { &*self.deref_ptr() }
    }

    /// Mutably borrow the element at this position.
    ///
    /// # Safety
    ///
    /// As for [`Cursor::get`], and no other reference to the element may
    /// exist while the returned one is alive.
    pub unsafe fn get_mut<'a>(self) -> &'a mut T {
        // SAFETY: forwarded caller contract.
        unsafe { &mut *self.deref_ptr() }
    }

    /// Borrow the element `offset` positions away.
    ///
    /// # Safety
    ///
    /// As for [`Cursor::get`], applied to `self + offset`.
    pub unsafe fn at<'a>(self, offset: isize) -> &'a T {
        // SAFETY: forwarded caller contract.
        unsafe { (self + offset).get() }
    }

    fn deref_ptr(self) -> *mut T {
        if mem::size_of::<T>() == 0 {
            NonNull::dangling().as_ptr()
        } else {
            self.ptr
        }
    }

    fn step(self, n: isize) -> Self {
        let ptr = if mem::size_of::<T>() == 0 {
            self.ptr.wrapping_byte_offset(n)
        } else {
            self.ptr.wrapping_offset(n)
        };
        Self { ptr }
    }
}

impl<T> Clone for Cursor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Cursor<T> {}

impl<T> Add<isize> for Cursor<T> {
    type Output = Self;

    fn add(self, n: isize) -> Self {
        self.step(n)
    }
}

impl<T> Sub<isize> for Cursor<T> {
    type Output = Self;

    fn sub(self, n: isize) -> Self {
        self.step(n.wrapping_neg())
    }
}

impl<T> AddAssign<isize> for Cursor<T> {
    fn add_assign(&mut self, n: isize) {
        *self = self.step(n);
    }
}

impl<T> SubAssign<isize> for Cursor<T> {
    fn sub_assign(&mut self, n: isize) {
        *self = self.step(n.wrapping_neg());
    }
}

impl<T> Sub for Cursor<T> {
    type Output = isize;

    fn sub(self, origin: Self) -> isize {
        self.offset_from(origin)
    }
}

impl<T> PartialEq for Cursor<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<T> Eq for Cursor<T> {}

impl<T> PartialOrd for Cursor<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Cursor<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ptr.cmp(&other.ptr)
    }
}

impl<T> Hash for Cursor<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ptr.hash(state);
    }
}

impl<T> fmt::Debug for Cursor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cursor({:p})", self.ptr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursors(data: &mut [i32]) -> (Cursor<i32>, Cursor<i32>) {
        let range = data.as_mut_ptr_range();
        (Cursor::new(range.start), Cursor::new(range.end))
    }

    #[test]
    fn stepping_and_distance() {
        let mut data = [10, 20, 30, 40];
        let (begin, end) = cursors(&mut data);
        assert_eq!(end - begin, 4);
        let mut c = begin;
        c.inc().inc();
        assert_eq!(c - begin, 2);
        c.dec();
        assert_eq!(unsafe { *c.get() }, 20);
        assert_eq!(unsafe { *c.at(2) }, 40);
        assert_eq!(unsafe { *c.at(-1) }, 10);
    }

    #[test]
    fn offset_arithmetic() {
        let mut data = [1, 2, 3, 4, 5];
        let (begin, end) = cursors(&mut data);
        assert_eq!(begin + 5, end);
        assert_eq!(end - 5isize, begin);
        assert_eq!(begin + 3 - 1isize, begin + 2);
        let mut c = begin;
        c += 4;
        c -= 1;
        assert_eq!(c, begin + 3);
    }

    #[test]
    fn relational_operators_follow_address() {
        let mut data = [0u8; 8];
        let range = data.as_mut_ptr_range();
        let a = Cursor::new(range.start);
        let b = a + 3;
        assert!(a < b);
        assert!(a <= b);
        assert!(b > a);
        assert!(b >= a);
        assert!(a != b);
        assert!(a == b - 3isize);
    }

    #[test]
    fn write_through_get_mut() {
        let mut data = [1, 2, 3];
        let (begin, _) = cursors(&mut data);
        unsafe { *(begin + 1).get_mut() = 99 };
        assert_eq!(data, [1, 99, 3]);
    }

    #[test]
    fn zero_sized_distance_counts_steps() {
        let origin = Cursor::<()>::new(NonNull::dangling().as_ptr());
        let moved = origin + 7;
        assert_eq!(moved - origin, 7);
        let () = unsafe { *moved.get() };
    }

    #[test]
    fn debug_shows_address() {
        let mut x = 5;
        let c = Cursor::new(&mut x as *mut i32);
        assert!(format!("{c:?}").starts_with("Cursor(0x"));
    }
}
