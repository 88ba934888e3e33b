//! By-value iteration over a [`DynArray`].

#![allow(unsafe_code)]

use std::fmt;
use std::iter::FusedIterator;
use std::mem;
use std::ptr::{self, NonNull};
use std::slice;

use freepool_core::ElementAllocator;

use crate::array::DynArray;

/// Owning iterator returned by `DynArray::into_iter`.
///
/// Holds the array's storage until dropped; unyielded elements are dropped
/// and the run is returned to the allocator then.
pub struct IntoIter<T, A: ElementAllocator<T>> {
    buf: NonNull<T>,
    cap: usize,
    /// Live elements occupy `[head, tail)`.
    head: usize,
    tail: usize,
    alloc: A,
}

impl<T, A: ElementAllocator<T>> IntoIter<T, A> {
    pub(crate) fn new(array: DynArray<T, A>) -> Self {
        let (buf, len, cap, alloc) = array.into_raw_parts();
        Self {
            buf,
            cap,
            head: 0,
            tail: len,
            alloc,
        }
    }

    /// The elements not yet yielded.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `[head, tail)` holds initialised elements.
        unsafe { slice::from_raw_parts(self.buf.as_ptr().add(self.head), self.tail - self.head) }
    }

    fn read(&self, index: usize) -> T {
        // SAFETY: callers pass an index in `[head, tail)` and then shrink
        // the range past it, so each element is read once.
        unsafe { ptr::read(self.buf.as_ptr().add(index)) }
    }
}

impl<T, A: ElementAllocator<T>> Iterator for IntoIter<T, A> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.head == self.tail {
            return None;
        }
        let value = self.read(self.head);
        self.head += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.tail - self.head;
        (remaining, Some(remaining))
    }
}

impl<T, A: ElementAllocator<T>> DoubleEndedIterator for IntoIter<T, A> {
    fn next_back(&mut self) -> Option<T> {
        if self.head == self.tail {
            return None;
        }
        self.tail -= 1;
        Some(self.read(self.tail))
    }
}

impl<T, A: ElementAllocator<T>> ExactSizeIterator for IntoIter<T, A> {}

impl<T, A: ElementAllocator<T>> FusedIterator for IntoIter<T, A> {}

impl<T, A: ElementAllocator<T>> Drop for IntoIter<T, A> {
    fn drop(&mut self) {
        let (head, tail) = (self.head, mem::replace(&mut self.tail, self.head));
        for i in head..tail {
            // SAFETY: `[head, tail)` were still live; the range is emptied
            // first so a panicking destructor cannot cause a double drop.
            unsafe { self.alloc.destroy(self.buf.add(i)) };
        }
        if self.cap > 0 {
            // SAFETY: `(buf, cap)` is the run the array obtained from
            // `alloc`, now holding no live elements.
            unsafe { self.alloc.deallocate(self.buf.as_ptr(), self.cap) };
        }
    }
}

impl<T: fmt::Debug, A: ElementAllocator<T>> fmt::Debug for IntoIter<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freepool_arena::{ArenaRegistry, PoolAllocator, PoolConfig};

    #[test]
    fn yields_in_order_from_both_ends() {
        let v = DynArray::from_slice(&[1, 2, 3, 4]).unwrap();
        let mut it = v.into_iter();
        assert_eq!(it.len(), 4);
        assert_eq!(it.next(), Some(1));
        assert_eq!(it.next_back(), Some(4));
        assert_eq!(it.as_slice(), &[2, 3]);
        assert_eq!(it.collect::<Vec<_>>(), [2, 3]);
    }

    #[test]
    fn dropping_early_releases_storage() {
        let registry = ArenaRegistry::with_config(PoolConfig::new(32));
        let alloc = PoolAllocator::<String>::from_registry(&registry).unwrap();
        let mut v = DynArray::new_in(alloc.clone());
        for word in ["a", "b", "c"] {
            v.push(word.to_string()).unwrap();
        }
        let mut it = v.into_iter();
        assert_eq!(it.next().as_deref(), Some("a"));
        drop(it);
        assert_eq!(alloc.stats().unwrap().used, 0);
    }

    #[test]
    fn empty_array_iterates_nothing() {
        let v = DynArray::<u8>::new();
        assert_eq!(v.into_iter().next(), None);
    }
}
