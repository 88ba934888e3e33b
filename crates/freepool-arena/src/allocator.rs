//! The allocator front-end: a stateless handle onto a shared arena.
//!
//! [`PoolAllocator<T>`] owns nothing but a reference to the arena for `T`.
//! A default handle resolves the thread's shared arena lazily, on the
//! first allocation, so constructing one never reserves memory.

#![allow(unsafe_code)]

use std::cell::OnceCell;
use std::fmt;
use std::ptr::NonNull;
use std::rc::Rc;

use freepool_core::{AllocError, ElementAllocator};

use crate::arena::Arena;
use crate::registry::{existing_shared_arena, shared_arena, ArenaRegistry};
use crate::stats::ArenaStats;

enum Binding<T> {
    /// The default registry's arena for `T`, resolved on first use.
    Shared(OnceCell<Rc<Arena<T>>>),
    /// A specific arena chosen at construction.
    Explicit(Rc<Arena<T>>),
}

/// Allocator handle for the free-list arena of element type `T`.
///
/// Handles are cheap to clone and carry no state of their own. All
/// default handles for the same `T` compare equal: they address the same
/// thread-shared arena. A handle bound to an explicit arena equals any
/// other handle that resolves to that same arena.
pub struct PoolAllocator<T> {
    binding: Binding<T>,
}

impl<T: 'static> PoolAllocator<T> {
    /// Handle onto the shared arena for `T`.
    ///
    /// The arena is created on the first allocation through any handle.
    pub fn new() -> Self {
        Self {
            binding: Binding::Shared(OnceCell::new()),
        }
    }

    /// Handle onto `registry`'s arena for `T`, creating it if needed.
    ///
    /// # Errors
    ///
    /// See [`ArenaRegistry::arena`].
    pub fn from_registry(registry: &ArenaRegistry) -> Result<Self, AllocError> {
        Ok(Self::in_arena(registry.arena::<T>()?))
    }

    /// The arena this handle allocates from, resolving it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::InvalidConfig`] if the shared arena for `T`
    /// cannot be created.
    pub fn arena(&self) -> Result<&Rc<Arena<T>>, AllocError> {
        match &self.binding {
            Binding::Explicit(arena) => Ok(arena),
            Binding::Shared(cell) => {
                if let Some(arena) = cell.get() {
                    return Ok(arena);
                }
                let arena = shared_arena::<T>()?;
                Ok(cell.get_or_init(|| arena))
            }
        }
    }

    /// Stats of the underlying arena, or `None` if a shared handle has
    /// not resolved one yet and none exists.
    pub fn stats(&self) -> Option<ArenaStats> {
        self.resolved().map(|arena| arena.stats())
    }

    fn resolved(&self) -> Option<Rc<Arena<T>>> {
        match &self.binding {
            Binding::Explicit(arena) => Some(Rc::clone(arena)),
            Binding::Shared(cell) => cell.get().cloned().or_else(existing_shared_arena::<T>),
        }
    }
}

impl<T> PoolAllocator<T> {
    /// Handle onto a specific arena.
    pub fn in_arena(arena: Rc<Arena<T>>) -> Self {
        Self {
            binding: Binding::Explicit(arena),
        }
    }
}

impl<T: 'static> ElementAllocator<T> for PoolAllocator<T> {
    fn allocate(&self, n: usize) -> Result<NonNull<T>, AllocError> {
        if n == 0 {
            return Ok(NonNull::dangling());
        }
        self.arena()?.allocate(n)
    }

    unsafe fn deallocate(&self, ptr: *mut T, n: usize) {
        if ptr.is_null() || n == 0 {
            return;
        }
        // A shared handle that never resolved an arena cannot own `ptr`
        // unless another handle created the arena in the meantime.
        if let Some(arena) = self.resolved() {
            // SAFETY: forwarded caller contract.
            unsafe { arena.deallocate(ptr, n) }
        }
    }
}

impl<T: 'static> Default for PoolAllocator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for PoolAllocator<T> {
    fn clone(&self) -> Self {
        let binding = match &self.binding {
            Binding::Shared(cell) => Binding::Shared(cell.clone()),
            Binding::Explicit(arena) => Binding::Explicit(Rc::clone(arena)),
        };
        Self { binding }
    }
}

impl<T: 'static> PartialEq for PoolAllocator<T> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.binding, &other.binding) {
            (Binding::Shared(_), Binding::Shared(_)) => true,
            _ => match (self.resolved(), other.resolved()) {
                (Some(a), Some(b)) => Rc::ptr_eq(&a, &b),
                _ => false,
            },
        }
    }
}

impl<T: 'static> Eq for PoolAllocator<T> {}

impl<T> fmt::Debug for PoolAllocator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let binding = match &self.binding {
            Binding::Shared(_) => "shared",
            Binding::Explicit(_) => "explicit",
        };
        f.debug_struct("PoolAllocator")
            .field("element", &std::any::type_name::<T>())
            .field("binding", &binding)
            .finish()
    }
}
