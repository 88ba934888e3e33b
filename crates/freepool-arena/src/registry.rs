//! Per-element-type arena registry.
//!
//! An [`ArenaRegistry`] owns at most one [`Arena`] per element type,
//! creating it on first request and handing out shared `Rc` references
//! afterwards. Every allocator handle that resolves through the same
//! registry for the same `T` therefore sees the same pool.
//!
//! A thread-local default registry backs [`shared_arena`] and the
//! default-constructed `PoolAllocator`. It lives until the thread exits.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use freepool_core::AllocError;

use crate::arena::Arena;
use crate::config::PoolConfig;

/// Lazily populated map from element type to its arena.
pub struct ArenaRegistry {
    config: PoolConfig,
    arenas: RefCell<IndexMap<TypeId, Rc<dyn Any>>>,
}

impl ArenaRegistry {
    /// Create an empty registry whose arenas use the default config.
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Create an empty registry whose arenas are built from `config`.
    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            config,
            arenas: RefCell::new(IndexMap::new()),
        }
    }

    /// The arena for `T`, creating it on first access.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::InvalidConfig`] if the registry's config
    /// cannot back an arena of `T`. Nothing is registered in that case.
    pub fn arena<T: 'static>(&self) -> Result<Rc<Arena<T>>, AllocError> {
        if let Some(existing) = self.get::<T>() {
            return Ok(existing);
        }
        let arena = Rc::new(Arena::<T>::new(self.config.clone())?);
        self.arenas
            .borrow_mut()
            .insert(TypeId::of::<T>(), Rc::clone(&arena) as Rc<dyn Any>);
        Ok(arena)
    }

    /// The arena for `T` if one has already been created.
    pub fn get<T: 'static>(&self) -> Option<Rc<Arena<T>>> {
        let entry = Rc::clone(self.arenas.borrow().get(&TypeId::of::<T>())?);
        // Entries are only ever inserted under their own TypeId.
        entry.downcast::<Arena<T>>().ok()
    }

    /// Register a pre-built arena for `T`.
    ///
    /// Returns the arena back as `Err` if `T` already has one: an arena
    /// in use is never replaced.
    pub fn insert<T: 'static>(&self, arena: Arena<T>) -> Result<Rc<Arena<T>>, Arena<T>> {
        let mut arenas = self.arenas.borrow_mut();
        if arenas.contains_key(&TypeId::of::<T>()) {
            return Err(arena);
        }
        let arena = Rc::new(arena);
        arenas.insert(TypeId::of::<T>(), Rc::clone(&arena) as Rc<dyn Any>);
        Ok(arena)
    }

    /// Whether an arena for `T` has been created.
    pub fn contains<T: 'static>(&self) -> bool {
        self.arenas.borrow().contains_key(&TypeId::of::<T>())
    }

    /// Number of arenas created so far.
    pub fn len(&self) -> usize {
        self.arenas.borrow().len()
    }

    /// Whether no arena has been created yet.
    pub fn is_empty(&self) -> bool {
        self.arenas.borrow().is_empty()
    }

    /// The config new arenas are built from.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }
}

impl Default for ArenaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ArenaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaRegistry")
            .field("config", &self.config)
            .field("arenas", &self.len())
            .finish()
    }
}

thread_local! {
    static DEFAULT_REGISTRY: ArenaRegistry = ArenaRegistry::new();
}

/// The default registry's arena for `T`, created on first access.
///
/// # Errors
///
/// See [`ArenaRegistry::arena`].
pub fn shared_arena<T: 'static>() -> Result<Rc<Arena<T>>, AllocError> {
    DEFAULT_REGISTRY.with(|registry| registry.arena::<T>())
}

/// The default registry's arena for `T`, without creating one.
pub fn existing_shared_arena<T: 'static>() -> Option<Rc<Arena<T>>> {
    DEFAULT_REGISTRY.with(|registry| registry.get::<T>())
}
