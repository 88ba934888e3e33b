//! freepool: a fixed-arena free-list allocator and a dynamic array built on it.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! freepool sub-crates. For most users, adding `freepool` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use freepool::prelude::*;
//!
//! // Arrays draw from the thread's shared arena for their element type.
//! let mut v = DynArray::<u32>::new();
//! for i in 0..10 {
//!     v.push(i)?;
//! }
//! v.erase_range(2..8)?;
//! assert_eq!(v, [0, 1, 8, 9]);
//!
//! // A private registry gives arenas of a chosen size.
//! let registry = ArenaRegistry::with_config(PoolConfig::new(16));
//! let alloc = PoolAllocator::<u64>::from_registry(&registry)?;
//! let mut small = DynArray::new_in(alloc.clone());
//! small.assign_fill(4, &7)?;
//! assert!(small.reserve(1_000).is_err());
//! assert_eq!(alloc.stats().map(|s| s.used), Some(small.capacity()));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `freepool-core` | Error types and the `ElementAllocator` trait |
//! | [`arena`] | `freepool-arena` | Block ledger, arenas, registry, `PoolAllocator` |
//! | [`vec`] | `freepool-vec` | `DynArray`, `Cursor`, `IntoIter` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Error types and the allocation capability trait (`freepool-core`).
pub use freepool_core as types;

/// Free-list arenas and the allocator front-end (`freepool-arena`).
///
/// [`arena::BlockLedger`] is the pure bookkeeping core; [`arena::Arena`]
/// pairs it with storage; [`arena::PoolAllocator`] is the handle
/// containers use.
pub use freepool_arena as arena;

/// The dynamic array and its cursors (`freepool-vec`).
pub use freepool_vec as vec;

/// Common imports for typical freepool usage.
///
/// ```rust
/// use freepool::prelude::*;
/// ```
pub mod prelude {
    // Errors and traits
    pub use freepool_core::{AllocError, ArrayError, ElementAllocator};

    // Arena
    pub use freepool_arena::{ArenaRegistry, ArenaStats, PoolAllocator, PoolConfig};

    // Array
    pub use freepool_vec::{Cursor, DynArray};
}
