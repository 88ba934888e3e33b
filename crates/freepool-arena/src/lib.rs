//! Fixed-capacity free-list arenas for freepool.
//!
//! Each element type gets one pre-reserved region of slots, partitioned
//! by a block ledger into free and occupied runs. Allocation is a last-fit
//! search from the top of the arena with splitting; deallocation frees a
//! run and immediately coalesces it with free neighbours. This crate is
//! one of two that contain `unsafe` code (along with `freepool-vec`).
//!
//! # Architecture
//!
//! ```text
//! PoolAllocator<T> (stateless handle, Clone + Eq)
//! └── Rc<Arena<T>> (one per element type per registry)
//!     ├── RawStorage<T> (capacity × T, reserved once)
//!     └── BlockLedger → Block[] (address-ordered, gap-free)
//! ArenaRegistry (TypeId → Arena, lazily populated; thread-local default)
//! ```
//!
//! # Failure model
//!
//! The arena never grows and never defragments. A request fails with
//! [`AllocError::OutOfMemory`](freepool_core::AllocError::OutOfMemory)
//! when no single free block can hold it, whether the arena is exhausted
//! or merely fragmented.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod allocator;
pub mod arena;
pub mod block;
pub mod config;
pub mod ledger;
mod raw;
pub mod registry;
pub mod stats;

// Public re-exports for the primary API surface.
pub use allocator::PoolAllocator;
pub use arena::Arena;
pub use block::Block;
pub use config::PoolConfig;
pub use ledger::{BlockLedger, LedgerCounters, LedgerViolation};
pub use registry::{shared_arena, ArenaRegistry};
pub use stats::ArenaStats;
