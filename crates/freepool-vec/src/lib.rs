//! Contiguous dynamic array generic over freepool allocators.
//!
//! [`DynArray`] is a growable sequence whose storage comes from any
//! [`ElementAllocator`](freepool_core::ElementAllocator), by default the
//! shared free-list arena for its element type. Because that arena has a
//! fixed capacity, every operation that may need storage returns a
//! `Result` rather than aborting on exhaustion.
//!
//! # Architecture
//!
//! ```text
//! DynArray<T, A = PoolAllocator<T>>
//! ├── [ptr, ptr+len)  live elements
//! ├── [ptr+len, ptr+cap)  uninitialised spare slots
//! ├── A (allocator handle; storage requested as 2 × needed)
//! ├── Cursor<T> (raw random-access position, begin()/end())
//! └── IntoIter<T, A> (by-value iteration, releases storage on drop)
//! ```
//!
//! # Example
//!
//! ```
//! use freepool_vec::DynArray;
//!
//! let mut v = DynArray::<i32>::new();
//! for i in 1..=5 {
//!     v.push(i)?;
//! }
//! v.insert(0, 0)?;
//! assert_eq!(v, [0, 1, 2, 3, 4, 5]);
//! assert!(v.capacity() >= v.len());
//! # Ok::<(), freepool_vec::ArrayError>(())
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod array;
pub mod cursor;
pub mod iter;

// Public re-exports for the primary API surface.
pub use array::{DynArray, OVER_ALLOCATION};
pub use cursor::Cursor;
pub use freepool_core::ArrayError;
pub use iter::IntoIter;
