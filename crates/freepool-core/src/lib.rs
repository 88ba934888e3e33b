//! Core types and traits for the freepool workspace.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the error taxonomy shared by the arena and the dynamic array, and the
//! [`ElementAllocator`] capability trait that containers are generic over.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod error;
pub mod traits;

pub use error::{AllocError, ArrayError};
pub use traits::ElementAllocator;
