//! Test utilities and fixture types for freepool development.
//!
//! Provides a heap-backed [`ElementAllocator`] mock ([`HeapAllocator`]),
//! element types that observe their own lifecycle ([`fixtures`]), and a
//! seeded generator of allocate/release workloads ([`workload`]).
//!
//! [`ElementAllocator`]: freepool_core::ElementAllocator

#![deny(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
mod heap;
pub mod workload;

pub use fixtures::{DropLog, PanicOnClone, Tracked};
pub use heap::HeapAllocator;
pub use workload::{LedgerOp, Workload};
