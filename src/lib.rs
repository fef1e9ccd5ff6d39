//! # tierkit
//!
//! Tiered, memory-compact in-memory data structures: a sorted integer set,
//! a fixed-width multi-array, and an S4LRU-style multi-level cache. Each
//! structure starts in its narrowest, cheapest representation and migrates
//! to a wider one only when an operation demands it — an element too wide
//! for the current tier, a capacity that outgrows the current slot-id
//! width — never the reverse within a single run.
//!
//! ## Module Organization
//!
//! ### Foundation
//! - [`cc`] - Compiler compatibility utilities (bit operations, branch hints)
//! - [`malloc`] - Memory allocator abstraction
//! - [`error`] - The crate's single fallible outcome: allocator exhaustion
//! - [`growth`] - Backing-store growth sizing oracle
//! - [`rng`] - Deterministic PRNG backing `IntSet::random`
//! - [`pack`] - Bit-field packing for Multi-LRU's variable-width entries
//!
//! ### Cores
//! - [`intset`] - [`IntSet`](intset::IntSet), a tiered sorted set of `i64`
//! - [`multiarray`] - [`MultiArray`](multiarray::MultiArray), a tiered fixed-width dynamic array
//! - [`multilru`] - [`Cache`](multilru::Cache), an S4LRU-style multi-level cache
//!
//! This crate's cores are all single-threaded (see `DESIGN.md`); the
//! concurrency-primitive library this crate's ancestor also carried
//! (locks, lock-free queues, hazard pointers, epoch reclamation, and the
//! like) has no counterpart in this crate's scope and was removed.

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![allow(clippy::module_inception)]

extern crate alloc;

// `quickcheck` pulls in `std` transitively; `no_std` crates need to opt
// back into it explicitly for test code, since the std prelude isn't
// implicit here the way it is for an ordinary crate.
#[cfg(test)]
extern crate std;

// =============================================================================
// Foundation
// =============================================================================

/// Compiler compatibility utilities.
///
/// Provides bit manipulation operations (ffs, ctz, popcount) and branch prediction hints.
pub mod cc;

/// Memory allocator abstraction.
///
/// Defines the [`Allocator`](malloc::Allocator) trait for custom memory allocation.
pub mod malloc;

/// The crate's single fallible outcome.
pub mod error;

/// Backing-store growth sizing oracle.
pub mod growth;

/// Deterministic PRNG backing [`intset::IntSet::random`].
pub mod rng;

/// Bit-field packing for Multi-LRU's variable-width entries.
pub mod pack;

// =============================================================================
// Cores
// =============================================================================

/// A tiered sorted set of 64-bit signed integers.
pub mod intset;

/// A tiered fixed-width dynamic array.
pub mod multiarray;

/// An S4LRU-style multi-level cache.
pub mod multilru;

// =============================================================================
// Re-exports for convenience
// =============================================================================

pub use error::{AllocError, Result};
pub use intset::IntSet;
pub use malloc::Allocator;
pub use multiarray::MultiArray;
pub use multilru::{Cache, CacheStats, Policy};
