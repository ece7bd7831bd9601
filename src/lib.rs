#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// Construction errors.
pub mod error;

/// Hash spreading, capacity normalization, and the tuning constants shared by
/// the table and the map.
pub mod hash;

/// A key-value map over the chained table.
///
/// This module provides a `HashMap` that wraps the `HashTable`, hashing keys
/// with a configurable hasher builder and caching the spread hash per entry.
pub mod hash_map;

/// The separately chained table underneath [`HashMap`].
pub mod hash_table;

#[cfg(any(feature = "foldhash", feature = "std"))]
pub use hash::DefaultHashBuilder;
pub use error::Error;
pub use error::Result;
pub use hash_map::Entry;
pub use hash_map::HashMap;
pub use hash_table::HashTable;
