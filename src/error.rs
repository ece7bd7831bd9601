use thiserror::Error;

/// Errors returned when constructing a [`HashTable`] or [`HashMap`].
///
/// Construction is the only fallible operation; once a table exists, inserts
/// and lookups cannot fail.
///
/// [`HashTable`]: crate::hash_table::HashTable
/// [`HashMap`]: crate::hash_map::HashMap
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum Error {
    /// The requested initial capacity was zero.
    #[error("initial capacity should be greater than 0, got {0}")]
    InvalidCapacity(usize),
    /// The requested load factor was zero, negative, or NaN.
    #[error("illegal load factor: {0}")]
    InvalidLoadFactor(f32),
}

/// A `Result` alias using this crate's [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
