use core::hash::BuildHasher;
use core::hash::Hash;

/// Number of buckets allocated on the first insert into a table built without
/// an explicit initial capacity.
pub const DEFAULT_INITIAL_CAPACITY: usize = 1 << 16;

/// The largest bucket count a table will ever grow to.
///
/// Once a table reaches this many buckets its threshold is raised to
/// `usize::MAX` and it stops growing; chains simply get longer.
pub const MAXIMUM_CAPACITY: usize = 1 << 30;

/// Load factor used when none is supplied.
pub const DEFAULT_LOAD_FACTOR: f32 = 0.75;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The hasher builder used by [`HashMap::new`](crate::HashMap::new).
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// The hasher builder used by [`HashMap::new`](crate::HashMap::new).
        pub type DefaultHashBuilder = std::collections::hash_map::RandomState;
    }
}

/// Folds the high half of a hash code into the low half.
///
/// Bucket indices only look at the low bits of a hash, so hash codes that
/// differ mostly in their upper bits would otherwise pile into the same few
/// buckets.
///
/// ```rust
/// use chain_hash::hash::spread;
///
/// assert_eq!(spread(0), 0);
/// assert_eq!(spread(0x0001_0000), 0x0001_0001);
/// assert_eq!(spread(0xFFFF_0000), 0xFFFF_FFFF);
/// ```
#[inline(always)]
pub const fn spread(h: u32) -> u32 {
    h ^ (h >> 16)
}

/// Computes the spread hash of a key.
///
/// The native hash code is the low 32 bits of `hash_builder.hash_one(key)`.
/// An absent key hashes to 0 and therefore always lands in bucket 0.
///
/// ```rust
/// use std::collections::hash_map::RandomState;
///
/// use chain_hash::hash::hash_key;
///
/// let state = RandomState::new();
/// assert_eq!(hash_key::<str, _>(&state, None), 0);
/// assert_eq!(hash_key(&state, Some("a")), hash_key(&state, Some("a")));
/// ```
#[inline]
pub fn hash_key<K, S>(hash_builder: &S, key: Option<&K>) -> u32
where
    K: Hash + ?Sized,
    S: BuildHasher,
{
    match key {
        None => 0,
        Some(key) => spread(hash_builder.hash_one(key) as u32),
    }
}

/// Rounds a requested capacity up to a power of two, clamped to
/// [`MAXIMUM_CAPACITY`].
///
/// ```rust
/// use chain_hash::hash::MAXIMUM_CAPACITY;
/// use chain_hash::hash::table_size_for;
///
/// assert_eq!(table_size_for(1), 1);
/// assert_eq!(table_size_for(5), 8);
/// assert_eq!(table_size_for(64), 64);
/// assert_eq!(table_size_for(usize::MAX), MAXIMUM_CAPACITY);
/// ```
#[inline]
pub const fn table_size_for(requested: usize) -> usize {
    if requested >= MAXIMUM_CAPACITY {
        return MAXIMUM_CAPACITY;
    }

    let mut n = requested.saturating_sub(1);
    n |= n >> 1;
    n |= n >> 2;
    n |= n >> 4;
    n |= n >> 8;
    n |= n >> 16;
    n + 1
}

/// Bucket index of `hash` in a table of `capacity` buckets.
///
/// `capacity` must be a non-zero power of two.
#[inline(always)]
pub(crate) fn bucket_index(hash: u32, capacity: usize) -> usize {
    debug_assert!(capacity.is_power_of_two());
    hash as usize & (capacity - 1)
}

/// Threshold for `capacity` buckets at `load_factor`, clamped so that it can
/// never wrap.
#[inline]
pub(crate) fn threshold_for(capacity: usize, load_factor: f32) -> usize {
    let ft = capacity as f32 * load_factor;
    if capacity < MAXIMUM_CAPACITY && ft < MAXIMUM_CAPACITY as f32 {
        ft as usize
    } else {
        usize::MAX
    }
}

/// Bucket count and threshold after the next resize, or `None` once the table
/// is already at [`MAXIMUM_CAPACITY`] and must stop growing.
///
/// An unallocated table (`old_capacity == 0`) allocates the pending capacity
/// held in `old_threshold`, or [`DEFAULT_INITIAL_CAPACITY`] when nothing is
/// pending. An allocated table doubles; its threshold doubles with it unless
/// that overflows, is zero, or the new capacity hits the ceiling, in which
/// case it is recomputed from the load factor.
pub(crate) fn next_size(
    old_capacity: usize,
    old_threshold: usize,
    load_factor: f32,
) -> Option<(usize, usize)> {
    if old_capacity >= MAXIMUM_CAPACITY {
        return None;
    }

    if old_capacity == 0 {
        return Some(if old_threshold > 0 {
            (old_threshold, threshold_for(old_threshold, load_factor))
        } else {
            (
                DEFAULT_INITIAL_CAPACITY,
                threshold_for(DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR),
            )
        });
    }

    let new_capacity = old_capacity << 1;
    let doubled = if new_capacity < MAXIMUM_CAPACITY {
        old_threshold.checked_mul(2).filter(|&t| t > 0)
    } else {
        None
    };
    Some((
        new_capacity,
        doubled.unwrap_or_else(|| threshold_for(new_capacity, load_factor)),
    ))
}
