use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::error::Error;
use crate::error::Result;
use crate::hash::DEFAULT_INITIAL_CAPACITY;
use crate::hash::DEFAULT_LOAD_FACTOR;
use crate::hash::MAXIMUM_CAPACITY;
use crate::hash::bucket_index;
use crate::hash::next_size;
use crate::hash::table_size_for;

type Link<V> = Option<Box<Node<V>>>;

/// One entry of a bucket chain. The spread hash is computed once, on insert,
/// and reused for every lookup and every resize.
struct Node<V> {
    hash: u32,
    value: V,
    next: Link<V>,
}

fn empty_buckets<V>(capacity: usize) -> Vec<Link<V>> {
    let mut buckets = Vec::with_capacity(capacity);
    buckets.resize_with(capacity, || None);
    buckets
}

/// Chain-length statistics for a table.
///
/// Requires the `stats` feature outside of tests.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of entries currently in the table
    pub populated: usize,
    /// Number of buckets allocated
    pub capacity: usize,
    /// Entry count that triggers the next resize
    pub threshold: usize,
    /// Number of buckets with no chain
    pub empty_buckets: usize,
    /// Length of the longest chain
    pub longest_chain: usize,
    /// Configured load factor
    pub load_factor: f32,
    /// Observed load (populated / capacity)
    pub load: f64,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} buckets ({:.2}% load, resize above {})",
            self.populated,
            self.capacity,
            self.load * 100.0,
            self.threshold
        );
        println!(
            "Empty buckets: {} ({:.2}%)",
            self.empty_buckets,
            if self.capacity == 0 {
                0.0
            } else {
                (self.empty_buckets as f64 / self.capacity as f64) * 100.0
            }
        );
        println!("Longest chain: {}", self.longest_chain);
        println!("Configured load factor: {:.2}", self.load_factor);
    }
}

/// A histogram of chain lengths: `counts[n]` is the number of buckets whose
/// chain holds exactly `n` entries.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainHistogram {
    /// Bucket counts indexed by chain length.
    pub counts: Vec<usize>,
}

#[cfg(any(test, feature = "stats"))]
impl ChainHistogram {
    /// Pretty-prints the histogram horizontally using stdout.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        let max = self.counts.iter().copied().max().unwrap_or(0);
        if max == 0 {
            println!("chain histogram: empty");
            return;
        }

        let max_bar = 60usize;
        println!("chain histogram ({} buckets):", self.counts.iter().sum::<usize>());
        for (len, &count) in self.counts.iter().enumerate() {
            let width = (count * max_bar).div_ceil(max);
            println!("{:>3} | {} ({})", len, "█".repeat(width), count);
        }
    }
}

/// A hash table that resolves collisions by chaining entries off a
/// power-of-two bucket array.
///
/// `HashTable<V>` stores values of type `V`. Like `hashbrown::HashTable`, it
/// does not hash anything itself: every operation takes the entry's spread
/// hash (see [`hash_key`](crate::hash::hash_key)) and an equality predicate.
///
/// The bucket array is allocated on the first insert. Whenever an insert
/// pushes the number of entries above the threshold, the bucket count doubles
/// and every entry is relinked into its new bucket; entries are moved, never
/// cloned or rehashed.
///
/// ## Example
///
/// ```rust
/// # use std::collections::hash_map::RandomState;
/// #
/// # use chain_hash::hash::hash_key;
/// # use chain_hash::hash_table::Entry;
/// # use chain_hash::hash_table::HashTable;
/// #
/// # #[derive(Debug, PartialEq)]
/// # struct Person {
/// #     id: u64,
/// #     name: String,
/// # }
/// let state = RandomState::new();
/// let mut table = HashTable::with_capacity(100)?;
/// let hash = hash_key(&state, Some(&123u64));
///
/// match table.entry(hash, |p: &Person| p.id == 123) {
///     Entry::Vacant(entry) => {
///         entry.insert(Person {
///             id: 123,
///             name: "Alice".to_string(),
///         });
///     }
///     Entry::Occupied(_) => unreachable!(),
/// }
///
/// assert_eq!(table.find(hash, |p| p.id == 123).map(|p| &p.name[..]), Some("Alice"));
/// # Ok::<(), chain_hash::Error>(())
/// ```
pub struct HashTable<V> {
    buckets: Vec<Link<V>>,
    populated: usize,
    // Before the first allocation this holds the pending bucket count
    // (zero when the default should be used).
    threshold: usize,
    load_factor: f32,
}

impl<V> Debug for HashTable<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HashTable")
            .field("chains", &self.bucket_lengths().collect::<Vec<_>>())
            .field("populated", &self.populated)
            .field("capacity", &self.buckets.len())
            .field("threshold", &self.threshold)
            .field("load_factor", &self.load_factor)
            .finish()
    }
}

impl<V> Clone for HashTable<V>
where
    V: Clone,
{
    fn clone(&self) -> Self {
        let mut buckets = empty_buckets(self.buckets.len());

        for (dst, src) in buckets.iter_mut().zip(self.buckets.iter()) {
            let mut tail = dst;
            let mut cursor = src.as_deref();
            while let Some(node) = cursor {
                let copy = tail.insert(Box::new(Node {
                    hash: node.hash,
                    value: node.value.clone(),
                    next: None,
                }));
                tail = &mut copy.next;
                cursor = node.next.as_deref();
            }
        }

        Self {
            buckets,
            populated: self.populated,
            threshold: self.threshold,
            load_factor: self.load_factor,
        }
    }
}

impl<V> Drop for HashTable<V> {
    fn drop(&mut self) {
        // Unlink chains one node at a time; the default recursive drop of a
        // long chain could exhaust the stack.
        for bucket in self.buckets.iter_mut() {
            let mut link = bucket.take();
            while let Some(mut node) = link {
                link = node.next.take();
            }
        }
    }
}

impl<V> Default for HashTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> HashTable<V> {
    /// Creates an empty table that will allocate
    /// [`DEFAULT_INITIAL_CAPACITY`] buckets on its first insert.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let table: HashTable<String> = HashTable::new();
    /// assert_eq!(table.capacity(), 0);
    /// assert!(table.is_empty());
    /// ```
    pub fn new() -> Self {
        Self {
            buckets: Vec::new(),
            populated: 0,
            threshold: 0,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }

    /// Creates an empty table whose first allocation holds at least
    /// `capacity` buckets, using [`DEFAULT_LOAD_FACTOR`].
    ///
    /// Fails if `capacity` is zero.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let table: HashTable<String> = HashTable::with_capacity(5)?;
    /// // Nothing is allocated yet; the requested size is rounded up and kept
    /// // pending until the first insert.
    /// assert_eq!(table.capacity(), 0);
    /// assert_eq!(table.threshold(), 8);
    /// # Ok::<(), chain_hash::Error>(())
    /// ```
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::with_capacity_and_load_factor(capacity, DEFAULT_LOAD_FACTOR)
    }

    /// Creates an empty table with an explicit initial capacity and load
    /// factor.
    ///
    /// Fails if `capacity` is zero or if `load_factor` is not strictly
    /// positive.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::Error;
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// assert!(HashTable::<u8>::with_capacity_and_load_factor(4, 0.5).is_ok());
    /// assert_eq!(
    ///     HashTable::<u8>::with_capacity_and_load_factor(0, 0.75).unwrap_err(),
    ///     Error::InvalidCapacity(0)
    /// );
    /// assert_eq!(
    ///     HashTable::<u8>::with_capacity_and_load_factor(4, -1.0).unwrap_err(),
    ///     Error::InvalidLoadFactor(-1.0)
    /// );
    /// ```
    pub fn with_capacity_and_load_factor(capacity: usize, load_factor: f32) -> Result<Self> {
        if capacity == 0 {
            log::debug!("rejecting table with zero initial capacity");
            return Err(Error::InvalidCapacity(capacity));
        }
        // Written so that NaN is rejected as well.
        if !(load_factor > 0.0) {
            log::debug!("rejecting table with load factor {load_factor}");
            return Err(Error::InvalidLoadFactor(load_factor));
        }

        Ok(Self {
            buckets: Vec::new(),
            populated: 0,
            threshold: table_size_for(capacity),
            load_factor,
        })
    }

    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table contains no entries.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the number of buckets currently allocated.
    ///
    /// This is zero until the first insert, and a power of two afterwards.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the entry count above which the next insert grows the table.
    ///
    /// Before the first insert this is the bucket count the first allocation
    /// will use, or zero if the table will fall back to
    /// [`DEFAULT_INITIAL_CAPACITY`].
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Returns the configured load factor.
    pub fn load_factor(&self) -> f32 {
        self.load_factor
    }

    /// Returns an iterator over the entries of the table.
    ///
    /// Entries are yielded bucket by bucket, and in chain order within a
    /// bucket.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u32> = HashTable::with_capacity(4)?;
    /// for n in [3u32, 1, 2] {
    ///     table.entry(n, |&v| v == n).or_insert(n);
    /// }
    ///
    /// // Hashes are bucket indices here, so iteration is sorted.
    /// let values: Vec<u32> = table.iter().copied().collect();
    /// assert_eq!(values, [1, 2, 3]);
    /// # Ok::<(), chain_hash::Error>(())
    /// ```
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            buckets: self.buckets.iter(),
            node: None,
            remaining: self.populated,
        }
    }

    /// Returns the length of every bucket's chain, in bucket order.
    pub fn bucket_lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.buckets.iter().map(|bucket| Chain { node: bucket.as_deref() }.count())
    }

    fn chain(&self, hash: u32) -> Chain<'_, V> {
        let node = if self.buckets.is_empty() {
            None
        } else {
            self.buckets[bucket_index(hash, self.buckets.len())].as_deref()
        };
        Chain { node }
    }

    /// Finds an entry in the table.
    ///
    /// The chain for `hash` is walked oldest entry first; cached hashes are
    /// compared before `eq` is called.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<(&str, i32)> = HashTable::with_capacity(8)?;
    /// table.entry(7, |&(k, _)| k == "seven").or_insert(("seven", 7));
    ///
    /// assert_eq!(table.find(7, |&(k, _)| k == "seven"), Some(&("seven", 7)));
    /// assert_eq!(table.find(7, |&(k, _)| k == "eight"), None);
    /// # Ok::<(), chain_hash::Error>(())
    /// ```
    pub fn find(&self, hash: u32, eq: impl Fn(&V) -> bool) -> Option<&V> {
        self.chain(hash)
            .find(|node| node.hash == hash && eq(&node.value))
            .map(|node| &node.value)
    }

    /// Finds an entry in the table and returns a mutable reference to it.
    pub fn find_mut(&mut self, hash: u32, eq: impl Fn(&V) -> bool) -> Option<&mut V> {
        if self.buckets.is_empty() {
            return None;
        }

        let index = bucket_index(hash, self.buckets.len());
        let mut link = &mut self.buckets[index];
        while let Some(node) = link {
            if node.hash == hash && eq(&node.value) {
                return Some(&mut node.value);
            }
            link = &mut node.next;
        }

        None
    }

    /// Gets the entry for `hash`/`eq` for in-place manipulation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::Entry;
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    ///
    /// match table.entry(42, |&v: &u64| v == 42) {
    ///     Entry::Vacant(entry) => {
    ///         entry.insert(42);
    ///     }
    ///     Entry::Occupied(_) => unreachable!(),
    /// }
    ///
    /// assert!(matches!(table.entry(42, |&v| v == 42), Entry::Occupied(_)));
    /// ```
    pub fn entry(&mut self, hash: u32, eq: impl Fn(&V) -> bool) -> Entry<'_, V> {
        let position = self
            .chain(hash)
            .position(|node| node.hash == hash && eq(&node.value));

        // `eq` runs once per node; an occupied entry is reached again by
        // position alone.
        let Some(depth) = position else {
            return Entry::Vacant(VacantEntry { table: self, hash });
        };

        match self.nth_in_chain_mut(hash, depth) {
            Some(value) => Entry::Occupied(OccupiedEntry { value }),
            None => unreachable!("entry disappeared between lookups"),
        }
    }

    fn nth_in_chain_mut(&mut self, hash: u32, depth: usize) -> Option<&mut V> {
        let index = bucket_index(hash, self.buckets.len());
        let mut node = self.buckets[index].as_deref_mut()?;
        for _ in 0..depth {
            node = node.next.as_deref_mut()?;
        }
        Some(&mut node.value)
    }

    /// Appends a new entry to the tail of its chain, growing the table once
    /// the entry count passes the threshold.
    fn insert_new(&mut self, hash: u32, value: V) -> &mut V {
        if self.buckets.is_empty() {
            self.resize();
        }

        let index = bucket_index(hash, self.buckets.len());
        let node = Box::new(Node {
            hash,
            value,
            next: None,
        });

        self.populated += 1;
        if self.populated <= self.threshold {
            return &mut Self::append(&mut self.buckets[index], node).value;
        }

        // The node keeps its heap address across the resize, so it can be
        // found again by identity.
        let target: *const Node<V> = Self::append(&mut self.buckets[index], node);
        self.resize();

        let index = bucket_index(hash, self.buckets.len());
        let mut link = &mut self.buckets[index];
        while let Some(node) = link {
            if core::ptr::eq(&**node, target) {
                return &mut node.value;
            }
            link = &mut node.next;
        }

        unreachable!("inserted entry is missing from its bucket after resize")
    }

    fn append(bucket: &mut Link<V>, node: Box<Node<V>>) -> &mut Node<V> {
        let mut link = bucket;
        while let Some(existing) = link {
            link = &mut existing.next;
        }
        link.insert(node)
    }

    #[cold]
    fn resize(&mut self) {
        let old_capacity = self.buckets.len();
        let old_threshold = self.threshold;

        let Some((new_capacity, new_threshold)) =
            next_size(old_capacity, old_threshold, self.load_factor)
        else {
            self.threshold = usize::MAX;
            return;
        };
        self.threshold = new_threshold;

        if new_capacity >= MAXIMUM_CAPACITY {
            log::warn!(
                "table reached maximum capacity of {MAXIMUM_CAPACITY} buckets, growth disabled"
            );
        }

        log::debug!(
            "resizing table from {old_capacity} to {new_capacity} buckets ({} entries, threshold {old_threshold} -> {})",
            self.populated,
            self.threshold
        );

        let old_buckets = core::mem::replace(&mut self.buckets, empty_buckets(new_capacity));
        for mut link in old_buckets {
            while let Some(mut node) = link {
                link = node.next.take();
                let index = bucket_index(node.hash, new_capacity);
                node.next = self.buckets[index].take();
                self.buckets[index] = Some(node);
            }
        }
    }

    /// Computes a histogram of chain lengths for the current table state.
    ///
    /// Requires the `stats` feature outside of tests.
    #[cfg(any(test, feature = "stats"))]
    pub fn chain_histogram(&self) -> ChainHistogram {
        let mut counts = alloc::vec![0usize; 1];
        for len in self.bucket_lengths() {
            if len >= counts.len() {
                counts.resize(len + 1, 0);
            }
            counts[len] += 1;
        }

        ChainHistogram { counts }
    }

    /// Returns chain statistics for debugging.
    ///
    /// Requires the `stats` feature outside of tests.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let capacity = self.buckets.len();
        let mut empty_buckets = 0;
        let mut longest_chain = 0;
        for len in self.bucket_lengths() {
            if len == 0 {
                empty_buckets += 1;
            }
            longest_chain = longest_chain.max(len);
        }

        DebugStats {
            populated: self.populated,
            capacity,
            threshold: self.threshold,
            empty_buckets,
            longest_chain,
            load_factor: self.load_factor,
            load: if capacity == 0 {
                0.0
            } else {
                self.populated as f64 / capacity as f64
            },
        }
    }
}

struct Chain<'a, V> {
    node: Option<&'a Node<V>>,
}

impl<'a, V> Iterator for Chain<'a, V> {
    type Item = &'a Node<V>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.node?;
        self.node = node.next.as_deref();
        Some(node)
    }
}

/// A view into a single entry in the hash table, which may be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
pub enum Entry<'a, V> {
    /// A vacant entry.
    Vacant(VacantEntry<'a, V>),
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, V>),
}

impl<'a, V> Entry<'a, V> {
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the entry's value.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the result of `default` if the entry is vacant and returns a
    /// mutable reference to the entry's value.
    pub fn or_insert_with(self, default: impl FnOnce() -> V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Calls `f` on the value if the entry is occupied.
    pub fn and_modify(self, f: impl FnOnce(&mut V)) -> Self {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }
}

/// A view into a vacant entry in a [`HashTable`].
pub struct VacantEntry<'a, V> {
    table: &'a mut HashTable<V>,
    hash: u32,
}

impl<'a, V> VacantEntry<'a, V> {
    /// Returns the hash the entry will be stored under.
    pub fn hash(&self) -> u32 {
        self.hash
    }

    /// Inserts `value` at the tail of its bucket's chain and returns a
    /// mutable reference to it.
    ///
    /// If the insert pushes the table over its threshold, the table grows
    /// before this returns.
    pub fn insert(self, value: V) -> &'a mut V {
        self.table.insert_new(self.hash, value)
    }
}

/// A view into an occupied entry in a [`HashTable`].
pub struct OccupiedEntry<'a, V> {
    value: &'a mut V,
}

impl<'a, V> OccupiedEntry<'a, V> {
    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        self.value
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        self.value
    }

    /// Converts the entry into a mutable reference to the value.
    pub fn into_mut(self) -> &'a mut V {
        self.value
    }

    /// Replaces the value in the entry, returning the old one.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(self.value, value)
    }
}

/// An iterator over the entries of a [`HashTable`], in bucket-then-chain
/// order.
pub struct Iter<'a, V> {
    buckets: core::slice::Iter<'a, Link<V>>,
    node: Option<&'a Node<V>>,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(node) = self.node {
                self.node = node.next.as_deref();
                self.remaining -= 1;
                return Some(&node.value);
            }

            self.node = self.buckets.next()?.as_deref();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

impl<V> core::iter::FusedIterator for Iter<'_, V> {}
