use core::borrow::Borrow;
use core::fmt::Debug;
use core::fmt::Display;
use core::hash::BuildHasher;
use core::hash::Hash;

use crate::error::Result;
use crate::hash::DEFAULT_LOAD_FACTOR;
#[cfg(any(feature = "foldhash", feature = "std"))]
use crate::hash::DefaultHashBuilder;
use crate::hash::hash_key;
use crate::hash_table::Entry as TableEntry;
use crate::hash_table::HashTable;

/// A hash map built on the chained [`HashTable`].
///
/// `HashMap<K, V, S>` stores key-value pairs where keys implement
/// `Hash + Eq`, and hashes keys with the hasher builder `S`. The low 32 bits
/// of each key's hash are spread (see [`spread`](crate::hash::spread)) and
/// cached alongside the entry, so a key is hashed exactly once per insert or
/// lookup and never again on resize.
///
/// Entries live in singly linked chains hanging off a power-of-two bucket
/// array. The array is allocated on the first insert and doubles whenever the
/// number of entries exceeds `capacity * load_factor`. There is no removal.
///
/// # Examples
///
/// ```rust
/// # #[cfg(any(feature = "std", feature = "foldhash"))]
/// # {
/// use chain_hash::HashMap;
///
/// let mut map = HashMap::with_capacity(4)?;
/// map.put("a", 1);
/// map.put("b", 2);
/// map.put("c", 3);
/// assert_eq!(map.len(), 3);
/// assert_eq!(map.capacity(), 4);
///
/// // The fourth key crosses the threshold of 3 and doubles the table.
/// map.put("d", 4);
/// assert_eq!(map.capacity(), 8);
/// assert_eq!(map.get("a"), Some(&1));
/// assert_eq!(map.get("d"), Some(&4));
/// # }
/// # Ok::<(), chain_hash::Error>(())
/// ```
#[derive(Clone)]
pub struct HashMap<K, V, S> {
    table: HashTable<(K, V)>,
    hash_builder: S,
}

impl<K, V, S> Debug for HashMap<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Renders the map as `{k1=v1, k2=v2}` in bucket-then-chain order.
impl<K, V, S> Display for HashMap<K, V, S>
where
    K: Display,
    V: Display,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}={v}")?;
        }
        f.write_str("}")
    }
}

#[cfg(any(feature = "foldhash", feature = "std"))]
impl<K, V> HashMap<K, V, DefaultHashBuilder> {
    /// Creates an empty map using the default hasher builder.
    ///
    /// Nothing is allocated until the first insert, which allocates
    /// [`DEFAULT_INITIAL_CAPACITY`](crate::hash::DEFAULT_INITIAL_CAPACITY)
    /// buckets.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let map: HashMap<i32, String, _> = HashMap::new();
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), 0);
    /// # }
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Creates an empty map whose first allocation holds at least `capacity`
    /// buckets.
    ///
    /// Fails if `capacity` is zero.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::with_capacity(5)?;
    /// map.put(1, "one");
    /// assert_eq!(map.capacity(), 8);
    ///
    /// assert!(HashMap::<i32, i32, _>::with_capacity(0).is_err());
    /// # }
    /// # Ok::<(), chain_hash::Error>(())
    /// ```
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }

    /// Creates an empty map with an explicit initial capacity and load
    /// factor.
    ///
    /// Fails if `capacity` is zero or `load_factor` is not strictly positive.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::Error;
    /// use chain_hash::HashMap;
    ///
    /// let map = HashMap::<u8, u8, _>::with_capacity_and_load_factor(16, 0.5)?;
    /// assert_eq!(map.load_factor(), 0.5);
    ///
    /// assert_eq!(
    ///     HashMap::<u8, u8, _>::with_capacity_and_load_factor(4, -1.0).unwrap_err(),
    ///     Error::InvalidLoadFactor(-1.0)
    /// );
    /// # }
    /// # Ok::<(), chain_hash::Error>(())
    /// ```
    pub fn with_capacity_and_load_factor(capacity: usize, load_factor: f32) -> Result<Self> {
        Self::with_capacity_load_factor_and_hasher(
            capacity,
            load_factor,
            DefaultHashBuilder::default(),
        )
    }
}

impl<K, V, S> HashMap<K, V, S> {
    /// Creates an empty map with the given hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::collections::hash_map::RandomState;
    ///
    /// use chain_hash::HashMap;
    ///
    /// let map: HashMap<i32, String, _> = HashMap::with_hasher(RandomState::new());
    /// assert!(map.is_empty());
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self {
            table: HashTable::new(),
            hash_builder,
        }
    }

    /// Creates an empty map with the specified capacity and hasher builder.
    ///
    /// Fails if `capacity` is zero.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Result<Self> {
        Self::with_capacity_load_factor_and_hasher(capacity, DEFAULT_LOAD_FACTOR, hash_builder)
    }

    /// Creates an empty map with the specified capacity, load factor, and
    /// hasher builder.
    ///
    /// Fails if `capacity` is zero or `load_factor` is not strictly positive.
    pub fn with_capacity_load_factor_and_hasher(
        capacity: usize,
        load_factor: f32,
        hash_builder: S,
    ) -> Result<Self> {
        Ok(Self {
            table: HashTable::with_capacity_and_load_factor(capacity, load_factor)?,
            hash_builder,
        })
    }

    /// Returns the number of entries in the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// assert_eq!(map.len(), 0);
    /// map.put(1, "a");
    /// assert_eq!(map.len(), 1);
    /// # }
    /// ```
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of buckets currently allocated.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the entry count above which the next insert grows the map.
    ///
    /// Before the first insert this is the pending bucket count of the first
    /// allocation.
    pub fn threshold(&self) -> usize {
        self.table.threshold()
    }

    /// Returns the configured load factor.
    pub fn load_factor(&self) -> f32 {
        self.table.load_factor()
    }

    /// Returns a reference to the map's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns an iterator over the key-value pairs of the map, bucket by
    /// bucket and in chain order within each bucket.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.put(1, "a");
    /// map.put(2, "b");
    ///
    /// for (key, value) in map.iter() {
    ///     println!("{key}: {value}");
    /// }
    /// assert_eq!(map.iter().len(), 2);
    /// # }
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over the keys of the map.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values of the map.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns the underlying table.
    pub fn table(&self) -> &HashTable<(K, V)> {
        &self.table
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, key: &Q) -> u32
    where
        Q: Hash + ?Sized,
    {
        hash_key(&self.hash_builder, Some(key))
    }

    /// Associates `value` with `key`.
    ///
    /// Returns the previous value if the key was already present, in which
    /// case only the value is replaced: the stored key, the entry's place in
    /// its chain, and the map's size are unchanged. A new key is appended to
    /// the tail of its bucket's chain, and may grow the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// assert_eq!(map.put(37, "a"), None);
    /// assert_eq!(map.put(37, "b"), Some("a"));
    /// assert_eq!(map.get(&37), Some(&"b"));
    /// assert_eq!(map.len(), 1);
    /// # }
    /// ```
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.make_hash(&key);
        match self.table.entry(hash, |(k, _)| k == &key) {
            TableEntry::Occupied(mut entry) => {
                Some(core::mem::replace(&mut entry.get_mut().1, value))
            }
            TableEntry::Vacant(entry) => {
                entry.insert((key, value));
                None
            }
        }
    }

    /// Inserts a key-value pair into the map. Same as [`put`](Self::put).
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.put(key, value)
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// A stored value is always reported, whatever it is; `None` means the
    /// key is not in the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.put("present", None::<i32>);
    /// assert_eq!(map.get("present"), Some(&None));
    /// assert_eq!(map.get("missing"), None);
    /// # }
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Returns the stored key and its value.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.make_hash(key);
        self.table
            .find(hash, |(k, _)| key.eq(k.borrow()))
            .map(|(k, v)| (k, v))
    }

    /// Returns a mutable reference to the value corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.put(1, "a");
    /// if let Some(x) = map.get_mut(&1) {
    ///     *x = "b";
    /// }
    /// assert_eq!(map.get(&1), Some(&"b"));
    /// # }
    /// ```
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.make_hash(key);
        self.table
            .find_mut(hash, |(k, _)| key.eq(k.borrow()))
            .map(|(_, v)| v)
    }

    /// Returns `true` if the map contains the key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let mut map = HashMap::new();
    /// map.put(1, "a");
    /// assert!(map.contains_key(&1));
    /// assert!(!map.contains_key(&2));
    /// # }
    /// ```
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Gets the given key's corresponding entry in the map for in-place
    /// manipulation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use chain_hash::HashMap;
    ///
    /// let mut counts = HashMap::new();
    /// for word in ["a", "b", "a"] {
    ///     *counts.entry(word).or_insert(0) += 1;
    /// }
    ///
    /// assert_eq!(counts.get("a"), Some(&2));
    /// assert_eq!(counts.get("b"), Some(&1));
    /// # }
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V> {
        let hash = self.make_hash(&key);
        match self.table.entry(hash, |(k, _)| k == &key) {
            TableEntry::Occupied(slot) => Entry::Occupied(OccupiedEntry { slot }),
            TableEntry::Vacant(slot) => Entry::Vacant(VacantEntry { slot, key }),
        }
    }
}

impl<K, V, S> Default for HashMap<K, V, S>
where
    S: Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> PartialEq for HashMap<K, V, S>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S> Eq for HashMap<K, V, S>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> Extend<(K, V)> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashMap<K, V, S> {
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A map slot for one key, returned by [`HashMap::entry`].
///
/// The lookup that produced it already walked the key's chain, so filling a
/// vacant slot appends without hashing or comparing again.
pub enum Entry<'a, K, V> {
    /// The key is not in the map.
    Vacant(VacantEntry<'a, K, V>),
    /// The key is in the map.
    Occupied(OccupiedEntry<'a, K, V>),
}

impl<'a, K, V> Entry<'a, K, V> {
    /// Returns the value for the key, inserting `default` first if the key is
    /// absent.
    pub fn or_insert(self, default: V) -> &'a mut V {
        self.or_insert_with(|| default)
    }

    /// Like [`or_insert`](Self::or_insert), but only builds the value when
    /// the key is absent.
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Vacant(vacant) => vacant.insert(default()),
            Entry::Occupied(occupied) => occupied.into_mut(),
        }
    }

    /// Runs `f` on the stored value if the key is present.
    pub fn and_modify<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        if let Entry::Occupied(occupied) = &mut self {
            f(occupied.get_mut());
        }
        self
    }

    /// The key this entry was looked up with, or the stored key if present.
    pub fn key(&self) -> &K {
        match self {
            Entry::Vacant(vacant) => vacant.key(),
            Entry::Occupied(occupied) => occupied.key(),
        }
    }
}

impl<'a, K, V: Default> Entry<'a, K, V> {
    /// Returns the value for the key, inserting `V::default()` first if the
    /// key is absent.
    pub fn or_default(self) -> &'a mut V {
        self.or_insert_with(V::default)
    }
}

/// An absent key together with the table slot it would be appended to.
pub struct VacantEntry<'a, K, V> {
    slot: crate::hash_table::VacantEntry<'a, (K, V)>,
    key: K,
}

impl<'a, K, V> VacantEntry<'a, K, V> {
    /// The key that [`insert`](Self::insert) will store.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Stores the key with `value`, growing the map if the new size crosses
    /// the threshold.
    pub fn insert(self, value: V) -> &'a mut V {
        let (_, stored) = self.slot.insert((self.key, value));
        stored
    }
}

/// A present key and its stored value.
pub struct OccupiedEntry<'a, K, V> {
    slot: crate::hash_table::OccupiedEntry<'a, (K, V)>,
}

impl<'a, K, V> OccupiedEntry<'a, K, V> {
    /// The key stored when the entry was first inserted.
    pub fn key(&self) -> &K {
        let (key, _) = self.slot.get();
        key
    }

    /// The stored value.
    pub fn get(&self) -> &V {
        let (_, value) = self.slot.get();
        value
    }

    /// The stored value, mutably.
    pub fn get_mut(&mut self) -> &mut V {
        let (_, value) = self.slot.get_mut();
        value
    }

    /// Gives up the entry for a reference to the value that lives as long as
    /// the map borrow.
    pub fn into_mut(self) -> &'a mut V {
        let (_, value) = self.slot.into_mut();
        value
    }
}

/// An iterator over the key-value pairs of a `HashMap`.
pub struct Iter<'a, K, V> {
    inner: crate::hash_table::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> core::iter::FusedIterator for Iter<'_, K, V> {}

/// An iterator over the keys of a `HashMap`.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> core::iter::FusedIterator for Keys<'_, K, V> {}

/// An iterator over the values of a `HashMap`.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> core::iter::FusedIterator for Values<'_, K, V> {}
