#![doc = include_str!("../README.md")]
#![deny(missing_docs)]

mod error;
mod list;

use std::{
    hash::Hash,
    num::NonZeroUsize,
};

pub use error::Error;
use list::{
    Entry,
    RecencyList,
};
pub use list::{
    IntoIter,
    Iter,
};

#[cfg(not(feature = "ahash"))]
type RandomState = std::hash::RandomState;
#[cfg(feature = "ahash")]
type RandomState = ahash::RandomState;

/// A fixed-capacity least-recently-used cache.
///
/// Holds at most `capacity` entries. Inserting a new key into a full
/// cache evicts the entry that was touched longest ago. Both [`get`] and
/// [`insert`] count as a touch and promote the entry to most recently
/// used; [`peek`] does not.
///
/// # Time complexity
/// - Insert/Get/Remove: O(1) average, O(n) worst case
/// - Peek/Contains: O(1) average, O(n) worst case
/// - Pop/Clear: O(1)
///
/// # Thread safety
///
/// Every operation, including lookup, takes `&mut self` because
/// promotion mutates the recency order. Shared use requires one
/// exclusive lock around the whole cache; there is no safe
/// reader/writer split.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
///
/// use lru_arena::LruCache;
///
/// let mut cache = LruCache::<i32, String>::new(NonZeroUsize::new(3).unwrap());
/// cache.insert(1, "one".to_string());
/// cache.insert(2, "two".to_string());
/// cache.insert(3, "three".to_string());
///
/// cache.get(&1); // Mark as recently used
/// cache.insert(4, "four".to_string()); // Evicts key 2
///
/// // `into_iter` returns the items in eviction order, LRU first.
/// assert_eq!(
///     cache.into_iter().collect::<Vec<_>>(),
///     [
///         (3, "three".to_string()),
///         (1, "one".to_string()),
///         (4, "four".to_string()),
///     ]
/// );
/// ```
///
/// [`get`]: Self::get
/// [`insert`]: Self::insert
/// [`peek`]: Self::peek
#[derive(Clone)]
pub struct LruCache<K, V> {
    list: RecencyList<K, V>,
    capacity: NonZeroUsize,
}

impl<K: std::fmt::Debug, V: std::fmt::Debug> std::fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries: Vec<_> = self.list.iter().collect();
        f.debug_struct("LruCache")
            .field("capacity", &self.capacity)
            .field("entries", &entries)
            .finish()
    }
}

impl<K: Hash + Eq, V> LruCache<K, V> {
    /// Creates a new, empty cache with the specified capacity.
    ///
    /// Pre-allocates space for `capacity` entries so steady-state
    /// operation does not reallocate.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` exceeds `u32::MAX - 2` entries; slots are
    /// addressed by 32-bit handles.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::num::NonZeroUsize;
    ///
    /// use lru_arena::LruCache;
    ///
    /// let cache: LruCache<i32, String> = LruCache::new(NonZeroUsize::new(100).unwrap());
    /// assert_eq!(cache.capacity(), 100);
    /// assert!(cache.is_empty());
    /// ```
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            list: RecencyList::with_capacity(capacity.get()),
            capacity,
        }
    }

    /// Creates a new, empty cache, rejecting a zero capacity with
    /// [`Error::InvalidCapacity`] instead of making it unrepresentable
    /// at the type level.
    ///
    /// Useful when the capacity comes from configuration or user input.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lru_arena::{
    ///     Error,
    ///     LruCache,
    /// };
    ///
    /// let cache = LruCache::<i32, i32>::with_capacity(8).unwrap();
    /// assert_eq!(cache.capacity(), 8);
    ///
    /// assert_eq!(
    ///     LruCache::<i32, i32>::with_capacity(0).unwrap_err(),
    ///     Error::InvalidCapacity,
    /// );
    /// ```
    pub fn with_capacity(capacity: usize) -> Result<Self, Error> {
        let capacity = NonZeroUsize::new(capacity).ok_or(Error::InvalidCapacity)?;
        Ok(Self::new(capacity))
    }

    /// Returns the maximum number of entries the cache can hold.
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Returns the number of entries currently in the cache.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Removes all entries from the cache. The capacity is unchanged.
    pub fn clear(&mut self) {
        self.list.clear();
    }

    /// Gets a value from the cache, marking it as touched.
    ///
    /// If the key exists, the entry is promoted to most recently used
    /// and its value returned unchanged. If the key doesn't exist,
    /// returns `None` and the cache is unchanged; in particular a miss
    /// never affects which entry is evicted next.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::num::NonZeroUsize;
    ///
    /// use lru_arena::LruCache;
    ///
    /// let mut cache = LruCache::new(NonZeroUsize::new(2).unwrap());
    /// cache.insert(1, "one");
    /// cache.insert(2, "two");
    ///
    /// assert_eq!(cache.get(&1), Some(&"one"));
    /// assert_eq!(cache.get(&3), None);
    ///
    /// // Key 1 was promoted, so key 2 is now the eviction candidate.
    /// assert_eq!(cache.tail(), Some((&2, &"two")));
    /// ```
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.get_mut(key).map(|v| &*v)
    }

    /// Gets a mutable reference to a value, marking the entry as
    /// touched.
    ///
    /// This is the mutable version of [`get()`](Self::get): the entry is
    /// promoted to most recently used whether or not the value is
    /// modified through the returned reference.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let ptr = self.list.get_ptr(key)?;
        self.list.move_to_head(ptr);
        self.list.ptr_get_mut(ptr)
    }

    /// Returns a reference to the value without updating its position
    /// in the recency order.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.list.get(key)
    }

    /// Returns true if the cache contains the given key, without
    /// touching the entry.
    pub fn contains_key(&self, key: &K) -> bool {
        self.list.get_ptr(key).is_some()
    }

    /// Inserts a key-value pair, marking the entry as touched.
    ///
    /// If the key already exists its value is overwritten in place, the
    /// old value is returned, and the entry is promoted; an overwrite
    /// never counts as a new entry and never evicts. If the key is new
    /// and the cache is full, the least recently used entry is evicted
    /// as part of the insertion.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::num::NonZeroUsize;
    ///
    /// use lru_arena::LruCache;
    ///
    /// let mut cache = LruCache::new(NonZeroUsize::new(2).unwrap());
    ///
    /// assert_eq!(cache.insert(1, "one"), None);
    /// assert_eq!(cache.insert(2, "two"), None);
    /// assert_eq!(cache.insert(1, "uno"), Some("one"));
    /// assert_eq!(cache.len(), 2);
    ///
    /// // This evicts the least recently used entry (key 2).
    /// cache.insert(3, "three");
    ///
    /// assert_eq!(
    ///     cache.into_iter().collect::<Vec<_>>(),
    ///     [(1, "uno"), (3, "three")]
    /// );
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let old = self.list.insert_head(key, value);
        if old.is_none() && self.list.len() > self.capacity.get() {
            self.list.remove_tail();
        }
        old
    }

    /// Gets the value for a key, or inserts one built by the provided
    /// function.
    ///
    /// Either way the entry ends up most recently used. When the call
    /// inserts into a full cache, the least recently used entry is
    /// evicted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::num::NonZeroUsize;
    ///
    /// use lru_arena::LruCache;
    ///
    /// let mut cache = LruCache::<i32, String>::new(NonZeroUsize::new(3).unwrap());
    ///
    /// let value = cache.get_or_insert_with(1, |&key| format!("value_{key}"));
    /// assert_eq!(value, "value_1");
    ///
    /// // Existing key: the function is not called.
    /// let value = cache.get_or_insert_with(1, |&key| format!("different_{key}"));
    /// assert_eq!(value, "value_1");
    /// ```
    pub fn get_or_insert_with(&mut self, key: K, or_insert: impl FnOnce(&K) -> V) -> &V {
        self.get_or_insert_with_mut(key, or_insert)
    }

    /// Mutable version of [`get_or_insert_with()`](Self::get_or_insert_with).
    pub fn get_or_insert_with_mut(&mut self, key: K, or_insert: impl FnOnce(&K) -> V) -> &mut V {
        let (ptr, inserted) = match self.list.entry(key) {
            Entry::Occupied(entry) => (entry.ptr(), false),
            Entry::Vacant(entry) => {
                let value = or_insert(entry.key());
                (entry.insert_head(value), true)
            }
        };

        if inserted {
            if self.list.len() > self.capacity.get() {
                self.list.remove_tail();
            }
        } else {
            self.list.move_to_head(ptr);
        }

        &mut self.list[ptr]
    }

    /// Returns the entry that would be evicted next, without touching
    /// it.
    ///
    /// Returns `None` if the cache is empty. The returned entry is
    /// always the first item yielded by [`iter()`](Self::iter).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::num::NonZeroUsize;
    ///
    /// use lru_arena::LruCache;
    ///
    /// let mut cache = LruCache::new(NonZeroUsize::new(3).unwrap());
    /// assert_eq!(cache.tail(), None);
    ///
    /// cache.insert(1, "one");
    /// cache.insert(2, "two");
    /// assert_eq!(cache.tail(), Some((&1, &"one")));
    ///
    /// cache.get(&1);
    /// assert_eq!(cache.tail(), Some((&2, &"two")));
    /// ```
    pub fn tail(&self) -> Option<(&K, &V)> {
        self.list.tail_entry()
    }

    /// Removes and returns the least recently used entry.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::num::NonZeroUsize;
    ///
    /// use lru_arena::LruCache;
    ///
    /// let mut cache = LruCache::new(NonZeroUsize::new(3).unwrap());
    /// cache.insert(1, "one");
    /// cache.insert(2, "two");
    ///
    /// assert_eq!(cache.pop(), Some((1, "one")));
    /// assert_eq!(cache.pop(), Some((2, "two")));
    /// assert_eq!(cache.pop(), None);
    /// ```
    pub fn pop(&mut self) -> Option<(K, V)> {
        self.list.remove_tail()
    }

    /// Removes a specific key from the cache, returning its value.
    ///
    /// Returns `None` and leaves the cache unchanged if the key is
    /// absent.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.list.remove(key)
    }

    /// Returns an iterator over the entries in eviction order, least
    /// recently used first.
    ///
    /// Iterating does not touch any entry.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::num::NonZeroUsize;
    ///
    /// use lru_arena::LruCache;
    ///
    /// let mut cache = LruCache::new(NonZeroUsize::new(3).unwrap());
    /// cache.insert(1, "one");
    /// cache.insert(2, "two");
    /// cache.get(&1);
    ///
    /// let keys: Vec<_> = cache.iter().map(|(k, _)| *k).collect();
    /// assert_eq!(keys, [2, 1]);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.list.iter()
    }
}

impl<K: Hash + Eq, V> IntoIterator for LruCache<K, V> {
    type IntoIter = IntoIter<K, V>;
    type Item = (K, V);

    /// Consumes the cache, yielding entries in eviction order.
    fn into_iter(self) -> Self::IntoIter {
        self.list.into_iter()
    }
}

impl<'a, K: Hash + Eq, V> IntoIterator for &'a LruCache<K, V> {
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Hash + Eq, V> Extend<(K, V)> for LruCache<K, V> {
    /// Inserts each pair in order, evicting per the capacity as it goes.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Hash + Eq, V> FromIterator<(K, V)> for LruCache<K, V> {
    /// Builds a cache whose capacity is the number of distinct keys in
    /// the iterator (minimum 1), so nothing is evicted during
    /// collection. Duplicate keys overwrite and promote as
    /// [`insert`](LruCache::insert) would.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut list = RecencyList::default();
        for (key, value) in iter {
            list.insert_head(key, value);
        }
        let capacity = NonZeroUsize::new(list.len()).unwrap_or(NonZeroUsize::MIN);
        LruCache { list, capacity }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> LruCache<i32, i32> {
        LruCache::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn test_lru_trivial() {
        let mut lru = cache(3);
        lru.insert(1, 10);
        lru.insert(2, 20);
        lru.insert(3, 30);

        assert_eq!(lru.get(&1), Some(&10));
        assert_eq!(lru.get(&2), Some(&20));
        assert_eq!(lru.get(&3), Some(&30));

        lru.get(&1);
        lru.insert(4, 40);

        assert_eq!(lru.get(&1), Some(&10));
        assert_eq!(lru.get(&2), None);
    }

    #[test]
    fn test_lru_eviction_order() {
        let mut lru = cache(3);
        lru.insert(1, 10);
        lru.insert(2, 20);
        lru.insert(3, 30);
        lru.insert(4, 40);

        assert_eq!(
            lru.into_iter().collect::<Vec<_>>(),
            [(2, 20), (3, 30), (4, 40)]
        );
    }

    #[test]
    fn test_lru_access_updates_order() {
        let mut lru = cache(3);
        lru.insert(1, 10);
        lru.insert(2, 20);
        lru.insert(3, 30);

        lru.get(&1);
        lru.insert(4, 40);

        assert_eq!(
            lru.into_iter().collect::<Vec<_>>(),
            [(3, 30), (1, 10), (4, 40)]
        );
    }

    #[test]
    fn test_lru_update_existing_key() {
        let mut lru = cache(2);
        lru.insert(1, 10);
        lru.insert(2, 20);

        assert_eq!(lru.insert(1, 100), Some(10));
        lru.insert(3, 30);

        assert_eq!(lru.get(&1), Some(&100));
        assert_eq!(lru.get(&2), None);
        assert_eq!(lru.get(&3), Some(&30));
    }

    #[test]
    fn test_lru_single_capacity() {
        let mut lru = cache(1);

        lru.insert(1, 10);
        assert_eq!(lru.get(&1), Some(&10));

        lru.insert(2, 20);
        assert_eq!(lru.get(&1), None);
        assert_eq!(lru.get(&2), Some(&20));
    }

    #[test]
    fn test_lru_empty_cache() {
        let mut lru = cache(3);

        assert!(lru.is_empty());
        assert_eq!(lru.len(), 0);
        assert_eq!(lru.capacity(), 3);
        assert_eq!(lru.get(&1), None);
        assert_eq!(lru.peek(&1), None);
        assert_eq!(lru.remove(&1), None);
        assert_eq!(lru.pop(), None);
        assert!(lru.tail().is_none());
        assert!(!lru.contains_key(&1));
    }

    #[test]
    fn test_lru_with_capacity_zero_rejected() {
        assert_eq!(
            LruCache::<i32, i32>::with_capacity(0).unwrap_err(),
            Error::InvalidCapacity
        );
        assert!(LruCache::<i32, i32>::with_capacity(1).is_ok());
    }

    #[test]
    fn test_lru_peek_no_side_effects() {
        let mut lru = cache(3);
        lru.insert(1, 10);
        lru.insert(2, 20);
        lru.insert(3, 30);

        assert_eq!(lru.peek(&1), Some(&10));
        lru.insert(4, 40);

        assert_eq!(lru.get(&1), None);
        assert_eq!(lru.get(&2), Some(&20));
    }

    #[test]
    fn test_lru_get_mut_promotes() {
        let mut lru = LruCache::new(NonZeroUsize::new(2).unwrap());
        lru.insert(1, String::from("hello"));
        lru.insert(2, String::from("world"));

        if let Some(val) = lru.get_mut(&1) {
            val.push_str(" modified");
        }

        lru.insert(3, String::from("new"));

        assert_eq!(
            lru.into_iter().collect::<Vec<_>>(),
            [
                (1, String::from("hello modified")),
                (3, String::from("new"))
            ]
        );
    }

    #[test]
    fn test_lru_get_or_insert_with_eviction() {
        let mut lru = cache(2);
        lru.insert(1, 10);
        lru.insert(2, 20);
        lru.get(&1);

        let value = lru.get_or_insert_with(3, |_| 30);
        assert_eq!(value, &30);

        assert_eq!(lru.into_iter().collect::<Vec<_>>(), [(1, 10), (3, 30)]);
    }

    #[test]
    fn test_lru_get_or_insert_existing_key() {
        let mut lru = cache(3);
        lru.insert(1, 10);
        lru.insert(2, 20);
        lru.insert(3, 30);

        let value = lru.get_or_insert_with(1, |_| 999);
        assert_eq!(value, &10);

        lru.insert(4, 40);

        assert_eq!(
            lru.into_iter().collect::<Vec<_>>(),
            [(3, 30), (1, 10), (4, 40)]
        );
    }

    #[test]
    fn test_lru_get_or_insert_with_mut() {
        let mut lru = LruCache::new(NonZeroUsize::new(2).unwrap());
        lru.insert(1, String::from("existing"));

        let val = lru.get_or_insert_with_mut(1, |_| String::from("new"));
        val.push_str(" modified");
        assert_eq!(lru.peek(&1), Some(&String::from("existing modified")));

        let val = lru.get_or_insert_with_mut(2, |_| String::from("created"));
        val.push_str(" too");
        assert_eq!(lru.peek(&2), Some(&String::from("created too")));
    }

    #[test]
    fn test_lru_pop() {
        let mut lru = cache(3);
        lru.insert(1, 10);
        lru.insert(2, 20);
        lru.insert(3, 30);

        assert_eq!(lru.pop(), Some((1, 10)));
        assert_eq!(lru.pop(), Some((2, 20)));
        assert_eq!(lru.pop(), Some((3, 30)));
        assert_eq!(lru.pop(), None);
        assert!(lru.is_empty());
    }

    #[test]
    fn test_lru_remove() {
        let mut lru = cache(3);
        lru.insert(1, 10);
        lru.insert(2, 20);
        lru.insert(3, 30);

        assert_eq!(lru.remove(&2), Some(20));
        assert_eq!(lru.len(), 2);
        assert_eq!(lru.remove(&2), None);

        lru.insert(4, 40);
        assert_eq!(
            lru.into_iter().collect::<Vec<_>>(),
            [(1, 10), (3, 30), (4, 40)]
        );
    }

    #[test]
    fn test_lru_tail_tracks_candidate() {
        let mut lru = cache(3);
        assert!(lru.tail().is_none());

        lru.insert(1, 10);
        assert_eq!(lru.tail(), Some((&1, &10)));

        lru.insert(2, 20);
        assert_eq!(lru.tail(), Some((&1, &10)));

        lru.get(&1);
        assert_eq!(lru.tail(), Some((&2, &20)));
    }

    #[test]
    fn test_lru_clear() {
        let mut lru = cache(3);
        lru.insert(1, 10);
        lru.insert(2, 20);

        lru.clear();

        assert_eq!(lru.len(), 0);
        assert!(lru.is_empty());
        assert_eq!(lru.capacity(), 3);
        assert!(lru.tail().is_none());
    }

    #[test]
    fn test_lru_extend() {
        let mut lru = cache(5);
        lru.insert(1, 10);

        lru.extend(vec![(2, 20), (3, 30), (4, 40)]);

        assert_eq!(lru.len(), 4);
        assert_eq!(
            lru.into_iter().collect::<Vec<_>>(),
            [(1, 10), (2, 20), (3, 30), (4, 40)]
        );
    }

    #[test]
    fn test_lru_from_iterator() {
        let lru: LruCache<i32, i32> = vec![(1, 10), (2, 20), (3, 30)].into_iter().collect();

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.capacity(), 3);
        assert_eq!(
            lru.into_iter().collect::<Vec<_>>(),
            [(1, 10), (2, 20), (3, 30)]
        );
    }

    #[test]
    fn test_lru_from_iterator_overlapping_keys() {
        let items = vec![
            (1, "first"),
            (2, "second"),
            (1, "updated_first"),
            (3, "third"),
        ];
        let lru: LruCache<i32, &str> = items.into_iter().collect();

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.capacity(), 3);
        assert_eq!(lru.peek(&1), Some(&"updated_first"));
        assert_eq!(lru.tail(), Some((&2, &"second")));
    }

    #[test]
    fn test_lru_from_iterator_empty() {
        let lru: LruCache<i32, i32> = std::iter::empty().collect();
        assert!(lru.is_empty());
        assert_eq!(lru.capacity(), 1);
    }

    #[test]
    fn test_lru_iter_consistency_with_tail() {
        let mut lru = cache(4);
        lru.insert(10, 1);
        lru.insert(20, 2);
        lru.insert(30, 3);
        lru.get(&20);

        assert_eq!(lru.tail(), lru.iter().next());
    }

    #[test]
    fn test_lru_borrowing_into_iterator() {
        let mut lru = cache(3);
        lru.insert(1, 10);
        lru.insert(2, 20);

        let collected: Vec<_> = (&lru).into_iter().collect();
        assert_eq!(collected, [(&1, &10), (&2, &20)]);
        assert_eq!(lru.len(), 2);
    }

    #[test]
    fn test_lru_debug_renders_eviction_order() {
        let mut lru = cache(2);
        lru.insert(1, 10);
        lru.insert(2, 20);

        let rendered = format!("{lru:?}");
        assert!(rendered.contains("LruCache"));
        assert!(rendered.contains("(1, 10)"));
    }

    #[test]
    fn test_lru_boundary_conditions() {
        let mut lru = cache(1000);
        for i in 0..1000 {
            lru.insert(i, i);
        }
        assert_eq!(lru.len(), 1000);

        lru.insert(1000, 1000);
        assert_eq!(lru.len(), 1000);
        assert!(!lru.contains_key(&0));
        assert!(lru.contains_key(&1000));
    }
}
