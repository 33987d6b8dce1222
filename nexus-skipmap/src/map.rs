//! Ordered map over the skip list engine.
//!
//! Stores `(K, V)` pairs ordered by `K`. Keys are unique: [`insert`]
//! refuses an existing key and leaves its value alone, [`upsert`]
//! overwrites.
//!
//! ```
//! use nexus_skipmap::SkipMap;
//!
//! let mut map = SkipMap::new();
//! map.insert("b", 2);
//! map.insert("a", 1);
//! assert!(!map.insert("a", 100));
//! assert_eq!(map.upsert("a", 10), Some(1));
//!
//! *map.get_or_insert_default("c") += 3;
//!
//! let pairs: Vec<_> = map.iter().map(|(k, v)| (*k, *v)).collect();
//! assert_eq!(pairs, vec![("a", 10), ("b", 2), ("c", 3)]);
//! ```
//!
//! [`insert`]: SkipMap::insert
//! [`upsert`]: SkipMap::upsert

use core::fmt;
use core::ops::{self, RangeBounds};

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand_core::RngCore;

use crate::builder::DEFAULT_MAX_LEVEL;
use crate::order::{Ascending, Comparator, First};
use crate::skiplist::{self, SkipList, SlabSkipStorage};

type Entries<K, V> = SlabSkipStorage<(K, V)>;

/// An ordered map with unique keys, backed by a skip list.
pub struct SkipMap<K, V, C = Ascending, R = SmallRng> {
    list: SkipList<(K, V), First, C, R>,
}

impl<K: Ord, V> SkipMap<K, V> {
    /// Creates an empty map in ascending key order.
    pub fn new() -> Self {
        Self::with_comparator(Ascending)
    }

    /// Creates an empty map whose nodes reach at most `max_level`.
    ///
    /// # Panics
    ///
    /// Panics if `max_level` is 0.
    pub fn with_max_level(max_level: usize) -> Self {
        Self::with_rng(max_level, Ascending, SmallRng::from_os_rng())
    }
}

impl<K: Ord, V> Default for SkipMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C: Comparator<K>> SkipMap<K, V, C> {
    /// Creates an empty map ordered by `comparator`.
    pub fn with_comparator(comparator: C) -> Self {
        Self::with_rng(DEFAULT_MAX_LEVEL, comparator, SmallRng::from_os_rng())
    }
}

impl<K, V, C, R> SkipMap<K, V, C, R>
where
    C: Comparator<K>,
    R: RngCore,
{
    /// Creates an empty map drawing node levels from `rng`.
    ///
    /// # Panics
    ///
    /// Panics if `max_level` is 0.
    pub fn with_rng(max_level: usize, comparator: C, rng: R) -> Self {
        Self::from_list(SkipList::new(max_level, comparator, rng))
    }

    pub(crate) fn from_list(list: SkipList<(K, V), First, C, R>) -> Self {
        Self { list }
    }

    /// Returns the underlying engine.
    #[inline]
    pub fn as_list(&self) -> &SkipList<(K, V), First, C, R> {
        &self.list
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Returns `true` if the map holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Inserts `key -> value` if `key` is absent.
    ///
    /// Returns `false`, dropping `key` and `value`, if the key is already
    /// present. The existing value is not touched.
    #[inline]
    pub fn insert(&mut self, key: K, value: V) -> bool {
        self.list.insert_unique((key, value)).1
    }

    /// Inserts `key -> value`, overwriting an existing entry.
    ///
    /// Returns the previous value, if any.
    #[inline]
    pub fn upsert(&mut self, key: K, value: V) -> Option<V> {
        self.list.upsert((key, value)).1.map(|(_, old)| old)
    }

    /// Returns the value for `key`.
    #[inline]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.list.get(key).map(|(_, v)| v)
    }

    /// Returns a mutable reference to the value for `key`.
    #[inline]
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let idx = self.list.find(key)?;
        self.list.value_at_mut(idx).map(|(_, v)| v)
    }

    /// Returns the stored key and value for `key`.
    #[inline]
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.list.get(key).map(|(k, v)| (k, v))
    }

    /// Returns `true` if `key` is present.
    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.list.contains(key)
    }

    /// Returns the value for `key`, inserting `V::default()` first if the
    /// key is absent.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let idx = match self.list.find(&key) {
            Some(idx) => idx,
            None => self.list.insert_unique((key, V::default())).0,
        };
        &mut self.list.value_at_mut(idx).expect("invalid index").1
    }

    /// Removes `key`, returning its value.
    #[inline]
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.list.remove(key).map(|(_, v)| v)
    }

    /// Removes `key`, returning the stored key and value.
    #[inline]
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        self.list.remove(key)
    }

    /// Removes every entry whose key falls in `range`, returning how many
    /// were removed.
    pub fn erase_range<B>(&mut self, range: B) -> usize
    where
        B: RangeBounds<K>,
        K: Clone,
    {
        self.list.erase_range(range)
    }

    /// Removes and returns the first entry.
    #[inline]
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.list.pop_first()
    }

    /// Returns the first entry.
    #[inline]
    pub fn first(&self) -> Option<(&K, &V)> {
        self.list.first().map(|(k, v)| (k, v))
    }

    /// Returns the last entry.
    #[inline]
    pub fn last(&self) -> Option<(&K, &V)> {
        self.list.last().map(|(k, v)| (k, v))
    }

    /// Removes every entry.
    #[inline]
    pub fn clear(&mut self) {
        self.list.clear();
    }

    /// Iterates entries in key order.
    #[inline]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter { inner: self.list.iter() }
    }

    /// Iterates entries in key order with mutable values.
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut { inner: self.list.iter_mut() }
    }

    /// Iterates entries starting at the first key not less than `key`.
    #[inline]
    pub fn lower_bound(&self, key: &K) -> Iter<'_, K, V> {
        Iter { inner: self.list.iter_from(self.list.lower_bound(key)) }
    }

    /// Iterates entries starting at the first key greater than `key`.
    #[inline]
    pub fn upper_bound(&self, key: &K) -> Iter<'_, K, V> {
        Iter { inner: self.list.iter_from(self.list.upper_bound(key)) }
    }

    /// Iterates keys in order.
    #[inline]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Iterates values in key order.
    #[inline]
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Iterates mutable values in key order.
    #[inline]
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut { inner: self.iter_mut() }
    }

    /// Renders each lane as `key:value` cells aligned to lane 0.
    pub fn levels(&self) -> String
    where
        K: fmt::Display,
        V: fmt::Display,
    {
        self.list.levels_with(|(k, v)| format!("{k}:{v}"))
    }
}

// ============================================================================
// Trait impls
// ============================================================================

impl<K, V, C, R> Clone for SkipMap<K, V, C, R>
where
    K: Clone,
    V: Clone,
    C: Clone,
    R: Clone,
{
    fn clone(&self) -> Self {
        Self { list: self.list.clone() }
    }
}

impl<K, V, C, R> PartialEq for SkipMap<K, V, C, R>
where
    K: PartialEq,
    V: PartialEq,
    C: Comparator<K>,
{
    fn eq(&self, other: &Self) -> bool {
        self.list == other.list
    }
}

impl<K: Eq, V: Eq, C: Comparator<K>, R> Eq for SkipMap<K, V, C, R> {}

impl<K, V, C, R> fmt::Debug for SkipMap<K, V, C, R>
where
    K: fmt::Debug,
    V: fmt::Debug,
    C: Comparator<K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.list.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

/// Looks up `key`, panicking when it is absent.
///
/// Use [`SkipMap::get_or_insert_default`] to insert on a miss.
impl<K, V, C, R> ops::Index<&K> for SkipMap<K, V, C, R>
where
    C: Comparator<K>,
    R: RngCore,
{
    type Output = V;

    fn index(&self, key: &K) -> &V {
        self.get(key).expect("key not present in SkipMap")
    }
}

/// Bulk insert; keys already present keep their value.
impl<K, V, C, R> Extend<(K, V)> for SkipMap<K, V, C, R>
where
    C: Comparator<K>,
    R: RngCore,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for SkipMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for SkipMap<K, V> {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<'a, K, V, C, R> IntoIterator for &'a SkipMap<K, V, C, R>
where
    C: Comparator<K>,
    R: RngCore,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, C, R> IntoIterator for &'a mut SkipMap<K, V, C, R>
where
    C: Comparator<K>,
    R: RngCore,
{
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, C, R> IntoIterator for SkipMap<K, V, C, R> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { inner: self.list.into_iter() }
    }
}

// ============================================================================
// Iterators
// ============================================================================

/// Iterator over `(&K, &V)` in key order.
pub struct Iter<'a, K, V> {
    inner: skiplist::Iter<'a, (K, V), Entries<K, V>, usize>,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Iterator over `(&K, &mut V)` in key order.
pub struct IterMut<'a, K, V> {
    inner: skiplist::IterMut<'a, (K, V), Entries<K, V>, usize>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let (key, value) = self.inner.next()?;
        let key: &'a K = key;
        Some((key, value))
    }
}

/// Iterator over keys in order.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Iterator over values in key order.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Iterator over mutable values in key order.
pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    #[inline]
    fn next(&mut self) -> Option<&'a mut V> {
        self.inner.next().map(|(_, v)| v)
    }
}

/// Owning iterator over `(K, V)` in key order.
pub struct IntoIter<K, V> {
    inner: skiplist::IntoIter<(K, V), Entries<K, V>, usize>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<(K, V)> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
