//! Ordered set over the skip list engine.
//!
//! Elements are their own keys and are only ever handed out by shared
//! reference; changing one in place could break the ordering.

use core::fmt;
use core::ops::RangeBounds;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand_core::RngCore;

use crate::builder::DEFAULT_MAX_LEVEL;
use crate::order::{Ascending, Comparator, Identity};
use crate::skiplist::{self, SkipList, SlabSkipStorage};

/// An ordered set backed by a skip list.
///
/// # Example
///
/// ```
/// use nexus_skipmap::SkipSet;
///
/// let mut set: SkipSet<u32> = (0..5).collect();
/// assert!(!set.insert(3));
/// assert!(set.insert(5));
/// assert!(set.remove(&1));
/// assert!(!set.contains(&1));
/// assert_eq!(set.len(), 5);
/// ```
pub struct SkipSet<T, C = Ascending, R = SmallRng> {
    list: SkipList<T, Identity, C, R>,
}

impl<T: Ord> SkipSet<T> {
    /// Creates an empty set in ascending order.
    pub fn new() -> Self {
        Self::with_comparator(Ascending)
    }

    /// Creates an empty set whose nodes reach at most `max_level`.
    ///
    /// # Panics
    ///
    /// Panics if `max_level` is 0.
    pub fn with_max_level(max_level: usize) -> Self {
        Self::with_rng(max_level, Ascending, SmallRng::from_os_rng())
    }
}

impl<T: Ord> Default for SkipSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C: Comparator<T>> SkipSet<T, C> {
    /// Creates an empty set ordered by `comparator`.
    pub fn with_comparator(comparator: C) -> Self {
        Self::with_rng(DEFAULT_MAX_LEVEL, comparator, SmallRng::from_os_rng())
    }
}

impl<T, C, R> SkipSet<T, C, R>
where
    C: Comparator<T>,
    R: RngCore,
{
    /// Creates an empty set drawing node levels from `rng`.
    ///
    /// # Panics
    ///
    /// Panics if `max_level` is 0.
    pub fn with_rng(max_level: usize, comparator: C, rng: R) -> Self {
        Self::from_list(SkipList::new(max_level, comparator, rng))
    }

    pub(crate) fn from_list(list: SkipList<T, Identity, C, R>) -> Self {
        Self { list }
    }

    /// Returns the underlying engine.
    #[inline]
    pub fn as_list(&self) -> &SkipList<T, Identity, C, R> {
        &self.list
    }

    /// Returns the number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Returns `true` if the set holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Adds `value`. Returns `false` if an equivalent element was present,
    /// in which case the set is unchanged.
    #[inline]
    pub fn insert(&mut self, value: T) -> bool {
        self.list.insert_unique(value).1
    }

    /// Adds `value`, replacing an equivalent element. Returns the replaced
    /// element.
    #[inline]
    pub fn replace(&mut self, value: T) -> Option<T> {
        self.list.upsert(value).1
    }

    /// Returns `true` if an equivalent element is present.
    #[inline]
    pub fn contains(&self, value: &T) -> bool {
        self.list.contains(value)
    }

    /// Returns the stored element equivalent to `value`.
    #[inline]
    pub fn get(&self, value: &T) -> Option<&T> {
        self.list.get(value)
    }

    /// Removes the element equivalent to `value`. Returns whether one was
    /// present.
    #[inline]
    pub fn remove(&mut self, value: &T) -> bool {
        self.list.remove(value).is_some()
    }

    /// Removes and returns the element equivalent to `value`.
    #[inline]
    pub fn take(&mut self, value: &T) -> Option<T> {
        self.list.remove(value)
    }

    /// Removes every element in `range`, returning how many were removed.
    pub fn erase_range<B>(&mut self, range: B) -> usize
    where
        B: RangeBounds<T>,
        T: Clone,
    {
        self.list.erase_range(range)
    }

    /// Removes and returns the smallest element.
    #[inline]
    pub fn pop_first(&mut self) -> Option<T> {
        self.list.pop_first()
    }

    /// Returns the smallest element.
    #[inline]
    pub fn first(&self) -> Option<&T> {
        self.list.first()
    }

    /// Returns the largest element.
    #[inline]
    pub fn last(&self) -> Option<&T> {
        self.list.last()
    }

    /// Removes every element.
    #[inline]
    pub fn clear(&mut self) {
        self.list.clear();
    }

    /// Iterates elements in order.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { inner: self.list.iter() }
    }

    /// Iterates elements starting at the first one not less than `value`.
    #[inline]
    pub fn lower_bound(&self, value: &T) -> Iter<'_, T> {
        Iter { inner: self.list.iter_from(self.list.lower_bound(value)) }
    }

    /// Iterates elements starting at the first one greater than `value`.
    #[inline]
    pub fn upper_bound(&self, value: &T) -> Iter<'_, T> {
        Iter { inner: self.list.iter_from(self.list.upper_bound(value)) }
    }

    /// Renders each lane aligned to lane 0.
    pub fn levels(&self) -> String
    where
        T: fmt::Display,
    {
        self.list.levels_with(|v| v.to_string())
    }
}

impl<T: Clone, C: Clone, R: Clone> Clone for SkipSet<T, C, R> {
    fn clone(&self) -> Self {
        Self { list: self.list.clone() }
    }
}

impl<T: PartialEq, C: Comparator<T>, R> PartialEq for SkipSet<T, C, R> {
    fn eq(&self, other: &Self) -> bool {
        self.list == other.list
    }
}

impl<T: Eq, C: Comparator<T>, R> Eq for SkipSet<T, C, R> {}

impl<T: fmt::Debug, C: Comparator<T>, R> fmt::Debug for SkipSet<T, C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.list.iter()).finish()
    }
}

/// Bulk insert; elements already present are kept.
impl<T, C: Comparator<T>, R: RngCore> Extend<T> for SkipSet<T, C, R> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T: Ord> FromIterator<T> for SkipSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<T: Ord, const N: usize> From<[T; N]> for SkipSet<T> {
    fn from(values: [T; N]) -> Self {
        values.into_iter().collect()
    }
}

impl<'a, T, C: Comparator<T>, R: RngCore> IntoIterator for &'a SkipSet<T, C, R> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, C, R> IntoIterator for SkipSet<T, C, R> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { inner: self.list.into_iter() }
    }
}

/// Iterator over `&T` in order.
pub struct Iter<'a, T> {
    inner: skiplist::Iter<'a, T, SlabSkipStorage<T>, usize>,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Owning iterator over `T` in order.
pub struct IntoIter<T> {
    inner: skiplist::IntoIter<T, SlabSkipStorage<T>, usize>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}
