//! Ordering and key extraction.
//!
//! One engine serves both the map and the set. What differs is which part of
//! a stored value is the key, and that is a type parameter:
//!
//! ```text
//! SkipSet<T>    = SkipList<T,      Identity, ..>   key_of(v) = v
//! SkipMap<K, V> = SkipList<(K, V), First,    ..>   key_of(v) = &v.0
//! ```
//!
//! The comparator is a value rather than a type so closures and stateful
//! orderings work. Two keys are considered equal when the comparator returns
//! [`Ordering::Equal`]; `Eq` on the key type is never consulted.

use core::cmp::Ordering;

/// A total order over keys.
///
/// Implemented for [`Ascending`], [`Descending`] and any
/// `Fn(&K, &K) -> Ordering`.
///
/// # Example
///
/// ```
/// use nexus_skipmap::{Comparator, SkipSet};
/// use std::cmp::Ordering;
///
/// // Case-insensitive set.
/// let by_lowercase = |a: &String, b: &String| a.to_lowercase().cmp(&b.to_lowercase());
/// let mut set = SkipSet::with_comparator(by_lowercase);
/// assert!(set.insert("Apple".to_string()));
/// assert!(!set.insert("APPLE".to_string()));
/// assert_eq!(set.len(), 1);
/// ```
pub trait Comparator<K: ?Sized> {
    /// Compares two keys.
    fn compare(&self, a: &K, b: &K) -> Ordering;

    /// Returns `true` if `a` sorts strictly before `b`.
    #[inline]
    fn less(&self, a: &K, b: &K) -> bool {
        self.compare(a, b) == Ordering::Less
    }

    /// Returns `true` if the keys are equivalent under this order.
    #[inline]
    fn equivalent(&self, a: &K, b: &K) -> bool {
        self.compare(a, b) == Ordering::Equal
    }
}

/// The natural `Ord` order, smallest key first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ascending;

impl<K: Ord + ?Sized> Comparator<K> for Ascending {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

/// The reverse of `Ord`, largest key first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Descending;

impl<K: Ord + ?Sized> Comparator<K> for Descending {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        b.cmp(a)
    }
}

impl<K: ?Sized, F> Comparator<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self(a, b)
    }
}

/// Maps a stored value to the key it is ordered by.
///
/// Implementations are stateless; the extraction is a pure function of the
/// value.
pub trait KeyOf<V> {
    /// The key type.
    type Key;

    /// Borrows the key out of a stored value.
    fn key_of(value: &V) -> &Self::Key;
}

/// The value is its own key (sets).
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<T> KeyOf<T> for Identity {
    type Key = T;

    #[inline]
    fn key_of(value: &T) -> &T {
        value
    }
}

/// The key is the first component of a pair (maps).
#[derive(Debug, Clone, Copy, Default)]
pub struct First;

impl<K, V> KeyOf<(K, V)> for First {
    type Key = K;

    #[inline]
    fn key_of(value: &(K, V)) -> &K {
        &value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascending_and_descending_are_mirrors() {
        assert_eq!(Ascending.compare(&1, &2), Ordering::Less);
        assert_eq!(Descending.compare(&1, &2), Ordering::Greater);
        assert!(Ascending.equivalent(&3, &3));
        assert!(Descending.equivalent(&3, &3));
        assert!(Descending.less(&9, &1));
    }

    #[test]
    fn closure_comparator() {
        let by_len = |a: &&str, b: &&str| a.len().cmp(&b.len());
        assert!(by_len.equivalent(&"abc", &"xyz"));
        assert!(by_len.less(&"ab", &"abc"));
    }

    #[test]
    fn key_extraction() {
        let pair = ("k", 7);
        assert_eq!(*First::key_of(&pair), "k");
        assert_eq!(*Identity::key_of(&5), 5);
    }
}
