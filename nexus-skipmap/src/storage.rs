//! Node arenas with stable handles.
//!
//! The skip list never holds pointers to its nodes. Every node lives in a
//! slot of an arena and forward links are slot handles, so unlinking a node
//! is a plain slot release and a stale handle can only ever miss, never
//! dangle.
//!
//! ```text
//! Storage<T>                - try_insert, remove, get, len, clear
//!     │
//!     └── UnboundedStorage<T>  - infallible insert (growable arenas)
//! ```
//!
//! # Implementations
//!
//! - `slab::Slab<T>` - growable, the default arena
//! - [`BoundedSlab<T>`] - fixed capacity, reports [`Full`] once exhausted

use crate::Index;

/// Slab-like arena with stable handles.
///
/// Handles stay valid until the slot is removed. Removed slots may be
/// reused by later inserts, so a handle must not outlive its node.
pub trait Storage<T> {
    /// Handle type for this arena.
    type Index: Index;

    /// Inserts a value, returning its handle, or hands the value back if
    /// the arena cannot grow.
    fn try_insert(&mut self, value: T) -> Result<Self::Index, Full<T>>;

    /// Removes and returns the value at `index`, if present.
    fn remove(&mut self, index: Self::Index) -> Option<T>;

    /// Returns a reference to the value at `index`, if present.
    fn get(&self, index: Self::Index) -> Option<&T>;

    /// Returns a mutable reference to the value at `index`, if present.
    fn get_mut(&mut self, index: Self::Index) -> Option<&mut T>;

    /// Returns the number of occupied slots.
    fn len(&self) -> usize;

    /// Returns `true` if no slots are occupied.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every stored value.
    ///
    /// Any structure still holding handles into this arena is left with
    /// dangling links; clear the structure first.
    fn clear(&mut self);
}

/// An arena whose inserts cannot fail.
pub trait UnboundedStorage<T>: Storage<T> {
    /// Inserts a value, returning its handle.
    fn insert(&mut self, value: T) -> Self::Index;
}

/// Error returned when a bounded arena has no free slot.
///
/// Carries the value that could not be stored so the caller can recover it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Full<T>(pub T);

impl<T> Full<T> {
    /// Returns the value that could not be inserted.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> core::fmt::Display for Full<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "node storage is full")
    }
}

impl<T: core::fmt::Debug> std::error::Error for Full<T> {}

// =============================================================================
// slab::Slab - growable
// =============================================================================

impl<T> Storage<T> for slab::Slab<T> {
    type Index = usize;

    #[inline]
    fn try_insert(&mut self, value: T) -> Result<usize, Full<T>> {
        Ok(slab::Slab::insert(self, value))
    }

    #[inline]
    fn remove(&mut self, index: usize) -> Option<T> {
        self.try_remove(index)
    }

    #[inline]
    fn get(&self, index: usize) -> Option<&T> {
        slab::Slab::get(self, index)
    }

    #[inline]
    fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        slab::Slab::get_mut(self, index)
    }

    #[inline]
    fn len(&self) -> usize {
        slab::Slab::len(self)
    }

    fn clear(&mut self) {
        slab::Slab::clear(self);
    }
}

impl<T> UnboundedStorage<T> for slab::Slab<T> {
    #[inline]
    fn insert(&mut self, value: T) -> usize {
        slab::Slab::insert(self, value)
    }
}

// =============================================================================
// BoundedSlab - fixed capacity
// =============================================================================

/// Fixed-capacity arena over `slab::Slab`.
///
/// The backing slab is allocated up front and never grows; once `capacity`
/// slots are occupied, [`Storage::try_insert`] returns [`Full`]. Handles are
/// narrowed to `Idx`, which lets small arenas use `u16`/`u32` links.
///
/// # Example
///
/// ```
/// use nexus_skipmap::{BoundedSlab, Storage};
///
/// let mut storage: BoundedSlab<u64> = BoundedSlab::with_capacity(2);
/// let a = storage.try_insert(1).unwrap();
/// storage.try_insert(2).unwrap();
/// assert_eq!(storage.try_insert(3).unwrap_err().into_inner(), 3);
///
/// storage.remove(a);
/// assert!(storage.try_insert(3).is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct BoundedSlab<T, Idx: Index = u32> {
    slots: slab::Slab<T>,
    capacity: usize,
    _marker: core::marker::PhantomData<Idx>,
}

impl<T, Idx: Index> BoundedSlab<T, Idx> {
    /// Creates an arena holding at most `capacity` values.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0 or does not fit below `Idx::NONE`.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        assert!(
            capacity <= Idx::NONE.as_usize(),
            "capacity exceeds index type maximum"
        );
        Self {
            slots: slab::Slab::with_capacity(capacity),
            capacity,
            _marker: core::marker::PhantomData,
        }
    }

    /// Returns the fixed capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` if every slot is occupied.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }
}

impl<T, Idx: Index> Storage<T> for BoundedSlab<T, Idx> {
    type Index = Idx;

    #[inline]
    fn try_insert(&mut self, value: T) -> Result<Idx, Full<T>> {
        if self.is_full() {
            return Err(Full(value));
        }
        Ok(Idx::from_usize(self.slots.insert(value)))
    }

    #[inline]
    fn remove(&mut self, index: Idx) -> Option<T> {
        if index.is_none() {
            return None;
        }
        self.slots.try_remove(index.as_usize())
    }

    #[inline]
    fn get(&self, index: Idx) -> Option<&T> {
        if index.is_none() {
            return None;
        }
        self.slots.get(index.as_usize())
    }

    #[inline]
    fn get_mut(&mut self, index: Idx) -> Option<&mut T> {
        if index.is_none() {
            return None;
        }
        self.slots.get_mut(index.as_usize())
    }

    #[inline]
    fn len(&self) -> usize {
        self.slots.len()
    }

    fn clear(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slab_insert_get_remove() {
        let mut storage: slab::Slab<u64> = slab::Slab::new();

        let idx = Storage::try_insert(&mut storage, 42).unwrap();
        assert_eq!(Storage::get(&storage, idx), Some(&42));
        assert_eq!(Storage::len(&storage), 1);

        assert_eq!(Storage::remove(&mut storage, idx), Some(42));
        assert_eq!(Storage::get(&storage, idx), None);
        assert!(Storage::is_empty(&storage));
    }

    #[test]
    fn slab_remove_vacant_is_none() {
        let mut storage: slab::Slab<u64> = slab::Slab::new();

        let idx = UnboundedStorage::insert(&mut storage, 1);
        Storage::remove(&mut storage, idx);

        assert_eq!(Storage::remove(&mut storage, idx), None);
        assert_eq!(Storage::remove(&mut storage, usize::NONE), None);
    }

    #[test]
    fn bounded_fill_to_capacity() {
        let mut storage: BoundedSlab<u64> = BoundedSlab::with_capacity(4);

        let keys: Vec<u32> = (0..4).map(|i| storage.try_insert(i).unwrap()).collect();
        assert!(storage.is_full());

        let err = storage.try_insert(4).unwrap_err();
        assert_eq!(err.into_inner(), 4);
        assert_eq!(err.to_string(), "node storage is full");

        for (i, key) in keys.iter().enumerate() {
            assert_eq!(storage.get(*key), Some(&(i as u64)));
        }
    }

    #[test]
    fn bounded_slot_reuse() {
        let mut storage: BoundedSlab<u64, u16> = BoundedSlab::with_capacity(2);

        let a = storage.try_insert(0).unwrap();
        let _b = storage.try_insert(1).unwrap();
        storage.remove(a);

        let c = storage.try_insert(2).unwrap();
        assert_eq!(c, a);
        assert_eq!(storage.get(c), Some(&2));
    }

    #[test]
    fn bounded_none_handle_misses() {
        let mut storage: BoundedSlab<u64> = BoundedSlab::with_capacity(2);
        storage.try_insert(9).unwrap();

        assert_eq!(storage.get(u32::NONE), None);
        assert_eq!(storage.get_mut(u32::NONE), None);
        assert_eq!(storage.remove(u32::NONE), None);
    }

    #[test]
    fn bounded_clear_frees_everything() {
        let mut storage: BoundedSlab<String> = BoundedSlab::with_capacity(2);
        storage.try_insert("a".into()).unwrap();
        storage.try_insert("b".into()).unwrap();

        storage.clear();
        assert!(storage.is_empty());
        assert!(!storage.is_full());
        assert_eq!(storage.capacity(), 2);
    }

    #[test]
    #[should_panic(expected = "capacity must be > 0")]
    fn bounded_zero_capacity_panics() {
        let _storage: BoundedSlab<u64> = BoundedSlab::with_capacity(0);
    }

    #[test]
    #[should_panic(expected = "capacity exceeds index type maximum")]
    fn bounded_capacity_checked_against_index() {
        let _storage: BoundedSlab<u64, u8> = BoundedSlab::with_capacity(1000);
    }
}
