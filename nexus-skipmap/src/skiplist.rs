//! Skip list engine - a probabilistic ordered container over an arena.
//!
//! A skip list gives O(log n) expected search, insert and erase without any
//! rebalancing: each node is assigned a random level once, at insertion, and
//! never moves.
//!
//! # Design
//!
//! Nodes live in a [`Storage`] arena and link to each other by handle. The
//! header is not a node; it is the `head` array, one entry per lane. In
//! predecessor arrays, `Idx::NONE` stands for the header.
//!
//! ```text
//! lane 3:  HEAD ─────────────────────► 50 ──────────────────► NIL
//!            │                          │
//! lane 2:  HEAD ────────► 20 ──────────► 50 ──────────────────► NIL
//!            │            │              │
//! lane 1:  HEAD ──► 10 ──► 20 ──► 30 ──► 50 ──► 60 ──► NIL
//!            │      │      │      │      │      │
//! lane 0:  HEAD ──► 10 ──► 20 ──► 30 ──► 50 ──► 60 ──► NIL
//! ```
//!
//! The engine stores whole values `V` and orders them by the key a
//! [`KeyOf`] strategy extracts, under a [`Comparator`]. The map and set
//! adapters fix those two parameters; the engine itself is also usable
//! directly.
//!
//! # Invariants
//!
//! Before and after every public operation:
//!
//! - every lane `0..=top_level` is strictly increasing under the comparator
//!   and ends in `NONE`
//! - a node linked into lane `L` is linked into every lane below `L`
//! - `top_level` is the highest lane whose head is set, or 0 when empty
//! - `len` equals the number of nodes on lane 0
//! - no two nodes have equivalent keys
//!
//! [`check_invariants`](SkipList::check_invariants) verifies all of them.
//!
//! # Example
//!
//! ```
//! use nexus_skipmap::{Ascending, Identity, SkipList};
//! use rand::SeedableRng;
//! use rand::rngs::SmallRng;
//!
//! let mut list: SkipList<u64, Identity> =
//!     SkipList::new(16, Ascending, SmallRng::seed_from_u64(7));
//!
//! for key in [7, 9, 2, 8] {
//!     list.insert_unique(key);
//! }
//!
//! assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![2, 7, 8, 9]);
//! assert_eq!(list.insert_unique(7).1, false);
//! assert_eq!(list.remove(&7), Some(7));
//! ```

use core::convert::Infallible;
use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::ops::{Bound, RangeBounds};

use rand::rngs::SmallRng;
use rand_core::RngCore;
use tracing::trace;

use crate::level::{DEFAULT_LEVEL_RATIO, LevelGenerator};
use crate::order::{Ascending, Comparator, KeyOf};
use crate::storage::{BoundedSlab, Full, Storage, UnboundedStorage};
use crate::Index;

// ============================================================================
// SkipNode
// ============================================================================

/// A node in the skip list: a value and its forward links.
///
/// `forward[i]` is the next node on lane `i`. A node of level `L` has
/// `L + 1` forward links.
#[derive(Debug, Clone)]
pub struct SkipNode<V, Idx> {
    value: V,
    forward: Box<[Idx]>,
}

impl<V, Idx: Index> SkipNode<V, Idx> {
    #[inline]
    fn new(value: V, level: usize) -> Self {
        Self {
            value,
            forward: vec![Idx::NONE; level + 1].into_boxed_slice(),
        }
    }

    /// Returns the stored value.
    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Returns the highest lane this node is linked into.
    #[inline]
    pub fn level(&self) -> usize {
        self.forward.len() - 1
    }
}

/// Growable arena for skip list nodes (the default).
pub type SlabSkipStorage<V> = slab::Slab<SkipNode<V, usize>>;

/// Fixed-capacity arena for skip list nodes.
pub type BoundedSkipStorage<V, Idx = u32> = BoundedSlab<SkipNode<V, Idx>, Idx>;

/// Where an insert left the value.
enum Placed<Idx, V> {
    /// A new node was linked.
    Inserted(Idx),
    /// An equivalent key was present and left untouched.
    Existing(Idx),
    /// An equivalent key was present and its value was replaced.
    Replaced(Idx, V),
}

// ============================================================================
// SkipList
// ============================================================================

/// A probabilistic ordered container with unique keys.
///
/// # Type Parameters
///
/// - `V`: stored value
/// - `X`: [`KeyOf`] strategy extracting the ordering key from a value
/// - `C`: [`Comparator`] over `X::Key`, defaults to [`Ascending`]
/// - `R`: random source for level sampling, defaults to `SmallRng`
/// - `S`: node arena, defaults to a growable `slab::Slab`
/// - `Idx`: node handle type of the arena
///
/// Handles returned by [`find`](Self::find), [`insert_unique`](Self::insert_unique)
/// and friends stay valid until that node is erased. Erasing one node never
/// invalidates handles to other nodes.
///
/// Cloning copies the value sequence and the node skeleton as they are.
#[derive(Clone)]
pub struct SkipList<
    V,
    X,
    C = Ascending,
    R = SmallRng,
    S = SlabSkipStorage<V>,
    Idx = usize,
> where
    X: KeyOf<V>,
    Idx: Index,
{
    /// Header forward links, one per lane `0..=max_level`.
    head: Box<[Idx]>,
    /// Last node on lane 0, for O(1) `last()`.
    tail: Idx,
    /// Highest non-empty lane (0 when empty).
    top_level: usize,
    /// Number of nodes on lane 0.
    len: usize,
    comparator: C,
    levels: LevelGenerator<R>,
    storage: S,
    /// Predecessor scratch array reused by every mutation.
    update: Box<[Idx]>,
    _marker: PhantomData<(V, X)>,
}

impl<V, X, C, R> SkipList<V, X, C, R, SlabSkipStorage<V>, usize>
where
    X: KeyOf<V>,
    C: Comparator<X::Key>,
    R: RngCore,
{
    /// Creates an empty skip list backed by a growable slab.
    ///
    /// Nodes are assigned levels in `1..=max_level` with p = 1/2.
    ///
    /// # Panics
    ///
    /// Panics if `max_level` is 0. Use
    /// [`SkipListBuilder`](crate::SkipListBuilder) for a fallible constructor.
    pub fn new(max_level: usize, comparator: C, rng: R) -> Self {
        assert!(max_level > 0, "max_level must be > 0");
        Self::with_storage(
            slab::Slab::new(),
            LevelGenerator::new(rng, max_level, DEFAULT_LEVEL_RATIO),
            comparator,
        )
    }
}

impl<V, X, C, R, Idx> SkipList<V, X, C, R, BoundedSkipStorage<V, Idx>, Idx>
where
    X: KeyOf<V>,
    C: Comparator<X::Key>,
    R: RngCore,
    Idx: Index,
{
    /// Creates an empty skip list holding at most `capacity` nodes.
    ///
    /// Inserts beyond capacity fail with [`Full`] and leave the list as it
    /// was.
    ///
    /// # Panics
    ///
    /// Panics if `max_level` or `capacity` is 0, or if `capacity` does not
    /// fit in `Idx`.
    pub fn bounded(capacity: usize, max_level: usize, comparator: C, rng: R) -> Self {
        assert!(max_level > 0, "max_level must be > 0");
        Self::with_storage(
            BoundedSlab::with_capacity(capacity),
            LevelGenerator::new(rng, max_level, DEFAULT_LEVEL_RATIO),
            comparator,
        )
    }
}

// ============================================================================
// Read side
// ============================================================================

impl<V, X, C, R, S, Idx> SkipList<V, X, C, R, S, Idx>
where
    X: KeyOf<V>,
    C: Comparator<X::Key>,
    S: Storage<SkipNode<V, Idx>, Index = Idx>,
    Idx: Index,
{
    /// Returns the number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the list holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the highest lane a node may be linked into.
    #[inline]
    pub fn max_level(&self) -> usize {
        self.head.len() - 1
    }

    /// Returns the level ratio: each lane holds about `1 / ratio` of the
    /// nodes of the lane below.
    #[inline]
    pub fn level_ratio(&self) -> u32 {
        self.levels.level_ratio()
    }

    /// Returns the highest currently non-empty lane (0 when empty).
    #[inline]
    pub fn top_level(&self) -> usize {
        self.top_level
    }

    /// Returns the comparator.
    #[inline]
    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    /// Returns the handle of the node whose key is equivalent to `key`.
    #[inline]
    pub fn find(&self, key: &X::Key) -> Option<Idx> {
        let pred = self.descend(|k| self.comparator.less(k, key), None);
        self.match_after(pred, key)
    }

    /// Returns the value whose key is equivalent to `key`.
    #[inline]
    pub fn get(&self, key: &X::Key) -> Option<&V> {
        self.find(key).map(|idx| &self.node(idx).value)
    }

    /// Returns `true` if a value with an equivalent key is present.
    #[inline]
    pub fn contains(&self, key: &X::Key) -> bool {
        self.find(key).is_some()
    }

    /// Returns the first node whose key is not less than `key`, or
    /// `Idx::NONE`.
    #[inline]
    pub fn lower_bound(&self, key: &X::Key) -> Idx {
        let pred = self.descend(|k| self.comparator.less(k, key), None);
        self.forward_of(pred, 0)
    }

    /// Returns the first node whose key is greater than `key`, or
    /// `Idx::NONE`.
    #[inline]
    pub fn upper_bound(&self, key: &X::Key) -> Idx {
        let pred = self.descend(|k| !self.comparator.less(key, k), None);
        self.forward_of(pred, 0)
    }

    /// Returns the handle of the first node, or `Idx::NONE` when empty.
    #[inline]
    pub fn begin(&self) -> Idx {
        self.head[0]
    }

    /// Returns the past-the-end handle.
    #[inline]
    pub fn end(&self) -> Idx {
        Idx::NONE
    }

    /// Returns the lane-0 successor of `idx`, or `Idx::NONE`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` does not refer to a live node.
    #[inline]
    pub fn next(&self, idx: Idx) -> Idx {
        self.node(idx).forward[0]
    }

    /// Returns the value of the node at `idx`, or `None` for `Idx::NONE` or
    /// a released slot.
    #[inline]
    pub fn value_at(&self, idx: Idx) -> Option<&V> {
        self.storage.get(idx.into_option()?).map(|node| &node.value)
    }

    /// Mutable access for adapters that only touch the non-key part.
    #[inline]
    pub(crate) fn value_at_mut(&mut self, idx: Idx) -> Option<&mut V> {
        self.storage.get_mut(idx.into_option()?).map(|node| &mut node.value)
    }

    /// Returns the smallest value.
    #[inline]
    pub fn first(&self) -> Option<&V> {
        self.value_at(self.head[0])
    }

    /// Returns the largest value. O(1).
    #[inline]
    pub fn last(&self) -> Option<&V> {
        self.value_at(self.tail)
    }

    /// Returns an iterator over values in key order.
    #[inline]
    pub fn iter(&self) -> Iter<'_, V, S, Idx> {
        Iter {
            storage: &self.storage,
            current: self.head[0],
            remaining: self.len,
            _marker: PhantomData,
        }
    }

    /// Returns an iterator starting at `idx` (inclusive).
    ///
    /// `Idx::NONE` yields an empty iterator.
    #[inline]
    pub fn iter_from(&self, idx: Idx) -> Iter<'_, V, S, Idx> {
        Iter {
            storage: &self.storage,
            current: idx,
            remaining: if idx.is_none() { 0 } else { self.len },
            _marker: PhantomData,
        }
    }

    /// Returns a mutable iterator over values in key order.
    ///
    /// Crate-private: callers must not change the ordering key.
    #[inline]
    pub(crate) fn iter_mut(&mut self) -> IterMut<'_, V, S, Idx> {
        IterMut {
            current: self.head[0],
            storage: &mut self.storage,
            _marker: PhantomData,
        }
    }

    /// Renders every active lane, top lane first, with each node printed in
    /// the column of its lane-0 position.
    ///
    /// Diagnostic output only; the format is not stable.
    pub fn levels_with<F>(&self, mut render: F) -> String
    where
        F: FnMut(&V) -> String,
    {
        use core::fmt::Write;

        let columns: Vec<(Idx, String)> = self
            .lane(0)
            .map(|idx| (idx, render(&self.node(idx).value)))
            .collect();

        let mut out = String::new();
        for lane in (0..=self.top_level).rev() {
            let _ = write!(out, "level {lane:>2}:");
            let mut next = self.head[lane];
            for (idx, text) in &columns {
                if next.is_none() {
                    break;
                }
                if *idx == next {
                    let _ = write!(out, " {text}");
                    next = self.node(next).forward[lane];
                } else {
                    let _ = write!(out, " {:width$}", "", width = text.chars().count());
                }
            }
            out.push('\n');
        }
        let _ = writeln!(
            out,
            "max_level={}, top_level={}, len={}",
            self.max_level(),
            self.top_level,
            self.len
        );
        out
    }

    /// Verifies every structural invariant.
    ///
    /// # Panics
    ///
    /// Panics with a description of the first violated invariant.
    pub fn check_invariants(&self) {
        let mut lanes: Vec<Vec<Idx>> = Vec::with_capacity(self.top_level + 1);
        for lane in 0..=self.top_level {
            let chain: Vec<Idx> = self.lane(lane).collect();
            for pair in chain.windows(2) {
                let (a, b) = (self.key_at(pair[0]), self.key_at(pair[1]));
                assert!(
                    self.comparator.less(a, b),
                    "lane {lane} is not strictly increasing"
                );
            }
            for idx in &chain {
                assert!(
                    self.node(*idx).level() >= lane,
                    "node on lane {lane} has a lower level"
                );
            }
            lanes.push(chain);
        }

        for lane in 1..lanes.len() {
            let below: std::collections::HashSet<usize> =
                lanes[lane - 1].iter().map(|idx| idx.as_usize()).collect();
            assert!(
                lanes[lane].iter().all(|idx| below.contains(&idx.as_usize())),
                "lane {lane} is not nested in lane {}",
                lane - 1
            );
        }

        if self.is_empty() {
            assert_eq!(self.top_level, 0, "empty list has top_level > 0");
        } else {
            assert!(
                self.head[self.top_level].is_some(),
                "top lane {} is empty",
                self.top_level
            );
        }
        assert!(
            self.head[self.top_level + 1..].iter().all(|idx| idx.is_none()),
            "lane above top_level is populated"
        );

        assert_eq!(lanes[0].len(), self.len, "len does not match lane 0");
        assert_eq!(self.storage.len(), self.len, "arena holds unlinked nodes");
        assert_eq!(
            lanes[0].last().copied().unwrap_or(Idx::NONE),
            self.tail,
            "tail is not the last lane-0 node"
        );
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    #[inline]
    fn node(&self, idx: Idx) -> &SkipNode<V, Idx> {
        self.storage.get(idx).expect("invalid index")
    }

    #[inline]
    fn node_mut(&mut self, idx: Idx) -> &mut SkipNode<V, Idx> {
        self.storage.get_mut(idx).expect("invalid index")
    }

    #[inline]
    fn key_at(&self, idx: Idx) -> &X::Key {
        X::key_of(&self.node(idx).value)
    }

    /// Successor of `idx` on `lane`, where `NONE` means the header.
    #[inline]
    fn forward_of(&self, idx: Idx, lane: usize) -> Idx {
        if idx.is_none() {
            self.head[lane]
        } else {
            self.node(idx).forward[lane]
        }
    }

    #[inline]
    fn set_forward(&mut self, idx: Idx, lane: usize, to: Idx) {
        if idx.is_none() {
            self.head[lane] = to;
        } else {
            self.node_mut(idx).forward[lane] = to;
        }
    }

    /// Walks lane `lane` from the header.
    fn lane(&self, lane: usize) -> impl Iterator<Item = Idx> + '_ {
        let mut current = self.head[lane];
        core::iter::from_fn(move || {
            if current.is_none() {
                return None;
            }
            let idx = current;
            current = self.node(idx).forward[lane];
            Some(idx)
        })
    }

    /// Level-descending search.
    ///
    /// From `top_level` down to 0, advances while `advance(next_key)` holds,
    /// then drops a lane. Records the last node visited on each lane into
    /// `update` when given. Returns the lane-0 stopping node (`NONE` for the
    /// header).
    #[inline]
    fn descend<F>(&self, mut advance: F, mut update: Option<&mut [Idx]>) -> Idx
    where
        F: FnMut(&X::Key) -> bool,
    {
        let mut current = Idx::NONE;

        for lane in (0..=self.top_level).rev() {
            let mut next = self.forward_of(current, lane);

            while next.is_some() {
                let next_node = self.node(next);
                if !advance(X::key_of(&next_node.value)) {
                    break;
                }
                current = next;
                next = next_node.forward[lane];
            }

            if let Some(update) = update.as_deref_mut() {
                update[lane] = current;
            }
        }

        current
    }

    /// Returns the successor of `pred` if its key is equivalent to `key`.
    #[inline]
    fn match_after(&self, pred: Idx, key: &X::Key) -> Option<Idx> {
        let candidate = self.forward_of(pred, 0);
        if candidate.is_some() && self.comparator.equivalent(self.key_at(candidate), key) {
            Some(candidate)
        } else {
            None
        }
    }

    /// Searches for `key`, filling the scratch predecessor array.
    ///
    /// The array is taken out of `self`; callers hand it back.
    #[inline]
    fn locate(&mut self, key: &X::Key) -> (Box<[Idx]>, Option<Idx>) {
        let mut update = core::mem::take(&mut self.update);
        let pred = self.descend(|k| self.comparator.less(k, key), Some(&mut update[..]));
        let found = self.match_after(pred, key);
        (update, found)
    }

    /// Splices `idx` out of every lane it is linked into.
    ///
    /// `update` must hold its predecessors on lanes `0..=top_level`.
    fn unlink(&mut self, idx: Idx, update: &[Idx]) {
        for lane in 0..=self.top_level {
            if self.forward_of(update[lane], lane) != idx {
                break;
            }
            let next = self.node(idx).forward[lane];
            self.set_forward(update[lane], lane, next);
        }

        if self.node(idx).forward[0].is_none() {
            self.tail = update[0];
        }

        while self.top_level > 0 && self.head[self.top_level].is_none() {
            self.top_level -= 1;
            trace!(top_level = self.top_level, "skip list lowered top level");
        }

        self.len -= 1;
    }

    // ========================================================================
    // Erase
    // ========================================================================

    /// Removes the value whose key is equivalent to `key` and returns it.
    ///
    /// Absent keys are a no-op.
    pub fn remove(&mut self, key: &X::Key) -> Option<V> {
        let (update, found) = self.locate(key);
        let result = found.map(|idx| {
            self.unlink(idx, &update);
            self.storage.remove(idx).expect("invalid index").value
        });
        self.update = update;
        result
    }

    /// Removes the smallest value and returns it.
    pub fn pop_first(&mut self) -> Option<V> {
        let idx = self.head[0];
        if idx.is_none() {
            return None;
        }

        // The first node's predecessor is the header on every lane.
        let mut update = core::mem::take(&mut self.update);
        update.fill(Idx::NONE);
        self.unlink(idx, &update);
        self.update = update;

        Some(self.storage.remove(idx).expect("invalid index").value)
    }

    /// Erases the nodes in `[first, last)` and returns how many were erased.
    ///
    /// Each key is captured before the cursor advances past it, then erased
    /// by key. If `last` is not reachable from `first`, erasing stops at the
    /// end of the list.
    pub fn erase_span(&mut self, mut first: Idx, last: Idx) -> usize
    where
        X::Key: Clone,
    {
        let mut erased = 0;
        while first != last && first.is_some() {
            let key = self.key_at(first).clone();
            first = self.next(first);
            if self.remove(&key).is_some() {
                erased += 1;
            }
        }
        erased
    }

    /// Erases every value whose key falls in `range` and returns how many
    /// were erased.
    pub fn erase_range<B>(&mut self, range: B) -> usize
    where
        B: RangeBounds<X::Key>,
        X::Key: Clone,
    {
        let first = match range.start_bound() {
            Bound::Included(key) => self.lower_bound(key),
            Bound::Excluded(key) => self.upper_bound(key),
            Bound::Unbounded => self.begin(),
        };

        let keys: Vec<X::Key> = self
            .iter_from(first)
            .map(|value| X::key_of(value))
            .take_while(|key| match range.end_bound() {
                Bound::Included(end) => !self.comparator.less(end, key),
                Bound::Excluded(end) => self.comparator.less(key, end),
                Bound::Unbounded => true,
            })
            .cloned()
            .collect();

        keys.iter().filter(|key| self.remove(key).is_some()).count()
    }

    /// Removes every value and releases every arena slot.
    pub fn clear(&mut self) {
        self.storage.clear();
        self.head[..=self.top_level].fill(Idx::NONE);
        trace!(released = self.len, "skip list cleared");
        self.tail = Idx::NONE;
        self.top_level = 0;
        self.len = 0;
    }
}

// ============================================================================
// Write side
// ============================================================================

impl<V, X, C, R, S, Idx> SkipList<V, X, C, R, S, Idx>
where
    X: KeyOf<V>,
    C: Comparator<X::Key>,
    R: RngCore,
    S: Storage<SkipNode<V, Idx>, Index = Idx>,
    Idx: Index,
{
    /// Creates an empty skip list over a caller-provided arena.
    ///
    /// The arena must be empty and must not be shared with another
    /// structure.
    pub fn with_storage(storage: S, levels: LevelGenerator<R>, comparator: C) -> Self {
        debug_assert!(storage.is_empty(), "storage must start empty");
        let lanes = levels.max_level() + 1;
        Self {
            head: vec![Idx::NONE; lanes].into_boxed_slice(),
            tail: Idx::NONE,
            top_level: 0,
            len: 0,
            comparator,
            levels,
            storage,
            update: vec![Idx::NONE; lanes].into_boxed_slice(),
            _marker: PhantomData,
        }
    }

    /// Inserts `value` unless an equivalent key is present.
    ///
    /// Returns the handle of the node holding the key and `true` if `value`
    /// was inserted. On a duplicate, `value` is dropped and the existing
    /// node is untouched. Fails with [`Full`] if the arena cannot grow, in
    /// which case nothing is linked.
    pub fn try_insert_unique(&mut self, value: V) -> Result<(Idx, bool), Full<V>> {
        match self.place(value, false, |storage, node| storage.try_insert(node)) {
            Ok(Placed::Inserted(idx)) => Ok((idx, true)),
            Ok(Placed::Existing(idx) | Placed::Replaced(idx, _)) => Ok((idx, false)),
            Err(Full(node)) => Err(Full(node.value)),
        }
    }

    /// Inserts `value`, replacing the value of an equivalent key if present.
    ///
    /// Returns the node handle and the displaced value.
    pub fn try_upsert(&mut self, value: V) -> Result<(Idx, Option<V>), Full<V>> {
        match self.place(value, true, |storage, node| storage.try_insert(node)) {
            Ok(Placed::Inserted(idx) | Placed::Existing(idx)) => Ok((idx, None)),
            Ok(Placed::Replaced(idx, old)) => Ok((idx, Some(old))),
            Err(Full(node)) => Err(Full(node.value)),
        }
    }

    /// Shared insert path.
    ///
    /// The level is sampled and the node allocated before any link changes,
    /// so an allocation failure leaves the structure as it was.
    fn place<E, F>(&mut self, value: V, overwrite: bool, alloc: F) -> Result<Placed<Idx, V>, E>
    where
        F: FnOnce(&mut S, SkipNode<V, Idx>) -> Result<Idx, E>,
    {
        let (update, found) = self.locate(X::key_of(&value));

        if let Some(idx) = found {
            self.update = update;
            if !overwrite {
                return Ok(Placed::Existing(idx));
            }
            let old = core::mem::replace(&mut self.node_mut(idx).value, value);
            return Ok(Placed::Replaced(idx, old));
        }

        let level = self.levels.next_level();
        let idx = match alloc(&mut self.storage, SkipNode::new(value, level)) {
            Ok(idx) => idx,
            Err(err) => {
                self.update = update;
                return Err(err);
            }
        };

        self.link(idx, level, update);
        Ok(Placed::Inserted(idx))
    }

    /// Splices a freshly allocated node of `level` after its predecessors.
    fn link(&mut self, idx: Idx, level: usize, mut update: Box<[Idx]>) {
        if level > self.top_level {
            update[self.top_level + 1..=level].fill(Idx::NONE);
            trace!(from = self.top_level, to = level, "skip list raised top level");
            self.top_level = level;
        }

        for lane in 0..=level {
            let next = self.forward_of(update[lane], lane);
            self.node_mut(idx).forward[lane] = next;
            self.set_forward(update[lane], lane, idx);
        }

        if self.node(idx).forward[0].is_none() {
            self.tail = idx;
        }

        self.len += 1;
        self.update = update;
    }
}

impl<V, X, C, R, S, Idx> SkipList<V, X, C, R, S, Idx>
where
    X: KeyOf<V>,
    C: Comparator<X::Key>,
    R: RngCore,
    S: UnboundedStorage<SkipNode<V, Idx>, Index = Idx>,
    Idx: Index,
{
    /// Inserts `value` unless an equivalent key is present.
    ///
    /// Returns the handle of the node holding the key and `true` if `value`
    /// was inserted. On a duplicate, `value` is dropped and the existing
    /// node is untouched.
    pub fn insert_unique(&mut self, value: V) -> (Idx, bool) {
        match self.place(value, false, |storage, node| {
            Ok::<_, Infallible>(storage.insert(node))
        }) {
            Ok(Placed::Inserted(idx)) => (idx, true),
            Ok(Placed::Existing(idx) | Placed::Replaced(idx, _)) => (idx, false),
            Err(never) => match never {},
        }
    }

    /// Inserts `value`, replacing the value of an equivalent key if present.
    ///
    /// Returns the node handle and the displaced value.
    pub fn upsert(&mut self, value: V) -> (Idx, Option<V>) {
        match self.place(value, true, |storage, node| {
            Ok::<_, Infallible>(storage.insert(node))
        }) {
            Ok(Placed::Inserted(idx) | Placed::Existing(idx)) => (idx, None),
            Ok(Placed::Replaced(idx, old)) => (idx, Some(old)),
            Err(never) => match never {},
        }
    }
}

// ============================================================================
// Trait impls
// ============================================================================

/// Equal when the lane-0 value sequences are equal. The random skeleton is
/// never compared.
impl<V, X, C, R, S, Idx> PartialEq for SkipList<V, X, C, R, S, Idx>
where
    V: PartialEq,
    X: KeyOf<V>,
    C: Comparator<X::Key>,
    S: Storage<SkipNode<V, Idx>, Index = Idx>,
    Idx: Index,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<V, X, C, R, S, Idx> Eq for SkipList<V, X, C, R, S, Idx>
where
    V: Eq,
    X: KeyOf<V>,
    C: Comparator<X::Key>,
    S: Storage<SkipNode<V, Idx>, Index = Idx>,
    Idx: Index,
{
}

impl<V, X, C, R, S, Idx> fmt::Debug for SkipList<V, X, C, R, S, Idx>
where
    V: fmt::Debug,
    X: KeyOf<V>,
    C: Comparator<X::Key>,
    S: Storage<SkipNode<V, Idx>, Index = Idx>,
    Idx: Index,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, V, X, C, R, S, Idx> IntoIterator for &'a SkipList<V, X, C, R, S, Idx>
where
    X: KeyOf<V>,
    C: Comparator<X::Key>,
    S: Storage<SkipNode<V, Idx>, Index = Idx>,
    Idx: Index,
{
    type Item = &'a V;
    type IntoIter = Iter<'a, V, S, Idx>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V, X, C, R, S, Idx> IntoIterator for SkipList<V, X, C, R, S, Idx>
where
    X: KeyOf<V>,
    S: Storage<SkipNode<V, Idx>, Index = Idx>,
    Idx: Index,
{
    type Item = V;
    type IntoIter = IntoIter<V, S, Idx>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            current: self.head[0],
            remaining: self.len,
            storage: self.storage,
            _marker: PhantomData,
        }
    }
}

// ============================================================================
// Iterators
// ============================================================================

/// An iterator over values in key order.
pub struct Iter<'a, V, S, Idx> {
    storage: &'a S,
    current: Idx,
    /// Upper bound on what is left; exact when started from the front.
    remaining: usize,
    _marker: PhantomData<&'a V>,
}

impl<'a, V, S, Idx> Clone for Iter<'a, V, S, Idx>
where
    Idx: Copy,
{
    fn clone(&self) -> Self {
        Self {
            storage: self.storage,
            current: self.current,
            remaining: self.remaining,
            _marker: PhantomData,
        }
    }
}

impl<'a, V: 'a, S, Idx> Iterator for Iter<'a, V, S, Idx>
where
    S: Storage<SkipNode<V, Idx>, Index = Idx>,
    Idx: Index + 'a,
{
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let node = self.storage.get(self.current).expect("invalid index");
        self.current = node.forward[0];
        self.remaining = self.remaining.saturating_sub(1);
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.current.is_none() {
            (0, Some(0))
        } else {
            (1, Some(self.remaining))
        }
    }
}

impl<'a, V: 'a, S, Idx> FusedIterator for Iter<'a, V, S, Idx>
where
    S: Storage<SkipNode<V, Idx>, Index = Idx>,
    Idx: Index + 'a,
{
}

/// A mutable iterator over values in key order.
pub(crate) struct IterMut<'a, V, S, Idx> {
    storage: &'a mut S,
    current: Idx,
    _marker: PhantomData<&'a mut V>,
}

impl<'a, V: 'a, S, Idx> Iterator for IterMut<'a, V, S, Idx>
where
    S: Storage<SkipNode<V, Idx>, Index = Idx>,
    Idx: Index + 'a,
{
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let idx = self.current;

        // Safety: each node is visited once (current advances before
        // return) and the storage is borrowed mutably for 'a, so no other
        // reference to this node exists for 'a.
        let node: &'a mut SkipNode<V, Idx> =
            unsafe { &mut *(self.storage.get_mut(idx).expect("invalid index") as *mut _) };

        self.current = node.forward[0];
        Some(&mut node.value)
    }
}

/// An owning iterator over values in key order.
pub struct IntoIter<V, S, Idx> {
    storage: S,
    current: Idx,
    remaining: usize,
    _marker: PhantomData<V>,
}

impl<V, S, Idx> Iterator for IntoIter<V, S, Idx>
where
    S: Storage<SkipNode<V, Idx>, Index = Idx>,
    Idx: Index,
{
    type Item = V;

    fn next(&mut self) -> Option<V> {
        if self.current.is_none() {
            return None;
        }
        let node = self.storage.remove(self.current).expect("invalid index");
        self.current = node.forward[0];
        self.remaining -= 1;
        Some(node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V, S, Idx> ExactSizeIterator for IntoIter<V, S, Idx>
where
    S: Storage<SkipNode<V, Idx>, Index = Idx>,
    Idx: Index,
{
}


#[cfg(test)]
mod bench_skiplist {
    use super::*;
    use crate::order::Identity;
    use hdrhistogram::Histogram;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use std::time::Instant;

    type BenchList = SkipList<u64, Identity>;

    const WARMUP: usize = 10_000;
    const ITERATIONS: usize = 100_000;

    fn print_histogram(name: &str, hist: &Histogram<u64>) {
        println!(
            "{:24} p50: {:5} ns | p99: {:5} ns | p999: {:6} ns | min: {:4} | max: {:6}",
            name,
            hist.value_at_quantile(0.50),
            hist.value_at_quantile(0.99),
            hist.value_at_quantile(0.999),
            hist.min(),
            hist.max(),
        );
    }

    fn populated(count: usize) -> BenchList {
        let mut list: BenchList = SkipList::new(18, Ascending, SmallRng::seed_from_u64(12345));
        for key in 0..count as u64 {
            list.insert_unique(key * 2);
        }
        list
    }

    #[test]
    #[ignore]
    fn bench_insert_random() {
        let mut list: BenchList = SkipList::new(18, Ascending, SmallRng::seed_from_u64(12345));
        let mut rng = SmallRng::seed_from_u64(99999);
        let mut hist = Histogram::<u64>::new(3).unwrap();

        let keys: Vec<u64> = (0..ITERATIONS)
            .map(|_| rng.random_range(0..1_000_000))
            .collect();

        for i in 0..WARMUP {
            list.insert_unique(keys[i % keys.len()] + 1_000_000);
        }
        list.clear();

        for key in &keys {
            let start = Instant::now();
            list.insert_unique(*key);
            hist.record(start.elapsed().as_nanos() as u64).unwrap();
        }

        print_histogram("insert_random", &hist);
    }

    #[test]
    #[ignore]
    fn bench_find_hit_and_miss() {
        let list = populated(ITERATIONS);
        let mut rng = SmallRng::seed_from_u64(7);
        let mut hit = Histogram::<u64>::new(3).unwrap();
        let mut miss = Histogram::<u64>::new(3).unwrap();

        for _ in 0..ITERATIONS {
            let key = rng.random_range(0..ITERATIONS as u64) * 2;

            let start = Instant::now();
            std::hint::black_box(list.find(&key));
            hit.record(start.elapsed().as_nanos() as u64).unwrap();

            let start = Instant::now();
            std::hint::black_box(list.find(&(key + 1)));
            miss.record(start.elapsed().as_nanos() as u64).unwrap();
        }

        print_histogram("find_hit", &hit);
        print_histogram("find_miss", &miss);
    }

    #[test]
    #[ignore]
    fn bench_remove_random() {
        let mut list = populated(ITERATIONS);
        let mut rng = SmallRng::seed_from_u64(31337);
        let mut hist = Histogram::<u64>::new(3).unwrap();

        for _ in 0..ITERATIONS {
            let key = rng.random_range(0..ITERATIONS as u64) * 2;
            let start = Instant::now();
            std::hint::black_box(list.remove(&key));
            hist.record(start.elapsed().as_nanos() as u64).unwrap();
        }

        print_histogram("remove_random", &hist);
    }
}
