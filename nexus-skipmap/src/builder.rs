//! Fallible construction with validated settings.
//!
//! ```
//! use nexus_skipmap::{Ascending, SkipListBuilder, SkipMap};
//!
//! let mut map: SkipMap<u64, &str> = SkipListBuilder::default()
//!     .max_level(12)
//!     .seed(42)
//!     .build_map(Ascending)?;
//!
//! map.insert(1, "one");
//! assert_eq!(map.get(&1), Some(&"one"));
//! # Ok::<(), nexus_skipmap::ConfigError>(())
//! ```

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand_core::RngCore;
use tracing::debug;

use crate::error::ConfigError;
use crate::level::{DEFAULT_LEVEL_RATIO, LevelGenerator};
use crate::map::SkipMap;
use crate::order::{Comparator, First, Identity, KeyOf};
use crate::set::SkipSet;
use crate::skiplist::{BoundedSkipStorage, SkipList};
use crate::storage::BoundedSlab;
use crate::Index;

/// Default highest lane a node may reach.
pub const DEFAULT_MAX_LEVEL: usize = 18;

/// Builder for skip lists, maps and sets.
///
/// Settings are checked when building; nothing is validated in the
/// setters.
#[derive(Clone, Debug)]
pub struct SkipListBuilder {
    max_level: usize,
    level_ratio: u32,
    capacity: Option<usize>,
    seed: Option<u64>,
}

impl Default for SkipListBuilder {
    fn default() -> Self {
        Self {
            max_level: DEFAULT_MAX_LEVEL,
            level_ratio: DEFAULT_LEVEL_RATIO,
            capacity: None,
            seed: None,
        }
    }
}

impl SkipListBuilder {
    /// Highest lane a node may reach. Default: 18.
    pub fn max_level(mut self, max_level: usize) -> Self {
        self.max_level = max_level;
        self
    }

    /// Promotion ratio: each extra level is `1/ratio` as likely as the one
    /// below. Must be a power of two. Default: 2.
    pub fn level_ratio(mut self, ratio: u32) -> Self {
        self.level_ratio = ratio;
        self
    }

    /// Node slots to pre-allocate. Growable builds can exceed it; bounded
    /// builds are capped at it.
    pub fn capacity(mut self, nodes: usize) -> Self {
        self.capacity = Some(nodes);
        self
    }

    /// Seeds level sampling for reproducible skeletons. Default: seeded
    /// from the OS.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_level == 0 {
            return Err(ConfigError::ZeroMaxLevel);
        }
        if self.level_ratio < 2 || !self.level_ratio.is_power_of_two() {
            return Err(ConfigError::InvalidLevelRatio(self.level_ratio));
        }
        Ok(())
    }

    fn rng(&self) -> SmallRng {
        match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        }
    }

    fn levels<R: RngCore>(&self, rng: R) -> LevelGenerator<R> {
        LevelGenerator::new(rng, self.max_level, self.level_ratio)
    }

    /// Builds a growable skip list.
    pub fn build<V, X, C>(self, comparator: C) -> Result<SkipList<V, X, C>, ConfigError>
    where
        X: KeyOf<V>,
        C: Comparator<X::Key>,
    {
        let rng = self.rng();
        self.build_with_rng(comparator, rng)
    }

    /// Builds a growable skip list drawing levels from `rng`.
    pub fn build_with_rng<V, X, C, R>(
        self,
        comparator: C,
        rng: R,
    ) -> Result<SkipList<V, X, C, R>, ConfigError>
    where
        X: KeyOf<V>,
        C: Comparator<X::Key>,
        R: RngCore,
    {
        self.validate()?;
        let storage = match self.capacity {
            Some(nodes) => slab::Slab::with_capacity(nodes),
            None => slab::Slab::new(),
        };
        debug!(
            max_level = self.max_level,
            level_ratio = self.level_ratio,
            capacity = ?self.capacity,
            "building skip list"
        );
        Ok(SkipList::with_storage(storage, self.levels(rng), comparator))
    }

    /// Builds a skip list capped at `capacity` nodes with `Idx` handles.
    pub fn build_bounded<V, X, C, Idx>(
        self,
        comparator: C,
    ) -> Result<SkipList<V, X, C, SmallRng, BoundedSkipStorage<V, Idx>, Idx>, ConfigError>
    where
        X: KeyOf<V>,
        C: Comparator<X::Key>,
        Idx: Index,
    {
        self.validate()?;
        let capacity = match self.capacity {
            Some(0) | None => return Err(ConfigError::ZeroCapacity),
            Some(nodes) => nodes,
        };
        let max = Idx::NONE.as_usize();
        if capacity > max {
            return Err(ConfigError::CapacityExceedsIndex { capacity, max });
        }
        debug!(
            max_level = self.max_level,
            level_ratio = self.level_ratio,
            capacity,
            "building bounded skip list"
        );
        let rng = self.rng();
        Ok(SkipList::with_storage(
            BoundedSlab::with_capacity(capacity),
            self.levels(rng),
            comparator,
        ))
    }

    /// Builds an empty map.
    pub fn build_map<K, V, C>(self, comparator: C) -> Result<SkipMap<K, V, C>, ConfigError>
    where
        C: Comparator<K>,
    {
        self.build::<(K, V), First, C>(comparator).map(SkipMap::from_list)
    }

    /// Builds an empty set.
    pub fn build_set<T, C>(self, comparator: C) -> Result<SkipSet<T, C>, ConfigError>
    where
        C: Comparator<T>,
    {
        self.build::<T, Identity, C>(comparator).map(SkipSet::from_list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{Ascending, Descending};

    #[test]
    fn defaults() {
        let list: SkipList<u64, Identity> = SkipListBuilder::default().build(Ascending).unwrap();
        assert_eq!(list.max_level(), DEFAULT_MAX_LEVEL);
        assert!(list.is_empty());
    }

    #[test]
    fn rejects_zero_max_level() {
        let err = SkipListBuilder::default()
            .max_level(0)
            .build::<u64, Identity, _>(Ascending)
            .unwrap_err();
        assert_eq!(err, ConfigError::ZeroMaxLevel);
    }

    #[test]
    fn rejects_bad_ratio() {
        for ratio in [0, 1, 3, 6] {
            let err = SkipListBuilder::default()
                .level_ratio(ratio)
                .build::<u64, Identity, _>(Ascending)
                .unwrap_err();
            assert_eq!(err, ConfigError::InvalidLevelRatio(ratio));
        }
    }

    #[test]
    fn bounded_requires_capacity() {
        let err = SkipListBuilder::default()
            .build_bounded::<u64, Identity, _, u32>(Ascending)
            .unwrap_err();
        assert_eq!(err, ConfigError::ZeroCapacity);

        let err = SkipListBuilder::default()
            .capacity(300)
            .build_bounded::<u64, Identity, _, u8>(Ascending)
            .unwrap_err();
        assert_eq!(err, ConfigError::CapacityExceedsIndex { capacity: 300, max: 255 });
    }

    #[test]
    fn bounded_build_caps_inserts() {
        let mut list = SkipListBuilder::default()
            .capacity(2)
            .seed(1)
            .build_bounded::<u64, Identity, _, u16>(Ascending)
            .unwrap();

        assert!(list.try_insert_unique(1).is_ok());
        assert!(list.try_insert_unique(2).is_ok());
        assert!(list.try_insert_unique(3).is_err());
    }

    #[test]
    fn same_seed_same_skeleton() {
        let build = || {
            let mut list: SkipList<u64, Identity> = SkipListBuilder::default()
                .seed(7)
                .max_level(8)
                .build(Ascending)
                .unwrap();
            for key in 0..200 {
                list.insert_unique(key);
            }
            list.levels_with(|v| v.to_string())
        };

        assert_eq!(build(), build());
    }

    #[test]
    fn map_and_set() {
        let mut map: SkipMap<u64, u64, Descending> =
            SkipListBuilder::default().seed(3).build_map(Descending).unwrap();
        map.insert(1, 10);
        map.insert(2, 20);
        assert_eq!(map.first(), Some((&2, &20)));

        let mut set: SkipSet<u64> = SkipListBuilder::default()
            .level_ratio(4)
            .build_set(Ascending)
            .unwrap();
        set.insert(5);
        assert!(set.contains(&5));
    }

    #[test]
    fn level_ratio_reaches_the_list() {
        let list: SkipList<u64, Identity> = SkipListBuilder::default()
            .level_ratio(8)
            .build(Ascending)
            .unwrap();
        assert_eq!(list.level_ratio(), 8);

        let list: SkipList<u64, Identity> = SkipListBuilder::default().build(Ascending).unwrap();
        assert_eq!(list.level_ratio(), DEFAULT_LEVEL_RATIO);
    }
}
