//! Ordered maps and sets on an arena-backed skip list.
//!
//! One generic engine, [`SkipList`], keeps values sorted by a key under a
//! caller-chosen order. Two thin adapters fix how the key is found:
//!
//! ```text
//! SkipMap<K, V>  stores (K, V), ordered by K
//! SkipSet<T>     stores T, ordered by T itself
//! ```
//!
//! # Design
//!
//! Nodes live in a slab and link to each other by integer handle, not by
//! pointer:
//!
//! ```text
//! Storage (slab)  - owns nodes, hands out stable handles
//! SkipList        - header lanes + forward handles per node
//! ```
//!
//! - **Stable handles**: erasing a node never moves another one
//! - **Injected randomness**: levels come from the RNG you pass in, so a
//!   seed reproduces the exact skeleton
//! - **Bounded arenas**: [`BoundedSlab`] caps node count; a full arena
//!   returns the value in [`Full`] and leaves the list untouched
//!
//! # Quick Start
//!
//! ```
//! use nexus_skipmap::{SkipMap, SkipSet};
//!
//! let mut map = SkipMap::new();
//! for key in [7, 9, 2, 8] {
//!     map.insert(key, key * 10);
//! }
//! assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![2, 7, 8, 9]);
//!
//! let mut set: SkipSet<u32> = (0..5).collect();
//! assert!(!set.insert(3));
//! assert!(set.insert(5));
//! assert_eq!(set.len(), 6);
//! ```
//!
//! # Insert Policies
//!
//! Keys are unique. Two inserts are offered and neither is the "default":
//!
//! | Operation | Key present | Key absent |
//! |-----------|-------------|------------|
//! | `insert` / `insert_unique` | no change, returns `false` | inserts |
//! | `upsert` | overwrites, returns the old value | inserts |
//!
//! # Concurrency
//!
//! Containers are plain single-threaded structures. Share them through
//! [`Synchronized`], which holds the whole container behind one
//! reader-writer lock; [`ReadPolicy`] decides whether reads may overlap
//! each other.
//!
//! # Persistence
//!
//! [`SkipMap::dump`] and [`SkipMap::load`] write and read `key:value`
//! lines. See [`persist`] for the format rules.
//!
//! # Logging
//!
//! The crate emits [`tracing`] events (skeleton height changes at `trace`,
//! dump/load summaries at `debug`, skipped lines at `warn`) and never
//! installs a subscriber.

#![warn(missing_docs)]

pub mod builder;
pub mod error;
pub mod index;
pub mod level;
pub mod map;
pub mod order;
pub mod persist;
pub mod set;
pub mod skiplist;
pub mod storage;
pub mod sync;

pub use builder::{DEFAULT_MAX_LEVEL, SkipListBuilder};
pub use error::{ConfigError, PersistError};
pub use index::Index;
pub use level::{DEFAULT_LEVEL_RATIO, LevelGenerator};
pub use map::SkipMap;
pub use order::{Ascending, Comparator, Descending, First, Identity, KeyOf};
pub use persist::{DEFAULT_DELIMITER, LoadStats};
pub use set::SkipSet;
pub use skiplist::{BoundedSkipStorage, SkipList, SkipNode, SlabSkipStorage};
pub use storage::{BoundedSlab, Full, Storage, UnboundedStorage};
pub use sync::{ReadPolicy, Synchronized};
