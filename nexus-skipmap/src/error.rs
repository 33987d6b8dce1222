//! Error types for construction and persistence.
//!
//! Allocation failure is not here: a full arena hands the rejected value
//! back through [`Full`](crate::Full).

use thiserror::Error;

/// Invalid [`SkipListBuilder`](crate::SkipListBuilder) settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `max_level` was 0; every node occupies at least lanes 0 and 1.
    #[error("max_level must be at least 1")]
    ZeroMaxLevel,

    /// The level ratio was below 2 or not a power of two.
    #[error("level ratio must be a power of two >= 2, got {0}")]
    InvalidLevelRatio(u32),

    /// A bounded arena was requested with no slots.
    #[error("capacity must be > 0")]
    ZeroCapacity,

    /// The capacity does not fit below the index type's sentinel.
    #[error("capacity {capacity} exceeds index maximum {max}")]
    CapacityExceedsIndex {
        /// Requested slots.
        capacity: usize,
        /// Largest capacity the index type can address.
        max: usize,
    },
}

/// Failure while dumping or loading delimited text.
///
/// Malformed lines are not errors; they are skipped and counted in
/// [`LoadStats`](crate::LoadStats).
#[derive(Debug, Error)]
pub enum PersistError {
    /// The underlying reader, writer or file failed.
    #[error("persistence I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// An empty delimiter cannot split a line.
    #[error("delimiter must not be empty")]
    EmptyDelimiter,
}
