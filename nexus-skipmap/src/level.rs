//! Random level assignment.
//!
//! A new node's level is drawn from a geometric distribution: start at 1 and
//! keep climbing while a coin comes up heads, stopping at `max_level`. A
//! node of level `L` is linked into lanes `0..=L`.
//!
//! Rather than flipping one coin per step, one 64-bit draw is taken and its
//! trailing one bits are counted. Each bit is an independent fair coin, so
//! `P(level >= k) = 2^-(k-1)` with the default ratio. A ratio of `2^d`
//! consumes `d` bits per step, giving `P(level >= k) = ratio^-(k-1)`.
//!
//! The generator owns its RNG so runs are reproducible from a seed.

use rand_core::RngCore;

/// Default promotion ratio (p = 1/2).
pub const DEFAULT_LEVEL_RATIO: u32 = 2;

/// Draws node levels from an injected random source.
#[derive(Debug, Clone)]
pub struct LevelGenerator<R> {
    rng: R,
    max_level: usize,
    /// log2 of the level ratio: coin bits consumed per promotion.
    bits_per_step: u32,
}

impl<R: RngCore> LevelGenerator<R> {
    /// Creates a generator producing levels in `1..=max_level`.
    ///
    /// `level_ratio` must be a power of two and at least 2; callers validate
    /// it (see [`SkipListBuilder`](crate::SkipListBuilder)).
    pub fn new(rng: R, max_level: usize, level_ratio: u32) -> Self {
        debug_assert!(max_level >= 1);
        debug_assert!(level_ratio >= 2 && level_ratio.is_power_of_two());
        Self {
            rng,
            max_level,
            bits_per_step: level_ratio.trailing_zeros(),
        }
    }
}

impl<R> LevelGenerator<R> {
    /// Returns the upper bound on generated levels.
    #[inline]
    pub fn max_level(&self) -> usize {
        self.max_level
    }

    /// Returns the configured level ratio.
    #[inline]
    pub fn level_ratio(&self) -> u32 {
        1 << self.bits_per_step
    }
}

impl<R: RngCore> LevelGenerator<R> {
    /// Samples the level for a new node.
    #[inline]
    pub fn next_level(&mut self) -> usize {
        let heads = self.rng.next_u64().trailing_ones() / self.bits_per_step;
        (1 + heads as usize).min(self.max_level)
    }
}
