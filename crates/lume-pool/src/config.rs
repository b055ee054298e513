//! Pool configuration: size-class table, growth policy, and switches.

use std::fmt;

use lume_core::{ConfigError, ReuseMode, StatsMode};

/// Fixed ascending table of buffer lengths (in elements).
///
/// Every pooled buffer has exactly one of these lengths. A request for
/// `n` elements is served from the smallest class `>= n`; requests above
/// [`max_len`](SizeClasses::max_len) bypass the pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SizeClasses {
    lengths: Box<[usize]>,
}

impl SizeClasses {
    /// Length of the smallest default class.
    pub const DEFAULT_MIN_LEN: usize = 4096;

    /// Ratio between consecutive default classes.
    pub const DEFAULT_FACTOR: usize = 4;

    /// Number of default classes (4K .. 64M elements).
    pub const DEFAULT_COUNT: usize = 8;

    /// Build a geometric table: `min, min*factor, min*factor², ...` with
    /// `count` entries.
    pub fn geometric(min: usize, factor: usize, count: usize) -> Result<Self, ConfigError> {
        if factor < 2 {
            return Err(ConfigError::InvalidGrowthFactor { factor });
        }
        let mut lengths = Vec::with_capacity(count);
        let mut len = min;
        for _ in 0..count {
            lengths.push(len);
            len = len.saturating_mul(factor);
        }
        Self::from_lengths(lengths)
    }

    /// Build a table from explicit lengths.
    ///
    /// The lengths must be non-empty, non-zero and strictly ascending.
    pub fn from_lengths(lengths: Vec<usize>) -> Result<Self, ConfigError> {
        if lengths.is_empty() {
            return Err(ConfigError::EmptySizeClasses);
        }
        for (index, &len) in lengths.iter().enumerate() {
            if len == 0 {
                return Err(ConfigError::ZeroSizeClass { index });
            }
            if index > 0 && len <= lengths[index - 1] {
                return Err(ConfigError::SizeClassesNotAscending {
                    index,
                    previous: lengths[index - 1],
                    current: len,
                });
            }
        }
        Ok(Self {
            lengths: lengths.into_boxed_slice(),
        })
    }

    /// Number of classes (and therefore buckets).
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    /// Always `false`: construction rejects empty tables.
    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// The largest cacheable length.
    pub fn max_len(&self) -> usize {
        self.lengths[self.lengths.len() - 1]
    }

    /// Length of the class at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn class_len(&self, index: usize) -> usize {
        self.lengths[index]
    }

    /// Index of the smallest class that can hold `length` elements, or
    /// `None` if `length` exceeds [`max_len`](SizeClasses::max_len).
    pub fn class_for(&self, length: usize) -> Option<usize> {
        let index = self.lengths.partition_point(|&class| class < length);
        (index < self.lengths.len()).then_some(index)
    }

    /// The class lengths in ascending order.
    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }
}

impl Default for SizeClasses {
    fn default() -> Self {
        let mut lengths = Vec::with_capacity(Self::DEFAULT_COUNT);
        let mut len = Self::DEFAULT_MIN_LEN;
        for _ in 0..Self::DEFAULT_COUNT {
            lengths.push(len);
            len *= Self::DEFAULT_FACTOR;
        }
        Self {
            lengths: lengths.into_boxed_slice(),
        }
    }
}

/// Injectable growth policy: `(used, need) -> candidate length`.
///
/// Used by `widen_array` to size the replacement buffer. The policy
/// should be monotonic in both arguments. The pool never trusts it to
/// cover `need` on its own: [`new_size`](GrowthPolicy::new_size) clamps
/// the candidate up to `need`.
#[derive(Clone, Copy)]
pub struct GrowthPolicy {
    grow: fn(usize, usize) -> usize,
}

impl GrowthPolicy {
    /// Below this many used elements the default policy doubles; above
    /// it, growth is additive (at least this many elements, or half).
    pub const DOUBLING_THRESHOLD: usize = 1 << 20;

    /// The default policy rounds its result up to a multiple of this.
    pub const ALIGNMENT: usize = 1024;

    /// Wrap a growth function.
    pub const fn new(grow: fn(usize, usize) -> usize) -> Self {
        Self { grow }
    }

    /// The raw candidate returned by the policy function.
    pub fn candidate(&self, used: usize, need: usize) -> usize {
        (self.grow)(used, need)
    }

    /// The replacement length: the candidate, but never less than `need`.
    pub fn new_size(&self, used: usize, need: usize) -> usize {
        self.candidate(used, need).max(need)
    }
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self::new(default_growth)
    }
}

impl fmt::Debug for GrowthPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrowthPolicy").finish_non_exhaustive()
    }
}

/// Default growth: ×2 below [`GrowthPolicy::DOUBLING_THRESHOLD`], then
/// by at least the threshold and eventually ×1.5; never less than `need`,
/// rounded up to [`GrowthPolicy::ALIGNMENT`].
///
/// The additive floor above the threshold keeps the curve monotonic
/// across the switch from doubling.
pub fn default_growth(used: usize, need: usize) -> usize {
    let grown = if used < GrowthPolicy::DOUBLING_THRESHOLD {
        used.saturating_mul(2)
    } else {
        used.saturating_add((used / 2).max(GrowthPolicy::DOUBLING_THRESHOLD))
    };
    let target = grown.max(need);
    target
        .checked_next_multiple_of(GrowthPolicy::ALIGNMENT)
        .unwrap_or(target)
}

/// Configuration for a [`SizeClassPool`](crate::SizeClassPool).
///
/// Validated at pool construction; immutable afterwards.
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Buffer lengths, one bucket per class.
    pub size_classes: SizeClasses,

    /// Maximum number of idle buffers a bucket retains. Buffers returned
    /// to a full bucket are dropped. Default: 8.
    pub bucket_capacity: usize,

    /// Whether returned buffers are zero-filled over their used range.
    pub reuse: ReuseMode,

    /// Replacement sizing for `widen_array`.
    pub growth: GrowthPolicy,

    /// Statistics collection switch.
    pub stats: StatsMode,

    /// Verify cleared buffers and log capacity overflows.
    ///
    /// Costs a full scan of every cleared buffer; meant for debugging
    /// pool misuse, not production.
    pub debug_checks: bool,
}

impl PoolConfig {
    /// Default bucket capacity.
    pub const DEFAULT_BUCKET_CAPACITY: usize = 8;

    /// Default configuration with the given reuse mode.
    pub fn new(reuse: ReuseMode) -> Self {
        Self {
            size_classes: SizeClasses::default(),
            bucket_capacity: Self::DEFAULT_BUCKET_CAPACITY,
            reuse,
            growth: GrowthPolicy::default(),
            stats: StatsMode::Disabled,
            debug_checks: false,
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size_classes.is_empty() {
            return Err(ConfigError::EmptySizeClasses);
        }
        if self.bucket_capacity == 0 {
            return Err(ConfigError::ZeroBucketCapacity);
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(ReuseMode::Clean)
    }
}
