//! Configuration error type shared by the pool and arena crates.

use std::error::Error;
use std::fmt;

/// Errors detected while validating a pool or reclaimer configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The size-class table has no entries.
    EmptySizeClasses,
    /// A size class of zero elements was configured.
    ZeroSizeClass {
        /// Position of the offending entry in the table.
        index: usize,
    },
    /// The size-class table is not strictly ascending.
    SizeClassesNotAscending {
        /// Position of the first entry that is not larger than its predecessor.
        index: usize,
        /// The predecessor's length.
        previous: usize,
        /// The offending length.
        current: usize,
    },
    /// A geometric size-class table was requested with a factor below 2.
    InvalidGrowthFactor {
        /// The configured factor.
        factor: usize,
    },
    /// Buckets must be able to hold at least one buffer.
    ZeroBucketCapacity,
    /// The reclaimer's watcher thread needs a non-empty name.
    EmptyThreadName,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySizeClasses => write!(f, "size-class table is empty"),
            Self::ZeroSizeClass { index } => {
                write!(f, "size class at index {index} has zero length")
            }
            Self::SizeClassesNotAscending {
                index,
                previous,
                current,
            } => {
                write!(
                    f,
                    "size classes must be strictly ascending: index {index} has {current} after {previous}"
                )
            }
            Self::InvalidGrowthFactor { factor } => {
                write!(f, "size-class growth factor must be at least 2, got {factor}")
            }
            Self::ZeroBucketCapacity => write!(f, "bucket capacity must be at least 1"),
            Self::EmptyThreadName => write!(f, "reclaimer thread name is empty"),
        }
    }
}

impl Error for ConfigError {}
