//! The size-classed pool and its rebuildable bucket table.

use std::any::type_name;
use std::cell::{Cell, RefCell};
use std::mem::size_of;
use std::rc::Rc;

use lume_core::ConfigError;

use crate::bucket::{create_array, Bucket, PutOutcome};
use crate::config::PoolConfig;
use crate::reference::Reference;
use crate::stats::{CacheStats, PoolStats};
use crate::PoolElement;

/// A pool of reusable scratch buffers, bucketed by size class.
///
/// Cloning is cheap and yields another handle to the same pool. The pool
/// is confined to one thread (it is neither `Send` nor `Sync`); each
/// rendering context owns its own.
///
/// The bucket table is built on first use. [`trim`](SizeClassPool::trim)
/// drops it (and every idle buffer) to give memory back; the next
/// request rebuilds an empty table transparently.
pub struct SizeClassPool<T> {
    inner: Rc<PoolInner<T>>,
}

struct PoolInner<T> {
    config: PoolConfig,
    buckets: RefCell<Option<Box<[Bucket<T>]>>>,
    table_builds: Cell<u64>,
    stats: Option<CacheStats>,
}

impl<T: PoolElement> SizeClassPool<T> {
    /// Create a pool from a validated configuration.
    pub fn new(config: PoolConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let stats = config.stats.is_enabled().then(|| {
            CacheStats::new(
                format!("{}{}ArrayCache", config.reuse.label(), element_label::<T>()),
                config.size_classes.len(),
            )
        });
        Ok(Self {
            inner: Rc::new(PoolInner {
                config,
                buckets: RefCell::new(None),
                table_builds: Cell::new(0),
                stats,
            }),
        })
    }

    /// The pool's configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// Create a per-use handle owning a fresh, never-pooled buffer of
    /// `initial_size` elements.
    pub fn create_reference(&self, initial_size: usize) -> Reference<T> {
        if let Some(stats) = &self.inner.stats {
            stats.record_initial(initial_size);
        }
        Reference::new(self.clone(), create_array(initial_size))
    }

    /// Drop the bucket table and every idle buffer in it.
    ///
    /// Buffers currently borrowed are unaffected; returning them later
    /// lands in a freshly built table.
    pub fn trim(&self) {
        let dropped = self.inner.buckets.borrow_mut().take();
        if let Some(table) = dropped {
            tracing::debug!(
                pool = self.inner.config.reuse.label(),
                buffers = table.iter().map(Bucket::len).sum::<usize>(),
                "bucket table dropped"
            );
        }
    }

    /// How many times the bucket table has been built (first use plus
    /// one per rebuild after [`trim`](SizeClassPool::trim)).
    pub fn bucket_table_builds(&self) -> u64 {
        self.inner.table_builds.get()
    }

    /// Whether a bucket table currently exists.
    pub fn has_bucket_table(&self) -> bool {
        self.inner.buckets.borrow().is_some()
    }

    /// Number of idle buffers held across all buckets.
    pub fn retained_buffers(&self) -> usize {
        self.inner
            .buckets
            .borrow()
            .as_ref()
            .map_or(0, |table| table.iter().map(Bucket::len).sum())
    }

    /// Bytes held by idle buffers across all buckets.
    pub fn retained_bytes(&self) -> usize {
        self.inner.buckets.borrow().as_ref().map_or(0, |table| {
            table
                .iter()
                .map(|b| b.len() * b.array_size() * size_of::<T>())
                .sum()
        })
    }

    /// Whether `array` is currently idle in any bucket (by address).
    pub fn holds(&self, array: &[T]) -> bool {
        self.inner
            .buckets
            .borrow()
            .as_ref()
            .is_some_and(|table| table.iter().any(|b| b.holds(array)))
    }

    /// Snapshot of the statistics counters, if collection is enabled.
    pub fn stats(&self) -> Option<PoolStats> {
        self.inner
            .stats
            .as_ref()
            .map(|s| s.snapshot(self.inner.config.size_classes.lengths()))
    }

    /// Largest length served from buckets.
    pub(crate) fn max_array_size(&self) -> usize {
        self.inner.config.size_classes.max_len()
    }

    /// Borrow a buffer for `length` elements: pooled when it fits a size
    /// class, otherwise a one-off allocation of exactly `length`.
    pub(crate) fn take(&self, length: usize) -> Box<[T]> {
        match self.inner.config.size_classes.class_for(length) {
            Some(index) => self.with_buckets(|table| table[index].get_array()),
            None => {
                if let Some(stats) = &self.inner.stats {
                    stats.record_oversize();
                }
                tracing::debug!(
                    pool = self.inner.config.reuse.label(),
                    length,
                    "oversized array request"
                );
                create_array(length)
            }
        }
    }

    /// Return a non-initial buffer to the bucket for its length.
    ///
    /// The buffer goes to the smallest class able to hold it; if its
    /// length is not exactly that class, the bucket rejects it.
    pub(crate) fn give_back(&self, array: Box<[T]>) -> PutOutcome {
        match self.inner.config.size_classes.class_for(array.len()) {
            Some(index) => self.with_buckets(|table| table[index].put_array(array)),
            None => PutOutcome::Dropped,
        }
    }

    pub(crate) fn record_resize(&self) {
        if let Some(stats) = &self.inner.stats {
            stats.record_resize();
        }
    }

    fn with_buckets<R>(&self, f: impl FnOnce(&mut [Bucket<T>]) -> R) -> R {
        let mut slot = self.inner.buckets.borrow_mut();
        let table = slot.get_or_insert_with(|| self.build_table());
        f(table)
    }

    fn build_table(&self) -> Box<[Bucket<T>]> {
        let config = &self.inner.config;
        self.inner.table_builds.set(self.inner.table_builds.get() + 1);
        config
            .size_classes
            .lengths()
            .iter()
            .enumerate()
            .map(|(index, &len)| {
                Bucket::new(
                    len,
                    config.bucket_capacity,
                    config.reuse,
                    config.debug_checks,
                    self.inner.stats.as_ref().map(|s| s.bucket(index)),
                )
            })
            .collect()
    }
}

impl<T> Clone for SizeClassPool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: PoolElement> Default for SizeClassPool<T> {
    fn default() -> Self {
        Self {
            inner: Rc::new(PoolInner {
                config: PoolConfig::default(),
                buckets: RefCell::new(None),
                table_builds: Cell::new(0),
                stats: None,
            }),
        }
    }
}

fn element_label<T>() -> &'static str {
    match type_name::<T>() {
        "u8" | "i8" => "Byte",
        "i32" | "u32" => "Int",
        "f32" => "Float",
        "f64" => "Double",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SizeClasses;
    use lume_core::{ReuseMode, StatsMode};

    fn small_config() -> PoolConfig {
        PoolConfig {
            size_classes: SizeClasses::from_lengths(vec![4, 16, 64]).unwrap(),
            bucket_capacity: 2,
            stats: StatsMode::Enabled,
            ..PoolConfig::new(ReuseMode::Clean)
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let config = PoolConfig {
            bucket_capacity: 0,
            ..PoolConfig::default()
        };
        assert!(matches!(
            SizeClassPool::<i32>::new(config),
            Err(ConfigError::ZeroBucketCapacity)
        ));
    }

    #[test]
    fn table_is_built_lazily() {
        let pool = SizeClassPool::<i32>::new(small_config()).unwrap();
        assert!(!pool.has_bucket_table());
        assert_eq!(pool.bucket_table_builds(), 0);
        let array = pool.take(10);
        assert_eq!(array.len(), 16);
        assert!(pool.has_bucket_table());
        assert_eq!(pool.bucket_table_builds(), 1);
    }

    #[test]
    fn trim_releases_idle_buffers_and_rebuilds() {
        let pool = SizeClassPool::<i32>::new(small_config()).unwrap();
        let array = pool.take(4);
        assert_eq!(pool.give_back(array), PutOutcome::Stored);
        assert_eq!(pool.retained_buffers(), 1);
        assert_eq!(pool.retained_bytes(), 4 * size_of::<i32>());

        pool.trim();
        assert!(!pool.has_bucket_table());
        assert_eq!(pool.retained_buffers(), 0);

        let again = pool.take(4);
        assert_eq!(again.len(), 4);
        assert_eq!(pool.bucket_table_builds(), 2);
    }

    #[test]
    fn oversize_requests_bypass_buckets() {
        let pool = SizeClassPool::<f32>::new(small_config()).unwrap();
        let big = pool.take(65);
        assert_eq!(big.len(), 65);
        assert_eq!(pool.give_back(big), PutOutcome::Dropped);
        let stats = pool.stats().unwrap();
        assert_eq!(stats.oversize, 1);
        assert_eq!(stats.misses(), 0);
    }

    #[test]
    fn foreign_length_is_rejected_by_bucket() {
        let pool = SizeClassPool::<u8>::new(small_config()).unwrap();
        let odd = vec![0u8; 10].into_boxed_slice();
        assert_eq!(pool.give_back(odd), PutOutcome::Rejected);
        assert_eq!(pool.retained_buffers(), 0);
    }

    #[test]
    fn stats_name_reflects_flavour() {
        let pool = SizeClassPool::<i32>::new(small_config()).unwrap();
        assert_eq!(pool.stats().unwrap().name, "CleanIntArrayCache");
        let dirty = SizeClassPool::<f64>::new(PoolConfig {
            stats: StatsMode::Enabled,
            ..PoolConfig::new(ReuseMode::Dirty)
        })
        .unwrap();
        assert_eq!(dirty.stats().unwrap().name, "DirtyDoubleArrayCache");
    }

    #[test]
    fn stats_disabled_yields_none() {
        let pool = SizeClassPool::<i32>::default();
        assert!(pool.stats().is_none());
    }

    #[test]
    fn clones_share_buckets() {
        let pool = SizeClassPool::<i32>::new(small_config()).unwrap();
        let other = pool.clone();
        let array = pool.take(16);
        let ptr = array.as_ptr();
        other.give_back(array);
        let again = pool.take(16);
        assert_eq!(again.as_ptr(), ptr);
    }
}
