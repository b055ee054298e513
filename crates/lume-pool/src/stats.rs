//! Optional pool statistics.
//!
//! Counters live behind `Option` on the pool: with
//! [`StatsMode::Disabled`](lume_core::StatsMode) nothing is allocated and
//! every recording site is a single `None` check. Counters use `Cell`
//! because pools are confined to one thread.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Live counters for one bucket.
///
/// Shared (via `Rc`) between the pool and the bucket so the counts
/// survive a bucket-table rebuild.
#[derive(Debug, Default)]
pub(crate) struct BucketStats {
    get_op: Cell<u64>,
    create_op: Cell<u64>,
    return_op: Cell<u64>,
    max_size: Cell<usize>,
}

impl BucketStats {
    pub(crate) fn record_get(&self) {
        self.get_op.set(self.get_op.get() + 1);
    }

    pub(crate) fn record_create(&self) {
        self.create_op.set(self.create_op.get() + 1);
    }

    pub(crate) fn record_return(&self) {
        self.return_op.set(self.return_op.get() + 1);
    }

    pub(crate) fn update_max_size(&self, size: usize) {
        if size > self.max_size.get() {
            self.max_size.set(size);
        }
    }

    pub(crate) fn snapshot(&self, array_size: usize) -> BucketCounters {
        BucketCounters {
            array_size,
            get_op: self.get_op.get(),
            create_op: self.create_op.get(),
            return_op: self.return_op.get(),
            max_size: self.max_size.get(),
        }
    }
}

/// Live counters for a whole pool.
#[derive(Debug)]
pub(crate) struct CacheStats {
    name: String,
    total_initial: Cell<u64>,
    oversize: Cell<u64>,
    resize: Cell<u64>,
    buckets: Box<[Rc<BucketStats>]>,
}

impl CacheStats {
    pub(crate) fn new(name: String, bucket_count: usize) -> Self {
        Self {
            name,
            total_initial: Cell::new(0),
            oversize: Cell::new(0),
            resize: Cell::new(0),
            buckets: (0..bucket_count)
                .map(|_| Rc::new(BucketStats::default()))
                .collect(),
        }
    }

    pub(crate) fn bucket(&self, index: usize) -> Rc<BucketStats> {
        Rc::clone(&self.buckets[index])
    }

    pub(crate) fn record_initial(&self, elements: usize) {
        self.total_initial
            .set(self.total_initial.get() + elements as u64);
    }

    pub(crate) fn record_oversize(&self) {
        self.oversize.set(self.oversize.get() + 1);
    }

    pub(crate) fn record_resize(&self) {
        self.resize.set(self.resize.get() + 1);
    }

    pub(crate) fn snapshot(&self, class_lengths: &[usize]) -> PoolStats {
        PoolStats {
            name: self.name.clone(),
            total_initial: self.total_initial.get(),
            oversize: self.oversize.get(),
            resize: self.resize.get(),
            buckets: self
                .buckets
                .iter()
                .zip(class_lengths)
                .map(|(stats, &len)| stats.snapshot(len))
                .collect(),
        }
    }
}

/// Point-in-time counters for one bucket.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BucketCounters {
    /// The bucket's size class.
    pub array_size: usize,
    /// Buffers requested from the bucket.
    pub get_op: u64,
    /// Requests that found the bucket empty and allocated a new buffer.
    pub create_op: u64,
    /// Buffers accepted back into the bucket (length checked).
    pub return_op: u64,
    /// High-water mark of idle buffers held at once.
    pub max_size: usize,
}

impl BucketCounters {
    /// Requests served from a pooled buffer.
    pub fn hits(&self) -> u64 {
        self.get_op.saturating_sub(self.create_op)
    }
}

/// Point-in-time counters for a pool.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Pool name used in log lines, e.g. `"CleanIntArrayCache"`.
    pub name: String,
    /// Elements allocated for never-pooled initial buffers.
    pub total_initial: u64,
    /// Requests larger than the biggest size class.
    pub oversize: u64,
    /// `widen_array` calls that had to replace the buffer.
    pub resize: u64,
    /// Per-bucket counters in class order.
    pub buckets: Vec<BucketCounters>,
}

impl PoolStats {
    /// Bucket requests served from a pooled buffer.
    pub fn hits(&self) -> u64 {
        self.buckets.iter().map(BucketCounters::hits).sum()
    }

    /// Bucket requests that allocated.
    pub fn misses(&self) -> u64 {
        self.buckets.iter().map(|b| b.create_op).sum()
    }

    /// Largest idle-buffer count seen in any bucket.
    pub fn high_water(&self) -> usize {
        self.buckets.iter().map(|b| b.max_size).max().unwrap_or(0)
    }
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: initial={} oversize={} resize={} hits={} misses={}",
            self.name,
            self.total_initial,
            self.oversize,
            self.resize,
            self.hits(),
            self.misses()
        )?;
        for b in self.buckets.iter().filter(|b| b.get_op > 0 || b.return_op > 0) {
            writeln!(
                f,
                "  [{}] get={} create={} return={} max={}",
                b.array_size, b.get_op, b.create_op, b.return_op, b.max_size
            )?;
        }
        Ok(())
    }
}
