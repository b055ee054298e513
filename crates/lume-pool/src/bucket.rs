//! Fixed-capacity LIFO store of same-length buffers.

use std::rc::Rc;

use lume_core::ReuseMode;

use crate::stats::BucketStats;
use crate::PoolElement;

/// What happened to a buffer handed to [`Bucket::put_array`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PutOutcome {
    /// The buffer is now idle in the bucket.
    Stored,
    /// The buffer's length does not match the bucket's class; it was
    /// dropped to keep the bucket homogeneous.
    Rejected,
    /// The bucket was full; the buffer was dropped.
    Dropped,
}

/// Idle buffers of exactly one length, reused most-recently-returned first.
///
/// Invariant: every stored buffer has length [`array_size`](Bucket::array_size).
pub struct Bucket<T> {
    array_size: usize,
    capacity: usize,
    arrays: Vec<Box<[T]>>,
    reuse: ReuseMode,
    debug_checks: bool,
    stats: Option<Rc<BucketStats>>,
}

impl<T: PoolElement> Bucket<T> {
    pub(crate) fn new(
        array_size: usize,
        capacity: usize,
        reuse: ReuseMode,
        debug_checks: bool,
        stats: Option<Rc<BucketStats>>,
    ) -> Self {
        Self {
            array_size,
            capacity,
            arrays: Vec::with_capacity(capacity),
            reuse,
            debug_checks,
            stats,
        }
    }

    /// Pop the most recently returned buffer, or allocate a fresh one of
    /// exactly [`array_size`](Bucket::array_size) elements.
    pub fn get_array(&mut self) -> Box<[T]> {
        if let Some(stats) = &self.stats {
            stats.record_get();
        }
        if let Some(array) = self.arrays.pop() {
            return array;
        }
        if let Some(stats) = &self.stats {
            stats.record_create();
        }
        create_array(self.array_size)
    }

    /// Push a buffer back for reuse.
    ///
    /// A wrong-length buffer is logged and dropped; a buffer arriving at
    /// a full bucket is dropped. Neither is an error for the caller.
    pub fn put_array(&mut self, array: Box<[T]>) -> PutOutcome {
        if array.len() != self.array_size {
            tracing::warn!(
                pool = self.reuse.label(),
                expected = self.array_size,
                actual = array.len(),
                "bad array length returned to bucket"
            );
            return PutOutcome::Rejected;
        }
        if let Some(stats) = &self.stats {
            stats.record_return();
        }
        if self.arrays.len() < self.capacity {
            self.arrays.push(array);
            if let Some(stats) = &self.stats {
                stats.update_max_size(self.arrays.len());
            }
            PutOutcome::Stored
        } else {
            if self.debug_checks {
                tracing::trace!(
                    pool = self.reuse.label(),
                    array_size = self.array_size,
                    capacity = self.capacity,
                    "bucket capacity exceeded"
                );
            }
            PutOutcome::Dropped
        }
    }

    /// Length of every buffer this bucket stores.
    pub fn array_size(&self) -> usize {
        self.array_size
    }

    /// Maximum number of idle buffers retained.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of idle buffers currently held.
    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    /// Returns `true` if no idle buffer is held.
    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Whether `array` is (by address) one of the idle buffers.
    pub fn holds(&self, array: &[T]) -> bool {
        self.arrays
            .iter()
            .any(|held| std::ptr::eq(held.as_ptr(), array.as_ptr()))
    }
}

/// Allocate a zero-initialised buffer of `len` elements.
pub(crate) fn create_array<T: PoolElement>(len: usize) -> Box<[T]> {
    vec![T::default(); len].into_boxed_slice()
}
