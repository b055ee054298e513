//! Per-use handle routing buffer requests to the right bucket.

use crate::bucket::PutOutcome;
use crate::pool::SizeClassPool;
use crate::PoolElement;

/// A per-use handle into a [`SizeClassPool`].
///
/// Owns one "initial" buffer that is never pooled, so the caller always
/// has a buffer of at least `initial_size` elements without touching the
/// shared buckets. Larger needs are met with [`widen_array`], and every
/// borrowed buffer goes back through [`put_array`], which hands the
/// initial buffer back as the caller's continuing buffer.
///
/// The initial buffer lives in a slot inside the reference while the
/// caller is not using it. While it is lent out it is recognised by
/// address when handed back, and is parked in that slot again rather than
/// in a bucket. A zero-length initial is never matched by address; any
/// empty box handed back while it is lent out takes its place.
///
/// Dropping a lent initial forfeits it: once its address shows up on a
/// pooled buffer, the reference stops recognising it and `put_array`
/// returns `None` from then on.
///
/// [`widen_array`]: Reference::widen_array
/// [`put_array`]: Reference::put_array
pub struct Reference<T: PoolElement> {
    pool: SizeClassPool<T>,
    initial: Option<Box<[T]>>,
    // `None` for an empty or forfeited initial.
    initial_addr: Option<usize>,
    initial_len: usize,
}

impl<T: PoolElement> Reference<T> {
    pub(crate) fn new(pool: SizeClassPool<T>, initial: Box<[T]>) -> Self {
        Self {
            pool,
            initial_addr: (!initial.is_empty()).then(|| initial.as_ptr() as usize),
            initial_len: initial.len(),
            initial: Some(initial),
        }
    }

    /// Lend out the initial buffer.
    ///
    /// Returns `None` if it is already lent out.
    pub fn take_initial(&mut self) -> Option<Box<[T]>> {
        self.initial.take()
    }

    /// Length of the initial buffer.
    pub fn initial_len(&self) -> usize {
        self.initial_len
    }

    /// Whether the initial buffer is parked in the reference.
    pub fn has_initial(&self) -> bool {
        self.initial.is_some()
    }

    /// The initial buffer, if it is parked in the reference.
    pub fn initial(&self) -> Option<&[T]> {
        self.initial.as_deref()
    }

    /// Whether `array` is this reference's initial buffer, lent out and
    /// not yet handed back.
    pub fn is_initial(&self, array: &[T]) -> bool {
        self.initial.is_none()
            && array.len() == self.initial_len
            && self.initial_addr == Some(array.as_ptr() as usize)
    }

    /// The pool this reference draws from.
    pub fn pool(&self) -> &SizeClassPool<T> {
        &self.pool
    }

    /// Borrow a buffer of at least `length` elements.
    ///
    /// Lengths up to the largest size class come from the matching
    /// bucket (length = that class). Longer requests get a one-off
    /// buffer of exactly `length` that is never cached.
    pub fn get_array(&mut self, length: usize) -> Box<[T]> {
        let array = self.pool.take(length);
        if self.initial.is_none() && self.initial_addr == Some(array.as_ptr() as usize) {
            // Two live buffers never share an address, so the lent initial was dropped.
            tracing::debug!(length = self.initial_len, "lent initial buffer forfeited");
            self.initial_addr = None;
        }
        array
    }

    /// Make sure `array` can hold `need` elements.
    ///
    /// Returns `array` unchanged when it is already long enough.
    /// Otherwise fetches a replacement sized by the pool's growth
    /// policy, copies the first `used` elements, returns `array` to the
    /// pool (cleared over `[0, used)` under clean reuse) and returns the
    /// replacement.
    pub fn widen_array(&mut self, array: Box<[T]>, used: usize, need: usize) -> Box<[T]> {
        let length = array.len();
        if length >= need {
            return array;
        }
        debug_assert!(used <= length, "used {used} exceeds array length {length}");
        let used = used.min(length);
        self.pool.record_resize();

        let new_size = self.pool.config().growth.new_size(used, need);
        let mut res = self.get_array(new_size);
        res[..used].copy_from_slice(&array[..used]);

        self.recycle(array, 0, used);

        tracing::debug!(
            pool = self.pool.config().reuse.label(),
            new_length = res.len(),
            used,
            length,
            need,
            "widened array"
        );
        res
    }

    /// Return a borrowed buffer, cleaning `[from, to)` under clean reuse.
    ///
    /// Non-initial buffers within the cacheable range go to the bucket
    /// for their exact length; oversized ones are dropped. Returns the
    /// initial buffer for the caller to continue with, or `None` if the
    /// caller still holds it elsewhere.
    pub fn put_array(&mut self, array: Box<[T]>, from: usize, to: usize) -> Option<Box<[T]>> {
        self.recycle(array, from, to);
        self.initial.take()
    }

    /// [`put_array`](Reference::put_array) over the whole buffer, for
    /// buffers whose used extent is unknown.
    pub fn put_all(&mut self, array: Box<[T]>) -> Option<Box<[T]>> {
        let len = array.len();
        self.put_array(array, 0, len)
    }

    fn recycle(&mut self, mut array: Box<[T]>, from: usize, to: usize) {
        if array.is_empty() {
            // Empty boxes are interchangeable; one refills a lent empty initial.
            if self.initial_len == 0 && self.initial.is_none() {
                self.initial = Some(array);
            }
            return;
        }
        let config = self.pool.config();
        let cacheable = array.len() <= self.pool.max_array_size();
        if cacheable && config.reuse.is_clean() && to != 0 {
            fill(&mut array, from, to, T::default(), config.debug_checks);
        }
        if self.is_initial(&array) {
            self.initial = Some(array);
        } else if cacheable && self.pool.give_back(array) == PutOutcome::Rejected {
            tracing::debug!(from, to, "foreign buffer dropped");
        }
    }
}

/// Set `array[from..to]` to `value`, clamping the range to the buffer.
///
/// With `check`, the whole buffer is verified afterwards; a buffer that
/// still holds stale data outside the range is logged and fully reset.
fn fill<T: PoolElement>(array: &mut [T], from: usize, to: usize, value: T, check: bool) {
    let to = to.min(array.len());
    let from = from.min(to);
    array[from..to].fill(value);
    if check {
        if let Some(index) = array.iter().position(|&v| v != value) {
            tracing::error!(
                index,
                found = ?array[index],
                from,
                to,
                "corrupted buffer: stale value outside the cleared range"
            );
            array.fill(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GrowthPolicy, PoolConfig, SizeClasses};
    use lume_core::{ReuseMode, StatsMode};

    fn pool(reuse: ReuseMode) -> SizeClassPool<i32> {
        SizeClassPool::new(PoolConfig {
            size_classes: SizeClasses::from_lengths(vec![8, 32, 128]).unwrap(),
            bucket_capacity: 4,
            growth: GrowthPolicy::new(|used, _| used * 2),
            stats: StatsMode::Enabled,
            ..PoolConfig::new(reuse)
        })
        .unwrap()
    }

    #[test]
    fn initial_buffer_has_requested_size() {
        let pool = pool(ReuseMode::Clean);
        let mut r = pool.create_reference(5);
        let initial = r.take_initial().unwrap();
        assert_eq!(initial.len(), 5);
        assert!(r.is_initial(&initial));
        assert!(!r.has_initial());
        assert!(r.take_initial().is_none());
        assert_eq!(pool.stats().unwrap().total_initial, 5);
    }

    #[test]
    fn widen_is_noop_when_large_enough() {
        let pool = pool(ReuseMode::Clean);
        let mut r = pool.create_reference(16);
        let initial = r.take_initial().unwrap();
        let ptr = initial.as_ptr();
        let same = r.widen_array(initial, 10, 16);
        assert_eq!(same.as_ptr(), ptr);
        assert_eq!(pool.stats().unwrap().resize, 0);
    }

    #[test]
    fn widen_copies_used_prefix_and_parks_initial() {
        let pool = pool(ReuseMode::Clean);
        let mut r = pool.create_reference(8);
        let mut initial = r.take_initial().unwrap();
        for (i, v) in initial.iter_mut().enumerate() {
            *v = i as i32 + 1;
        }
        let wide = r.widen_array(initial, 6, 20);
        assert!(wide.len() >= 20);
        assert_eq!(&wide[..6], &[1, 2, 3, 4, 5, 6]);
        assert!(wide[6..].iter().all(|&v| v == 0));

        // The initial buffer went back to its slot, cleared, not to a bucket.
        assert!(r.has_initial());
        assert_eq!(pool.retained_buffers(), 0);

        let back = r.put_array(wide, 0, 6).unwrap();
        assert_eq!(back.len(), 8);
        assert!(back[..6].iter().all(|&v| v == 0));
        assert_eq!(pool.retained_buffers(), 1);
    }

    #[test]
    fn clean_reuse_zeroes_used_range() {
        let pool = pool(ReuseMode::Clean);
        let mut r = pool.create_reference(1);
        let mut array = r.get_array(30);
        array[..30].fill(7);
        let ptr = array.as_ptr();
        r.put_array(array, 0, 30);
        let again = r.get_array(30);
        assert_eq!(again.as_ptr(), ptr);
        assert!(again.iter().all(|&v| v == 0));
    }

    #[test]
    fn dirty_reuse_keeps_contents() {
        let pool = pool(ReuseMode::Dirty);
        let mut r = pool.create_reference(1);
        let mut array = r.get_array(8);
        array.fill(9);
        r.put_all(array);
        let again = r.get_array(8);
        assert!(again.iter().all(|&v| v == 9));
    }

    #[test]
    fn put_array_returns_initial_even_when_parked() {
        let pool = pool(ReuseMode::Clean);
        let mut r = pool.create_reference(4);
        let borrowed = r.get_array(100);
        let initial = r.put_array(borrowed, 0, 0).unwrap();
        assert!(r.is_initial(&initial));
    }

    #[test]
    fn put_array_reports_lent_initial() {
        let pool = pool(ReuseMode::Clean);
        let mut r = pool.create_reference(4);
        let _held = r.take_initial().unwrap();
        let borrowed = r.get_array(8);
        assert!(r.put_array(borrowed, 0, 8).is_none());
        assert_eq!(pool.retained_buffers(), 1);
    }

    #[test]
    fn empty_initial_is_never_matched() {
        let pool = pool(ReuseMode::Clean);
        let mut r = pool.create_reference(0);
        assert_eq!(r.initial_len(), 0);
        let empty: Box<[i32]> = Box::default();
        assert!(!r.is_initial(&empty));

        let wide = r.widen_array(empty, 0, 10);
        assert_eq!(wide.len(), 32);
        // The real initial stayed parked; the foreign empty box was dropped.
        assert!(r.has_initial());
        assert_eq!(r.initial().map(<[i32]>::len), Some(0));
        assert_eq!(pool.retained_buffers(), 0);

        let initial = r.put_array(wide, 0, 10).unwrap();
        assert!(initial.is_empty());
        assert_eq!(pool.retained_buffers(), 1);
    }

    #[test]
    fn lent_empty_initial_comes_back() {
        let pool = pool(ReuseMode::Clean);
        let mut r = pool.create_reference(0);
        let initial = r.take_initial().unwrap();
        let wide = r.widen_array(initial, 0, 5);
        assert_eq!(wide.len(), 8);
        assert!(r.has_initial());
        assert!(r.put_array(wide, 0, 5).unwrap().is_empty());
        assert_eq!(pool.retained_buffers(), 1);
    }

    #[test]
    fn dropped_initial_is_forfeited() {
        let pool = pool(ReuseMode::Clean);
        let mut r = pool.create_reference(8);
        let initial = r.take_initial().unwrap();
        let addr = initial.as_ptr() as usize;
        drop(initial);

        let borrowed = r.get_array(8);
        let reused = borrowed.as_ptr() as usize == addr;
        assert!(!r.is_initial(&borrowed));
        assert!(r.put_array(borrowed, 0, 8).is_none());
        assert_eq!(pool.retained_buffers(), 1);
        assert!(!r.has_initial());
        if reused {
            // The recycled address no longer counts as the initial.
            let again = r.get_array(8);
            assert_eq!(again.as_ptr() as usize, addr);
            assert!(!r.is_initial(&again));
        }
    }

    #[test]
    fn parked_initial_is_not_matched() {
        let pool = pool(ReuseMode::Clean);
        let r = pool.create_reference(8);
        let parked = r.initial().unwrap();
        assert!(!r.is_initial(parked));
    }

    #[test]
    fn oversized_buffers_are_not_cached() {
        let pool = pool(ReuseMode::Clean);
        let mut r = pool.create_reference(4);
        let big = r.get_array(500);
        assert_eq!(big.len(), 500);
        r.put_array(big, 0, 500);
        assert_eq!(pool.retained_buffers(), 0);
        assert_eq!(pool.stats().unwrap().oversize, 1);
    }

    #[test]
    fn custom_growth_policy_is_honoured() {
        let pool = SizeClassPool::<i32>::new(PoolConfig {
            size_classes: SizeClasses::from_lengths(vec![8, 32, 128]).unwrap(),
            growth: GrowthPolicy::new(|_, need| need * 4),
            ..PoolConfig::default()
        })
        .unwrap();
        let mut r = pool.create_reference(8);
        let initial = r.take_initial().unwrap();
        let wide = r.widen_array(initial, 8, 9);
        // 36 rounds up to the 128 class.
        assert_eq!(wide.len(), 128);
    }

    #[test]
    fn fill_check_repairs_stale_data() {
        let mut array = vec![1, 1, 1, 1].into_boxed_slice();
        fill(&mut array, 1, 3, 0, true);
        assert!(array.iter().all(|&v| v == 0));

        let mut unchecked = vec![1, 1, 1, 1].into_boxed_slice();
        fill(&mut unchecked, 1, 3, 0, false);
        assert_eq!(&*unchecked, &[1, 0, 0, 1]);
    }

    #[test]
    fn fill_clamps_out_of_range_bounds() {
        let mut array = vec![5; 4].into_boxed_slice();
        fill(&mut array, 3, 99, 0, false);
        assert_eq!(&*array, &[5, 5, 5, 0]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Clone, Debug)]
        enum Op {
            Get(usize),
            Widen(usize),
            Put,
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (1usize..200).prop_map(Op::Get),
                (1usize..200).prop_map(Op::Widen),
                Just(Op::Put),
            ]
        }

        proptest! {
            #[test]
            fn pool_invariants_hold_under_random_use(
                initial in 1usize..40,
                ops in proptest::collection::vec(op(), 1..60),
            ) {
                let pool = pool(ReuseMode::Clean);
                let classes = [8usize, 32, 128];
                let mut r = pool.create_reference(initial);
                let mut current = r.take_initial().unwrap();
                let mut used = 0usize;
                let mut extra: Vec<Box<[i32]>> = Vec::new();
                let mut spare: Option<Box<[i32]>> = None;

                for op in ops {
                    match op {
                        Op::Get(len) => {
                            let array = r.get_array(len);
                            prop_assert!(array.len() >= len);
                            if len <= 128 {
                                prop_assert!(classes.contains(&array.len()));
                            }
                            // Clean reuse: everything handed out is zero.
                            prop_assert!(array.iter().all(|&v| v == 0));
                            extra.push(array);
                        }
                        Op::Widen(need) => {
                            for (i, v) in current[..used].iter_mut().enumerate() {
                                *v = i as i32 + 1;
                            }
                            let before: Vec<i32> = current[..used].to_vec();
                            current = r.widen_array(current, used, need);
                            prop_assert!(current.len() >= need);
                            prop_assert_eq!(&current[..used], &before[..]);
                            used = need.min(current.len());
                        }
                        Op::Put => {
                            if let Some(array) = extra.pop() {
                                let len = array.len();
                                if let Some(initial) = r.put_array(array, 0, len) {
                                    prop_assert!(spare.is_none());
                                    prop_assert!(r.is_initial(&initial));
                                    spare = Some(initial);
                                }
                            }
                        }
                    }
                    // Wherever the initial buffer is, it is never idle in a bucket.
                    if let Some(parked) = r.initial() {
                        prop_assert!(!pool.holds(parked));
                    }
                    if let Some(spare) = &spare {
                        prop_assert!(!pool.holds(spare));
                    }
                    prop_assert!(!pool.holds(&current));
                }

                let len = current.len();
                let initial = r.put_array(current, 0, len).or(spare);
                prop_assert!(initial.is_some());
                let initial = initial.unwrap();
                prop_assert!(r.is_initial(&initial));
                prop_assert!(!pool.holds(&initial));
            }
        }
    }
}
