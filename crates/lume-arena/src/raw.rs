//! Owned raw byte regions on the global allocator.
//!
//! This is the only module in the workspace containing `unsafe`. Every
//! block carries a `// SAFETY:` comment. Regions are always fully
//! initialised (zeroed on allocation and on growth), so handing out
//! `&[u8]` views is sound.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::NonNull;
use std::slice;

/// Alignment of every region.
pub(crate) const ALIGN: usize = 16;

/// A uniquely owned, zero-initialised byte region.
///
/// Zero-length regions hold a dangling pointer and never touch the
/// allocator.
pub(crate) struct RawRegion {
    ptr: NonNull<u8>,
    len: usize,
}

// SAFETY: a RawRegion uniquely owns its allocation and exposes it only
// through `&self`/`&mut self`, so moving it across threads is sound.
unsafe impl Send for RawRegion {}

impl RawRegion {
    /// Allocate `len` zeroed bytes. `None` if the layout is invalid or
    /// the allocator fails.
    pub(crate) fn allocate(len: usize) -> Option<Self> {
        if len == 0 {
            return Some(Self::empty());
        }
        let layout = Layout::from_size_align(len, ALIGN).ok()?;
        // SAFETY: `layout` has non-zero size.
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        NonNull::new(ptr).map(|ptr| Self { ptr, len })
    }

    fn empty() -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
        }
    }

    /// Change the region's length, preserving `[0, min(old, new))` and
    /// zeroing any new tail.
    ///
    /// On failure returns `false` and leaves the region untouched.
    pub(crate) fn resize(&mut self, new_len: usize) -> bool {
        if new_len == self.len {
            return true;
        }
        if self.len == 0 {
            return match Self::allocate(new_len) {
                Some(region) => {
                    *self = region;
                    true
                }
                None => false,
            };
        }
        if new_len == 0 {
            self.release();
            return true;
        }
        if Layout::from_size_align(new_len, ALIGN).is_err() {
            return false;
        }
        // SAFETY: `ptr` came from the global allocator with
        // `self.layout()`; `new_len` is non-zero and forms a valid layout
        // with ALIGN (checked above).
        let ptr = unsafe { alloc::realloc(self.ptr.as_ptr(), self.layout(), new_len) };
        let Some(ptr) = NonNull::new(ptr) else {
            return false;
        };
        if new_len > self.len {
            // SAFETY: `[len, new_len)` lies inside the new allocation and
            // nothing else references it yet.
            unsafe { ptr.as_ptr().add(self.len).write_bytes(0, new_len - self.len) };
        }
        self.ptr = ptr;
        self.len = new_len;
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn address(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        // SAFETY: `ptr` is valid for `len` initialised bytes (or dangling
        // with `len == 0`), and the borrow ties the slice to `self`.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as in `as_slice`; `&mut self` guarantees exclusivity.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    fn layout(&self) -> Layout {
        // SAFETY: the same (len, ALIGN) pair was validated when the
        // region was allocated or last resized.
        unsafe { Layout::from_size_align_unchecked(self.len, ALIGN) }
    }

    fn release(&mut self) {
        if self.len != 0 {
            // SAFETY: `ptr` was allocated with `self.layout()` and is not
            // used again: the region is reset to empty below.
            unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout()) };
        }
        *self = Self::empty();
    }
}

impl Drop for RawRegion {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_is_zeroed_and_aligned() {
        let region = RawRegion::allocate(100).unwrap();
        assert_eq!(region.len(), 100);
        assert_eq!(region.address() % ALIGN, 0);
        assert!(region.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn zero_length_never_allocates() {
        let mut region = RawRegion::allocate(0).unwrap();
        assert!(region.as_slice().is_empty());
        assert!(region.resize(8));
        assert_eq!(region.as_slice(), &[0; 8]);
        assert!(region.resize(0));
        assert_eq!(region.len(), 0);
    }

    #[test]
    fn impossible_layout_fails() {
        assert!(RawRegion::allocate(usize::MAX).is_none());
        let mut region = RawRegion::allocate(4).unwrap();
        region.as_mut_slice().copy_from_slice(&[1, 2, 3, 4]);
        assert!(!region.resize(usize::MAX));
        assert_eq!(region.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn grow_zeroes_tail_shrink_truncates() {
        let mut region = RawRegion::allocate(4).unwrap();
        region.as_mut_slice().fill(0xAB);
        assert!(region.resize(4096));
        assert_eq!(&region.as_slice()[..4], &[0xAB; 4]);
        assert!(region.as_slice()[4..].iter().all(|&b| b == 0));
        assert!(region.resize(2));
        assert_eq!(region.as_slice(), &[0xAB; 2]);
    }
}
