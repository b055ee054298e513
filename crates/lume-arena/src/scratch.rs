//! Raw scratch arenas with manual allocate/resize/free.

use std::ops::Deref;
use std::sync::Arc;

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};

use lume_core::{ArenaId, OwnerId};

use crate::error::ArenaError;
use crate::raw::RawRegion;
use crate::reclaim::{Block, Owner, Registry};

/// A raw, zero-initialised byte region owned by one rendering context.
///
/// Used for scratch needs too large or too long-lived for the buffer
/// pools (e.g. the per-context edge store). Memory is released when the
/// handle is [`free`](ScratchArena::free)d or dropped; if the handle is
/// leaked, the reclaimer releases it once the [`Owner`] goes away.
///
/// The region is tracked with a caller-maintained [`used`] mark, which
/// [`resize`] clamps to the new length.
///
/// [`used`]: ScratchArena::used
/// [`resize`]: ScratchArena::resize
pub struct ScratchArena {
    block: Arc<Block>,
    registry: Arc<Registry>,
    length: usize,
    used: usize,
    freed: bool,
}

impl ScratchArena {
    /// Reserve `length` zeroed bytes registered against `owner`.
    pub fn allocate(owner: &Owner, length: usize) -> Result<Self, ArenaError> {
        let region =
            RawRegion::allocate(length).ok_or(ArenaError::OutOfMemory { requested: length })?;
        let registry = Arc::clone(&owner.registry);
        let id = ArenaId::next();
        if registry.log_malloc {
            tracing::debug!(
                arena = %id,
                owner = %owner.id(),
                address = region.address(),
                length,
                "arena allocate"
            );
        }
        let block = Arc::new(Block {
            id,
            owner: owner.id(),
            region: Mutex::new(Some(region)),
        });
        registry.register(Arc::clone(&block));
        Ok(Self {
            block,
            registry,
            length,
            used: 0,
            freed: false,
        })
    }

    /// The arena's identity.
    pub fn id(&self) -> ArenaId {
        self.block.id
    }

    /// The owner this arena is registered against.
    pub fn owner(&self) -> OwnerId {
        self.block.owner
    }

    /// Length of the region in bytes (as of the last allocate/resize).
    pub fn length(&self) -> usize {
        self.length
    }

    /// The caller-maintained high-water mark of meaningful bytes.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Set the used mark. Values past the end are clamped to [`length`].
    ///
    /// [`length`]: ScratchArena::length
    pub fn set_used(&mut self, used: usize) {
        self.used = used.min(self.length);
    }

    /// Current base address. May change after [`resize`](ScratchArena::resize).
    pub fn address(&self) -> Result<usize, ArenaError> {
        Ok(self.region()?.address())
    }

    /// Whether the region has been released, through this handle or by
    /// the reclaimer.
    pub fn is_freed(&self) -> bool {
        self.block.region.lock().is_none()
    }

    /// Read view of the region. The arena stays locked while the view
    /// lives.
    pub fn bytes(&self) -> Result<ArenaBytes<'_>, ArenaError> {
        let guard = self.region()?;
        Ok(ArenaBytes {
            guard: MappedMutexGuard::map(guard, |r| r.as_mut_slice()),
        })
    }

    /// Mutable view of the region. The arena stays locked while the view
    /// lives.
    pub fn bytes_mut(&mut self) -> Result<MappedMutexGuard<'_, [u8]>, ArenaError> {
        let guard = self.region()?;
        Ok(MappedMutexGuard::map(guard, |r| r.as_mut_slice()))
    }

    /// Set every byte in `[0, length)` to `value`.
    pub fn fill(&mut self, value: u8) -> Result<(), ArenaError> {
        self.region()?.as_mut_slice().fill(value);
        Ok(())
    }

    /// Change the region's length, preserving `[0, min(old, new))`.
    ///
    /// The base address may change. New bytes are zero. On failure the
    /// region is left exactly as it was.
    pub fn resize(&mut self, new_length: usize) -> Result<(), ArenaError> {
        let mut region = self.region()?;
        let old_address = region.address();
        if !region.resize(new_length) {
            return Err(ArenaError::OutOfMemory {
                requested: new_length,
            });
        }
        if self.registry.log_malloc {
            tracing::debug!(
                arena = %self.block.id,
                old_address,
                address = region.address(),
                old_length = self.length,
                length = new_length,
                "arena resize"
            );
        }
        drop(region);
        self.length = new_length;
        self.used = self.used.min(new_length);
        Ok(())
    }

    /// Release the region now.
    ///
    /// Freeing twice through the same handle is a caller bug: it panics
    /// in debug builds and is a no-op otherwise. Freeing a region the
    /// reclaimer already took is a no-op.
    pub fn free(&mut self) {
        debug_assert!(!self.freed, "{} freed twice", self.block.id);
        if self.freed {
            return;
        }
        self.freed = true;
        if !self.registry.release(&self.block) {
            tracing::debug!(arena = %self.block.id, "arena already reclaimed");
        }
    }

    fn region(&self) -> Result<MappedMutexGuard<'_, RawRegion>, ArenaError> {
        MutexGuard::try_map(self.block.region.lock(), Option::as_mut)
            .map_err(|_| ArenaError::Freed { arena: self.block.id })
    }
}

impl Drop for ScratchArena {
    fn drop(&mut self) {
        if !self.freed {
            self.freed = true;
            self.registry.release(&self.block);
        }
    }
}

impl std::fmt::Debug for ScratchArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchArena")
            .field("id", &self.block.id)
            .field("owner", &self.block.owner)
            .field("length", &self.length)
            .field("used", &self.used)
            .field("freed", &self.is_freed())
            .finish()
    }
}

/// Read-only guarded view returned by [`ScratchArena::bytes`].
pub struct ArenaBytes<'a> {
    guard: MappedMutexGuard<'a, [u8]>,
}

impl Deref for ArenaBytes<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.guard
    }
}
