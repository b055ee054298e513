//! Liveness-driven reclamation of leaked arenas.
//!
//! Every [`ScratchArena`](crate::ScratchArena) is registered against an
//! [`Owner`]. Dropping the owner enqueues one `OwnerGone` event on a
//! crossbeam channel; the watcher thread drains the queue and frees any
//! arena of that owner still in the live registry.
//!
//! Dropping (or explicitly freeing) the arena handle is the normal path.
//! The watcher only finds work when a handle was leaked, e.g. through
//! `mem::forget` or a reference cycle.
//!
//! # Exactly-once release
//!
//! Each arena's region sits in a `parking_lot::Mutex<Option<RawRegion>>`.
//! Both release paths `take()` the region under that lock, so whichever
//! runs first frees it and the other observes `None`. Both paths lock the
//! region before the registry. The watcher collects an owner's entries
//! under the registry lock and drops it before touching any region.
//!
//! The watcher never blocks on a region. A region locked by a live
//! [`ArenaBytes`](crate::ArenaBytes) view stays registered and is retried
//! every [`RETRY_INTERVAL`] until it is freed or the watcher stops.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use indexmap::IndexMap;
use parking_lot::Mutex;

use lume_core::{ArenaId, OwnerId};

use crate::config::ReclaimerConfig;
use crate::error::ArenaError;
use crate::raw::RawRegion;

/// How often the watcher retries regions that were locked when their
/// owner went away.
pub const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Messages consumed by the watcher thread.
pub(crate) enum ReclaimEvent {
    OwnerGone(OwnerId),
    Shutdown,
}

/// One arena's memory and identity, shared by the handle and registry.
pub(crate) struct Block {
    pub(crate) id: ArenaId,
    pub(crate) owner: OwnerId,
    pub(crate) region: Mutex<Option<RawRegion>>,
}

struct Entry {
    owner: OwnerId,
    block: Arc<Block>,
}

/// Live-arena registry plus lifetime counters.
pub(crate) struct Registry {
    live: Mutex<IndexMap<ArenaId, Entry>>,
    allocated: AtomicU64,
    freed_by_handle: AtomicU64,
    reclaimed: AtomicU64,
    pub(crate) log_malloc: bool,
}

impl Registry {
    fn new(log_malloc: bool) -> Self {
        Self {
            live: Mutex::new(IndexMap::new()),
            allocated: AtomicU64::new(0),
            freed_by_handle: AtomicU64::new(0),
            reclaimed: AtomicU64::new(0),
            log_malloc,
        }
    }

    pub(crate) fn register(&self, block: Arc<Block>) {
        let id = block.id;
        let owner = block.owner;
        self.live.lock().insert(id, Entry { owner, block });
        self.allocated.fetch_add(1, Ordering::Relaxed);
    }

    /// Free `block` on behalf of its handle. Returns `false` if it was
    /// already released.
    pub(crate) fn release(&self, block: &Block) -> bool {
        let mut slot = block.region.lock();
        let Some(region) = slot.take() else {
            return false;
        };
        self.log_free(block, &region, "freed");
        drop(region);
        self.live.lock().swap_remove(&block.id);
        drop(slot);
        self.freed_by_handle.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Free every still-live arena of `owner`. Returns how many were
    /// freed by this call; arenas whose region is busy are pushed onto
    /// `busy`.
    fn reclaim_owner(&self, owner: OwnerId, busy: &mut Vec<Arc<Block>>) -> usize {
        let orphans: Vec<Arc<Block>> = self
            .live
            .lock()
            .values()
            .filter(|entry| entry.owner == owner)
            .map(|entry| Arc::clone(&entry.block))
            .collect();

        let mut freed = 0;
        for block in orphans {
            match self.try_reclaim(&block) {
                Reclaim::Freed => freed += 1,
                Reclaim::Gone => {}
                Reclaim::Busy => busy.push(block),
            }
        }
        freed
    }

    /// Retry the busy list, keeping only regions that are still locked.
    fn retry(&self, busy: &mut Vec<Arc<Block>>) -> usize {
        let mut freed = 0;
        busy.retain(|block| match self.try_reclaim(block) {
            Reclaim::Freed => {
                freed += 1;
                false
            }
            Reclaim::Gone => false,
            Reclaim::Busy => true,
        });
        freed
    }

    fn try_reclaim(&self, block: &Block) -> Reclaim {
        let Some(mut slot) = block.region.try_lock() else {
            return Reclaim::Busy;
        };
        // The handle path removes its entry while holding the region lock,
        // so an empty slot here is already unregistered.
        let Some(region) = slot.take() else {
            return Reclaim::Gone;
        };
        self.log_free(block, &region, "reclaimed");
        drop(region);
        self.live.lock().swap_remove(&block.id);
        drop(slot);
        self.reclaimed.fetch_add(1, Ordering::Relaxed);
        Reclaim::Freed
    }

    fn log_free(&self, block: &Block, region: &RawRegion, action: &'static str) {
        if self.log_malloc {
            tracing::debug!(
                arena = %block.id,
                owner = %block.owner,
                address = region.address(),
                length = region.len(),
                action,
                "arena release"
            );
        }
    }

    fn live_count(&self) -> usize {
        self.live.lock().len()
    }
}

enum Reclaim {
    Freed,
    Gone,
    Busy,
}

/// Liveness token for an object that owns scratch arenas.
///
/// Store it inside the owning object. When it drops, exactly one
/// reclamation event is queued for its id; any arena registered against
/// it and still unfreed is then released by the watcher.
///
/// An arena handle that outlives its owner is reclaimed too; later
/// access through it reports [`ArenaError::Freed`].
pub struct Owner {
    id: OwnerId,
    events: Sender<ReclaimEvent>,
    pub(crate) registry: Arc<Registry>,
}

impl Owner {
    /// The owner's identity.
    pub fn id(&self) -> OwnerId {
        self.id
    }
}

impl Drop for Owner {
    fn drop(&mut self) {
        // A send error means the watcher has shut down; nothing to notify.
        if self.events.send(ReclaimEvent::OwnerGone(self.id)).is_err() {
            tracing::trace!(owner = %self.id, "owner dropped after reclaimer shutdown");
        }
    }
}

/// Summary returned by [`ArenaReclaimer::shutdown`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReclaimReport {
    /// Arenas freed by the watcher over the reclaimer's lifetime.
    pub reclaimed: u64,
    /// Owner-gone events the watcher processed.
    pub events_processed: u64,
    /// Arenas still registered when the watcher stopped.
    pub still_live: usize,
}

/// Background service that frees arenas whose owner went away.
///
/// Construct one per process (or per renderer) and pass it by reference
/// to whatever creates [`Owner`]s. [`shutdown`](ArenaReclaimer::shutdown)
/// processes every event already queued, then stops the watcher; dropping
/// the reclaimer does the same.
pub struct ArenaReclaimer {
    registry: Arc<Registry>,
    events: Sender<ReclaimEvent>,
    watcher: Option<JoinHandle<u64>>,
    events_processed: u64,
}

impl ArenaReclaimer {
    /// Validate `config` and spawn the watcher thread.
    pub fn start(config: ReclaimerConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        let registry = Arc::new(Registry::new(config.log_malloc));
        let (events, rx) = crossbeam_channel::unbounded();

        let watcher_registry = Arc::clone(&registry);
        let watcher = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || watch(rx, watcher_registry))
            .map_err(|e| ArenaError::Spawn {
                reason: e.to_string(),
            })?;

        tracing::info!(thread = %config.thread_name, "arena reclaimer started");
        Ok(Self {
            registry,
            events,
            watcher: Some(watcher),
            events_processed: 0,
        })
    }

    /// Mint a new liveness token.
    pub fn owner(&self) -> Owner {
        Owner {
            id: OwnerId::next(),
            events: self.events.clone(),
            registry: Arc::clone(&self.registry),
        }
    }

    /// Total arenas allocated against this reclaimer's owners.
    pub fn allocated(&self) -> u64 {
        self.registry.allocated.load(Ordering::Relaxed)
    }

    /// Arenas released through their handle (`free()` or drop).
    pub fn explicitly_freed(&self) -> u64 {
        self.registry.freed_by_handle.load(Ordering::Relaxed)
    }

    /// Arenas released by the watcher.
    pub fn reclaimed(&self) -> u64 {
        self.registry.reclaimed.load(Ordering::Relaxed)
    }

    /// Arenas currently registered and not yet released.
    pub fn live(&self) -> usize {
        self.registry.live_count()
    }

    /// Events queued but not yet processed by the watcher.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Whether the watcher thread is still running.
    pub fn is_running(&self) -> bool {
        self.watcher.is_some()
    }

    /// Drain queued events, stop the watcher and join it.
    ///
    /// Idempotent: later calls return the same totals without blocking.
    pub fn shutdown(&mut self) -> ReclaimReport {
        if let Some(handle) = self.watcher.take() {
            // The watcher owns the receiver, so the send only fails if it
            // has already exited; join below reports that.
            let _ = self.events.send(ReclaimEvent::Shutdown);
            match handle.join() {
                Ok(processed) => self.events_processed = processed,
                Err(_) => tracing::error!("arena reclaimer thread panicked"),
            }
            tracing::info!(
                reclaimed = self.reclaimed(),
                events = self.events_processed,
                still_live = self.live(),
                "arena reclaimer stopped"
            );
        }
        ReclaimReport {
            reclaimed: self.reclaimed(),
            events_processed: self.events_processed,
            still_live: self.live(),
        }
    }
}

impl Drop for ArenaReclaimer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn watch(rx: Receiver<ReclaimEvent>, registry: Arc<Registry>) -> u64 {
    let mut processed = 0;
    let mut busy = Vec::new();
    loop {
        let event = if busy.is_empty() {
            rx.recv().ok()
        } else {
            match rx.recv_timeout(RETRY_INTERVAL) {
                Ok(event) => Some(event),
                Err(RecvTimeoutError::Timeout) => {
                    let freed = registry.retry(&mut busy);
                    if freed > 0 {
                        tracing::debug!(freed, pending = busy.len(), "reclaimed busy arenas");
                    }
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => None,
            }
        };
        match event {
            None | Some(ReclaimEvent::Shutdown) => break,
            Some(ReclaimEvent::OwnerGone(owner)) => {
                processed += 1;
                let freed = registry.reclaim_owner(owner, &mut busy);
                if freed > 0 {
                    tracing::debug!(%owner, freed, "reclaimed leaked arenas");
                }
            }
        }
    }
    registry.retry(&mut busy);
    if !busy.is_empty() {
        tracing::warn!(
            count = busy.len(),
            "arenas still borrowed at shutdown left to their handles"
        );
    }
    processed
}
