//! Last-known lifecycle state.
//!
//! The cache holds exactly one scalar: "absent" (the owner has not started)
//! or the most recently observed lifecycle event. Once non-absent it never
//! returns to absent. Reads and writes are owner-thread affine; the cache
//! itself carries no locking (the channel wrapper serializes access).

use crate::event::LifecycleEvent;

/// Most-recently-observed lifecycle state for one owner.
///
/// Supports point-in-time reads ([`peek`](StateCache::peek)) independent of
/// subscribing to the event stream, and construction-time
/// [`backfill`](StateCache::backfill) for owners that were already past their
/// earliest event when the channel was created.
#[derive(Debug, Clone)]
pub struct StateCache<E> {
    last: Option<E>,
    pending_backfill: Option<E>,
}

impl<E: LifecycleEvent> StateCache<E> {
    /// Creates an empty cache (owner not yet started).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: None,
            pending_backfill: None,
        }
    }

    /// Returns the last-known state, or `None` if the owner has not emitted
    /// (or been backfilled with) any event yet.
    #[must_use]
    pub fn peek(&self) -> Option<E> {
        self.last
    }

    /// Records an observed event, monotonically updating the last-known
    /// state.
    ///
    /// Returns `false` when the event is the literal duplicate of a
    /// backfilled event and was suppressed; the caller must not rebroadcast
    /// it. The suppression window closes at the first recorded event: once
    /// the real stream has produced anything, a later equal event is a
    /// genuine new observation.
    pub fn record(&mut self, event: E) -> bool {
        if self.pending_backfill.take() == Some(event) {
            tracing::debug!(event = ?event, "suppressed duplicate of backfilled event");
            return false;
        }
        self.last = Some(event);
        true
    }

    /// Synthesizes a last-known state before the real stream has emitted
    /// anything, from an already-advanced owner's queryable current level.
    ///
    /// If the stream later emits this literal event, the duplicate is
    /// suppressed by [`record`](StateCache::record). Backfilling after the
    /// stream has already produced an event is a no-op: the stream is the
    /// authority once it is live.
    pub fn backfill(&mut self, event: E) {
        if self.last.is_some() {
            return;
        }
        self.last = Some(event);
        self.pending_backfill = Some(event);
    }
}

impl<E: LifecycleEvent> Default for StateCache<E> {
    fn default() -> Self {
        Self::new()
    }
}
