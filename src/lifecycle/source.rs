//! The lifecycle channel: emitter, peekable source, and event streams.
//!
//! One channel carries the time-ordered lifecycle events of exactly one
//! owner. Delivery is per-subscriber buffered rather than latest-only so a
//! watcher can never have the exact terminal value coalesced away, which
//! matters for equality-only event sets.
//!
//! # Thread model
//!
//! Emission, peeking, and subscribing are owner-thread operations and fail
//! with [`ScopeError::ThreadAffinity`] elsewhere. Dropping an
//! [`EventStream`] (the unsubscribe path) is allowed from any thread: off
//! the owner thread the removal is queued and drained by the next
//! owner-thread channel operation, so the unsubscribe still happens exactly
//! once and is never silently dropped.

use crate::affinity::OwnerAffinity;
use crate::error::ScopeError;
use crate::event::LifecycleEvent;
use crate::lifecycle::cache::StateCache;
use crate::stream::Stream;
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

#[derive(Debug)]
struct SubscriberSlot<E> {
    id: u64,
    buffer: VecDeque<E>,
    waker: Option<Waker>,
}

#[derive(Debug)]
struct ChannelInner<E> {
    cache: StateCache<E>,
    subscribers: SmallVec<[SubscriberSlot<E>; 2]>,
    next_subscriber_id: u64,
    closed: bool,
    fault: Option<Arc<str>>,
    /// Unsubscribes requested off the owner thread, applied on the next
    /// owner-thread operation.
    deferred_unsubscribes: Vec<u64>,
}

impl<E> ChannelInner<E> {
    fn drain_deferred(&mut self) {
        if self.deferred_unsubscribes.is_empty() {
            return;
        }
        for id in self.deferred_unsubscribes.drain(..) {
            self.subscribers.retain(|slot| slot.id != id);
        }
    }

    fn slot_mut(&mut self, id: u64) -> Option<&mut SubscriberSlot<E>> {
        self.subscribers.iter_mut().find(|slot| slot.id == id)
    }
}

#[derive(Debug)]
pub(crate) struct Shared<E> {
    affinity: OwnerAffinity,
    inner: Mutex<ChannelInner<E>>,
}

impl<E: LifecycleEvent> Shared<E> {
    fn new(affinity: OwnerAffinity) -> Self {
        Self {
            affinity,
            inner: Mutex::new(ChannelInner {
                cache: StateCache::new(),
                subscribers: SmallVec::new(),
                next_subscriber_id: 0,
                closed: false,
                fault: None,
                deferred_unsubscribes: Vec::new(),
            }),
        }
    }

    /// Removes a subscriber slot, deferring to the owner thread if needed.
    fn release(&self, id: u64) {
        let mut inner = self.inner.lock();
        if self.affinity.is_owner() {
            inner.deferred_unsubscribes.retain(|&pending| pending != id);
            inner.subscribers.retain(|slot| slot.id != id);
        } else {
            tracing::debug!(subscriber = id, "deferring unsubscribe to owner thread");
            inner.deferred_unsubscribes.push(id);
        }
    }

    fn close(&self, fault: Option<Arc<str>>) {
        let wakers: SmallVec<[Waker; 2]> = {
            let mut inner = self.inner.lock();
            if inner.closed {
                return;
            }
            inner.closed = true;
            inner.fault = fault;
            inner
                .subscribers
                .iter_mut()
                .filter_map(|slot| slot.waker.take())
                .collect()
        };
        for waker in wakers {
            waker.wake();
        }
    }
}

/// Creates a lifecycle channel for one owner, returning the emitting and
/// consuming halves.
#[must_use]
pub fn channel<E: LifecycleEvent>(affinity: OwnerAffinity) -> (Emitter<E>, LifecycleSource<E>) {
    let shared = Arc::new(Shared::new(affinity));
    (
        Emitter {
            shared: Arc::clone(&shared),
        },
        LifecycleSource { shared },
    )
}

/// The producing half of a lifecycle channel.
///
/// Owned by the owner adapter (view attach listener, activity callback
/// bridge, custom tracker). Dropping the emitter completes every live
/// [`EventStream`] once its buffered events are drained.
#[derive(Debug)]
pub struct Emitter<E: LifecycleEvent> {
    shared: Arc<Shared<E>>,
}

impl<E: LifecycleEvent> Emitter<E> {
    /// Emits the next lifecycle event, recording it as the last-known state
    /// and delivering it to every live subscriber.
    ///
    /// A literal duplicate of a backfilled event is recorded nowhere and
    /// delivered to no one (see [`Emitter::backfill`]).
    ///
    /// # Errors
    ///
    /// [`ScopeError::ThreadAffinity`] off the owner thread;
    /// [`ScopeError::UpstreamEnded`] after the channel was closed.
    pub fn emit(&self, event: E) -> Result<(), ScopeError> {
        self.shared.affinity.ensure()?;
        let wakers: SmallVec<[Waker; 2]> = {
            let mut inner = self.shared.inner.lock();
            inner.drain_deferred();
            if inner.closed {
                return Err(ScopeError::UpstreamEnded);
            }
            if !inner.cache.record(event) {
                return Ok(());
            }
            tracing::trace!(event = ?event, subscribers = inner.subscribers.len(), "lifecycle event");
            let mut wakers = SmallVec::new();
            for slot in &mut inner.subscribers {
                slot.buffer.push_back(event);
                if let Some(waker) = slot.waker.take() {
                    wakers.push(waker);
                }
            }
            wakers
        };
        for waker in wakers {
            waker.wake();
        }
        Ok(())
    }

    /// Synthesizes the last-known state from an owner tracker that had
    /// already advanced past its earliest event when this channel was
    /// constructed.
    ///
    /// Intended for construction time, before any event has been emitted;
    /// once the stream is live, backfilling is a no-op. If the stream later
    /// emits this literal event, the duplicate is suppressed — it is not
    /// recorded or delivered a second time.
    ///
    /// # Errors
    ///
    /// [`ScopeError::ThreadAffinity`] off the owner thread.
    pub fn backfill(&self, event: E) -> Result<(), ScopeError> {
        self.shared.affinity.ensure()?;
        let mut inner = self.shared.inner.lock();
        inner.drain_deferred();
        inner.cache.backfill(event);
        Ok(())
    }

    /// Fails the channel. Live subscribers drain their buffered events and
    /// then observe the failure; the reason is passed through unchanged to
    /// each scope handle as
    /// [`ScopeError::Upstream`](crate::error::ScopeError::Upstream).
    pub fn abort(&self, reason: &str) {
        tracing::debug!(reason, "lifecycle channel aborted");
        self.shared.close(Some(Arc::from(reason)));
    }

    /// Closes the channel without a failure. Equivalent to dropping the
    /// emitter.
    pub fn close(&self) {
        self.shared.close(None);
    }
}

impl<E: LifecycleEvent> Drop for Emitter<E> {
    fn drop(&mut self) {
        self.shared.close(None);
    }
}

/// The consuming half of a lifecycle channel: peek the last-known state, or
/// subscribe to the live event stream.
///
/// Cloneable; every clone observes the same owner.
#[derive(Debug)]
pub struct LifecycleSource<E: LifecycleEvent> {
    shared: Arc<Shared<E>>,
}

impl<E: LifecycleEvent> Clone for LifecycleSource<E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<E: LifecycleEvent> LifecycleSource<E> {
    /// Point-in-time read of the last-known state, independent of any
    /// subscription. `None` means the owner has not started.
    ///
    /// # Errors
    ///
    /// [`ScopeError::ThreadAffinity`] off the owner thread.
    pub fn peek(&self) -> Result<Option<E>, ScopeError> {
        self.shared.affinity.ensure()?;
        let mut inner = self.shared.inner.lock();
        inner.drain_deferred();
        Ok(inner.cache.peek())
    }

    /// Subscribes with replay-latest semantics: a late subscriber first
    /// receives the last-known event, then every subsequent one.
    ///
    /// # Errors
    ///
    /// [`ScopeError::ThreadAffinity`] off the owner thread.
    pub fn subscribe(&self) -> Result<EventStream<E>, ScopeError> {
        self.subscribe_inner(true)
    }

    /// Subscribes to changes only, skipping the value that produced the
    /// current last-known state. This is what scope resolution composes
    /// against: the event that opened the scope must not retrigger it.
    ///
    /// # Errors
    ///
    /// [`ScopeError::ThreadAffinity`] off the owner thread.
    pub fn subscribe_changes(&self) -> Result<EventStream<E>, ScopeError> {
        self.subscribe_inner(false)
    }

    /// Number of live subscriptions, after applying any deferred
    /// unsubscribes.
    ///
    /// # Errors
    ///
    /// [`ScopeError::ThreadAffinity`] off the owner thread.
    pub fn subscriber_count(&self) -> Result<usize, ScopeError> {
        self.shared.affinity.ensure()?;
        let mut inner = self.shared.inner.lock();
        inner.drain_deferred();
        Ok(inner.subscribers.len())
    }

    fn subscribe_inner(&self, replay_latest: bool) -> Result<EventStream<E>, ScopeError> {
        self.shared.affinity.ensure()?;
        let mut inner = self.shared.inner.lock();
        inner.drain_deferred();
        let id = inner.next_subscriber_id;
        inner.next_subscriber_id += 1;
        let mut buffer = VecDeque::new();
        if replay_latest {
            if let Some(event) = inner.cache.peek() {
                buffer.push_back(event);
            }
        }
        inner.subscribers.push(SubscriberSlot {
            id,
            buffer,
            waker: None,
        });
        Ok(EventStream {
            shared: Arc::clone(&self.shared),
            id,
            terminated: false,
        })
    }
}

/// A live subscription to one owner's lifecycle events.
///
/// Yields events in emission order; terminates after the channel closes and
/// the buffer is drained. Dropping the stream unsubscribes exactly once,
/// deferring to the owner thread when dropped elsewhere.
#[derive(Debug)]
#[must_use = "streams do nothing unless polled"]
pub struct EventStream<E: LifecycleEvent> {
    shared: Arc<Shared<E>>,
    id: u64,
    terminated: bool,
}

impl<E: LifecycleEvent> EventStream<E> {
    /// After the stream has terminated, returns the channel's failure
    /// reason, if it was aborted rather than closed.
    #[must_use]
    pub fn failure(&self) -> Option<Arc<str>> {
        self.shared.inner.lock().fault.clone()
    }
}

impl<E: LifecycleEvent> Stream for EventStream<E> {
    type Item = E;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.terminated {
            return Poll::Ready(None);
        }
        let mut inner = this.shared.inner.lock();
        let closed = inner.closed;
        let Some(slot) = inner.slot_mut(this.id) else {
            drop(inner);
            this.terminated = true;
            return Poll::Ready(None);
        };
        if let Some(event) = slot.buffer.pop_front() {
            return Poll::Ready(Some(event));
        }
        if closed {
            drop(inner);
            this.terminated = true;
            return Poll::Ready(None);
        }
        slot.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl<E: LifecycleEvent> Drop for EventStream<E> {
    fn drop(&mut self) {
        self.shared.release(self.id);
    }
}
