//! Scope resolution.
//!
//! The resolver is the orchestrator: given a lifecycle source, a
//! corresponding-events function, and a policy, it turns "the owner's
//! current state" into a one-shot [`ScopeHandle`].
//!
//! Resolution is a pure, synchronous chain of checks plus a subscribe call;
//! the only waiting is the downstream caller awaiting the handle, which may
//! complete arbitrarily far in the future or never.

use crate::error::ScopeError;
use crate::event::correspondence::CorrespondingEvents;
use crate::event::LifecycleEvent;
use crate::lifecycle::LifecycleSource;
use crate::scope::guard::{Admission, BoundaryGuard, ScopeState};
use crate::scope::handle::ScopeHandle;
use crate::scope::policy::ScopePolicy;

/// Derives one-shot scope completion signals from an owner's lifecycle.
///
/// # Example
///
/// ```ignore
/// let resolver = ScopeResolver::new(source, OwnerEvent::terminal_for);
/// let scope = resolver.request_scope()?;
/// // await `scope`, or wrap a stream in `ScopedStream::new(stream, scope)`.
/// ```
#[derive(Debug)]
pub struct ScopeResolver<E: LifecycleEvent, C> {
    source: LifecycleSource<E>,
    correspondence: C,
    guard: BoundaryGuard,
}

impl<E, C> ScopeResolver<E, C>
where
    E: LifecycleEvent,
    C: CorrespondingEvents<E>,
{
    /// Creates a resolver with a default (surface-everything) policy.
    #[must_use]
    pub fn new(source: LifecycleSource<E>, correspondence: C) -> Self {
        Self::with_policy(source, correspondence, ScopePolicy::new())
    }

    /// Creates a resolver governed by a shared policy.
    #[must_use]
    pub fn with_policy(source: LifecycleSource<E>, correspondence: C, policy: ScopePolicy) -> Self {
        Self {
            source,
            correspondence,
            guard: BoundaryGuard::new(policy),
        }
    }

    /// The boundary guard (and through it, the policy) this resolver runs
    /// under.
    #[must_use]
    pub fn guard(&self) -> &BoundaryGuard {
        &self.guard
    }

    /// Requests a scope for the owner's current lifecycle state.
    ///
    /// 1. Reads the last-known state; absent fails with
    ///    [`ScopeError::NotStarted`].
    /// 2. Maps it through the corresponding-events function; a terminal
    ///    input fails with [`ScopeError::Ended`], unless the policy's ended
    ///    handler swallows it, in which case an already-fired handle is
    ///    returned and the scope is disposed with no further action.
    /// 3. Otherwise subscribes to the live event stream — skipping the value
    ///    that produced the last-known state — and returns a handle armed to
    ///    fire on the first event that reaches the target.
    ///
    /// # Errors
    ///
    /// [`ScopeError::ThreadAffinity`] off the owner thread;
    /// [`ScopeError::NotStarted`] / [`ScopeError::Ended`] per the boundary
    /// state machine. All boundary violations pass through the policy's
    /// violation reporter before surfacing.
    pub fn request_scope(&self) -> Result<ScopeHandle<E>, ScopeError> {
        let last_known = self
            .source
            .peek()
            .map_err(|error| self.guard.reject(error))?;
        match self.guard.admit(last_known, &self.correspondence)? {
            Admission::AlreadyDisposed => Ok(ScopeHandle::resolved()),
            Admission::Watch(target) => {
                tracing::trace!(last_known = ?last_known, target = ?target, "scope armed");
                let events = self
                    .source
                    .subscribe_changes()
                    .map_err(|error| self.guard.reject(error))?;
                Ok(ScopeHandle::watching(events, target))
            }
        }
    }

    /// Classifies the owner's current position in the boundary state
    /// machine without arming anything.
    ///
    /// # Errors
    ///
    /// [`ScopeError::ThreadAffinity`] off the owner thread.
    pub fn state(&self) -> Result<ScopeState, ScopeError> {
        let last_known = self.source.peek()?;
        Ok(self.guard.classify(last_known, &self.correspondence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affinity::OwnerAffinity;
    use crate::event::OwnerEvent;
    use crate::lifecycle;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::task::{Context, Poll, Wake, Waker};
    use std::thread;

    struct NoopWaker;

    impl Wake for NoopWaker {
        fn wake(self: Arc<Self>) {}
    }

    fn noop_waker() -> Waker {
        Waker::from(Arc::new(NoopWaker))
    }

    fn init_test(name: &str) {
        crate::test_utils::init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn request_before_any_event_fails_not_started() {
        init_test("request_before_any_event_fails_not_started");
        let (_emitter, source) = lifecycle::channel::<OwnerEvent>(OwnerAffinity::current_thread());
        let resolver = ScopeResolver::new(source, OwnerEvent::terminal_for);
        assert_eq!(resolver.state().unwrap(), ScopeState::NotStarted);
        assert_eq!(
            resolver.request_scope().map(drop),
            Err(ScopeError::NotStarted)
        );
        crate::test_complete!("request_before_any_event_fails_not_started");
    }

    #[test]
    fn request_after_terminal_event_fails_ended() {
        init_test("request_after_terminal_event_fails_ended");
        let (emitter, source) = lifecycle::channel(OwnerAffinity::current_thread());
        emitter.emit(OwnerEvent::Create).unwrap();
        emitter.emit(OwnerEvent::Destroy).unwrap();
        let resolver = ScopeResolver::new(source, OwnerEvent::terminal_for);
        assert_eq!(resolver.state().unwrap(), ScopeState::Ended);
        assert_eq!(resolver.request_scope().map(drop), Err(ScopeError::ended()));
        crate::test_complete!("request_after_terminal_event_fails_ended");
    }

    #[test]
    fn swallowed_ended_returns_an_already_fired_handle() {
        init_test("swallowed_ended_returns_an_already_fired_handle");
        let (emitter, source) = lifecycle::channel(OwnerAffinity::current_thread());
        emitter.emit(OwnerEvent::Destroy).unwrap();
        let policy = ScopePolicy::new();
        policy.set_ended_handler(|_| {}).unwrap();
        let resolver = ScopeResolver::with_policy(source, OwnerEvent::terminal_for, policy);

        let mut handle = resolver.request_scope().unwrap();
        assert!(handle.is_resolved());
        let waker = noop_waker();
        let mut task_cx = Context::from_waker(&waker);
        assert!(matches!(
            Pin::new(&mut handle).poll(&mut task_cx),
            Poll::Ready(Ok(()))
        ));
        crate::test_complete!("swallowed_ended_returns_an_already_fired_handle");
    }

    #[test]
    fn active_scope_arms_against_future_events_only() {
        init_test("active_scope_arms_against_future_events_only");
        let (emitter, source) = lifecycle::channel(OwnerAffinity::current_thread());
        emitter.emit(OwnerEvent::Create).unwrap();
        let resolver = ScopeResolver::new(source.clone(), OwnerEvent::terminal_for);

        let mut handle = resolver.request_scope().unwrap();
        assert!(handle.is_watching());
        assert_eq!(source.subscriber_count().unwrap(), 1);

        let waker = noop_waker();
        let mut task_cx = Context::from_waker(&waker);
        // The Create that opened the scope must not retrigger it.
        assert!(Pin::new(&mut handle).poll(&mut task_cx).is_pending());

        emitter.emit(OwnerEvent::Destroy).unwrap();
        assert!(matches!(
            Pin::new(&mut handle).poll(&mut task_cx),
            Poll::Ready(Ok(()))
        ));
        crate::test_complete!("active_scope_arms_against_future_events_only");
    }

    #[test]
    fn resolution_off_owner_thread_is_rejected_and_reported() {
        init_test("resolution_off_owner_thread_is_rejected_and_reported");
        let (emitter, source) = lifecycle::channel(OwnerAffinity::current_thread());
        emitter.emit(OwnerEvent::Create).unwrap();
        let policy = ScopePolicy::new();
        let reported = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let seen = Arc::clone(&reported);
        policy
            .set_violation_reporter(move |error| {
                assert_eq!(*error, ScopeError::ThreadAffinity);
                seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            })
            .unwrap();
        let resolver = ScopeResolver::with_policy(source, OwnerEvent::terminal_for, policy);

        let result = thread::spawn(move || resolver.request_scope().map(drop))
            .join()
            .expect("spawned thread panicked");
        assert_eq!(result, Err(ScopeError::ThreadAffinity));
        assert_eq!(reported.load(std::sync::atomic::Ordering::SeqCst), 1);
        crate::test_complete!("resolution_off_owner_thread_is_rejected_and_reported");
    }
}
