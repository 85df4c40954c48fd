//! The one-shot scope completion handle.
//!
//! A [`ScopeHandle`] is the future a subscription host composes against: it
//! completes with `Ok(())` exactly once, when the owner's lifecycle reaches
//! the terminal event computed at resolution time, or with an error if the
//! event stream ends first. It never completes twice.
//!
//! # Cancel Safety
//!
//! [`cancel`](ScopeHandle::cancel) is idempotent and may be called from any
//! thread. It unsubscribes from the event stream exactly once; off the owner
//! thread the underlying unsubscribe is deferred to the owner thread by the
//! lifecycle channel (never silently dropped). Cancelling after the handle
//! has fired, or a completion racing a cancellation, has no effect beyond
//! the first action.

use crate::error::ScopeError;
use crate::event::LifecycleEvent;
use crate::lifecycle::EventStream;
use crate::stream::Stream;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

#[derive(Debug)]
enum HandleState<E: LifecycleEvent> {
    /// Armed: scanning the live event stream for the terminal event.
    Watching { events: EventStream<E>, target: E },
    /// Fired "done". Terminal.
    Resolved,
    /// Fired with a failure. Terminal; the error is re-yielded if polled
    /// again.
    Failed(ScopeError),
    /// Cancelled by the holder before firing. Terminal.
    Cancelled,
}

/// One-shot completion signal representing "this scope has now ended".
///
/// Created per resolution attempt by
/// [`ScopeResolver::request_scope`](crate::scope::ScopeResolver::request_scope);
/// owned by whichever downstream subscription consumes it.
#[derive(Debug)]
#[must_use = "a scope handle does nothing unless polled or composed"]
pub struct ScopeHandle<E: LifecycleEvent> {
    state: HandleState<E>,
}

impl<E: LifecycleEvent> ScopeHandle<E> {
    pub(crate) fn watching(events: EventStream<E>, target: E) -> Self {
        Self {
            state: HandleState::Watching { events, target },
        }
    }

    /// An already-fired handle, used when policy swallows the already-ended
    /// signal: the scope is disposed immediately with no further action.
    pub(crate) fn resolved() -> Self {
        Self {
            state: HandleState::Resolved,
        }
    }

    /// Cancels the handle. Unsubscribes from the event stream if it was
    /// still armed; otherwise does nothing.
    pub fn cancel(&mut self) {
        if matches!(self.state, HandleState::Watching { .. }) {
            tracing::debug!("scope handle cancelled");
            // Replacing the state drops the stream, which unsubscribes
            // (deferring to the owner thread when called elsewhere).
            self.state = HandleState::Cancelled;
        }
    }

    /// True while the handle is armed and waiting for the terminal event.
    #[must_use]
    pub fn is_watching(&self) -> bool {
        matches!(self.state, HandleState::Watching { .. })
    }

    /// True once the handle has fired "done".
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self.state, HandleState::Resolved)
    }

    /// True once the handle was cancelled before firing.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self.state, HandleState::Cancelled)
    }
}

impl<E: LifecycleEvent> Unpin for ScopeHandle<E> {}

impl<E: LifecycleEvent> Future for ScopeHandle<E> {
    type Output = Result<(), ScopeError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        loop {
            match &mut this.state {
                HandleState::Resolved => return Poll::Ready(Ok(())),
                HandleState::Cancelled => return Poll::Ready(Err(ScopeError::Cancelled)),
                HandleState::Failed(error) => return Poll::Ready(Err(error.clone())),
                HandleState::Watching { events, target } => {
                    let target = *target;
                    match Pin::new(&mut *events).poll_next(cx) {
                        Poll::Ready(Some(event)) => {
                            if event.reaches(target) {
                                if event != target {
                                    tracing::debug!(
                                        observed = ?event,
                                        expected = ?target,
                                        "terminal boundary passed out of declared order"
                                    );
                                }
                                this.state = HandleState::Resolved;
                                return Poll::Ready(Ok(()));
                            }
                            // Not terminal for this scope; keep scanning.
                        }
                        Poll::Ready(None) => {
                            let error = match events.failure() {
                                Some(reason) => ScopeError::Upstream(reason),
                                None => ScopeError::UpstreamEnded,
                            };
                            this.state = HandleState::Failed(error.clone());
                            return Poll::Ready(Err(error));
                        }
                        Poll::Pending => return Poll::Pending,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affinity::OwnerAffinity;
    use crate::event::{OwnerEvent, ViewEvent};
    use crate::lifecycle;
    use std::sync::Arc;
    use std::task::{Wake, Waker};

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

    fn armed_handle(
        source: &lifecycle::LifecycleSource<OwnerEvent>,
        target: OwnerEvent,
    ) -> ScopeHandle<OwnerEvent> {
        ScopeHandle::watching(source.subscribe_changes().unwrap(), target)
    }

    #[test]
    fn fires_once_at_the_terminal_event() {
        init_test("fires_once_at_the_terminal_event");
        let (emitter, source) = lifecycle::channel(OwnerAffinity::current_thread());
        emitter.emit(OwnerEvent::Resume).unwrap();
        let mut handle = armed_handle(&source, OwnerEvent::Stop);

        let waker = noop_waker();
        let mut task_cx = Context::from_waker(&waker);
        assert!(Pin::new(&mut handle).poll(&mut task_cx).is_pending());

        emitter.emit(OwnerEvent::Pause).unwrap();
        assert!(Pin::new(&mut handle).poll(&mut task_cx).is_pending());

        emitter.emit(OwnerEvent::Stop).unwrap();
        let fired = Pin::new(&mut handle).poll(&mut task_cx);
        crate::assert_with_log!(
            matches!(fired, Poll::Ready(Ok(()))),
            "handle fires at terminal event",
            "Ready(Ok(()))",
            format!("{fired:?}")
        );
        assert!(handle.is_resolved());
        // Unsubscribed on completion.
        assert_eq!(source.subscriber_count().unwrap(), 0);
        crate::test_complete!("fires_once_at_the_terminal_event");
    }

    #[test]
    fn jumping_past_the_target_still_terminates() {
        init_test("jumping_past_the_target_still_terminates");
        let (emitter, source) = lifecycle::channel(OwnerAffinity::current_thread());
        emitter.emit(OwnerEvent::Start).unwrap();
        let mut handle = armed_handle(&source, OwnerEvent::Stop);

        let waker = noop_waker();
        let mut task_cx = Context::from_waker(&waker);
        // Stop never arrives; the owner goes straight to Destroy.
        emitter.emit(OwnerEvent::Destroy).unwrap();
        assert!(matches!(
            Pin::new(&mut handle).poll(&mut task_cx),
            Poll::Ready(Ok(()))
        ));
        crate::test_complete!("jumping_past_the_target_still_terminates");
    }

    #[test]
    fn equality_only_events_require_the_exact_terminal_value() {
        init_test("equality_only_events_require_the_exact_terminal_value");
        let (emitter, source) = lifecycle::channel(OwnerAffinity::current_thread());
        emitter.emit(ViewEvent::Attach).unwrap();
        let mut handle =
            ScopeHandle::watching(source.subscribe_changes().unwrap(), ViewEvent::Detach);

        let waker = noop_waker();
        let mut task_cx = Context::from_waker(&waker);
        emitter.emit(ViewEvent::Attach).unwrap();
        assert!(Pin::new(&mut handle).poll(&mut task_cx).is_pending());
        emitter.emit(ViewEvent::Detach).unwrap();
        assert!(matches!(
            Pin::new(&mut handle).poll(&mut task_cx),
            Poll::Ready(Ok(()))
        ));
        crate::test_complete!("equality_only_events_require_the_exact_terminal_value");
    }

    #[test]
    fn stream_completion_before_match_is_a_failure() {
        init_test("stream_completion_before_match_is_a_failure");
        let (emitter, source) = lifecycle::channel(OwnerAffinity::current_thread());
        emitter.emit(OwnerEvent::Create).unwrap();
        let mut handle = armed_handle(&source, OwnerEvent::Destroy);
        drop(emitter);

        let waker = noop_waker();
        let mut task_cx = Context::from_waker(&waker);
        assert!(matches!(
            Pin::new(&mut handle).poll(&mut task_cx),
            Poll::Ready(Err(ScopeError::UpstreamEnded))
        ));
        // Fused: a second poll re-yields the failure.
        assert!(matches!(
            Pin::new(&mut handle).poll(&mut task_cx),
            Poll::Ready(Err(ScopeError::UpstreamEnded))
        ));
        crate::test_complete!("stream_completion_before_match_is_a_failure");
    }

    #[test]
    fn upstream_abort_reason_is_passed_through() {
        init_test("upstream_abort_reason_is_passed_through");
        let (emitter, source) = lifecycle::channel(OwnerAffinity::current_thread());
        emitter.emit(OwnerEvent::Create).unwrap();
        let mut handle = armed_handle(&source, OwnerEvent::Destroy);
        emitter.abort("tracker detached");

        let waker = noop_waker();
        let mut task_cx = Context::from_waker(&waker);
        let failed = Pin::new(&mut handle).poll(&mut task_cx);
        crate::assert_with_log!(
            matches!(
                &failed,
                Poll::Ready(Err(ScopeError::Upstream(reason))) if &**reason == "tracker detached"
            ),
            "abort reason passes through unchanged",
            "Upstream(tracker detached)",
            format!("{failed:?}")
        );
        crate::test_complete!("upstream_abort_reason_is_passed_through");
    }

    #[test]
    fn cancel_is_idempotent_and_unsubscribes_once() {
        init_test("cancel_is_idempotent_and_unsubscribes_once");
        let (emitter, source) = lifecycle::channel(OwnerAffinity::current_thread());
        emitter.emit(OwnerEvent::Create).unwrap();
        let mut handle = armed_handle(&source, OwnerEvent::Destroy);
        assert_eq!(source.subscriber_count().unwrap(), 1);

        handle.cancel();
        assert!(handle.is_cancelled());
        assert_eq!(source.subscriber_count().unwrap(), 0);

        handle.cancel();
        assert!(handle.is_cancelled());

        let waker = noop_waker();
        let mut task_cx = Context::from_waker(&waker);
        assert!(matches!(
            Pin::new(&mut handle).poll(&mut task_cx),
            Poll::Ready(Err(ScopeError::Cancelled))
        ));
        crate::test_complete!("cancel_is_idempotent_and_unsubscribes_once");
    }

    #[test]
    fn cancel_after_fire_has_no_effect() {
        init_test("cancel_after_fire_has_no_effect");
        let (emitter, source) = lifecycle::channel(OwnerAffinity::current_thread());
        emitter.emit(OwnerEvent::Start).unwrap();
        let mut handle = armed_handle(&source, OwnerEvent::Stop);
        emitter.emit(OwnerEvent::Stop).unwrap();

        let waker = noop_waker();
        let mut task_cx = Context::from_waker(&waker);
        assert!(matches!(
            Pin::new(&mut handle).poll(&mut task_cx),
            Poll::Ready(Ok(()))
        ));

        handle.cancel();
        assert!(handle.is_resolved());
        assert!(matches!(
            Pin::new(&mut handle).poll(&mut task_cx),
            Poll::Ready(Ok(()))
        ));
        crate::test_complete!("cancel_after_fire_has_no_effect");
    }
}
