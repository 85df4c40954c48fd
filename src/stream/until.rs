//! Binds a value stream to a scope.
//!
//! [`ScopedStream`] is the take-until composition the whole crate exists
//! for: wrap any [`Stream`] together with a [`ScopeHandle`] and the wrapped
//! stream terminates — and unsubscribes — the moment the scope ends, whether
//! or not the inner stream had more values to give.

use crate::event::LifecycleEvent;
use crate::scope::ScopeHandle;
use crate::stream::Stream;
use pin_project::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Stream that ends when its scope does.
///
/// The scope is checked before the inner stream on every poll, so once the
/// scope has ended no further item is delivered, even one already buffered
/// inside the inner stream. When the inner stream finishes on its own the
/// scope handle is cancelled, releasing its lifecycle subscription.
#[derive(Debug)]
#[must_use = "streams do nothing unless polled"]
#[pin_project]
pub struct ScopedStream<S, E: LifecycleEvent> {
    #[pin]
    stream: S,
    scope: Option<ScopeHandle<E>>,
}

impl<S, E: LifecycleEvent> ScopedStream<S, E> {
    /// Binds `stream` to `scope`.
    pub fn new(stream: S, scope: ScopeHandle<E>) -> Self {
        Self {
            stream,
            scope: Some(scope),
        }
    }

    /// True once the stream has terminated because its scope ended (rather
    /// than the inner stream finishing first).
    #[must_use]
    pub fn scope_ended(&self) -> bool {
        self.scope.is_none()
    }
}

impl<S, E> Stream for ScopedStream<S, E>
where
    S: Stream,
    E: LifecycleEvent,
{
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        match this.scope.as_mut() {
            None => return Poll::Ready(None),
            Some(scope) => {
                if scope.is_cancelled() {
                    return Poll::Ready(None);
                }
                // The scope outcome, success or failure, ends the stream
                // either way; a failure was already surfaced on the handle's
                // own channel.
                if Pin::new(scope).poll(cx).is_ready() {
                    tracing::trace!("scope ended; terminating bound stream");
                    *this.scope = None;
                    return Poll::Ready(None);
                }
            }
        }
        match this.stream.poll_next(cx) {
            Poll::Ready(Some(item)) => Poll::Ready(Some(item)),
            Poll::Ready(None) => {
                // Inner stream finished first; release the lifecycle
                // subscription held by the handle.
                if let Some(scope) = this.scope.as_mut() {
                    scope.cancel();
                }
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.scope.is_none() {
            return (0, Some(0));
        }
        let (_, upper) = self.stream.size_hint();
        (0, upper)
    }
}
