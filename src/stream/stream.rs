//! The stream seam toward subscription hosts.
//!
//! The crate stays runtime-agnostic by defining the minimal asynchronous
//! iteration contract it needs: lifecycle event streams implement it, and
//! any host-side value stream that implements it can be bound to a scope via
//! [`ScopedStream`](super::ScopedStream).

use std::ops::DerefMut;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Asynchronous iterator producing a sequence of values.
///
/// Each call to `poll_next` attempts to pull out the next value, returning
/// `Poll::Pending` if no value is ready, `Poll::Ready(Some(item))` if one
/// is, or `Poll::Ready(None)` once the stream has terminated.
///
/// # Cancel Safety
///
/// Dropping a stream mid-iteration is safe at any yield point; buffered
/// items may be lost but no delivery happens twice.
pub trait Stream {
    /// The type of values yielded by the stream.
    type Item;

    /// Attempt to pull out the next value of this stream.
    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>>;

    /// Returns the bounds on the remaining length of the stream.
    ///
    /// The default `(0, None)` is correct for any stream.
    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, None)
    }
}

impl<P> Stream for Pin<P>
where
    P: DerefMut + Unpin,
    P::Target: Stream + Unpin,
{
    type Item = <P::Target as Stream>::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().as_mut().poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (**self).size_hint()
    }
}

impl<S: Stream + Unpin + ?Sized> Stream for Box<S> {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut **self).poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (**self).size_hint()
    }
}

impl<S: Stream + Unpin + ?Sized> Stream for &mut S {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut **self).poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (**self).size_hint()
    }
}
