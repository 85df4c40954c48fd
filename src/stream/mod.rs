//! The stream seam toward subscription hosts.
//!
//! Scope resolution does not reimplement a reactive-streams library; it
//! exposes one narrow contract ([`Stream`]) and one composition
//! ([`ScopedStream`], take-until semantics against a scope handle). Host
//! pipelines that already have their own stream machinery can ignore this
//! module entirely and await the
//! [`ScopeHandle`](crate::scope::ScopeHandle) directly.

mod stream;
mod until;

pub use stream::Stream;
pub use until::ScopedStream;
