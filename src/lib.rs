//! Scopebind: lifecycle-scoped subscription binding.
//!
//! This crate binds the lifetime of an asynchronously-running subscription (a
//! stream of values, or a single pending result) to the lifetime of an
//! external *scope* — typically a UI component's lifecycle. Once the scope
//! ends, the subscription is torn down: no callback fires and no resource
//! stays subscribed past the owner that created it, and the call site never
//! tracks or cancels anything by hand.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                        SCOPE RESOLUTION                              │
//! │                                                                      │
//! │  Owner ──emit──► lifecycle channel ──peek──► BoundaryGuard           │
//! │                       │                          │                   │
//! │                       │              CorrespondingEvents             │
//! │                       │                          │                   │
//! │                       └──subscribe_changes──► ScopeHandle            │
//! │                                                  │                   │
//! │  Subscription host ◄──── done / failed (one-shot) ┘                  │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - [`lifecycle`]: a replay-latest channel carrying one owner's ordered
//!   lifecycle events, with a peekable last-known state.
//! - [`event`]: the [`LifecycleEvent`](event::LifecycleEvent) contract plus
//!   the built-in activity-like and view-like event sets and their default
//!   corresponding-events policies.
//! - [`scope`]: the resolver that turns "current lifecycle state" into a
//!   one-shot [`ScopeHandle`](scope::ScopeHandle), guarded by
//!   not-started / already-ended boundary checks and a pluggable policy.
//! - [`stream`]: the minimal [`Stream`](stream::Stream) seam toward
//!   subscription hosts, and the take-until adapter that ends any stream
//!   when its scope does.
//!
//! # Cancel Safety
//!
//! A [`ScopeHandle`](scope::ScopeHandle) fires exactly once. Cancelling it is
//! idempotent, unsubscribes from the event stream exactly once, and may be
//! requested from any thread: off the owner thread the unsubscribe is
//! deferred to the owner thread rather than dropped.
//!
//! # Example
//!
//! ```ignore
//! use scopebind::event::OwnerEvent;
//! use scopebind::lifecycle;
//! use scopebind::scope::ScopeResolver;
//! use scopebind::affinity::OwnerAffinity;
//!
//! let (emitter, source) = lifecycle::channel(OwnerAffinity::current_thread());
//! emitter.emit(OwnerEvent::Create)?;
//! emitter.emit(OwnerEvent::Start)?;
//!
//! let resolver = ScopeResolver::new(source, OwnerEvent::terminal_for);
//! let scope = resolver.request_scope()?;
//!
//! // `scope` completes when the owner reaches Stop; compose it with any
//! // subscription via `stream::ScopedStream` or await it directly.
//! ```

pub mod affinity;
pub mod error;
pub mod event;
pub mod lifecycle;
pub mod scope;
pub mod stream;
pub mod test_logging;

pub use crate::affinity::OwnerAffinity;
pub use crate::error::{ConfigError, ScopeError};
pub use crate::event::correspondence::{CorrespondingEvents, OutsideScope};
pub use crate::event::{LifecycleEvent, OwnerEvent, OwnerLevel, ViewEvent};
pub use crate::lifecycle::{Emitter, EventStream, LifecycleSource};
pub use crate::scope::{BoundaryGuard, ScopeHandle, ScopePolicy, ScopeResolver, ScopeState};
pub use crate::stream::{ScopedStream, Stream};

/// Phase tracking macro for structured test logging.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(test = $name, "=== TEST START ===");
    };
}

/// Section marker within a test phase.
#[macro_export]
macro_rules! test_section {
    ($name:expr) => {
        tracing::info!(section = $name, "--- section ---");
    };
}

/// Completion marker with optional summary fields.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = $name, "=== TEST COMPLETE ===");
    };
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(test = $name, $($key = ?$value,)+ "=== TEST COMPLETE ===");
    };
}

/// Assertion with logging for better test output.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {
        if !$cond {
            tracing::error!(
                message = $msg,
                expected = ?$expected,
                actual = ?$actual,
                "Assertion failed"
            );
        }
        assert!($cond, "{}: expected {:?}, got {:?}", $msg, $expected, $actual);
    };
}
