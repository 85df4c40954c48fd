//! Error types for scope resolution.
//!
//! Error handling follows these principles:
//!
//! - Errors are explicit and typed (no stringly-typed errors)
//! - The "already ended" path is an ordinary branch, not control flow by
//!   exception: correspondence functions return
//!   [`OutsideScope`](crate::event::correspondence::OutsideScope) and the
//!   resolver converts it into [`ScopeError::Ended`]
//! - Boundary violations are never silently dropped and never retried
//!   internally; only the `Ended` path has a configurable swallow policy
//!   (see [`ScopePolicy`](crate::scope::ScopePolicy))

use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by scope resolution and by a
/// [`ScopeHandle`](crate::scope::ScopeHandle)'s failure channel.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScopeError {
    /// Scope was requested before the owner emitted any lifecycle event.
    ///
    /// Fatal to that resolution attempt; never retried internally.
    #[error("scope requested before the owner emitted any lifecycle event")]
    NotStarted,

    /// The owner's lifecycle has already reached a terminal input under the
    /// corresponding-events policy; there is no further valid scope.
    #[error("owner lifecycle is already outside its scope")]
    Ended {
        /// Captured context, present when diagnostics capture is enabled on
        /// the governing [`ScopePolicy`](crate::scope::ScopePolicy).
        diagnostics: Option<EndedDiagnostics>,
    },

    /// Resolution or unsubscription was attempted off the owner's designated
    /// thread.
    #[error("lifecycle accessed from a non-owner thread")]
    ThreadAffinity,

    /// The lifecycle event stream completed before the scope's terminal
    /// event was observed.
    #[error("lifecycle event stream ended before the scope's terminal event")]
    UpstreamEnded,

    /// The lifecycle event stream itself failed; the reason is passed
    /// through unchanged.
    #[error("lifecycle event stream failed: {0}")]
    Upstream(Arc<str>),

    /// The scope handle was cancelled by its holder before the scope ended.
    #[error("scope handle was cancelled")]
    Cancelled,
}

impl ScopeError {
    /// Builds an `Ended` error with no captured diagnostics.
    #[must_use]
    pub fn ended() -> Self {
        Self::Ended { diagnostics: None }
    }

    /// Returns true if this error is a boundary violation (a precondition
    /// failure of the resolution state machine, as opposed to an upstream or
    /// cancellation outcome).
    #[must_use]
    pub fn is_boundary_violation(&self) -> bool {
        matches!(
            self,
            Self::NotStarted | Self::Ended { .. } | Self::ThreadAffinity
        )
    }
}

/// Context captured alongside [`ScopeError::Ended`] when diagnostics capture
/// is enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndedDiagnostics {
    /// Debug rendering of the terminal event that was observed.
    pub observed: String,
    /// Name of the thread the resolution ran on, if it has one.
    pub thread: Option<String>,
}

/// Errors from plugin/policy configuration.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The policy was locked down; configuration can no longer change.
    #[error("scope policy is locked; configuration can no longer change")]
    Locked,
}
