//! Boundary preconditions for scope resolution.
//!
//! Over its lifetime a scope moves through a conceptual machine:
//!
//! ```text
//! NOT_STARTED ──(first event observed)──► ACTIVE ──(terminal event |
//!                                                   OutsideScope)──► ENDED
//! ```
//!
//! The guard classifies the last-known state against that machine before any
//! subscription is armed. Requests while `NOT_STARTED` or `ENDED` fail
//! immediately; every such boundary violation is funneled through the
//! policy's reporter callback before being surfaced, and the `ENDED` case
//! may instead be swallowed by a registered handler.

use crate::error::{EndedDiagnostics, ScopeError};
use crate::event::correspondence::CorrespondingEvents;
use crate::event::LifecycleEvent;
use crate::scope::policy::ScopePolicy;
use std::thread;

/// Outcome of admitting a resolution request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission<E> {
    /// The scope is active; arm a watch for this terminal event.
    Watch(E),
    /// The lifecycle already ended and policy swallowed the signal; the
    /// scope is disposed with no further action.
    AlreadyDisposed,
}

/// Conceptual position of a scope's owner in the boundary state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    /// No lifecycle event has been observed yet.
    NotStarted,
    /// The owner is between its first event and its terminal event.
    Active,
    /// The lifecycle reached a terminal input; no further scope exists.
    Ended,
}

/// Precondition checks wrapping the resolver's entry point.
#[derive(Debug, Clone)]
pub struct BoundaryGuard {
    policy: ScopePolicy,
}

impl BoundaryGuard {
    /// Creates a guard enforcing boundaries under the given policy.
    #[must_use]
    pub fn new(policy: ScopePolicy) -> Self {
        Self { policy }
    }

    /// The policy this guard reports to.
    #[must_use]
    pub fn policy(&self) -> &ScopePolicy {
        &self.policy
    }

    /// Classifies the last-known state without arming anything.
    pub fn classify<E, C>(&self, last_known: Option<E>, correspondence: &C) -> ScopeState
    where
        E: LifecycleEvent,
        C: CorrespondingEvents<E>,
    {
        match last_known {
            None => ScopeState::NotStarted,
            Some(event) => match correspondence.resolve(event) {
                Ok(_) => ScopeState::Active,
                Err(_) => ScopeState::Ended,
            },
        }
    }

    /// Admits or rejects a resolution request for the given last-known
    /// state.
    pub(crate) fn admit<E, C>(
        &self,
        last_known: Option<E>,
        correspondence: &C,
    ) -> Result<Admission<E>, ScopeError>
    where
        E: LifecycleEvent,
        C: CorrespondingEvents<E>,
    {
        let Some(current) = last_known else {
            return Err(self.reject(ScopeError::NotStarted));
        };
        match correspondence.resolve(current) {
            Ok(target) => Ok(Admission::Watch(target)),
            Err(_) => {
                let error = ScopeError::Ended {
                    diagnostics: self.diagnostics_for(current),
                };
                if self.policy.swallow_ended(&error) {
                    tracing::debug!(observed = ?current, "ended signal swallowed by policy");
                    Ok(Admission::AlreadyDisposed)
                } else {
                    Err(self.reject(error))
                }
            }
        }
    }

    /// Funnels a boundary violation through the reporter and hands it back
    /// for surfacing.
    pub(crate) fn reject(&self, error: ScopeError) -> ScopeError {
        debug_assert!(error.is_boundary_violation());
        tracing::debug!(error = %error, "scope boundary violation");
        self.policy.report_violation(&error);
        error
    }

    fn diagnostics_for<E: LifecycleEvent>(&self, observed: E) -> Option<EndedDiagnostics> {
        if !self.policy.capture_diagnostics() {
            return None;
        }
        Some(EndedDiagnostics {
            observed: format!("{observed:?}"),
            thread: thread::current().name().map(str::to_owned),
        })
    }
}
