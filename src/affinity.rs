//! Owner-thread affinity.
//!
//! All lifecycle event emission, state-cache updates, and scope resolution
//! for one owner must occur on a single designated logical thread (the
//! "owner thread", analogous to a UI main thread). The engine performs no
//! internal locking on the caller's behalf; instead it *detects* affinity
//! violations and surfaces them as
//! [`ScopeError::ThreadAffinity`](crate::error::ScopeError::ThreadAffinity)
//! rather than proceeding with a potentially corrupting access.
//!
//! The check itself is an injectable predicate so the core carries no
//! platform dependency: platform adapters supply the real main-thread check,
//! tests supply [`OwnerAffinity::unchecked`].

use crate::error::ScopeError;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// Predicate deciding whether the current thread is the owner thread.
#[derive(Clone)]
pub struct OwnerAffinity {
    check: Arc<dyn Fn() -> bool + Send + Sync>,
    label: &'static str,
}

impl fmt::Debug for OwnerAffinity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerAffinity")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl OwnerAffinity {
    /// Pins the owner to the calling thread.
    #[must_use]
    pub fn current_thread() -> Self {
        let owner: ThreadId = thread::current().id();
        Self {
            check: Arc::new(move || thread::current().id() == owner),
            label: "current-thread",
        }
    }

    /// Accepts every thread. For tests and hosts that already schedule
    /// deterministically.
    #[must_use]
    pub fn unchecked() -> Self {
        Self {
            check: Arc::new(|| true),
            label: "unchecked",
        }
    }

    /// Builds an affinity from a custom predicate, e.g. a platform's
    /// is-on-main-thread API.
    pub fn from_predicate<F>(predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            check: Arc::new(predicate),
            label: "custom",
        }
    }

    /// Returns true if the current thread is the owner thread.
    #[must_use]
    pub fn is_owner(&self) -> bool {
        (self.check)()
    }

    /// Fails with [`ScopeError::ThreadAffinity`] off the owner thread.
    pub(crate) fn ensure(&self) -> Result<(), ScopeError> {
        if self.is_owner() {
            Ok(())
        } else {
            tracing::debug!(affinity = self.label, "owner-thread affinity violated");
            Err(ScopeError::ThreadAffinity)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_thread_affinity_holds_on_owner() {
        let affinity = OwnerAffinity::current_thread();
        assert!(affinity.is_owner());
        assert!(affinity.ensure().is_ok());
    }

    #[test]
    fn current_thread_affinity_fails_elsewhere() {
        let affinity = OwnerAffinity::current_thread();
        let off_owner = thread::spawn(move || affinity.ensure())
            .join()
            .expect("spawned thread panicked");
        assert_eq!(off_owner, Err(ScopeError::ThreadAffinity));
    }

    #[test]
    fn unchecked_affinity_holds_everywhere() {
        let affinity = OwnerAffinity::unchecked();
        let off_owner = thread::spawn(move || affinity.ensure())
            .join()
            .expect("spawned thread panicked");
        assert_eq!(off_owner, Ok(()));
    }

    #[test]
    fn custom_predicate_is_consulted() {
        let affinity = OwnerAffinity::from_predicate(|| false);
        assert_eq!(affinity.ensure(), Err(ScopeError::ThreadAffinity));
    }
}
