//! Pluggable scope policy.
//!
//! Host applications configure three hooks: a handler that *swallows* the
//! already-ended signal (turning an `Ended` failure into an immediate silent
//! disposal), a reporter that observes every boundary violation before it is
//! surfaced (letting a host downgrade fatal errors to warnings in logs), and
//! a diagnostics-capture toggle.
//!
//! The policy is an explicit, injectable object passed to
//! [`ScopeResolver`](crate::scope::ScopeResolver) construction, not ambient
//! process state. A host that wants process-wide behavior shares one clone.
//! Once [`lockdown`](ScopePolicy::lockdown) is called, every further
//! configuration call fails fast with [`ConfigError::Locked`], so a library
//! consumer cannot silently alter error policy after application wiring is
//! finalized. [`reset_for_tests`](ScopePolicy::reset_for_tests) restores
//! defaults (including the lock) for test isolation.

use crate::error::{ConfigError, ScopeError};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

type EndedHandler = Arc<dyn Fn(&ScopeError) + Send + Sync>;
type ViolationReporter = Arc<dyn Fn(&ScopeError) + Send + Sync>;

#[derive(Default)]
struct PolicyInner {
    ended_handler: Option<EndedHandler>,
    reporter: Option<ViolationReporter>,
    capture_diagnostics: bool,
    locked: bool,
}

/// Shared, lockable configuration for scope resolution.
///
/// Cloneable handle; all clones observe the same configuration.
#[derive(Clone, Default)]
pub struct ScopePolicy {
    inner: Arc<Mutex<PolicyInner>>,
}

impl fmt::Debug for ScopePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ScopePolicy")
            .field("ended_handler", &inner.ended_handler.is_some())
            .field("reporter", &inner.reporter.is_some())
            .field("capture_diagnostics", &inner.capture_diagnostics)
            .field("locked", &inner.locked)
            .finish()
    }
}

impl ScopePolicy {
    /// Creates a policy with defaults: surface `Ended`, no reporter, no
    /// diagnostics capture, unlocked.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler that consumes the already-ended signal. With a
    /// handler in place, requesting a scope from an ended lifecycle
    /// completes immediately with no error instead of failing.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Locked`] after lockdown.
    pub fn set_ended_handler<F>(&self, handler: F) -> Result<(), ConfigError>
    where
        F: Fn(&ScopeError) + Send + Sync + 'static,
    {
        let mut inner = self.check_unlocked()?;
        inner.ended_handler = Some(Arc::new(handler));
        Ok(())
    }

    /// Removes the already-ended handler, restoring surface-as-error.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Locked`] after lockdown.
    pub fn clear_ended_handler(&self) -> Result<(), ConfigError> {
        let mut inner = self.check_unlocked()?;
        inner.ended_handler = None;
        Ok(())
    }

    /// Registers a callback observing every boundary violation before it is
    /// surfaced to the subscriber.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Locked`] after lockdown.
    pub fn set_violation_reporter<F>(&self, reporter: F) -> Result<(), ConfigError>
    where
        F: Fn(&ScopeError) + Send + Sync + 'static,
    {
        let mut inner = self.check_unlocked()?;
        inner.reporter = Some(Arc::new(reporter));
        Ok(())
    }

    /// Toggles capture of diagnostic context on `Ended` errors (observed
    /// event and resolving thread).
    ///
    /// # Errors
    ///
    /// [`ConfigError::Locked`] after lockdown.
    pub fn set_capture_diagnostics(&self, capture: bool) -> Result<(), ConfigError> {
        let mut inner = self.check_unlocked()?;
        inner.capture_diagnostics = capture;
        Ok(())
    }

    /// Locks the policy. Idempotent; irreversible except through
    /// [`reset_for_tests`](ScopePolicy::reset_for_tests).
    pub fn lockdown(&self) {
        self.inner.lock().locked = true;
    }

    /// Returns true once [`lockdown`](ScopePolicy::lockdown) has been
    /// called.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.inner.lock().locked
    }

    /// Restores every hook and the lock to defaults. Test isolation only;
    /// deliberately bypasses lockdown so one test's wiring cannot leak into
    /// the next.
    pub fn reset_for_tests(&self) {
        *self.inner.lock() = PolicyInner::default();
    }

    pub(crate) fn capture_diagnostics(&self) -> bool {
        self.inner.lock().capture_diagnostics
    }

    /// Runs the ended handler against `error`, returning true if a handler
    /// consumed the signal.
    pub(crate) fn swallow_ended(&self, error: &ScopeError) -> bool {
        let handler = self.inner.lock().ended_handler.clone();
        match handler {
            Some(handler) => {
                handler(error);
                true
            }
            None => false,
        }
    }

    /// Funnels a boundary violation through the reporter, if any.
    pub(crate) fn report_violation(&self, error: &ScopeError) {
        let reporter = self.inner.lock().reporter.clone();
        if let Some(reporter) = reporter {
            reporter(error);
        }
    }

    fn check_unlocked(&self) -> Result<parking_lot::MutexGuard<'_, PolicyInner>, ConfigError> {
        let inner = self.inner.lock();
        if inner.locked {
            return Err(ConfigError::Locked);
        }
        Ok(inner)
    }
}
