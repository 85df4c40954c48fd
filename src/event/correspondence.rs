//! Corresponding-events functions.
//!
//! A correspondence function maps the most recently observed lifecycle event
//! to the event that, when next observed, marks scope end. It is total over
//! the event set but partial in practice: the declared terminal input(s)
//! return [`OutsideScope`] instead of a value, making "the lifecycle has
//! already ended" an ordinary, statically checked branch.
//!
//! The function is invoked once per resolution, not once per event, and must
//! be pure and cheap.

use crate::event::LifecycleEvent;
use std::fmt;

/// Signal that the lifecycle has already reached its terminal event; there
/// is no further valid scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutsideScope;

impl fmt::Display for OutsideScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lifecycle has reached its terminal event")
    }
}

impl std::error::Error for OutsideScope {}

/// Maps a current lifecycle event to its corresponding terminal event.
///
/// Supplied per owner type. Any `Fn(E) -> Result<E, OutsideScope>` qualifies,
/// so the built-in policies are plain functions
/// ([`OwnerEvent::terminal_for`](crate::event::OwnerEvent::terminal_for),
/// [`ViewEvent::terminal_for`](crate::event::ViewEvent::terminal_for)) and a
/// custom owner adapter can pass a closure.
pub trait CorrespondingEvents<E: LifecycleEvent> {
    /// Resolves the terminal event for `event`, or signals that the
    /// lifecycle is already outside any scope.
    fn resolve(&self, event: E) -> Result<E, OutsideScope>;
}

impl<E, F> CorrespondingEvents<E> for F
where
    E: LifecycleEvent,
    F: Fn(E) -> Result<E, OutsideScope>,
{
    fn resolve(&self, event: E) -> Result<E, OutsideScope> {
        self(event)
    }
}
