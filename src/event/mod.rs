//! Lifecycle events and the contract they satisfy.
//!
//! A lifecycle event is a discrete, named point in an owner's life. The
//! resolver only needs two things from an event type: equality, and a
//! *termination test* deciding whether an observed event satisfies a target
//! terminal event. Totally-ordered event sets answer the second with `>=`,
//! which keeps a terminal event from being missed when events fire out of
//! declared order; equality-only event sets (such as [`ViewEvent`]) fall back
//! to strict equality, with the documented limitation that a stream skipping
//! the exact terminal value never resolves.

pub mod correspondence;

use crate::event::correspondence::OutsideScope;
use std::fmt;

/// Contract for lifecycle event types.
///
/// Implementors are small `Copy` values from a finite set. The default
/// [`reaches`](LifecycleEvent::reaches) is strict equality; override it for
/// ordered event sets so that "jumping past" the terminal event still
/// terminates the scope.
pub trait LifecycleEvent: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Returns true if observing `self` satisfies termination against
    /// `target`.
    fn reaches(self, target: Self) -> bool {
        self == target
    }
}

/// Lifecycle events of an activity-like owner.
///
/// The variants are declared in their conventional firing order, and the
/// derived `Ord` follows it, so [`reaches`](LifecycleEvent::reaches) is `>=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OwnerEvent {
    /// The owner was created.
    Create,
    /// The owner became visible.
    Start,
    /// The owner came to the foreground.
    Resume,
    /// The owner left the foreground.
    Pause,
    /// The owner is no longer visible.
    Stop,
    /// The owner was destroyed. Terminal.
    Destroy,
}

impl LifecycleEvent for OwnerEvent {
    fn reaches(self, target: Self) -> bool {
        self >= target
    }
}

impl OwnerEvent {
    /// Default corresponding-events policy for activity-like owners.
    ///
    /// Symmetric boundary pairing: create↔destroy, start↔stop. Resume's
    /// symmetric partner is pause, but pause is not itself a closing
    /// boundary, so a scope opened at resume (or at pause) escalates to the
    /// nearest still-open boundary, stop. Destroy is terminal.
    ///
    /// A plain `fn` so it can be handed straight to
    /// [`ScopeResolver::new`](crate::scope::ScopeResolver::new).
    pub fn terminal_for(event: Self) -> Result<Self, OutsideScope> {
        match event {
            Self::Create => Ok(Self::Destroy),
            Self::Start => Ok(Self::Stop),
            Self::Resume | Self::Pause => Ok(Self::Stop),
            Self::Stop => Ok(Self::Destroy),
            Self::Destroy => Err(OutsideScope),
        }
    }

    /// Translates an owner tracker's queryable level into the event that
    /// would have produced it, for backfilling a lifecycle channel created
    /// after the owner already advanced (see
    /// [`Emitter::backfill`](crate::lifecycle::Emitter::backfill)).
    ///
    /// Returns `None` for [`OwnerLevel::Initialized`]: nothing has happened
    /// yet, so there is nothing to synthesize.
    #[must_use]
    pub fn backfill_for(level: OwnerLevel) -> Option<Self> {
        match level {
            OwnerLevel::Initialized => None,
            OwnerLevel::Created => Some(Self::Create),
            OwnerLevel::Started => Some(Self::Start),
            OwnerLevel::Resumed => Some(Self::Resume),
            OwnerLevel::Destroyed => Some(Self::Destroy),
        }
    }
}

/// Queryable current level of an activity-like owner's tracker, independent
/// of its event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OwnerLevel {
    /// Constructed but no lifecycle event observed yet.
    Initialized,
    /// At or past create, before start.
    Created,
    /// At or past start, before resume.
    Started,
    /// At or past resume.
    Resumed,
    /// Destroyed. Terminal.
    Destroyed,
}

/// Lifecycle events of a view-like owner.
///
/// Attach/detach carry no useful total order (a view can re-attach), so this
/// set uses the default equality termination test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewEvent {
    /// The view was attached to a window.
    Attach,
    /// The view was detached from its window. Terminal.
    Detach,
}

impl LifecycleEvent for ViewEvent {}

impl ViewEvent {
    /// Default corresponding-events policy for view-like owners.
    pub fn terminal_for(event: Self) -> Result<Self, OutsideScope> {
        match event {
            Self::Attach => Ok(Self::Detach),
            Self::Detach => Err(OutsideScope),
        }
    }
}
