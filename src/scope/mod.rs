//! Scope resolution: boundary guard, policy, resolver, and the one-shot
//! handle.
//!
//! Data flow:
//!
//! ```text
//! request_scope() ─► peek last-known state ─► BoundaryGuard
//!                                                │
//!                              CorrespondingEvents function
//!                                                │
//!              subscribe_changes ◄── target terminal event
//!                      │
//!                 ScopeHandle ── fires "done" exactly once
//! ```

mod guard;
mod handle;
mod policy;
mod resolver;

pub use guard::{BoundaryGuard, ScopeState};
pub use handle::ScopeHandle;
pub use policy::ScopePolicy;
pub use resolver::ScopeResolver;
