//! Per-owner lifecycle channel.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      LIFECYCLE CHANNEL                           │
//! │                                                                  │
//! │  Owner adapter                         Consumers                 │
//! │      │                                     │                     │
//! │      │── emit(event) ──► [StateCache] ──► peek() ──► last known  │
//! │      │                       │                                   │
//! │      │── backfill(event) ────┘         subscribe() ──► replay    │
//! │      │                                 subscribe_changes() ──►   │
//! │   (drop / abort) ─────────────────────► streams terminate        │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`channel`] produces the [`Emitter`] (owned by the owner adapter) and the
//! [`LifecycleSource`] (cloned by anyone needing peek or subscribe access).
//! The channel is the single point where the last-known state and the live
//! stream agree: recording and delivery happen under one update.

pub mod cache;
mod source;

pub use cache::StateCache;
pub use source::{channel, Emitter, EventStream, LifecycleSource};
