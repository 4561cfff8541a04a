//! Identifier-keyed events for Herald
//!
//! A [`Registry`] maps the values of an identifier enum to events of
//! different signatures. Callers add listeners and trigger events by
//! identifier; the signature they name is checked against the declared one on
//! every access.
//!
//! ## Quick Start
//!
//! ```rust
//! use herald_registry::{event_ids, function, EventError, Registry};
//! use std::cell::Cell;
//!
//! event_ids! {
//!     pub enum GameEvent {
//!         Scored,
//!         Paused,
//!     }
//! }
//!
//! fn add_point(score: &Cell<u32>) {
//!     score.set(score.get() + 1);
//! }
//!
//! let registry = Registry::<GameEvent>::global();
//! registry.declare_event::<Cell<u32>, ()>(GameEvent::Scored, false)?;
//!
//! let _conn = registry
//!     .add_event_listener(GameEvent::Scored, function(add_point), 0, false)
//!     .scoped();
//!
//! let score = Cell::new(0_u32);
//! registry.notify_event(GameEvent::Scored, &score)?;
//! assert_eq!(score.get(), 1);
//!
//! // Wrong signature: nothing runs.
//! assert_eq!(
//!     registry.notify_event(GameEvent::Scored, &Cell::new(0_u64)),
//!     Err(EventError::FailedToMatchEventType)
//! );
//! # Ok::<(), EventError>(())
//! ```
//!
//! ## Blocking
//!
//! ```rust
//! use herald_registry::{event_ids, EventError, Registry};
//!
//! event_ids! {
//!     pub enum Signal {
//!         Tick,
//!     }
//! }
//!
//! let registry = Registry::<Signal>::new();
//! registry.declare_event::<(), ()>(Signal::Tick, false).unwrap();
//!
//! registry.block_events(true);
//! assert_eq!(registry.notify_event(Signal::Tick, &()), Err(EventError::EventsBlocked));
//! registry.block_events(false);
//! assert_eq!(registry.notify_event(Signal::Tick, &()), Ok(()));
//! ```

pub mod config;
pub mod id;
pub mod registry;
mod slot;

pub use config::RegistryConfig;
pub use id::EventId;
pub use registry::{Registry, RegistryBuilder};

pub use herald_events::{
    Connection, Event, EventError, IntoCallee, Priority, Result, ScopedConnection, function,
    method, method_mut,
};
