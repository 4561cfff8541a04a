//! Typed in-process events for Herald
//!
//! This crate provides priority-ordered listener lists with a fixed call
//! signature, and move-only handles for managing subscriptions.
//!
//! ## Features
//!
//! - **Typed** - Each [`Event<A, R>`] calls listeners as `Fn(&A) -> R`
//! - **Ordered** - Higher priorities run first, ties keep arrival order
//! - **Broadcast-safe** - The listener list cannot change while a trigger runs
//! - **Flexible listeners** - Free functions, bound methods and closures
//! - **RAII** - [`ScopedConnection`] disconnects when it goes out of scope
//!
//! ## Quick Start
//!
//! ```rust
//! use herald_events::{function, Event};
//!
//! #[derive(Debug, PartialEq)]
//! enum Source {
//!     Function,
//!     Closure,
//! }
//!
//! fn on_message(_: &str) -> Source {
//!     Source::Function
//! }
//!
//! let event: Event<str, Source> = Event::new();
//! let _function = event.connect(function(on_message), 2, false);
//! let _closure = event.connect(|_: &str| Source::Closure, 1, false).scoped();
//!
//! assert_eq!(event.trigger("hello"), vec![Source::Function, Source::Closure]);
//! ```
//!
//! ## Void Events
//!
//! ```rust
//! use herald_events::{function, Event};
//! use std::cell::Cell;
//!
//! fn increment(counter: &Cell<i32>) {
//!     counter.set(counter.get() + 1);
//! }
//!
//! let event: Event<Cell<i32>> = Event::new();
//! event.add_listener(function(increment), 0, false).unwrap();
//!
//! let counter = Cell::new(0);
//! event.notify(&counter);
//! assert_eq!(counter.get(), 1);
//! ```
//!
//! ## Threading
//!
//! Events are `!Send`: they are built on `Rc` and `Cell` and expect to be
//! used from one thread. The broadcasting flag guards against re-entrant
//! modification from inside a listener, not against data races.

pub mod config;
pub mod connection;
pub mod delegate;
pub mod error;
pub mod event;

pub use config::EventConfig;
pub use connection::{Connection, ScopedConnection};
pub use delegate::{
    BoundMethod, BoundMethodMut, Callee, CalleeForm, Closure, ClosureForm, Delegate, FreeFn,
    IntoCallee, Priority, function, method, method_mut,
};
pub use error::{EventError, Result};
pub use event::{Event, EventBuilder, ListenerHandle};
