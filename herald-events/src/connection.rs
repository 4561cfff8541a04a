//! Subscription handles
//!
//! A [`Connection`] is the move-only handle for one listener registration. It
//! shares ownership of its event, so the event stays alive for as long as the
//! connection does, and it refers to its listener by identity only.
//! [`ScopedConnection`] disconnects automatically when dropped.

use crate::error::EventError;
use crate::event::{Event, ListenerHandle, ListenerSet};
use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;
use tracing::{debug, warn};

/// Handle for one listener registration.
///
/// Connections cannot be cloned; a subscription has exactly one owner.
#[must_use = "dropping a Connection leaves the listener registered with no way to remove it"]
pub struct Connection {
    event: Option<Rc<dyn ListenerSet>>,
    delegate: Option<Box<dyn Any>>,
    active: bool,
    error: Option<EventError>,
}

impl Connection {
    pub(crate) fn bound<A: ?Sized + 'static, R: 'static>(
        event: &Event<A, R>,
        handle: ListenerHandle<A, R>,
    ) -> Self {
        Self {
            event: Some(event.erased()),
            delegate: Some(handle.erased()),
            active: true,
            error: None,
        }
    }

    /// A connection that never got registered
    pub fn failed(error: EventError) -> Self {
        Self {
            event: None,
            delegate: None,
            active: false,
            error: Some(error),
        }
    }

    // Left behind by `ScopedConnection::release`; disconnecting it is a no-op.
    fn detached() -> Self {
        Self {
            event: None,
            delegate: None,
            active: false,
            error: None,
        }
    }

    /// Remove the listener from its event.
    ///
    /// Calling this more than once is a no-op. If the event is broadcasting
    /// at the time the removal is refused, the connection still becomes
    /// inactive and the listener stays registered.
    pub fn disconnect(&mut self) {
        if let Some(event) = self.event.take() {
            if self.active {
                let removed = match self.delegate.take() {
                    Some(delegate) => event.remove_erased(delegate.as_ref()),
                    None => Ok(()),
                };

                if event.logging_enabled() {
                    match removed {
                        Ok(()) => debug!(event = event.label(), "Connection disconnected"),
                        Err(error) => warn!(
                            event = event.label(),
                            %error,
                            "Connection deactivated but listener could not be removed"
                        ),
                    }
                }
            }
        }

        self.active = false;
    }

    /// Whether this connection refers to a live, not yet disconnected listener
    pub fn is_connected(&self) -> bool {
        self.event.is_some() && self.active
    }

    /// Whether this connection is active and was created without error
    pub fn is_active(&self) -> bool {
        self.active && self.error.is_none()
    }

    /// Error the connection was created with, if any
    pub fn error(&self) -> Option<EventError> {
        self.error
    }

    /// Convert into a connection that disconnects on drop
    pub fn scoped(self) -> ScopedConnection {
        ScopedConnection::from(self)
    }
}

impl From<EventError> for Connection {
    fn from(error: EventError) -> Self {
        Self::failed(error)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("event", &self.event.as_ref().map(|event| event.label()))
            .field("active", &self.active)
            .field("error", &self.error)
            .finish()
    }
}

/// A [`Connection`] that disconnects when it goes out of scope.
#[must_use = "a ScopedConnection disconnects as soon as it is dropped"]
pub struct ScopedConnection {
    connection: Connection,
}

impl ScopedConnection {
    /// Disconnect now instead of at the end of the scope
    pub fn disconnect(&mut self) {
        self.connection.disconnect();
    }

    /// Give up automatic disconnection and return the plain connection
    pub fn release(mut self) -> Connection {
        std::mem::replace(&mut self.connection, Connection::detached())
    }
}

impl From<Connection> for ScopedConnection {
    fn from(connection: Connection) -> Self {
        Self { connection }
    }
}

impl Deref for ScopedConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.connection
    }
}

impl Drop for ScopedConnection {
    fn drop(&mut self) {
        self.connection.disconnect();
    }
}

impl fmt::Debug for ScopedConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ScopedConnection")
            .field(&self.connection)
            .finish()
    }
}
