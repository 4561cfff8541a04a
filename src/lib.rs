// Herald - typed in-process events
//
// Listeners subscribe to events with a fixed call signature and a priority,
// and are called in priority order when the event triggers. Events can be
// held directly or addressed by identifier through a registry.

// Re-export core functionality
pub use herald_events::*;

// Re-export optional crates
#[cfg(feature = "registry")]
pub use herald_registry::{EventId, Registry, RegistryBuilder, RegistryConfig, event_ids};

#[cfg(feature = "registry")]
pub use herald_registry;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Connection,
        Event,
        EventError,
        Priority,
        ScopedConnection,
        function,
        method,
        method_mut,
    };

    #[cfg(feature = "registry")]
    pub use crate::{EventId, Registry, event_ids};
}
