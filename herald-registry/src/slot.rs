//! Type-erased registry slots

use herald_events::Event;
use std::any::{Any, TypeId, type_name};

/// Object-safe view of an `Event<A, R>` of any signature.
trait ErasedEvent {
    fn as_any(&self) -> &dyn Any;

    fn listener_count(&self) -> usize;
}

impl<A: ?Sized + 'static, R: 'static> ErasedEvent for Event<A, R> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn listener_count(&self) -> usize {
        Event::<A, R>::listener_count(self)
    }
}

/// One declared event, tagged with its signature.
pub(crate) struct Slot {
    event: Box<dyn ErasedEvent>,
    signature: TypeId,
    signature_name: &'static str,
}

impl Slot {
    pub(crate) fn new<A: ?Sized + 'static, R: 'static>(event: Event<A, R>) -> Self {
        Self {
            event: Box::new(event),
            signature: TypeId::of::<Event<A, R>>(),
            signature_name: signature_name::<A, R>(),
        }
    }

    /// The stored event, if its signature is exactly `Fn(&A) -> R`
    pub(crate) fn typed<A: ?Sized + 'static, R: 'static>(&self) -> Option<Event<A, R>> {
        if self.signature != TypeId::of::<Event<A, R>>() {
            return None;
        }

        self.event.as_any().downcast_ref::<Event<A, R>>().cloned()
    }

    pub(crate) fn signature_name(&self) -> &'static str {
        self.signature_name
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.event.listener_count()
    }
}

/// Human-readable signature, used in log records
pub(crate) fn signature_name<A: ?Sized + 'static, R: 'static>() -> &'static str {
    type_name::<fn(&A) -> R>()
}
