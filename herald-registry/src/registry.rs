//! Identifier-keyed event registry

use crate::config::RegistryConfig;
use crate::id::EventId;
use crate::slot::{Slot, signature_name};
use herald_events::{Connection, Event, EventBuilder, EventError, IntoCallee, Priority, Result};
use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use tracing::{debug, info, trace, warn};

thread_local! {
    /// One registry per identifier type, created on first use.
    static REGISTRIES: RefCell<HashMap<TypeId, Rc<dyn Any>>> = RefCell::new(HashMap::new());
}

/// Events addressed by identifier instead of by handle.
///
/// Each identifier owns one slot. A slot is either empty or holds one event
/// whose signature was fixed by [`declare_event`](Self::declare_event). Every
/// access names the signature it expects and fails with
/// [`EventError::FailedToMatchEventType`] unless it matches exactly.
///
/// # Examples
///
/// ```rust
/// use herald_registry::{event_ids, Registry};
///
/// event_ids! {
///     pub enum AppEvent {
///         Greet,
///     }
/// }
///
/// let registry = Registry::<AppEvent>::global();
/// registry.declare_event::<str, String>(AppEvent::Greet, false).unwrap();
///
/// let _conn = registry
///     .add_event_listener(AppEvent::Greet, |name: &str| format!("hello {name}"), 0, false)
///     .scoped();
///
/// let greetings = registry.trigger_event::<str, String>(AppEvent::Greet, "bob").unwrap();
/// assert_eq!(greetings, vec!["hello bob".to_string()]);
/// ```
pub struct Registry<E: EventId> {
    slots: RefCell<Vec<Option<Slot>>>,
    blocked: Cell<bool>,
    config: RegistryConfig,
    _ids: PhantomData<E>,
}

impl<E: EventId> Registry<E> {
    /// Create a standalone registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a standalone registry with custom config
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            slots: RefCell::new((0..E::COUNT).map(|_| None).collect()),
            blocked: Cell::new(config.start_blocked),
            config,
            _ids: PhantomData,
        }
    }

    /// The registry for `E` on this thread, created on first use
    pub fn global() -> Rc<Self> {
        REGISTRIES.with(|registries| {
            let mut registries = registries.borrow_mut();
            let entry = registries
                .entry(TypeId::of::<E>())
                .or_insert_with(|| Rc::new(Self::new()) as Rc<dyn Any>);

            // Entries are keyed by `TypeId::of::<E>()`.
            Rc::clone(entry)
                .downcast::<Self>()
                .unwrap_or_else(|_| unreachable!("registry map entry has a foreign type"))
        })
    }

    /// Make `registry` the registry for `E` on this thread.
    ///
    /// Handles to the previous instance keep working but are no longer
    /// reachable through [`global`](Self::global).
    pub fn install_global(registry: Self) -> Rc<Self> {
        let registry = Rc::new(registry);
        let previous = REGISTRIES.with(|registries| {
            registries
                .borrow_mut()
                .insert(TypeId::of::<E>(), Rc::clone(&registry) as Rc<dyn Any>)
        });
        drop(previous);
        registry
    }

    /// Registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Bind the signature `Fn(&A) -> R` to `id`.
    ///
    /// Fails with [`EventError::EventAlreadyDefined`] if `id` already holds an
    /// event and `can_replace` is false. Replacing an event detaches it from
    /// the registry; connections made against it stay valid but only affect
    /// the detached event.
    pub fn declare_event<A: ?Sized + 'static, R: 'static>(
        &self,
        id: E,
        can_replace: bool,
    ) -> Result<()> {
        let event: Event<A, R> = EventBuilder::new()
            .name(format!("{id:?}"))
            .enable_logging(self.config.enable_logging)
            .build();

        let previous = {
            let mut slots = self.slots.borrow_mut();
            let slot = slots
                .get_mut(id.index())
                .ok_or(EventError::InvalidIdentifier(id.index()))?;

            if slot.is_some() && !can_replace {
                if self.config.enable_logging {
                    debug!(id = ?id, "Event already declared");
                }
                return Err(EventError::EventAlreadyDefined);
            }

            slot.replace(Slot::new(event))
        };

        if self.config.enable_logging {
            debug!(
                id = ?id,
                signature = signature_name::<A, R>(),
                replaced = previous.is_some(),
                "Event declared"
            );
        }

        // Dropped outside the borrow: the old listeners may own registry handles.
        drop(previous);
        Ok(())
    }

    /// The event declared under `id`, if its signature is `Fn(&A) -> R`
    pub fn event<A: ?Sized + 'static, R: 'static>(&self, id: E) -> Result<Event<A, R>> {
        let slots = self.slots.borrow();
        let slot = slots
            .get(id.index())
            .ok_or(EventError::InvalidIdentifier(id.index()))?;

        match slot.as_ref().and_then(Slot::typed::<A, R>) {
            Some(event) => Ok(event),
            None => {
                if self.config.enable_logging {
                    warn!(
                        id = ?id,
                        expected = signature_name::<A, R>(),
                        declared = slot.as_ref().map(Slot::signature_name),
                        "Failed to match event type"
                    );
                }
                Err(EventError::FailedToMatchEventType)
            }
        }
    }

    /// Register a listener on the event declared under `id`.
    ///
    /// The listener's signature selects the event type; an empty slot or a
    /// different signature yields a connection holding
    /// [`EventError::FailedToMatchEventType`].
    pub fn add_event_listener<A, R, C, M>(
        &self,
        id: E,
        callee: C,
        priority: Priority,
        allow_duplicates: bool,
    ) -> Connection
    where
        A: ?Sized + 'static,
        R: 'static,
        C: IntoCallee<A, R, M>,
    {
        match self.event::<A, R>(id) {
            Ok(event) => event.connect(callee, priority, allow_duplicates),
            Err(error) => Connection::failed(error),
        }
    }

    /// Call every listener of `id` and collect their results.
    ///
    /// `A` and `R` must match the declared signature exactly.
    pub fn trigger_event<A: ?Sized + 'static, R: 'static>(&self, id: E, args: &A) -> Result<Vec<R>> {
        let event = self.dispatch_target::<A, R>(id)?;
        Ok(event.trigger(args))
    }

    /// Call every listener of a void event
    pub fn notify_event<A: ?Sized + 'static>(&self, id: E, args: &A) -> Result<()> {
        let event = self.dispatch_target::<A, ()>(id)?;
        event.notify(args);
        Ok(())
    }

    /// Call every listener of `id`, accumulating results into a `C` with
    /// `adder`.
    pub fn trigger_event_with<A, R, C, F>(&self, id: E, args: &A, adder: F) -> Result<C>
    where
        A: ?Sized + 'static,
        R: 'static,
        C: Default,
        F: FnMut(&mut C, R),
    {
        let event = self.dispatch_target::<A, R>(id)?;
        Ok(event.trigger_with(args, adder))
    }

    /// Suppress (or resume) every trigger on this registry
    pub fn block_events(&self, blocked: bool) {
        self.blocked.set(blocked);

        if self.config.enable_logging {
            info!(blocked, "Registry events blocked state changed");
        }
    }

    /// Whether triggers are currently suppressed
    pub fn events_blocked(&self) -> bool {
        self.blocked.get()
    }

    /// Release every declared event
    pub fn destroy_all(&self) {
        let released: Vec<Slot> = self
            .slots
            .borrow_mut()
            .iter_mut()
            .filter_map(Option::take)
            .collect();

        if self.config.enable_logging {
            info!(released = released.len(), "Destroyed all events");
        }

        drop(released);
    }

    /// Whether an event is declared under `id`
    pub fn is_declared(&self, id: E) -> bool {
        matches!(self.slots.borrow().get(id.index()), Some(Some(_)))
    }

    /// Number of listeners on the event under `id`, whatever its signature
    pub fn listener_count(&self, id: E) -> Option<usize> {
        self.slots
            .borrow()
            .get(id.index())
            .and_then(Option::as_ref)
            .map(Slot::listener_count)
    }

    /// Number of identifiers with a declared event
    pub fn declared_count(&self) -> usize {
        self.slots.borrow().iter().filter(|slot| slot.is_some()).count()
    }

    fn dispatch_target<A: ?Sized + 'static, R: 'static>(&self, id: E) -> Result<Event<A, R>> {
        if self.blocked.get() {
            if self.config.enable_logging {
                debug!(id = ?id, "Trigger suppressed, events are blocked");
            }
            return Err(EventError::EventsBlocked);
        }

        let event = self.event::<A, R>(id)?;

        if self.config.enable_logging {
            trace!(id = ?id, listeners = event.listener_count(), "Dispatching event");
        }

        Ok(event)
    }
}

impl<E: EventId> Default for Registry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EventId> fmt::Debug for Registry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("slots", &E::COUNT)
            .field("declared", &self.declared_count())
            .field("blocked", &self.blocked.get())
            .finish()
    }
}

/// Registry builder
pub struct RegistryBuilder<E: EventId> {
    config: RegistryConfig,
    _ids: PhantomData<E>,
}

impl<E: EventId> RegistryBuilder<E> {
    /// Create new registry builder
    pub fn new() -> Self {
        Self {
            config: RegistryConfig::default(),
            _ids: PhantomData,
        }
    }

    /// Enable/disable logging for the registry and its events
    pub fn enable_logging(mut self, enabled: bool) -> Self {
        self.config.enable_logging = enabled;
        self
    }

    /// Start with triggers blocked
    pub fn start_blocked(mut self, blocked: bool) -> Self {
        self.config.start_blocked = blocked;
        self
    }

    /// Build a standalone registry
    pub fn build(self) -> Registry<E> {
        Registry::with_config(self.config)
    }

    /// Build the registry and make it this thread's global one for `E`
    pub fn install_global(self) -> Rc<Registry<E>> {
        Registry::install_global(self.build())
    }
}

impl<E: EventId> Default for RegistryBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}
