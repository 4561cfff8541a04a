//! Event definitions
//!
//! An [`Event`] owns the listeners for one fixed signature. Listeners are kept
//! sorted by descending priority; equal priorities keep their arrival order.
//! While a trigger is running the listener list is frozen and every attempt to
//! change it is refused with
//! [`EventError::ModifyingCallbackListDuringBroadcast`].

use crate::config::EventConfig;
use crate::connection::Connection;
use crate::delegate::{Delegate, IntoCallee, Priority};
use crate::error::{EventError, Result};
use std::any::Any;
use std::cell::{Cell, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, trace, warn};

/// A broadcast point with listeners called as `Fn(&A) -> R`.
///
/// `Event` is a shared handle: clones and [`Connection`]s all refer to the
/// same listener list, which lives as long as any of them does.
///
/// # Examples
///
/// ```
/// use herald_events::Event;
///
/// let event: Event<str, usize> = Event::new();
/// event.add_listener(|s: &str| s.len(), 0, false).unwrap();
/// event.add_listener(|s: &str| s.len() * 2, 1, false).unwrap();
///
/// assert_eq!(event.trigger("abc"), vec![6, 3]);
/// ```
pub struct Event<A: ?Sized, R = ()> {
    pub(crate) inner: Rc<EventInner<A, R>>,
}

pub(crate) struct EventInner<A: ?Sized, R> {
    delegates: RefCell<Vec<Rc<Delegate<A, R>>>>,
    broadcasting: Cell<bool>,
    config: EventConfig,
}

/// Weak identity reference to one registered listener.
///
/// Returned by [`Event::add_listener`] and accepted by
/// [`Event::remove_listener`]. It does not keep the listener alive.
pub struct ListenerHandle<A: ?Sized, R> {
    delegate: Weak<Delegate<A, R>>,
}

impl<A: ?Sized + 'static, R: 'static> ListenerHandle<A, R> {
    /// Priority of the listener, or `None` once it has been removed
    pub fn priority(&self) -> Option<Priority> {
        self.delegate.upgrade().map(|d| d.priority())
    }

    /// Whether the listener is still held by an event
    pub fn is_attached(&self) -> bool {
        self.delegate.strong_count() > 0
    }
}

impl<A: ?Sized + 'static, R: 'static> Clone for ListenerHandle<A, R> {
    fn clone(&self) -> Self {
        Self {
            delegate: self.delegate.clone(),
        }
    }
}

impl<A: ?Sized + 'static, R: 'static> fmt::Debug for ListenerHandle<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("priority", &self.priority())
            .finish()
    }
}

/// Sets the broadcasting flag and restores the previous value on exit,
/// including when a listener panics.
struct BroadcastGuard<'a> {
    flag: &'a Cell<bool>,
    previous: bool,
}

impl<'a> BroadcastGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        let previous = flag.replace(true);
        Self { flag, previous }
    }
}

impl Drop for BroadcastGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}

impl<A: ?Sized + 'static, R: 'static> Event<A, R> {
    /// Create an event with default configuration
    pub fn new() -> Self {
        Self::with_config(EventConfig::default())
    }

    /// Create an event with custom config
    pub fn with_config(config: EventConfig) -> Self {
        Self {
            inner: Rc::new(EventInner {
                delegates: RefCell::new(Vec::new()),
                broadcasting: Cell::new(false),
                config,
            }),
        }
    }

    /// Event configuration
    pub fn config(&self) -> &EventConfig {
        &self.inner.config
    }

    /// Register a listener.
    ///
    /// The listener is inserted after every existing listener whose priority
    /// is greater than or equal to `priority`. Unless `allow_duplicates` is
    /// set, a listener equal to an already registered one is rejected with
    /// [`EventError::CallbackAlreadyAdded`].
    pub fn add_listener<C, M>(
        &self,
        callee: C,
        priority: Priority,
        allow_duplicates: bool,
    ) -> Result<ListenerHandle<A, R>>
    where
        C: IntoCallee<A, R, M>,
    {
        let mut delegates = self.inner.delegates_mut()?;
        let delegate = Rc::new(callee.into_delegate(priority));

        if !allow_duplicates && delegates.iter().any(|existing| **existing == *delegate) {
            if self.inner.config.enable_logging {
                debug!(
                    event = self.inner.config.label(),
                    priority, "Duplicate listener rejected"
                );
            }
            return Err(EventError::CallbackAlreadyAdded);
        }

        let position = delegates
            .iter()
            .position(|existing| existing.priority() < priority)
            .unwrap_or(delegates.len());
        delegates.insert(position, Rc::clone(&delegate));

        if self.inner.config.enable_logging {
            debug!(
                event = self.inner.config.label(),
                priority,
                position,
                listeners = delegates.len(),
                "Listener added"
            );
        }

        Ok(ListenerHandle {
            delegate: Rc::downgrade(&delegate),
        })
    }

    /// Register a listener and return a [`Connection`] for it.
    ///
    /// Failures are reported through [`Connection::error`].
    pub fn connect<C, M>(&self, callee: C, priority: Priority, allow_duplicates: bool) -> Connection
    where
        C: IntoCallee<A, R, M>,
    {
        match self.add_listener(callee, priority, allow_duplicates) {
            Ok(handle) => Connection::bound(self, handle),
            Err(error) => Connection::failed(error),
        }
    }

    /// Remove a listener.
    ///
    /// A handle whose listener is no longer registered is not an error.
    pub fn remove_listener(&self, handle: &ListenerHandle<A, R>) -> Result<()> {
        self.inner.remove(&handle.delegate)
    }

    /// Remove every listener
    pub fn clear(&self) -> Result<()> {
        let mut delegates = self.inner.delegates_mut()?;
        let removed = delegates.len();
        delegates.clear();

        if self.inner.config.enable_logging {
            debug!(event = self.inner.config.label(), removed, "Listeners cleared");
        }

        Ok(())
    }

    /// Call every listener in priority order and collect the results
    pub fn trigger(&self, args: &A) -> Vec<R> {
        let mut results = Vec::with_capacity(self.listener_count());
        self.broadcast(args, |result| results.push(result));
        results
    }

    /// Call every listener in priority order, accumulating results with
    /// `adder` into a fresh `C`.
    ///
    /// # Examples
    ///
    /// ```
    /// use herald_events::Event;
    /// use std::collections::BTreeSet;
    ///
    /// let event: Event<i32, i32> = Event::new();
    /// event.add_listener(|x: &i32| x % 2, 0, false).unwrap();
    /// event.add_listener(|x: &i32| x % 2, 0, false).unwrap();
    ///
    /// let set: BTreeSet<i32> = event.trigger_with(&7, |set: &mut BTreeSet<i32>, r| {
    ///     set.insert(r);
    /// });
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn trigger_with<C, F>(&self, args: &A, mut adder: F) -> C
    where
        C: Default,
        F: FnMut(&mut C, R),
    {
        let mut container = C::default();
        self.broadcast(args, |result| adder(&mut container, result));
        container
    }

    /// Whether a trigger is currently running
    pub fn is_broadcasting(&self) -> bool {
        self.inner.broadcasting.get()
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.inner.delegates.borrow().len()
    }

    /// Whether no listener is registered
    pub fn is_empty(&self) -> bool {
        self.listener_count() == 0
    }

    /// Priorities of the registered listeners, in call order
    pub fn priorities(&self) -> Vec<Priority> {
        self.inner
            .delegates
            .borrow()
            .iter()
            .map(|d| d.priority())
            .collect()
    }

    fn broadcast<F: FnMut(R)>(&self, args: &A, mut sink: F) {
        let _guard = BroadcastGuard::enter(&self.inner.broadcasting);
        // Listeners run over a snapshot; no borrow of the list is held while
        // user code runs.
        let delegates: Vec<Rc<Delegate<A, R>>> = self.inner.delegates.borrow().clone();

        if self.inner.config.enable_logging {
            trace!(
                event = self.inner.config.label(),
                listeners = delegates.len(),
                "Triggering event"
            );
        }

        for delegate in delegates.iter() {
            sink(delegate.call(args));
        }
    }
}

impl<A: ?Sized + 'static> Event<A, ()> {
    /// Call every listener of a void event
    pub fn notify(&self, args: &A) {
        self.broadcast(args, |()| {});
    }
}

impl<A: ?Sized + 'static, R: 'static> Default for Event<A, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ?Sized + 'static, R: 'static> Clone for Event<A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A: ?Sized + 'static, R: 'static> fmt::Debug for Event<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.inner.config.label())
            .field("listeners", &self.inner.delegates.borrow().len())
            .field("broadcasting", &self.inner.broadcasting.get())
            .finish()
    }
}

impl<A: ?Sized + 'static, R: 'static> EventInner<A, R> {
    fn delegates_mut(&self) -> Result<RefMut<'_, Vec<Rc<Delegate<A, R>>>>> {
        if self.broadcasting.get() {
            if self.config.enable_logging {
                warn!(
                    event = self.config.label(),
                    "Listener list modification refused during broadcast"
                );
            }
            return Err(EventError::ModifyingCallbackListDuringBroadcast);
        }

        self.delegates
            .try_borrow_mut()
            .map_err(|_| EventError::ModifyingCallbackListDuringBroadcast)
    }

    fn remove(&self, target: &Weak<Delegate<A, R>>) -> Result<()> {
        let mut delegates = self.delegates_mut()?;

        if let Some(position) = delegates
            .iter()
            .position(|d| std::ptr::eq(Rc::as_ptr(d), target.as_ptr()))
        {
            delegates.remove(position);

            if self.config.enable_logging {
                debug!(
                    event = self.config.label(),
                    listeners = delegates.len(),
                    "Listener removed"
                );
            }
        }

        Ok(())
    }
}

/// Type-erased view of an event used by [`Connection`].
pub(crate) trait ListenerSet {
    /// Remove the listener behind a boxed `Weak<Delegate<A, R>>`
    fn remove_erased(&self, delegate: &dyn Any) -> Result<()>;

    fn logging_enabled(&self) -> bool;

    fn label(&self) -> &str;
}

impl<A: ?Sized + 'static, R: 'static> ListenerSet for EventInner<A, R> {
    fn remove_erased(&self, delegate: &dyn Any) -> Result<()> {
        match delegate.downcast_ref::<Weak<Delegate<A, R>>>() {
            Some(target) => self.remove(target),
            None => Err(EventError::FailedToMatchEventType),
        }
    }

    fn logging_enabled(&self) -> bool {
        self.config.enable_logging
    }

    fn label(&self) -> &str {
        self.config.label()
    }
}

impl<A: ?Sized + 'static, R: 'static> Event<A, R> {
    pub(crate) fn erased(&self) -> Rc<dyn ListenerSet> {
        Rc::clone(&self.inner) as Rc<dyn ListenerSet>
    }
}

impl<A: ?Sized + 'static, R: 'static> ListenerHandle<A, R> {
    pub(crate) fn erased(self) -> Box<dyn Any> {
        Box::new(self.delegate)
    }
}

/// Event builder
pub struct EventBuilder {
    config: EventConfig,
}

impl EventBuilder {
    /// Create new event builder
    pub fn new() -> Self {
        Self {
            config: EventConfig::default(),
        }
    }

    /// Name used in log records
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = Some(name.into());
        self
    }

    /// Enable/disable logging
    pub fn enable_logging(mut self, enabled: bool) -> Self {
        self.config.enable_logging = enabled;
        self
    }

    /// Build the event
    pub fn build<A: ?Sized + 'static, R: 'static>(self) -> Event<A, R> {
        Event::with_config(self.config)
    }
}

impl Default for EventBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegate::{function, method};
    use std::collections::BTreeSet;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum ListenerKind {
        Free,
        Member,
        Callable,
    }

    fn free_listener(_: &str) -> ListenerKind {
        ListenerKind::Free
    }

    struct Widget;

    impl Widget {
        fn member_listener(&self, _: &str) -> ListenerKind {
            ListenerKind::Member
        }
    }

    fn callable_listener(_: &str) -> ListenerKind {
        ListenerKind::Callable
    }

    fn increment(counter: &Cell<i32>) {
        counter.set(counter.get() + 1);
    }

    #[test]
    fn test_priority_order() {
        let event: Event<i32, i32> = Event::new();
        for priority in [3, -1, 7, 0, 5] {
            event
                .add_listener(move |_: &i32| priority, priority, false)
                .unwrap();
        }

        assert_eq!(event.trigger(&0), vec![7, 5, 3, 0, -1]);
        assert_eq!(event.priorities(), vec![7, 5, 3, 0, -1]);
    }

    #[test]
    fn test_equal_priority_keeps_insertion_order() {
        let event: Event<(), usize> = Event::new();
        for n in 0..4 {
            event.add_listener(move |_: &()| n, 1, false).unwrap();
        }
        event.add_listener(|_: &()| 100, 2, false).unwrap();
        event.add_listener(|_: &()| 200, 0, false).unwrap();

        assert_eq!(event.trigger(&()), vec![100, 0, 1, 2, 3, 200]);
    }

    #[test]
    fn test_free_member_and_callable_listeners() {
        let widget = Rc::new(Widget);
        let event: Event<str, ListenerKind> = Event::new();

        let free = event.add_listener(function(free_listener), 2, false).unwrap();
        let member = event
            .add_listener(method(&widget, Widget::member_listener), 0, false)
            .unwrap();
        let callable = event
            .add_listener(|s: &str| callable_listener(s), 1, false)
            .unwrap();

        assert_eq!(
            event.trigger("Event #1"),
            vec![ListenerKind::Free, ListenerKind::Callable, ListenerKind::Member]
        );

        event.remove_listener(&callable).unwrap();
        assert_eq!(
            event.trigger("Event #2"),
            vec![ListenerKind::Free, ListenerKind::Member]
        );

        event.remove_listener(&free).unwrap();
        event.remove_listener(&member).unwrap();
        let set: BTreeSet<ListenerKind> =
            event.trigger_with("Event #3", |set: &mut BTreeSet<_>, kind| {
                set.insert(kind);
            });
        assert!(set.is_empty());
    }

    #[test]
    fn test_duplicate_suppression() {
        let event: Event<Cell<i32>> = Event::new();

        event.add_listener(function(increment), 0, false).unwrap();
        assert_eq!(
            event.add_listener(function(increment), 5, false).unwrap_err(),
            EventError::CallbackAlreadyAdded
        );
        assert_eq!(event.listener_count(), 1);

        event.add_listener(function(increment), 0, true).unwrap();
        assert_eq!(event.listener_count(), 2);

        let counter = Cell::new(0);
        event.notify(&counter);
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn test_closures_are_never_duplicates() {
        let event: Event<i32, i32> = Event::new();
        let listener = |x: &i32| *x;

        event.add_listener(listener, 0, false).unwrap();
        event.add_listener(listener, 0, false).unwrap();

        assert_eq!(event.listener_count(), 2);
    }

    #[test]
    fn test_remove_twice_is_not_an_error() {
        let event: Event<i32, i32> = Event::new();
        let handle = event.add_listener(|x: &i32| *x, 0, false).unwrap();
        let other = event.add_listener(|x: &i32| x + 1, 0, false).unwrap();

        event.remove_listener(&handle).unwrap();
        event.remove_listener(&handle).unwrap();

        assert!(!handle.is_attached());
        assert!(other.is_attached());
        assert_eq!(event.trigger(&1), vec![2]);
    }

    #[test]
    fn test_remove_after_clear() {
        let event: Event<i32, i32> = Event::new();
        let handle = event.add_listener(|x: &i32| *x, 0, false).unwrap();

        event.clear().unwrap();
        assert!(event.is_empty());
        assert!(event.remove_listener(&handle).is_ok());
        assert_eq!(handle.priority(), None);
    }

    #[test]
    fn test_empty_trigger() {
        let event: Event<str, u8> = Event::new();
        assert!(event.trigger("nothing").is_empty());
    }

    #[test]
    fn test_mutation_refused_during_broadcast() {
        let event: Event<(), bool> = Event::new();
        let outcome: Rc<RefCell<Vec<Result<()>>>> = Rc::new(RefCell::new(Vec::new()));

        let inner_event = event.clone();
        let inner_outcome = Rc::clone(&outcome);
        let first = event
            .add_listener(
                move |_: &()| {
                    let added = inner_event.add_listener(|_: &()| false, 0, true).map(|_| ());
                    let cleared = inner_event.clear();
                    inner_outcome.borrow_mut().extend([added, cleared]);
                    inner_event.is_broadcasting()
                },
                1,
                false,
            )
            .unwrap();

        assert!(!event.is_broadcasting());
        assert_eq!(event.trigger(&()), vec![true]);
        assert!(!event.is_broadcasting());
        assert_eq!(
            *outcome.borrow(),
            vec![
                Err(EventError::ModifyingCallbackListDuringBroadcast),
                Err(EventError::ModifyingCallbackListDuringBroadcast),
            ]
        );
        assert_eq!(event.listener_count(), 1);

        // Breaks the event -> listener -> event cycle.
        event.remove_listener(&first).unwrap();
    }

    #[test]
    fn test_listener_can_inspect_own_event() {
        let event: Event<(), (usize, Vec<Priority>, String)> = Event::new();
        let inner_event = event.clone();

        let inspector = event
            .add_listener(
                move |_: &()| {
                    (
                        inner_event.listener_count(),
                        inner_event.priorities(),
                        format!("{:?}", inner_event),
                    )
                },
                3,
                false,
            )
            .unwrap();
        event
            .add_listener(|_: &()| (0, Vec::new(), String::new()), 1, false)
            .unwrap();

        let results = event.trigger(&());
        assert_eq!(results[0].0, 2);
        assert_eq!(results[0].1, vec![3, 1]);
        assert_eq!(
            results[0].2,
            "Event { name: \"event\", listeners: 2, broadcasting: true }"
        );

        event.remove_listener(&inspector).unwrap();
    }

    #[test]
    fn test_nested_trigger_keeps_guard() {
        let event: Event<u32, u32> = Event::new();
        let inner_event = event.clone();

        event
            .add_listener(
                move |depth: &u32| {
                    if *depth == 0 {
                        inner_event.trigger(&1);
                        // Still inside the outer broadcast.
                        assert!(inner_event.is_broadcasting());
                        assert!(inner_event.clear().is_err());
                    }
                    *depth
                },
                0,
                false,
            )
            .unwrap();

        assert_eq!(event.trigger(&0), vec![0]);
        assert!(!event.is_broadcasting());
        event.clear().unwrap();
    }

    #[test]
    fn test_negative_and_extreme_priorities() {
        let event: Event<(), i32> = Event::new();
        event.add_listener(|_: &()| 0, 0, false).unwrap();
        event.add_listener(|_: &()| i32::MIN, i32::MIN, false).unwrap();
        event.add_listener(|_: &()| i32::MAX, i32::MAX, false).unwrap();

        assert_eq!(event.trigger(&()), vec![i32::MAX, 0, i32::MIN]);
    }

    #[test]
    fn test_clones_share_listeners() {
        let event: Event<i32, i32> = Event::new();
        let clone = event.clone();

        clone.add_listener(|x: &i32| x * 10, 0, false).unwrap();
        assert_eq!(event.trigger(&2), vec![20]);
    }

    #[test]
    fn test_builder() {
        let event: Event<str> = EventBuilder::new()
            .name("on_save")
            .enable_logging(false)
            .build();

        assert_eq!(event.config().name.as_deref(), Some("on_save"));
        assert!(!event.config().enable_logging);
        assert_eq!(
            format!("{:?}", event),
            "Event { name: \"on_save\", listeners: 0, broadcasting: false }"
        );
    }
}
