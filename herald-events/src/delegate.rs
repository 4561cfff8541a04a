//! Delegates and the callee forms they wrap
//!
//! A [`Delegate`] pairs one listener callee with its priority. Callees come
//! from the [`IntoCallee`] factory trait, which knows how to wrap:
//!
//! - free functions ([`function`]), compared by address
//! - methods bound to a shared object ([`method`], [`method_mut`]), compared by
//!   object identity and method address
//! - arbitrary closures, which never compare equal to anything
//!
//! The event core only ever talks to the [`Callee`] trait, so new callee forms
//! can be plugged in by implementing it.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Listener priority. Higher values run earlier.
pub type Priority = i32;

/// An invocable listener with an equality rule used for duplicate detection.
pub trait Callee<A: ?Sized, R>: 'static {
    /// Invoke the listener
    fn call(&self, args: &A) -> R;

    /// Whether `other` wraps the same listener as `self`
    fn same_callee(&self, other: &dyn Callee<A, R>) -> bool;

    /// Cast to Any for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Marker for values that already implement [`Callee`].
pub enum CalleeForm {}

/// Marker for plain closures.
pub enum ClosureForm {}

/// Factory turning a listener into a boxed [`Callee`].
///
/// The `Marker` parameter only keeps the closure impl and the [`Callee`] impl
/// apart; callers never name it.
pub trait IntoCallee<A: ?Sized + 'static, R: 'static, Marker>: Sized {
    /// Wrap `self` as a callee
    fn into_callee(self) -> Box<dyn Callee<A, R>>;

    /// Wrap `self` as a delegate with the given priority
    fn into_delegate(self, priority: Priority) -> Delegate<A, R> {
        Delegate::new(self.into_callee(), priority)
    }
}

impl<A, R, C> IntoCallee<A, R, CalleeForm> for C
where
    A: ?Sized + 'static,
    R: 'static,
    C: Callee<A, R>,
{
    fn into_callee(self) -> Box<dyn Callee<A, R>> {
        Box::new(self)
    }
}

impl<A, R, F> IntoCallee<A, R, ClosureForm> for F
where
    A: ?Sized + 'static,
    R: 'static,
    F: Fn(&A) -> R + 'static,
{
    fn into_callee(self) -> Box<dyn Callee<A, R>> {
        Box::new(Closure(self))
    }
}

/// One listener stored inside an event.
pub struct Delegate<A: ?Sized, R> {
    callee: Box<dyn Callee<A, R>>,
    priority: Priority,
}

impl<A: ?Sized + 'static, R: 'static> Delegate<A, R> {
    /// Create a delegate from a boxed callee
    pub fn new(callee: Box<dyn Callee<A, R>>, priority: Priority) -> Self {
        Self { callee, priority }
    }

    /// Priority fixed at construction
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Invoke the wrapped listener
    pub fn call(&self, args: &A) -> R {
        self.callee.call(args)
    }
}

impl<A: ?Sized + 'static, R: 'static> PartialEq for Delegate<A, R> {
    fn eq(&self, other: &Self) -> bool {
        self.callee.same_callee(other.callee.as_ref())
    }
}

impl<A: ?Sized + 'static, R: 'static> fmt::Debug for Delegate<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delegate")
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

fn downcast<'a, T: 'static, A: ?Sized + 'static, R: 'static>(
    other: &'a dyn Callee<A, R>,
) -> Option<&'a T> {
    other.as_any().downcast_ref::<T>()
}

// ============================================================================
// Free functions
// ============================================================================

/// A free function listener.
pub struct FreeFn<A: ?Sized, R> {
    func: fn(&A) -> R,
}

/// Wrap a free function. Two wrappers of the same function are duplicates.
pub fn function<A: ?Sized, R>(func: fn(&A) -> R) -> FreeFn<A, R> {
    FreeFn { func }
}

impl<A: ?Sized + 'static, R: 'static> Callee<A, R> for FreeFn<A, R> {
    fn call(&self, args: &A) -> R {
        (self.func)(args)
    }

    fn same_callee(&self, other: &dyn Callee<A, R>) -> bool {
        downcast::<Self, A, R>(other).is_some_and(|o| std::ptr::fn_addr_eq(self.func, o.func))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Bound methods
// ============================================================================

/// A method bound to a shared target object, called through `&T`.
pub struct BoundMethod<T, A: ?Sized, R> {
    target: Rc<T>,
    method: fn(&T, &A) -> R,
}

/// Bind `method` to `target`.
///
/// The listener keeps `target` alive for as long as it stays registered.
/// Duplicates are the same method on the same object.
pub fn method<T, A: ?Sized, R>(target: &Rc<T>, method: fn(&T, &A) -> R) -> BoundMethod<T, A, R> {
    BoundMethod {
        target: Rc::clone(target),
        method,
    }
}

impl<T: 'static, A: ?Sized + 'static, R: 'static> Callee<A, R> for BoundMethod<T, A, R> {
    fn call(&self, args: &A) -> R {
        (self.method)(&self.target, args)
    }

    fn same_callee(&self, other: &dyn Callee<A, R>) -> bool {
        downcast::<Self, A, R>(other).is_some_and(|o| {
            Rc::ptr_eq(&self.target, &o.target) && std::ptr::fn_addr_eq(self.method, o.method)
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A method bound to a shared target object, called through `&mut T`.
pub struct BoundMethodMut<T, A: ?Sized, R> {
    target: Rc<RefCell<T>>,
    method: fn(&mut T, &A) -> R,
}

/// Bind a mutating `method` to `target`.
///
/// # Panics
///
/// Invoking the listener panics if `target` is already borrowed, e.g. when the
/// method triggers the same event again.
pub fn method_mut<T, A: ?Sized, R>(
    target: &Rc<RefCell<T>>,
    method: fn(&mut T, &A) -> R,
) -> BoundMethodMut<T, A, R> {
    BoundMethodMut {
        target: Rc::clone(target),
        method,
    }
}

impl<T: 'static, A: ?Sized + 'static, R: 'static> Callee<A, R> for BoundMethodMut<T, A, R> {
    fn call(&self, args: &A) -> R {
        let mut target = self.target.borrow_mut();
        (self.method)(&mut target, args)
    }

    fn same_callee(&self, other: &dyn Callee<A, R>) -> bool {
        downcast::<Self, A, R>(other).is_some_and(|o| {
            Rc::ptr_eq(&self.target, &o.target) && std::ptr::fn_addr_eq(self.method, o.method)
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Closures
// ============================================================================

/// A closure listener.
///
/// Closures have no comparable identity, so they are never considered
/// duplicates, even of themselves.
pub struct Closure<F>(pub F);

impl<A, R, F> Callee<A, R> for Closure<F>
where
    A: ?Sized + 'static,
    R: 'static,
    F: Fn(&A) -> R + 'static,
{
    fn call(&self, args: &A) -> R {
        (self.0)(args)
    }

    fn same_callee(&self, _other: &dyn Callee<A, R>) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
