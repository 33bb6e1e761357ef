//! Observer trait and closure adapters.
//!
//! An [`Observer`] is the consumer side of a sequence. `next` may be called any
//! number of times; `error` and `complete` consume the observer, so a concrete
//! observer can receive at most one terminal event. Observers that are shared
//! between threads or producers are wrapped in a
//! [`Subscriber`](crate::subscriber::Subscriber), which enforces the same
//! contract at runtime.

use std::fmt::Debug;

use crate::hooks::ErrorHooks;

// ============================================================================
// Observer Trait
// ============================================================================

pub trait Observer<Item, Err> {
  fn next(&mut self, value: Item);

  /// Consumes the observer: nothing is delivered after an error.
  fn error(self, err: Err);

  /// Consumes the observer: nothing is delivered after completion.
  fn complete(self);

  /// Sources poll this to stop producing early.
  fn is_closed(&self) -> bool;
}

// ============================================================================
// DynObserver Trait - Object-safe Observer
// ============================================================================

/// Object-safe mirror of [`Observer`], so observers can be boxed.
pub trait DynObserver<Item, Err> {
  fn box_next(&mut self, value: Item);
  fn box_error(self: Box<Self>, err: Err);
  fn box_complete(self: Box<Self>);
  fn box_is_closed(&self) -> bool;
}

impl<T, Item, Err> DynObserver<Item, Err> for T
where
  T: Observer<Item, Err>,
{
  fn box_next(&mut self, value: Item) { self.next(value); }
  fn box_error(self: Box<Self>, err: Err) { self.error(err); }
  fn box_complete(self: Box<Self>) { self.complete(); }
  fn box_is_closed(&self) -> bool { self.is_closed() }
}

pub type BoxedObserver<Item, Err> = Box<dyn DynObserver<Item, Err> + Send>;

impl<Item, Err> Observer<Item, Err> for BoxedObserver<Item, Err> {
  #[inline]
  fn next(&mut self, value: Item) { (**self).box_next(value) }

  #[inline]
  fn error(self, err: Err) { self.box_error(err) }

  #[inline]
  fn complete(self) { self.box_complete() }

  #[inline]
  fn is_closed(&self) -> bool { (**self).box_is_closed() }
}

// ============================================================================
// FnObserver - Closure adapter
// ============================================================================

/// Observer built from up to three closures.
///
/// The `subscribe*` family of `Observable` builds one of these; use it
/// directly when an observer has to be passed around before subscribing.
#[derive(Clone)]
pub struct FnObserver<N, E, C> {
  next: N,
  error: E,
  complete: C,
}

impl<N, E, C> FnObserver<N, E, C> {
  pub fn new(next: N, error: E, complete: C) -> Self { Self { next, error, complete } }
}

impl<Item, Err, N, E, C> Observer<Item, Err> for FnObserver<N, E, C>
where
  N: FnMut(Item),
  E: FnOnce(Err),
  C: FnOnce(),
{
  #[inline]
  fn next(&mut self, value: Item) { (self.next)(value) }

  #[inline]
  fn error(self, err: Err) { (self.error)(err) }

  #[inline]
  fn complete(self) { (self.complete)() }

  #[inline]
  fn is_closed(&self) -> bool { false }
}

/// An error callback that hands the error to an [`ErrorHooks`] instance. Used
/// when a subscriber does not supply an error handler of its own.
pub fn unhandled_error<Err: Debug>(hooks: ErrorHooks) -> impl FnOnce(Err) + Send + Sync {
  move |err: Err| hooks.report(&err)
}

/// The `complete` callback of observers that ignore completion.
pub fn ignore_complete() {}
