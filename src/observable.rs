//! Observables: lazy, re-subscribable producers.
//!
//! An [`Observable`] is a cloneable handle around a subscribe function. Nothing
//! happens until one of the `subscribe*` methods runs it, and every
//! subscription runs it again, independently.
//!
//! ```rust
//! use rxcore::prelude::*;
//! use std::sync::{Arc, Mutex};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let c_seen = seen.clone();
//! observable::from_iter(1..=3)
//!   .map(|v| v * 10)
//!   .subscribe(move |v| c_seen.lock().unwrap().push(v));
//! assert_eq!(*seen.lock().unwrap(), vec![10, 20, 30]);
//! ```

use std::{
  convert::Infallible,
  fmt::{Debug, Formatter},
  sync::Arc,
};

use crate::{
  diagnostics::Tracked,
  hooks::ErrorHooks,
  observer::{ignore_complete, unhandled_error, FnObserver, Observer},
  subscriber::Subscriber,
  subscription::Subscription,
};

mod defer;
mod from_iter;
mod generate;
mod interval;
mod timer;
mod trivial;

pub use defer::defer;
pub use from_iter::{from_iter, of};
pub use generate::{generate, try_generate};
pub use interval::interval;
pub use timer::{timer, timer_periodic};
pub use trivial::{empty, never, throw};

type SubscribeFn<T, E> = dyn Fn(Subscriber<T, E>) + Send + Sync;

pub struct Observable<T, E = Infallible> {
  subscribe: Arc<SubscribeFn<T, E>>,
  _tracked: Tracked,
}

impl<T, E> Clone for Observable<T, E> {
  fn clone(&self) -> Self { Self { subscribe: self.subscribe.clone(), _tracked: Tracked::new() } }
}

impl<T, E> Debug for Observable<T, E> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str("Observable") }
}

/// Creates an observable from its subscribe function.
///
/// The function receives the [`Subscriber`] of each new subscription. It may
/// emit synchronously, or keep the subscriber and emit later from anywhere;
/// resources it starts should be registered with [`Subscriber::add`] so they
/// are released on disposal.
pub fn create<T, E, F>(subscribe: F) -> Observable<T, E>
where
  F: Fn(Subscriber<T, E>) + Send + Sync + 'static,
{
  Observable::create(subscribe)
}

impl<T, E> Observable<T, E> {
  pub fn create<F>(subscribe: F) -> Self
  where
    F: Fn(Subscriber<T, E>) + Send + Sync + 'static,
  {
    Self { subscribe: Arc::new(subscribe), _tracked: Tracked::new() }
  }

  /// Runs the subscribe function for `subscriber`. The returned handle
  /// disposes the subscriber.
  pub fn subscribe_with(&self, subscriber: Subscriber<T, E>) -> Subscription
  where
    T: 'static,
    E: 'static,
  {
    (self.subscribe)(subscriber.clone());
    Subscription::new(Arc::new(subscriber))
  }

  pub fn subscribe_observer<O>(&self, observer: O) -> Subscription
  where
    O: Observer<T, E> + Send + 'static,
    T: 'static,
    E: 'static,
  {
    self.subscribe_with(Subscriber::new(observer))
  }

  /// Subscribes with a `next` callback only. An error is reported to
  /// [`ErrorHooks::global`].
  pub fn subscribe<N>(&self, next: N) -> Subscription
  where
    N: FnMut(T) + Send + 'static,
    T: 'static,
    E: Debug + 'static,
  {
    self.subscribe_with_hooks(next, ErrorHooks::global().clone())
  }

  /// Like [`subscribe`](Self::subscribe), reporting an error to `hooks`.
  pub fn subscribe_with_hooks<N>(&self, next: N, hooks: ErrorHooks) -> Subscription
  where
    N: FnMut(T) + Send + 'static,
    T: 'static,
    E: Debug + 'static,
  {
    self.subscribe_observer(FnObserver::new(next, unhandled_error(hooks), ignore_complete))
  }

  pub fn subscribe_err<N, Er>(&self, next: N, error: Er) -> Subscription
  where
    N: FnMut(T) + Send + 'static,
    Er: FnOnce(E) + Send + 'static,
    T: 'static,
    E: 'static,
  {
    self.subscribe_observer(FnObserver::new(next, error, ignore_complete))
  }

  pub fn subscribe_all<N, Er, C>(&self, next: N, error: Er, complete: C) -> Subscription
  where
    N: FnMut(T) + Send + 'static,
    Er: FnOnce(E) + Send + 'static,
    C: FnOnce() + Send + 'static,
    T: 'static,
    E: 'static,
  {
    self.subscribe_observer(FnObserver::new(next, error, complete))
  }

  /// Builds an operator: `make` turns each downstream subscriber into the
  /// observer subscribed to this observable. Disposing the downstream
  /// disposes the upstream subscription.
  pub(crate) fn lift<U, F, O, Make>(self, make: Make) -> Observable<U, F>
  where
    Make: Fn(Subscriber<U, F>) -> O + Send + Sync + 'static,
    O: Observer<T, E> + Send + 'static,
    T: 'static,
    E: 'static,
  {
    Observable::create(move |downstream: Subscriber<U, F>| {
      let upstream = Subscriber::new(make(downstream.clone()));
      downstream.add(upstream.clone());
      self.subscribe_with(upstream);
    })
  }
}
