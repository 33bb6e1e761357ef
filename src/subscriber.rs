//! The runtime guard between a producer and an observer.
//!
//! A [`Subscriber`] owns a boxed observer plus the lifetime of the
//! subscription (a [`CompositeDisposable`]). It is cheap to clone and safe to
//! share between threads, and it guarantees:
//!
//! - at most one terminal event;
//! - nothing is delivered after a terminal event or after disposal;
//! - the lifetime is disposed right after the terminal event is delivered.
//!
//! Delivery to one subscriber is serialized by its observer lock, so an
//! observer never runs concurrently with itself.

use std::{
  fmt::{Debug, Formatter},
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
};

use crate::{
  diagnostics::Tracked,
  observer::{BoxedObserver, Observer},
  rc::MutArc,
  subscription::{CompositeDisposable, Disposable, DisposeKey},
};

pub struct Subscriber<T, E> {
  inner: Arc<SubscriberInner<T, E>>,
}

struct SubscriberInner<T, E> {
  observer: MutArc<Option<BoxedObserver<T, E>>>,
  closed: AtomicBool,
  lifetime: CompositeDisposable,
  _tracked: Tracked,
}

impl<T, E> Clone for Subscriber<T, E> {
  fn clone(&self) -> Self { Self { inner: self.inner.clone() } }
}

impl<T, E> Subscriber<T, E> {
  pub fn new<O>(observer: O) -> Self
  where
    O: Observer<T, E> + Send + 'static,
    T: 'static,
    E: 'static,
  {
    Self::from_boxed(Box::new(observer))
  }

  pub fn from_boxed(observer: BoxedObserver<T, E>) -> Self {
    Self {
      inner: Arc::new(SubscriberInner {
        observer: MutArc::own(Some(observer)),
        closed: AtomicBool::new(false),
        lifetime: CompositeDisposable::new(),
        _tracked: Tracked::new(),
      }),
    }
  }

  pub fn next(&self, value: T) {
    if self.is_closed() {
      return;
    }
    let mut observer = self.inner.observer.rc_deref_mut();
    // Re-checked under the lock: a terminal event or disposal may have won.
    if self.is_closed() {
      return;
    }
    let released = match observer.as_mut() {
      Some(o) => {
        o.next(value);
        if self.is_closed() { observer.take() } else { None }
      }
      None => None,
    };
    drop(observer);
    drop(released);
  }

  pub fn error(&self, err: E) {
    if let Some(observer) = self.terminate() {
      observer.error(err);
    }
    self.inner.lifetime.dispose();
  }

  pub fn complete(&self) {
    if let Some(observer) = self.terminate() {
      observer.complete();
    }
    self.inner.lifetime.dispose();
  }

  /// True once a terminal event was delivered or the subscriber was disposed.
  pub fn is_closed(&self) -> bool { self.inner.closed.load(Ordering::Acquire) }

  /// Ties `resource` to this subscription: it is disposed when the subscriber
  /// terminates or is disposed, or right away if that already happened.
  pub fn add(&self, resource: impl Disposable + 'static) -> Option<DisposeKey> {
    self.inner.lifetime.add(resource)
  }

  pub fn remove(&self, key: DisposeKey) { drop(self.inner.lifetime.remove(key)); }

  pub fn lifetime(&self) -> &CompositeDisposable { &self.inner.lifetime }

  pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.inner, &other.inner) }

  fn terminate(&self) -> Option<BoxedObserver<T, E>> {
    if self.inner.closed.swap(true, Ordering::AcqRel) {
      return None;
    }
    self.inner.observer.rc_deref_mut().take()
  }
}

impl<T, E> Disposable for Subscriber<T, E> {
  fn dispose(&self) {
    if self.inner.closed.swap(true, Ordering::AcqRel) {
      // Already terminated or disposed; the lifetime may still hold members
      // added later, which `CompositeDisposable::add` already disposed.
      self.inner.lifetime.dispose();
      return;
    }
    // If the observer is busy (possibly on this very thread, disposing from
    // inside its own callback) `next` releases it once the callback returns.
    let released = self
      .inner
      .observer
      .try_rc_deref_mut()
      .and_then(|mut o| o.take());
    drop(released);
    self.inner.lifetime.dispose();
  }

  fn is_disposed(&self) -> bool { self.is_closed() }
}

impl<T, E> Debug for Subscriber<T, E> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscriber")
      .field("closed", &self.is_closed())
      .field("resources", &self.inner.lifetime.len())
      .finish()
  }
}
