//! Multicast subjects: values pushed in with `next` are fanned out to every
//! current subscriber.
//!
//! - [`PublishSubject`] forwards only what happens after a subscription.
//! - [`BehaviorSubject`] starts every subscriber with its latest value.
//! - [`ReplaySubject`] replays its `capacity` most recent values, even after
//!   it has terminated.
//!
//! Every flavour is a cheap cloneable handle to shared state, usable from any
//! thread. Calls from different threads take turns: one waits until the
//! pass in flight is finished. An observer may push into the subject it is
//! observing; such re-entrant emissions are delivered once the current pass
//! is finished, so every subscriber sees one total order.

mod behavior_subject;
mod publish_subject;
mod replay_subject;
mod subject_core;
mod subject_subscription;
mod subscribers;

pub use behavior_subject::BehaviorSubject;
pub use publish_subject::PublishSubject;
pub use replay_subject::ReplaySubject;

/// A subject seen from its producing side, as an [`Observer`].
///
/// Subjects expose `next`, `error` and `complete` through `&self`, so they do
/// not implement [`Observer`] themselves; its consuming `error` and
/// `complete` would shadow those methods. `subject.as_observer()` gives a
/// handle that can be passed wherever an observer is expected.
///
/// [`Observer`]: crate::observer::Observer
pub struct SubjectObserver<S>(S);

impl<S: Clone> Clone for SubjectObserver<S> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

/// The surface shared by every subject flavour, each of which wraps a
/// `SubjectCore` in a field named `core`.
macro_rules! impl_subject_surface {
  ($name:ident) => {
    impl<T, E> Clone for $name<T, E> {
      fn clone(&self) -> Self { Self { core: self.core.clone() } }
    }

    impl<T, E> $name<T, E>
    where
      T: Clone + Send + 'static,
      E: Clone + Send + 'static,
    {
      #[inline]
      pub fn next(&self, value: T) {
        self
          .core
          .emit($crate::notification::Notification::Next(value))
      }

      #[inline]
      pub fn error(&self, err: E) {
        self
          .core
          .emit($crate::notification::Notification::Error(err))
      }

      #[inline]
      pub fn complete(&self) {
        self
          .core
          .emit($crate::notification::Notification::Completed)
      }

      pub fn has_observers(&self) -> bool { self.observer_count() > 0 }

      pub fn observer_count(&self) -> usize { self.core.observer_count() }

      pub fn is_terminated(&self) -> bool { self.core.is_terminated() }

      /// The subscribe side of the subject, without its `next`.
      pub fn as_observable(&self) -> $crate::observable::Observable<T, E> {
        self.core.as_observable()
      }

      /// The push side of the subject, as an observer.
      pub fn as_observer(&self) -> $crate::subject::SubjectObserver<Self> {
        $crate::subject::SubjectObserver(self.clone())
      }
    }

    impl<T, E> $crate::observer::Observer<T, E> for $crate::subject::SubjectObserver<$name<T, E>>
    where
      T: Clone + Send + 'static,
      E: Clone + Send + 'static,
    {
      #[inline]
      fn next(&mut self, value: T) { self.0.next(value) }

      #[inline]
      fn error(self, err: E) { self.0.error(err) }

      #[inline]
      fn complete(self) { self.0.complete() }

      #[inline]
      fn is_closed(&self) -> bool { self.0.is_terminated() }
    }

    impl<T, E> std::fmt::Debug for $name<T, E>
    where
      T: Clone + Send + 'static,
      E: Clone + Send + 'static,
    {
      fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!($name))
          .field("observers", &self.observer_count())
          .field("terminated", &self.is_terminated())
          .finish()
      }
    }
  };
}

use impl_subject_surface;
