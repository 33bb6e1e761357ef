use std::convert::Infallible;

use crate::{
  notification::Notification, observable::Observable, observer::Observer, subscriber::Subscriber,
};

impl<T, E> Observable<T, E> {
  /// Turns every event, terminal ones included, into a [`Notification`]
  /// value. The resulting sequence completes right after the notification of
  /// the source's terminal event and never errors.
  pub fn materialize(self) -> Observable<Notification<T, E>, Infallible>
  where
    T: 'static,
    E: 'static,
  {
    self.lift(|downstream| MaterializeObserver { downstream })
  }
}

impl<T, E> Observable<Notification<T, E>, Infallible> {
  /// The inverse of [`materialize`](Observable::materialize): replays each
  /// notification as the event it describes. Notifications following a
  /// terminal one are ignored.
  pub fn dematerialize(self) -> Observable<T, E>
  where
    T: 'static,
    E: 'static,
  {
    self.lift(|downstream| DematerializeObserver { downstream })
  }
}

// ==================== Materialize ====================

struct MaterializeObserver<T, E> {
  downstream: Subscriber<Notification<T, E>, Infallible>,
}

impl<T, E> Observer<T, E> for MaterializeObserver<T, E> {
  fn next(&mut self, value: T) { self.downstream.next(Notification::Next(value)) }

  fn error(self, err: E) {
    self.downstream.next(Notification::Error(err));
    self.downstream.complete();
  }

  fn complete(self) {
    self.downstream.next(Notification::Completed);
    self.downstream.complete();
  }

  fn is_closed(&self) -> bool { self.downstream.is_closed() }
}

// ==================== Dematerialize ====================

struct DematerializeObserver<T, E> {
  downstream: Subscriber<T, E>,
}

impl<T, E> Observer<Notification<T, E>, Infallible> for DematerializeObserver<T, E> {
  fn next(&mut self, notification: Notification<T, E>) {
    match notification {
      Notification::Next(v) => self.downstream.next(v),
      Notification::Error(e) => self.downstream.error(e),
      Notification::Completed => self.downstream.complete(),
    }
  }

  fn error(self, err: Infallible) { match err {} }

  fn complete(self) { self.downstream.complete() }

  fn is_closed(&self) -> bool { self.downstream.is_closed() }
}
