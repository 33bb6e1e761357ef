use std::sync::Arc;

use crate::{observable::Observable, observer::Observer, subscriber::Subscriber};

impl<T, E> Observable<T, E> {
  /// Forwards only the values for which `predicate` returns `true`.
  pub fn filter<F>(self, predicate: F) -> Observable<T, E>
  where
    F: Fn(&T) -> bool + Send + Sync + 'static,
    T: 'static,
    E: 'static,
  {
    let predicate = Arc::new(predicate);
    self.lift(move |downstream| FilterObserver { downstream, predicate: predicate.clone() })
  }
}

struct FilterObserver<T, E, F> {
  downstream: Subscriber<T, E>,
  predicate: Arc<F>,
}

impl<T, E, F> Observer<T, E> for FilterObserver<T, E, F>
where
  F: Fn(&T) -> bool,
{
  fn next(&mut self, value: T) {
    if (self.predicate)(&value) {
      self.downstream.next(value)
    }
  }

  fn error(self, err: E) { self.downstream.error(err) }

  fn complete(self) { self.downstream.complete() }

  fn is_closed(&self) -> bool { self.downstream.is_closed() }
}
