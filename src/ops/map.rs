use std::sync::Arc;

use crate::{observable::Observable, observer::Observer, subscriber::Subscriber};

impl<T, E> Observable<T, E> {
  /// Applies `f` to every value.
  ///
  /// ```rust
  /// use rxcore::prelude::*;
  /// use std::sync::{Arc, Mutex};
  ///
  /// let out = Arc::new(Mutex::new(Vec::new()));
  /// let c_out = out.clone();
  /// observable::of(3)
  ///   .map(|v| v.to_string())
  ///   .subscribe(move |v| c_out.lock().unwrap().push(v));
  /// assert_eq!(*out.lock().unwrap(), vec!["3".to_owned()]);
  /// ```
  pub fn map<U, F>(self, f: F) -> Observable<U, E>
  where
    F: Fn(T) -> U + Send + Sync + 'static,
    T: 'static,
    E: 'static,
    U: 'static,
  {
    let f = Arc::new(f);
    self.lift(move |downstream| MapObserver { downstream, f: f.clone() })
  }
}

struct MapObserver<U, E, F> {
  downstream: Subscriber<U, E>,
  f: Arc<F>,
}

impl<T, U, E, F> Observer<T, E> for MapObserver<U, E, F>
where
  F: Fn(T) -> U,
{
  fn next(&mut self, value: T) { self.downstream.next((self.f)(value)) }

  fn error(self, err: E) { self.downstream.error(err) }

  fn complete(self) { self.downstream.complete() }

  fn is_closed(&self) -> bool { self.downstream.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use super::*;
  use crate::prelude::*;

  #[test]
  fn maps_values_and_forwards_terminal() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (l1, l2) = (log.clone(), log.clone());
    observable::from_iter(vec![1, 2, 3])
      .map(|v| v * 2)
      .map(|v| format!("<{v}>"))
      .subscribe_all(
        move |v| l1.lock().unwrap().push(v),
        |_| {},
        move || l2.lock().unwrap().push("done".to_owned()),
      );
    assert_eq!(*log.lock().unwrap(), vec!["<2>", "<4>", "<6>", "done"]);
  }

  #[test]
  fn forwards_error() {
    let seen = Arc::new(Mutex::new(None));
    let c_seen = seen.clone();
    observable::throw::<i32, _>("bad")
      .map(|v| v + 1)
      .subscribe_err(|_| {}, move |e| *c_seen.lock().unwrap() = Some(e));
    assert_eq!(*seen.lock().unwrap(), Some("bad"));
  }
}
