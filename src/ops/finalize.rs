use std::sync::Arc;

use crate::{observable::Observable, subscriber::Subscriber, subscription::ActionDisposable};

impl<T, E> Observable<T, E> {
  /// Calls `f` once per subscription when it ends, after the terminal event
  /// has been delivered or when it is disposed, whichever comes first.
  pub fn finalize<F>(self, f: F) -> Observable<T, E>
  where
    F: Fn() + Send + Sync + 'static,
    T: 'static,
    E: 'static,
  {
    let f = Arc::new(f);
    Observable::create(move |subscriber: Subscriber<T, E>| {
      let f = f.clone();
      subscriber.add(ActionDisposable::new(move || f()));
      self.subscribe_with(subscriber);
    })
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[test]
  fn runs_after_completion() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
    observable::of(1)
      .finalize(move || l3.lock().unwrap().push("finalize".to_owned()))
      .subscribe_all(
        move |v| l1.lock().unwrap().push(format!("{v}")),
        |_| {},
        move || l2.lock().unwrap().push("done".to_owned()),
      );
    assert_eq!(*log.lock().unwrap(), vec!["1", "done", "finalize"]);
  }

  #[test]
  fn runs_after_error() {
    let count = Arc::new(Mutex::new(0));
    let c_count = count.clone();
    observable::throw::<i32, _>("e")
      .finalize(move || *c_count.lock().unwrap() += 1)
      .subscribe_err(|_| {}, |_| {});
    assert_eq!(*count.lock().unwrap(), 1);
  }

  #[test]
  fn runs_once_on_dispose() {
    let count = Arc::new(Mutex::new(0));
    let c_count = count.clone();
    let subscription = observable::never::<i32, ()>()
      .finalize(move || *c_count.lock().unwrap() += 1)
      .subscribe(|_| {});
    assert_eq!(*count.lock().unwrap(), 0);
    subscription.dispose();
    subscription.dispose();
    assert_eq!(*count.lock().unwrap(), 1);
  }

  #[test]
  fn each_subscription_finalizes() {
    let count = Arc::new(Mutex::new(0));
    let c_count = count.clone();
    let source = observable::of(1).finalize(move || *c_count.lock().unwrap() += 1);
    source.subscribe(|_| {});
    source.subscribe(|_| {});
    assert_eq!(*count.lock().unwrap(), 2);
  }
}
