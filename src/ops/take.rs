use crate::{observable::Observable, observer::Observer, subscriber::Subscriber};

impl<T, E> Observable<T, E> {
  /// Emits the first `count` values, then completes and disposes the source.
  /// If the source emits fewer than `count` values, all of them are emitted.
  ///
  /// ```rust
  /// use rxcore::prelude::*;
  /// use std::sync::{Arc, Mutex};
  ///
  /// let out = Arc::new(Mutex::new(Vec::new()));
  /// let c_out = out.clone();
  /// observable::from_iter(0..10)
  ///   .take(3)
  ///   .subscribe(move |v| c_out.lock().unwrap().push(v));
  /// assert_eq!(*out.lock().unwrap(), vec![0, 1, 2]);
  /// ```
  pub fn take(self, count: usize) -> Observable<T, E>
  where
    T: 'static,
    E: 'static,
  {
    self.lift(move |downstream: Subscriber<T, E>| {
      if count == 0 {
        downstream.complete();
      }
      TakeObserver { downstream, remaining: count }
    })
  }
}

struct TakeObserver<T, E> {
  downstream: Subscriber<T, E>,
  remaining: usize,
}

impl<T, E> Observer<T, E> for TakeObserver<T, E> {
  fn next(&mut self, value: T) {
    if self.remaining == 0 {
      return;
    }
    self.remaining -= 1;
    self.downstream.next(value);
    if self.remaining == 0 {
      // Completing downstream disposes its lifetime, which holds the
      // subscription to the source.
      self.downstream.complete();
    }
  }

  fn error(self, err: E) { self.downstream.error(err) }

  fn complete(self) { self.downstream.complete() }

  fn is_closed(&self) -> bool { self.remaining == 0 || self.downstream.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[test]
  fn completes_after_count() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (l1, l2) = (log.clone(), log.clone());
    observable::from_iter(1..100).take(2).subscribe_all(
      move |v| l1.lock().unwrap().push(format!("{v}")),
      |_| {},
      move || l2.lock().unwrap().push("done".to_owned()),
    );
    assert_eq!(*log.lock().unwrap(), vec!["1", "2", "done"]);
  }

  #[test]
  fn shorter_source() {
    let out = Arc::new(Mutex::new(Vec::new()));
    let c_out = out.clone();
    observable::from_iter(1..3)
      .take(5)
      .subscribe(move |v| c_out.lock().unwrap().push(v));
    assert_eq!(*out.lock().unwrap(), vec![1, 2]);
  }

  #[test]
  fn take_zero_completes_immediately() {
    let done = Arc::new(Mutex::new(false));
    let c_done = done.clone();
    observable::never::<i32, ()>()
      .take(0)
      .subscribe_all(|_| {}, |_| {}, move || *c_done.lock().unwrap() = true);
    assert!(*done.lock().unwrap());
  }

  #[test]
  fn disposes_the_source() {
    let scheduler = VirtualTimeScheduler::new();
    let subscription = observable::interval(Duration::from_millis(10), scheduler.clone())
      .take(2)
      .subscribe(|_| {});
    scheduler.advance_to(20);
    assert!(subscription.is_disposed());
    assert_eq!(scheduler.pending_count(), 0);
  }
}
