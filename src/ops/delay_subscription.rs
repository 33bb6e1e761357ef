use std::sync::Arc;

use crate::{
  observable::Observable,
  scheduler::{Duration, Scheduler, SchedulerExt, SchedulerRef},
  subscriber::Subscriber,
};

impl<T, E> Observable<T, E> {
  /// Subscribes to the source only once `delay` has elapsed on `scheduler`.
  /// Disposing before then cancels the pending subscription; the source is
  /// never subscribed.
  pub fn delay_subscription<Sch>(self, delay: Duration, scheduler: Sch) -> Observable<T, E>
  where
    Sch: Scheduler,
    T: Send + 'static,
    E: Send + 'static,
  {
    let scheduler: SchedulerRef = Arc::new(scheduler);
    Observable::create(move |subscriber: Subscriber<T, E>| {
      let source = self.clone();
      let c_subscriber = subscriber.clone();
      let handle = scheduler.schedule_relative_fn(delay, move |_| {
        if !c_subscriber.is_closed() {
          source.subscribe_with(c_subscriber);
        }
      });
      subscriber.add(handle);
    })
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[test]
  fn source_is_subscribed_after_delay() {
    let scheduler = VirtualTimeScheduler::new();
    let subscribed_at = Arc::new(Mutex::new(None));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (c_at, c_seen, clock) = (subscribed_at.clone(), seen.clone(), scheduler.clone());
    let c_clock = scheduler.clone();
    observable::defer(move || {
      *c_at.lock().unwrap() = Some(clock.clock());
      observable::of(7)
    })
    .delay_subscription(Duration::from_millis(50), scheduler.clone())
    .subscribe(move |v| c_seen.lock().unwrap().push((v, c_clock.clock())));

    scheduler.advance_to(49);
    assert_eq!(*subscribed_at.lock().unwrap(), None);
    scheduler.advance_to(50);
    assert_eq!(*subscribed_at.lock().unwrap(), Some(50));
    assert_eq!(*seen.lock().unwrap(), vec![(7, 50)]);
  }

  #[test]
  fn dispose_before_delay_skips_subscription() {
    let scheduler = VirtualTimeScheduler::new();
    let subscribed = Arc::new(Mutex::new(false));
    let c_subscribed = subscribed.clone();
    observable::defer(move || {
      *c_subscribed.lock().unwrap() = true;
      observable::of(1)
    })
    .delay_subscription(Duration::from_millis(10), scheduler.clone())
    .subscribe(|_| {})
    .dispose();

    scheduler.start();
    assert!(!*subscribed.lock().unwrap());
  }
}
