use std::sync::Arc;

use crate::{
  observable::Observable,
  scheduler::{Scheduler, SchedulerExt, SchedulerRef},
  subscriber::Subscriber,
};

impl<T, E> Observable<T, E> {
  /// Runs the source's subscribe function as an action on `scheduler`, so a
  /// synchronous source produces on the scheduler's thread instead of the
  /// caller's. Disposal still happens on the disposing thread.
  pub fn subscribe_on<Sch>(self, scheduler: Sch) -> Observable<T, E>
  where
    Sch: Scheduler,
    T: Send + 'static,
    E: Send + 'static,
  {
    let scheduler: SchedulerRef = Arc::new(scheduler);
    Observable::create(move |subscriber: Subscriber<T, E>| {
      let source = self.clone();
      let c_subscriber = subscriber.clone();
      let handle = scheduler.schedule_fn(move |_| {
        if !c_subscriber.is_closed() {
          source.subscribe_with(c_subscriber);
        }
      });
      subscriber.add(handle);
    })
  }
}
