use std::{convert::Infallible, sync::Arc};

use super::Observable;
use crate::{
  scheduler::{Duration, Scheduler, SchedulerExt, SchedulerRef},
  subscriber::Subscriber,
};

/// Emits `0` once `due` has elapsed on `scheduler`, then completes.
pub fn timer<Sch: Scheduler>(due: Duration, scheduler: Sch) -> Observable<u64, Infallible> {
  let scheduler: SchedulerRef = Arc::new(scheduler);
  Observable::create(move |subscriber: Subscriber<u64, Infallible>| {
    let c_subscriber = subscriber.clone();
    let handle = scheduler.schedule_relative_fn(due, move |_| {
      c_subscriber.next(0);
      c_subscriber.complete();
    });
    subscriber.add(handle);
  })
}

/// Emits `0` once `due` has elapsed, then `1, 2, …` every `period`.
///
/// Ticks follow the scheduler's periodic schedule, so they do not drift. A
/// zero period re-schedules each tick through the scheduler, interleaving
/// with other queued work instead of spinning.
pub fn timer_periodic<Sch: Scheduler>(
  due: Duration, period: Duration, scheduler: Sch,
) -> Observable<u64, Infallible> {
  let scheduler: SchedulerRef = Arc::new(scheduler);
  Observable::create(move |subscriber: Subscriber<u64, Infallible>| {
    let c_subscriber = subscriber.clone();
    let mut tick = 0u64;
    let handle = scheduler.schedule_periodic_fn(due, period, move || {
      c_subscriber.next(tick);
      tick += 1;
    });
    subscriber.add(handle);
  })
}
