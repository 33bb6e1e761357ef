use std::convert::Infallible;

use super::{timer_periodic, Observable};
use crate::scheduler::{Duration, Scheduler};

/// Emits `0, 1, 2, …`, one value every `period`, the first after one period.
pub fn interval<Sch: Scheduler>(period: Duration, scheduler: Sch) -> Observable<u64, Infallible> {
  timer_periodic(period, period, scheduler)
}
