//! Virtual-time test harness.
//!
//! A [`TestScheduler`] drives hot and cold test observables built from
//! timestamped notifications, records what a pipeline produced into a
//! [`MockObserver`], and records every subscription made to a test source as
//! a [`SubscriptionRecord`]. Scenario tests then compare both against
//! literal expectations.
//!
//! ```rust
//! use rxcore::prelude::*;
//! use rxcore::testing::*;
//!
//! let scheduler = TestScheduler::new();
//! let source = scheduler.create_cold_observable(vec![
//!   on_next::<i32, ()>(10, 1),
//!   on_next(20, 2),
//!   on_completed(30),
//! ]);
//!
//! let c_source = source.clone();
//! let observer = scheduler.start_with(move || c_source.as_observable().map(|v| v * 10));
//!
//! assert_eq!(
//!   observer.messages(),
//!   vec![on_next::<i32, ()>(210, 10), on_next(220, 20), on_completed(230)]
//! );
//! assert_eq!(source.subscriptions(), vec![SubscriptionRecord::new(200, 230)]);
//! ```

use crate::{notification::Notification, scheduler::virtual_time::Ticks};

mod mock_observer;
mod test_observable;
mod test_scheduler;

pub use mock_observer::MockObserver;
pub use test_observable::{ColdObservable, HotObservable};
pub use test_scheduler::TestScheduler;

/// Virtual time at which [`TestScheduler::start`] creates the pipeline.
pub const CREATED: Ticks = 100;
/// Virtual time at which [`TestScheduler::start`] subscribes to it.
pub const SUBSCRIBED: Ticks = 200;
/// Virtual time at which [`TestScheduler::start`] disposes the subscription.
pub const DISPOSED: Ticks = 1000;

/// Unsubscribe time of a subscription that is still live.
pub const INFINITE: Ticks = Ticks::MAX;

/// A value stamped with the virtual time it was produced at.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Recorded<V> {
  pub time: Ticks,
  pub value: V,
}

impl<V> Recorded<V> {
  pub fn new(time: Ticks, value: V) -> Self { Self { time, value } }
}

pub fn on_next<T, E>(time: Ticks, value: T) -> Recorded<Notification<T, E>> {
  Recorded::new(time, Notification::Next(value))
}

pub fn on_error<T, E>(time: Ticks, err: E) -> Recorded<Notification<T, E>> {
  Recorded::new(time, Notification::Error(err))
}

pub fn on_completed<T, E>(time: Ticks) -> Recorded<Notification<T, E>> {
  Recorded::new(time, Notification::Completed)
}

/// The interval during which a test source had a given subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionRecord {
  pub subscribe: Ticks,
  /// [`INFINITE`] while the subscription is live.
  pub unsubscribe: Ticks,
}

impl SubscriptionRecord {
  pub fn new(subscribe: Ticks, unsubscribe: Ticks) -> Self { Self { subscribe, unsubscribe } }

  /// A subscription that has not ended.
  pub fn open(subscribe: Ticks) -> Self { Self::new(subscribe, INFINITE) }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::prelude::*;

  #[test]
  fn start_disposes_at_conventional_time() {
    let scheduler = TestScheduler::new();
    let source = scheduler.create_hot_observable::<i32, ()>(vec![on_next(500, 1)]);
    let c_source = source.clone();
    let observer = scheduler.start_with(move || c_source.as_observable());
    assert_eq!(observer.messages(), vec![on_next::<i32, ()>(500, 1)]);
    assert_eq!(source.subscriptions(), vec![SubscriptionRecord::new(SUBSCRIBED, DISPOSED)]);
  }

  #[test]
  fn pipeline_created_at_created_time() {
    let scheduler = TestScheduler::new();
    let created_at = ClockProbe::default();
    let (c_probe, c_scheduler) = (created_at.clone(), scheduler.clone());
    scheduler.start_with(move || {
      c_probe.set(c_scheduler.clock());
      observable::empty::<i32, ()>()
    });
    assert_eq!(created_at.get(), Some(CREATED));
  }

  #[test]
  fn mock_observer_stamps_with_clock() {
    let scheduler = TestScheduler::new();
    let mut observer = scheduler.create_observer::<&str, ()>();
    let recorder = observer.clone();
    scheduler.advance_to(5);
    observer.next("a");
    scheduler.advance_to(9);
    observer.complete();
    assert_eq!(recorder.messages(), vec![on_next::<&str, ()>(5, "a"), on_completed(9)]);
  }

  #[test]
  fn cold_resubscription_gets_its_own_timeline() {
    let scheduler = TestScheduler::new();
    let cold = scheduler.create_cold_observable(vec![on_next::<i32, ()>(10, 1)]);
    let first = cold.as_observable().subscribe(|_| {});
    scheduler.advance_to(30);
    let second = cold.as_observable().subscribe(|_| {});
    scheduler.advance_to(60);
    first.dispose();
    second.dispose();
    assert_eq!(
      cold.subscriptions(),
      vec![SubscriptionRecord::new(0, 60), SubscriptionRecord::new(30, 60)]
    );
  }

  #[derive(Clone, Default)]
  struct ClockProbe(crate::rc::MutArc<Option<Ticks>>);

  impl ClockProbe {
    fn set(&self, t: Ticks) { *self.0.rc_deref_mut() = Some(t); }
    fn get(&self) -> Option<Ticks> { *self.0.rc_deref_mut() }
  }
}
