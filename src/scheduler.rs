//! Scheduler capability.
//!
//! A [`Scheduler`] decides *when* and *where* an [`Action`] runs. Every
//! scheduling call hands back a [`DisposableRef`]; disposing it before the
//! action starts prevents it from running. Cancellation is cooperative: it is
//! checked between steps and never interrupts an action that is running.
//!
//! Actions receive the scheduler that runs them, which is the handle they use
//! to schedule follow-up work (recursive scheduling).
//!
//! | Scheduler | Execution |
//! |-----------|-----------|
//! | [`CurrentThreadScheduler`] | trampoline on the calling thread, immediate work only |
//! | [`PoolScheduler`] | OS worker threads, serial or concurrent |
//! | [`VirtualTimeScheduler`] | deterministic virtual clock, for tests |

use std::sync::Arc;

use once_cell::sync::Lazy;
pub use std::time::{Duration, Instant};

use crate::{
  rc::MutArc,
  subscription::{
    BooleanDisposable, Disposable, DisposableRef, SerialDisposable, SingleAssignmentDisposable,
  },
};

pub mod trampoline;
pub use trampoline::CurrentThreadScheduler;
#[cfg(feature = "pool-scheduler")]
pub mod pool;
#[cfg(feature = "pool-scheduler")]
pub use pool::{PoolScheduler, PoolSchedulerBuilder};
pub mod virtual_time;
pub use virtual_time::VirtualTimeScheduler;

/// A unit of work. It receives the scheduler running it.
pub type Action = Box<dyn FnOnce(&dyn Scheduler) + Send>;

/// The body of a periodic schedule, invoked once per tick.
pub type PeriodicAction = Box<dyn FnMut() + Send>;

pub type SchedulerRef = Arc<dyn Scheduler>;

pub trait Scheduler: Send + Sync + 'static {
  /// The scheduler's notion of the current time, measured from its epoch.
  fn now(&self) -> Duration;

  /// Run `action` once `delay` has elapsed on this scheduler's clock.
  fn schedule_relative(&self, delay: Duration, action: Action) -> DisposableRef;

  /// Run `action` as soon as possible.
  fn schedule(&self, action: Action) -> DisposableRef {
    self.schedule_relative(Duration::ZERO, action)
  }

  /// Run `action` after `start`, then every `period`.
  ///
  /// Tick `n` is due at `start + n * period` on this scheduler's clock, so a
  /// slow tick delays the next one but does not shift the ones after it.
  /// A zero period re-schedules every tick through the scheduler instead of
  /// looping in place, so other queued work keeps running.
  fn schedule_periodic(
    &self, start: Duration, period: Duration, action: PeriodicAction,
  ) -> DisposableRef {
    let periodic = Arc::new(Periodic {
      action: MutArc::own(action),
      period,
      next_due: MutArc::own(self.now() + start),
      cancelled: BooleanDisposable::new(),
      first: SingleAssignmentDisposable::new(),
      pending: SerialDisposable::new(),
    });
    let first = self.schedule_relative(start, periodic_tick(periodic.clone()));
    periodic.first.set(first);
    periodic
  }
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
  #[inline]
  fn now(&self) -> Duration { (**self).now() }

  #[inline]
  fn schedule_relative(&self, delay: Duration, action: Action) -> DisposableRef {
    (**self).schedule_relative(delay, action)
  }

  #[inline]
  fn schedule(&self, action: Action) -> DisposableRef { (**self).schedule(action) }

  #[inline]
  fn schedule_periodic(
    &self, start: Duration, period: Duration, action: PeriodicAction,
  ) -> DisposableRef {
    (**self).schedule_periodic(start, period, action)
  }
}

/// Closure-friendly helpers over any [`Scheduler`].
pub trait SchedulerExt: Scheduler {
  fn schedule_fn<F>(&self, f: F) -> DisposableRef
  where
    F: FnOnce(&dyn Scheduler) + Send + 'static,
  {
    self.schedule(Box::new(f))
  }

  fn schedule_relative_fn<F>(&self, delay: Duration, f: F) -> DisposableRef
  where
    F: FnOnce(&dyn Scheduler) + Send + 'static,
  {
    self.schedule_relative(delay, Box::new(f))
  }

  fn schedule_periodic_fn<F>(&self, start: Duration, period: Duration, f: F) -> DisposableRef
  where
    F: FnMut() + Send + 'static,
  {
    self.schedule_periodic(start, period, Box::new(f))
  }

  /// Moves `state` into the action.
  fn schedule_with_state<S, F>(&self, state: S, f: F) -> DisposableRef
  where
    S: Send + 'static,
    F: FnOnce(&dyn Scheduler, S) + Send + 'static,
  {
    self.schedule(Box::new(move |scheduler: &dyn Scheduler| f(scheduler, state)))
  }
}

impl<T: Scheduler + ?Sized> SchedulerExt for T {}

// ==================== Wall clock ====================

static EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// Time elapsed since the process-wide epoch shared by the real-time
/// schedulers.
pub fn wall_clock() -> Duration { EPOCH.elapsed() }

// ==================== Periodic ====================

struct Periodic {
  action: MutArc<PeriodicAction>,
  period: Duration,
  next_due: MutArc<Duration>,
  cancelled: BooleanDisposable,
  // The first tick may run (and chain the next one) before `schedule_relative`
  // returns, so it is held apart from the re-armed `pending` tick.
  first: SingleAssignmentDisposable,
  pending: SerialDisposable,
}

impl Disposable for Periodic {
  fn dispose(&self) {
    self.cancelled.dispose();
    self.first.dispose();
    self.pending.dispose();
  }

  fn is_disposed(&self) -> bool { self.cancelled.is_disposed() }
}

fn periodic_tick(periodic: Arc<Periodic>) -> Action {
  Box::new(move |scheduler: &dyn Scheduler| {
    if periodic.is_disposed() {
      return;
    }
    (periodic.action.rc_deref_mut())();
    if periodic.is_disposed() {
      return;
    }
    let delay = {
      let mut next_due = periodic.next_due.rc_deref_mut();
      *next_due += periodic.period;
      next_due.saturating_sub(scheduler.now())
    };
    let next = scheduler.schedule_relative(delay, periodic_tick(periodic.clone()));
    periodic.pending.replace(next);
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn periodic_ticks_on_virtual_time() {
    let scheduler = VirtualTimeScheduler::new();
    let ticks = MutArc::own(Vec::new());
    let c_ticks = ticks.clone();
    let c_scheduler = scheduler.clone();
    let handle = scheduler.schedule_periodic_fn(
      Duration::from_millis(10),
      Duration::from_millis(5),
      move || c_ticks.rc_deref_mut().push(c_scheduler.clock()),
    );

    scheduler.advance_to(26);
    handle.dispose();
    scheduler.start();

    assert_eq!(*ticks.rc_deref_mut(), vec![10, 15, 20, 25]);
  }

  #[test]
  fn periodic_disposed_inside_tick() {
    let scheduler = VirtualTimeScheduler::new();
    let count = MutArc::own(0);
    let slot: MutArc<Option<DisposableRef>> = MutArc::own(None);
    let (c_count, c_slot) = (count.clone(), slot.clone());
    let handle = scheduler.schedule_periodic_fn(Duration::ZERO, Duration::from_millis(1), move || {
      let mut count = c_count.rc_deref_mut();
      *count += 1;
      if *count == 3 {
        if let Some(handle) = c_slot.rc_deref_mut().as_ref() {
          handle.dispose();
        }
      }
    });
    *slot.rc_deref_mut() = Some(handle);

    scheduler.start();

    assert_eq!(*count.rc_deref_mut(), 3);
    assert_eq!(scheduler.pending_count(), 0);
  }

  #[test]
  fn schedule_with_state_moves_state() {
    let scheduler = VirtualTimeScheduler::new();
    let out = MutArc::own(String::new());
    let c_out = out.clone();
    scheduler.schedule_with_state(String::from("state"), move |_, s| {
      c_out.rc_deref_mut().push_str(&s)
    });
    scheduler.start();
    assert_eq!(*out.rc_deref_mut(), "state");
  }

  #[test]
  fn arc_scheduler_delegates() {
    let scheduler = VirtualTimeScheduler::new();
    let shared: SchedulerRef = Arc::new(scheduler.clone());
    let hit = MutArc::own(false);
    let c_hit = hit.clone();
    shared.schedule_relative_fn(Duration::from_millis(3), move |_| *c_hit.rc_deref_mut() = true);
    scheduler.start();
    assert!(*hit.rc_deref_mut());
    assert_eq!(scheduler.clock(), 3);
  }
}
