//! Virtual-time scheduler for deterministic tests of time-based pipelines.
//!
//! The clock is an integer tick count that only moves while [`start`],
//! [`advance_to`] or [`advance_by`] is running. When a `Duration` is converted
//! to ticks, one tick is one millisecond and any sub-millisecond remainder
//! rounds up, so an action never runs before its due time.
//!
//! Each instance owns its own clock and queue. Clones share them.
//!
//! ```rust
//! use rxcore::prelude::*;
//! use std::sync::{Arc, Mutex};
//!
//! let scheduler = VirtualTimeScheduler::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let c_seen = seen.clone();
//! let c_scheduler = scheduler.clone();
//! scheduler.schedule_relative_fn(Duration::from_millis(50), move |_| {
//!   c_seen.lock().unwrap().push(c_scheduler.clock());
//! });
//!
//! scheduler.advance_by(49);
//! assert!(seen.lock().unwrap().is_empty());
//! scheduler.advance_by(1);
//! assert_eq!(*seen.lock().unwrap(), vec![50]);
//! ```
//!
//! [`start`]: VirtualTimeScheduler::start
//! [`advance_to`]: VirtualTimeScheduler::advance_to
//! [`advance_by`]: VirtualTimeScheduler::advance_by

use std::{
  cmp::Ordering,
  collections::BinaryHeap,
  fmt::{Debug, Formatter},
  sync::Arc,
};

use super::{Action, Duration, Scheduler};
use crate::{
  diagnostics::Tracked,
  rc::MutArc,
  subscription::{BooleanDisposable, Disposable, DisposableRef},
};

/// Virtual time, in ticks.
pub type Ticks = u64;

/// Converts a duration to ticks, rounding sub-millisecond remainders up.
pub fn to_ticks(duration: Duration) -> Ticks {
  let millis = duration.as_millis();
  let rounded = if duration.subsec_nanos() % 1_000_000 != 0 { millis + 1 } else { millis };
  u64::try_from(rounded).unwrap_or(u64::MAX)
}

// ==================== Internal State ====================

struct ScheduledItem {
  due: Ticks,
  seq: u64,
  action: Action,
  cancel: Arc<BooleanDisposable>,
}

impl PartialEq for ScheduledItem {
  fn eq(&self, other: &Self) -> bool { self.due == other.due && self.seq == other.seq }
}

impl Eq for ScheduledItem {}

impl PartialOrd for ScheduledItem {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for ScheduledItem {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap: earlier ticks first, then FIFO by seq
    other
      .due
      .cmp(&self.due)
      .then_with(|| other.seq.cmp(&self.seq))
  }
}

#[derive(Default)]
struct VirtualState {
  clock: Ticks,
  queue: BinaryHeap<ScheduledItem>,
  next_seq: u64,
  enabled: bool,
  _tracked: Tracked,
}

/// How a call to `run` ended.
#[derive(Debug, PartialEq, Eq)]
enum RunExit {
  /// Nothing left to run within the limit.
  Idle,
  /// `stop` was called.
  Stopped,
  /// Called from inside a running action; the outer loop owns the queue.
  Nested,
}

// ==================== VirtualTimeScheduler ====================

#[derive(Clone, Default)]
pub struct VirtualTimeScheduler {
  state: MutArc<VirtualState>,
}

impl Debug for VirtualTimeScheduler {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let state = self.state.rc_deref_mut();
    f.debug_struct("VirtualTimeScheduler")
      .field("clock", &state.clock)
      .field("queued", &state.queue.len())
      .field("enabled", &state.enabled)
      .finish()
  }
}

impl VirtualTimeScheduler {
  pub fn new() -> Self { Self::default() }

  /// Current virtual time.
  pub fn clock(&self) -> Ticks { self.state.rc_deref_mut().clock }

  /// True while a `start`/`advance_*` loop is running and has not been
  /// stopped.
  pub fn is_enabled(&self) -> bool { self.state.rc_deref_mut().enabled }

  /// Number of queued actions that have not been disposed.
  pub fn pending_count(&self) -> usize {
    self
      .state
      .rc_deref_mut()
      .queue
      .iter()
      .filter(|item| !item.cancel.is_disposed())
      .count()
  }

  /// Queue `action` at tick `due`. A due time in the past runs at the
  /// current clock, after items already queued for it.
  pub fn schedule_absolute(&self, due: Ticks, action: Action) -> DisposableRef {
    let cancel = Arc::new(BooleanDisposable::new());
    let mut state = self.state.rc_deref_mut();
    let seq = state.next_seq;
    state.next_seq += 1;
    let due = due.max(state.clock);
    state
      .queue
      .push(ScheduledItem { due, seq, action, cancel: cancel.clone() });
    cancel
  }

  /// Run queued actions in `(due, seq)` order until the queue is empty or
  /// [`stop`](Self::stop) is called.
  pub fn start(&self) { self.run(None); }

  /// Run every action due at or before `target`, then move the clock to
  /// `target`. Called from inside a running action it does nothing: the
  /// running loop keeps the clock.
  ///
  /// # Panics
  ///
  /// Panics if `target` is earlier than the current clock.
  pub fn advance_to(&self, target: Ticks) {
    let clock = self.clock();
    assert!(target >= clock, "cannot advance virtual time backwards from {clock} to {target}");
    if self.run(Some(target)) == RunExit::Idle {
      let mut state = self.state.rc_deref_mut();
      state.clock = state.clock.max(target);
    }
  }

  pub fn advance_by(&self, ticks: Ticks) { self.advance_to(self.clock().saturating_add(ticks)); }

  /// Ends the running loop after the current action. Items still queued stay
  /// queued and are not disposed.
  pub fn stop(&self) { self.state.rc_deref_mut().enabled = false; }

  fn run(&self, limit: Option<Ticks>) -> RunExit {
    {
      let mut state = self.state.rc_deref_mut();
      if state.enabled {
        return RunExit::Nested;
      }
      state.enabled = true;
      tracing::trace!(clock = state.clock, ?limit, "virtual scheduler started");
    }

    loop {
      let item = {
        let mut state = self.state.rc_deref_mut();
        if !state.enabled {
          tracing::trace!(clock = state.clock, "virtual scheduler stopped");
          return RunExit::Stopped;
        }
        let due_now = state
          .queue
          .peek()
          .is_some_and(|item| limit.map_or(true, |limit| item.due <= limit));
        if !due_now {
          state.enabled = false;
          tracing::trace!(clock = state.clock, "virtual scheduler idle");
          return RunExit::Idle;
        }
        let Some(item) = state.queue.pop() else {
          continue;
        };
        if item.due > state.clock {
          state.clock = item.due;
        }
        item
      };

      if !item.cancel.is_disposed() {
        (item.action)(self);
      }
    }
  }
}

impl Scheduler for VirtualTimeScheduler {
  fn now(&self) -> Duration { Duration::from_millis(self.clock()) }

  fn schedule_relative(&self, delay: Duration, action: Action) -> DisposableRef {
    let mut state = self.state.rc_deref_mut();
    let seq = state.next_seq;
    state.next_seq += 1;
    let due = state.clock.saturating_add(to_ticks(delay));
    let cancel = Arc::new(BooleanDisposable::new());
    state
      .queue
      .push(ScheduledItem { due, seq, action, cancel: cancel.clone() });
    cancel
  }
}
