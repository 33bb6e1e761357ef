//! Current-thread (trampoline) scheduler.
//!
//! The first action scheduled on a thread runs synchronously on that thread.
//! Anything it schedules is appended to a thread-local queue and drained
//! iteratively once it returns, so recursive scheduling never grows the
//! stack and same-thread work runs in FIFO order.
//!
//! The trampoline never blocks the thread to wait for a due time, so it
//! accepts immediate work only.
//!
//! ```rust
//! use rxcore::prelude::*;
//! use std::sync::{Arc, Mutex};
//!
//! let out = Arc::new(Mutex::new(Vec::new()));
//! let o = out.clone();
//! CurrentThreadScheduler.schedule_fn(move |s| {
//!   o.lock().unwrap().push(1);
//!   let o2 = o.clone();
//!   s.schedule_fn(move |_| o2.lock().unwrap().push(3));
//!   o.lock().unwrap().push(2);
//! });
//! assert_eq!(*out.lock().unwrap(), vec![1, 2, 3]);
//! ```

use std::{cell::RefCell, collections::VecDeque, sync::Arc};

use super::{wall_clock, Action, Duration, Scheduler};
use crate::subscription::{BooleanDisposable, Disposable, DisposableRef};

// ==================== Internal State ====================

struct QueuedAction {
  action: Action,
  cancel: Arc<BooleanDisposable>,
}

thread_local! {
  static TRAMPOLINE: RefCell<Option<VecDeque<QueuedAction>>> = const { RefCell::new(None) };
}

/// Clears the thread's queue when the owning drain ends, including by
/// unwinding, so a panicking action cannot wedge the thread.
struct DrainGuard;

impl Drop for DrainGuard {
  fn drop(&mut self) {
    let leftover = TRAMPOLINE.with(|t| t.borrow_mut().take());
    // Dropped outside the borrow: dropping an action may release resources
    // that touch the scheduler again.
    drop(leftover);
  }
}

// ==================== CurrentThreadScheduler ====================

/// Runs immediate work on the calling thread.
///
/// It never waits: scheduling with a positive delay panics. Timers,
/// intervals and other delayed work belong on a `PoolScheduler` or a
/// [`VirtualTimeScheduler`](super::VirtualTimeScheduler).
#[derive(Clone, Copy, Debug, Default)]
pub struct CurrentThreadScheduler;

impl CurrentThreadScheduler {
  /// True when no trampoline is draining on the calling thread, meaning the
  /// next `schedule` call will run synchronously and own the drain.
  pub fn is_schedule_required() -> bool { TRAMPOLINE.with(|t| t.borrow().is_none()) }

  fn drain(&self) {
    loop {
      let next = TRAMPOLINE.with(|t| t.borrow_mut().as_mut().and_then(|q| q.pop_front()));
      let Some(item) = next else {
        break;
      };
      if !item.cancel.is_disposed() {
        (item.action)(self);
      }
    }
  }
}

impl Scheduler for CurrentThreadScheduler {
  fn now(&self) -> Duration { wall_clock() }

  /// # Panics
  ///
  /// If `delay` is not zero.
  fn schedule_relative(&self, delay: Duration, action: Action) -> DisposableRef {
    assert!(
      delay.is_zero(),
      "CurrentThreadScheduler runs immediate work only, got a delay of {delay:?}; \
       use a PoolScheduler or a VirtualTimeScheduler for delayed work"
    );
    let cancel = Arc::new(BooleanDisposable::new());

    let owned = TRAMPOLINE.with(|t| {
      let mut t = t.borrow_mut();
      match t.as_mut() {
        Some(queue) => {
          queue.push_back(QueuedAction { action, cancel: cancel.clone() });
          None
        }
        None => {
          *t = Some(VecDeque::new());
          Some(action)
        }
      }
    });

    if let Some(action) = owned {
      let _guard = DrainGuard;
      tracing::trace!("trampoline drain started");
      action(self);
      self.drain();
      tracing::trace!("trampoline drain finished");
    }
    cancel
  }
}
