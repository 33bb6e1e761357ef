//! Hybrid time/count buffering.
//!
//! Values are collected into a buffer that is emitted when it holds `count`
//! values or when `time_span` has elapsed since it was opened, whichever
//! comes first; a new buffer opens right away. Each open buffer has exactly
//! one pending timer, cancelled and re-armed on every count-triggered
//! rotation.
//!
//! Closed buffers are handed downstream through a [`DeliveryQueue`], never
//! while the operator state is locked, so a downstream handler may feed the
//! source again.

use std::{
  collections::VecDeque,
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
};

use crate::{
  observable::Observable,
  observer::Observer,
  rc::MutArc,
  scheduler::{Duration, Scheduler, SchedulerExt, SchedulerRef},
  subscriber::Subscriber,
  subscription::{Disposable, DisposableRef},
};

impl<T, E> Observable<T, E> {
  /// Emits buffers of at most `count` values, each covering at most
  /// `time_span` on `scheduler`.
  ///
  /// A buffer closed by its timer may be empty. When the source completes
  /// the current buffer, empty or not, is emitted before completion; when it
  /// errors the current buffer is dropped. Disposing the subscription drops
  /// the current buffer without emitting it.
  ///
  /// # Panics
  ///
  /// If `count` or `time_span` is zero.
  pub fn buffer_with_time_or_count<Sch>(
    self, time_span: Duration, count: usize, scheduler: Sch,
  ) -> Observable<Vec<T>, E>
  where
    Sch: Scheduler,
    T: Send + 'static,
    E: Send + 'static,
  {
    assert!(count > 0, "buffer count must be positive");
    assert!(!time_span.is_zero(), "buffer time span must be positive");
    let scheduler: SchedulerRef = Arc::new(scheduler);
    self.lift(move |downstream: Subscriber<Vec<T>, E>| {
      let shared = Arc::new(BufferShared {
        state: MutArc::own(BufferState { buffer: Vec::new(), window: 0, stopped: false }),
        outbox: DeliveryQueue::default(),
        timer: Arc::new(WindowTimer::new()),
        downstream: downstream.clone(),
        scheduler: scheduler.clone(),
        time_span,
        count,
      });
      downstream.add(shared.timer.clone());
      BufferShared::arm(&shared, 0);
      BufferObserver { shared }
    })
  }
}

// ==================== Window timer ====================

/// The single pending timer of the open window of a time/count operator.
///
/// Windows are numbered; a timer armed for an older window than the one held
/// is disposed instead of stored, so rotations racing on different threads
/// still leave exactly the newest window's timer pending. Disposing the
/// `WindowTimer` cancels the pending timer and refuses later ones.
pub(crate) struct WindowTimer {
  slot: MutArc<Option<(u64, DisposableRef)>>,
  closed: AtomicBool,
}

impl WindowTimer {
  pub(crate) fn new() -> Self { Self { slot: MutArc::own(None), closed: AtomicBool::new(false) } }

  pub(crate) fn set(&self, window: u64, handle: DisposableRef) {
    let discarded = {
      let mut slot = self.slot.rc_deref_mut();
      let newer_held = matches!(slot.as_ref(), Some((held, _)) if *held > window);
      if self.closed.load(Ordering::Acquire) || newer_held {
        Some(handle)
      } else {
        slot.replace((window, handle)).map(|(_, old)| old)
      }
    };
    if let Some(handle) = discarded {
      handle.dispose();
    }
  }
}

impl Disposable for WindowTimer {
  fn dispose(&self) {
    self.closed.store(true, Ordering::Release);
    let pending = self.slot.rc_deref_mut().take();
    if let Some((_, handle)) = pending {
      handle.dispose();
    }
  }

  fn is_disposed(&self) -> bool { self.closed.load(Ordering::Acquire) }
}

// ==================== Delivery queue ====================

pub(crate) type Delivery = Box<dyn FnOnce() + Send>;

/// Hands deliveries downstream one at a time, in push order, with no lock
/// held.
///
/// Operators push while holding their state lock, so the queue order is the
/// window order, and call [`drain`](Self::drain) after releasing it. The
/// thread that finds the queue idle runs every delivery; one pushed from
/// inside a running delivery, or from another thread meanwhile, runs after
/// the current one returns.
#[derive(Default)]
pub(crate) struct DeliveryQueue {
  state: MutArc<DeliveryState>,
}

#[derive(Default)]
struct DeliveryState {
  pending: VecDeque<Delivery>,
  draining: bool,
}

impl DeliveryQueue {
  pub(crate) fn push(&self, delivery: Delivery) {
    self.state.rc_deref_mut().pending.push_back(delivery);
  }

  pub(crate) fn drain(&self) {
    {
      let mut state = self.state.rc_deref_mut();
      if state.draining {
        return;
      }
      state.draining = true;
    }
    let _reset = DrainReset(&self.state);
    loop {
      let delivery = {
        let mut state = self.state.rc_deref_mut();
        match state.pending.pop_front() {
          Some(delivery) => delivery,
          None => {
            state.draining = false;
            return;
          }
        }
      };
      delivery();
    }
  }
}

/// Releases the queue if a delivery unwinds; what is still queued is dropped.
struct DrainReset<'a>(&'a MutArc<DeliveryState>);

impl Drop for DrainReset<'_> {
  fn drop(&mut self) {
    if !std::thread::panicking() {
      return;
    }
    let leftover = {
      let mut state = self.0.rc_deref_mut();
      state.draining = false;
      std::mem::take(&mut state.pending)
    };
    drop(leftover);
  }
}

// ==================== State ====================

struct BufferState<T> {
  buffer: Vec<T>,
  window: u64,
  stopped: bool,
}

struct BufferShared<T, E> {
  state: MutArc<BufferState<T>>,
  outbox: DeliveryQueue,
  timer: Arc<WindowTimer>,
  downstream: Subscriber<Vec<T>, E>,
  scheduler: SchedulerRef,
  time_span: Duration,
  count: usize,
}

impl<T, E> BufferShared<T, E>
where
  T: Send + 'static,
  E: Send + 'static,
{
  fn arm(this: &Arc<Self>, window: u64) {
    if this.timer.is_disposed() {
      return;
    }
    let c_this = this.clone();
    let handle = this
      .scheduler
      .schedule_relative_fn(this.time_span, move |_| BufferShared::on_timer(&c_this, window));
    this.timer.set(window, handle);
  }

  fn on_timer(this: &Arc<Self>, window: u64) {
    {
      let mut state = this.state.rc_deref_mut();
      if state.stopped || state.window != window {
        return;
      }
      state.window += 1;
      let buffer = std::mem::take(&mut state.buffer);
      this.emit(buffer);
    }
    this.outbox.drain();
    BufferShared::arm(this, window + 1);
  }

  /// Queues `buffer` for downstream. Called with the state locked.
  fn emit(&self, buffer: Vec<T>) {
    let downstream = self.downstream.clone();
    self.outbox.push(Box::new(move || downstream.next(buffer)));
  }
}

// ==================== Observer ====================

struct BufferObserver<T, E> {
  shared: Arc<BufferShared<T, E>>,
}

impl<T, E> Observer<T, E> for BufferObserver<T, E>
where
  T: Send + 'static,
  E: Send + 'static,
{
  fn next(&mut self, value: T) {
    let rotated = {
      let mut state = self.shared.state.rc_deref_mut();
      if state.stopped {
        return;
      }
      state.buffer.push(value);
      if state.buffer.len() < self.shared.count {
        None
      } else {
        state.window += 1;
        let buffer = std::mem::replace(&mut state.buffer, Vec::with_capacity(self.shared.count));
        self.shared.emit(buffer);
        Some(state.window)
      }
    };
    self.shared.outbox.drain();
    if let Some(window) = rotated {
      BufferShared::arm(&self.shared, window);
    }
  }

  fn error(self, err: E) {
    {
      let mut state = self.shared.state.rc_deref_mut();
      state.stopped = true;
      state.buffer.clear();
      let downstream = self.shared.downstream.clone();
      self.shared.outbox.push(Box::new(move || downstream.error(err)));
    }
    self.shared.outbox.drain();
  }

  fn complete(self) {
    {
      let mut state = self.shared.state.rc_deref_mut();
      state.stopped = true;
      let buffer = std::mem::take(&mut state.buffer);
      let downstream = self.shared.downstream.clone();
      self.shared.outbox.push(Box::new(move || {
        downstream.next(buffer);
        downstream.complete();
      }));
    }
    self.shared.outbox.drain();
  }

  fn is_closed(&self) -> bool { self.shared.downstream.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use super::*;
  use crate::prelude::*;

  type Emissions = Arc<Mutex<Vec<(Vec<i32>, u64)>>>;

  fn buffered(
    subject: &PublishSubject<i32, &'static str>, scheduler: &VirtualTimeScheduler, span: u64,
    count: usize,
  ) -> (Emissions, Subscription) {
    let out: Emissions = Arc::default();
    let (c_out, clock) = (out.clone(), scheduler.clone());
    let subscription = subject
      .as_observable()
      .buffer_with_time_or_count(Duration::from_millis(span), count, scheduler.clone())
      .subscribe_err(move |b| c_out.lock().unwrap().push((b, clock.clock())), |_| {});
    (out, subscription)
  }

  #[test]
  fn count_rotation_rearms_the_timer() {
    let scheduler = VirtualTimeScheduler::new();
    let subject = PublishSubject::new();
    let (out, _subscription) = buffered(&subject, &scheduler, 100, 2);

    scheduler.advance_to(30);
    subject.next(1);
    subject.next(2);
    scheduler.advance_to(100);
    subject.next(3);
    scheduler.advance_to(129);
    assert_eq!(*out.lock().unwrap(), vec![(vec![1, 2], 30)]);
    scheduler.advance_to(130);
    assert_eq!(*out.lock().unwrap(), vec![(vec![1, 2], 30), (vec![3], 130)]);
    assert_eq!(scheduler.pending_count(), 1);
  }

  #[test]
  fn time_closes_possibly_empty_buffers() {
    let scheduler = VirtualTimeScheduler::new();
    let subject = PublishSubject::new();
    let (out, _subscription) = buffered(&subject, &scheduler, 50, 5);

    subject.next(1);
    scheduler.advance_to(120);
    assert_eq!(*out.lock().unwrap(), vec![(vec![1], 50), (vec![], 100)]);
  }

  #[test]
  fn completion_flushes_then_completes() {
    let scheduler = VirtualTimeScheduler::new();
    let subject = PublishSubject::<i32, &'static str>::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let (l1, l2) = (log.clone(), log.clone());
    subject
      .as_observable()
      .buffer_with_time_or_count(Duration::from_millis(50), 5, scheduler.clone())
      .subscribe_all(
        move |b| l1.lock().unwrap().push(format!("{b:?}")),
        |_| {},
        move || l2.lock().unwrap().push("done".to_owned()),
      );
    subject.next(1);
    scheduler.advance_to(60);
    subject.complete();

    assert_eq!(*log.lock().unwrap(), vec!["[1]", "[]", "done"]);
    assert_eq!(scheduler.pending_count(), 0);
  }

  #[test]
  fn error_discards_pending_buffer() {
    let scheduler = VirtualTimeScheduler::new();
    let subject = PublishSubject::<i32, &'static str>::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let (l1, l2) = (log.clone(), log.clone());
    subject
      .as_observable()
      .buffer_with_time_or_count(Duration::from_millis(50), 5, scheduler.clone())
      .subscribe_err(
        move |b| l1.lock().unwrap().push(format!("{b:?}")),
        move |e| l2.lock().unwrap().push(format!("error {e}")),
      );
    subject.next(1);
    subject.next(2);
    subject.error("broken");
    scheduler.start();

    assert_eq!(*log.lock().unwrap(), vec!["error broken"]);
  }

  #[test]
  fn dispose_mid_window_does_not_flush() {
    let scheduler = VirtualTimeScheduler::new();
    let subject = PublishSubject::new();
    let (out, subscription) = buffered(&subject, &scheduler, 50, 5);

    subject.next(1);
    subject.next(2);
    scheduler.advance_to(20);
    subscription.dispose();
    scheduler.start();

    assert!(out.lock().unwrap().is_empty());
    assert!(!subject.has_observers());
    assert_eq!(scheduler.pending_count(), 0);
  }

  #[test]
  fn handler_may_feed_the_source_from_a_timer_buffer() {
    let scheduler = VirtualTimeScheduler::new();
    let feed: MutArc<Option<Subscriber<i32, ()>>> = MutArc::own(None);
    let c_feed = feed.clone();
    let source = observable::create(move |s: Subscriber<i32, ()>| *c_feed.rc_deref_mut() = Some(s));

    let out: Emissions = Arc::default();
    let (c_out, clock, c_feed) = (out.clone(), scheduler.clone(), feed.clone());
    let _subscription = source
      .buffer_with_time_or_count(Duration::from_millis(50), 5, scheduler.clone())
      .subscribe_err(
        move |b: Vec<i32>| {
          let feed_back = b.is_empty() && clock.clock() == 50;
          c_out.lock().unwrap().push((b, clock.clock()));
          if feed_back {
            let upstream = c_feed.rc_deref_mut().clone();
            if let Some(upstream) = upstream {
              upstream.next(7);
            }
          }
        },
        |_| {},
      );

    scheduler.advance_to(100);
    assert_eq!(*out.lock().unwrap(), vec![(vec![], 50), (vec![7], 100)]);
  }

  #[test]
  fn deliveries_queued_while_draining_run_after() {
    let queue = Arc::new(DeliveryQueue::default());
    let log = Arc::new(Mutex::new(Vec::new()));
    let (c_queue, l1, l2) = (queue.clone(), log.clone(), log.clone());
    queue.push(Box::new(move || {
      l1.lock().unwrap().push("outer start");
      let l3 = l1.clone();
      c_queue.push(Box::new(move || l3.lock().unwrap().push("inner")));
      c_queue.drain();
      l1.lock().unwrap().push("outer end");
    }));
    queue.push(Box::new(move || l2.lock().unwrap().push("second")));
    queue.drain();
    assert_eq!(*log.lock().unwrap(), vec!["outer start", "outer end", "second", "inner"]);
  }

  #[test]
  fn stale_timer_is_not_kept() {
    let timer = WindowTimer::new();
    let first = Arc::new(BooleanDisposable::new());
    let second = Arc::new(BooleanDisposable::new());
    timer.set(2, second.clone());
    timer.set(1, first.clone());
    assert!(first.is_disposed());
    assert!(!second.is_disposed());
    timer.dispose();
    assert!(second.is_disposed());
    let late = Arc::new(BooleanDisposable::new());
    timer.set(3, late.clone());
    assert!(late.is_disposed());
  }

  #[test]
  #[should_panic(expected = "buffer count must be positive")]
  fn zero_count_panics() {
    observable::never::<i32, ()>().buffer_with_time_or_count(
      Duration::from_millis(1),
      0,
      VirtualTimeScheduler::new(),
    );
  }
}
