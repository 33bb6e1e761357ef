use std::sync::Arc;

use super::buffer_time::{Delivery, DeliveryQueue, WindowTimer};
use crate::{
  observable::Observable,
  observer::Observer,
  rc::MutArc,
  scheduler::{Duration, Scheduler, SchedulerExt, SchedulerRef},
  subject::PublishSubject,
  subscriber::Subscriber,
  subscription::Disposable,
};

impl<T, E> Observable<T, E> {
  /// Splits the source into windows of at most `count` values, each open for
  /// at most `time_span` on `scheduler`.
  ///
  /// Windows are emitted as observables when they open, the first one on
  /// subscription. Each is backed by a [`PublishSubject`], so a late
  /// subscriber to a window sees only the rest of it. Completion or error of
  /// the source is forwarded to the open window and then downstream.
  ///
  /// # Panics
  ///
  /// If `count` or `time_span` is zero.
  pub fn window_with_time_or_count<Sch>(
    self, time_span: Duration, count: usize, scheduler: Sch,
  ) -> Observable<Observable<T, E>, E>
  where
    Sch: Scheduler,
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
  {
    assert!(count > 0, "window count must be positive");
    assert!(!time_span.is_zero(), "window time span must be positive");
    let scheduler: SchedulerRef = Arc::new(scheduler);
    self.lift(move |downstream: Subscriber<Observable<T, E>, E>| {
      let first = PublishSubject::new();
      downstream.next(first.as_observable());
      let shared = Arc::new(WindowShared {
        state: MutArc::own(WindowState { current: first, filled: 0, window: 0, stopped: false }),
        outbox: DeliveryQueue::default(),
        timer: Arc::new(WindowTimer::new()),
        downstream: downstream.clone(),
        scheduler: scheduler.clone(),
        time_span,
        count,
      });
      downstream.add(shared.timer.clone());
      WindowShared::arm(&shared, 0);
      WindowObserver { shared }
    })
  }
}

struct WindowState<T, E> {
  current: PublishSubject<T, E>,
  filled: usize,
  window: u64,
  stopped: bool,
}

impl<T, E> WindowState<T, E>
where
  T: Clone + Send + 'static,
  E: Clone + Send + 'static,
{
  /// Opens a fresh window. The returned delivery completes the old one and
  /// hands the new one downstream.
  fn rotate(&mut self, downstream: &Subscriber<Observable<T, E>, E>) -> (u64, Delivery) {
    let closed = std::mem::replace(&mut self.current, PublishSubject::new());
    self.filled = 0;
    self.window += 1;
    let (downstream, opened) = (downstream.clone(), self.current.as_observable());
    let delivery: Delivery = Box::new(move || {
      closed.complete();
      downstream.next(opened);
    });
    (self.window, delivery)
  }
}

struct WindowShared<T, E> {
  state: MutArc<WindowState<T, E>>,
  outbox: DeliveryQueue,
  timer: Arc<WindowTimer>,
  downstream: Subscriber<Observable<T, E>, E>,
  scheduler: SchedulerRef,
  time_span: Duration,
  count: usize,
}

impl<T, E> WindowShared<T, E>
where
  T: Clone + Send + 'static,
  E: Clone + Send + 'static,
{
  fn arm(this: &Arc<Self>, window: u64) {
    if this.timer.is_disposed() {
      return;
    }
    let c_this = this.clone();
    let handle = this
      .scheduler
      .schedule_relative_fn(this.time_span, move |_| WindowShared::on_timer(&c_this, window));
    this.timer.set(window, handle);
  }

  fn on_timer(this: &Arc<Self>, window: u64) {
    let next = {
      let mut state = this.state.rc_deref_mut();
      if state.stopped || state.window != window {
        return;
      }
      let (next, delivery) = state.rotate(&this.downstream);
      this.outbox.push(delivery);
      next
    };
    this.outbox.drain();
    WindowShared::arm(this, next);
  }
}

struct WindowObserver<T, E> {
  shared: Arc<WindowShared<T, E>>,
}

impl<T, E> Observer<T, E> for WindowObserver<T, E>
where
  T: Clone + Send + 'static,
  E: Clone + Send + 'static,
{
  fn next(&mut self, value: T) {
    let rotated = {
      let mut state = self.shared.state.rc_deref_mut();
      if state.stopped {
        return;
      }
      let current = state.current.clone();
      self.shared.outbox.push(Box::new(move || current.next(value)));
      state.filled += 1;
      if state.filled < self.shared.count {
        None
      } else {
        let (next, delivery) = state.rotate(&self.shared.downstream);
        self.shared.outbox.push(delivery);
        Some(next)
      }
    };
    self.shared.outbox.drain();
    if let Some(window) = rotated {
      WindowShared::arm(&self.shared, window);
    }
  }

  fn error(self, err: E) {
    {
      let mut state = self.shared.state.rc_deref_mut();
      state.stopped = true;
      let (current, downstream) = (state.current.clone(), self.shared.downstream.clone());
      self.shared.outbox.push(Box::new(move || {
        current.error(err.clone());
        downstream.error(err);
      }));
    }
    self.shared.outbox.drain();
  }

  fn complete(self) {
    {
      let mut state = self.shared.state.rc_deref_mut();
      state.stopped = true;
      let (current, downstream) = (state.current.clone(), self.shared.downstream.clone());
      self.shared.outbox.push(Box::new(move || {
        current.complete();
        downstream.complete();
      }));
    }
    self.shared.outbox.drain();
  }

  fn is_closed(&self) -> bool { self.shared.downstream.is_closed() }
}
