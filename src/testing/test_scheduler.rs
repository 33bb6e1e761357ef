use super::{
  ColdObservable, HotObservable, MockObserver, Recorded, CREATED, DISPOSED, SUBSCRIBED,
};
use crate::{
  notification::Notification,
  observable::Observable,
  rc::MutArc,
  scheduler::{
    virtual_time::{Ticks, VirtualTimeScheduler},
    Action, Duration, Scheduler,
  },
  subscription::{DisposableRef, Subscription},
};

/// A [`VirtualTimeScheduler`] with factories for test sources and observers.
/// Clones share the clock.
#[derive(Clone, Default, Debug)]
pub struct TestScheduler {
  clock: VirtualTimeScheduler,
}

impl TestScheduler {
  pub fn new() -> Self { Self::default() }

  /// The underlying virtual-time scheduler, to hand to operators.
  pub fn virtual_time(&self) -> &VirtualTimeScheduler { &self.clock }

  pub fn clock(&self) -> Ticks { self.clock.clock() }

  pub fn start(&self) { self.clock.start() }

  pub fn advance_to(&self, time: Ticks) { self.clock.advance_to(time) }

  pub fn advance_by(&self, ticks: Ticks) { self.clock.advance_by(ticks) }

  pub fn stop(&self) { self.clock.stop() }

  pub fn pending_count(&self) -> usize { self.clock.pending_count() }

  pub fn schedule_absolute_fn<F>(&self, due: Ticks, f: F) -> DisposableRef
  where
    F: FnOnce(&dyn Scheduler) + Send + 'static,
  {
    self.clock.schedule_absolute(due, Box::new(f))
  }

  /// A source whose notifications happen at the given absolute times.
  pub fn create_hot_observable<T, E>(
    &self, messages: Vec<Recorded<Notification<T, E>>>,
  ) -> HotObservable<T, E>
  where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
  {
    HotObservable::new(self.clock.clone(), messages)
  }

  /// A source that replays the given notifications for each subscriber, at
  /// times relative to its subscription.
  pub fn create_cold_observable<T, E>(
    &self, messages: Vec<Recorded<Notification<T, E>>>,
  ) -> ColdObservable<T, E>
  where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
  {
    ColdObservable::new(self.clock.clone(), messages)
  }

  pub fn create_observer<T, E>(&self) -> MockObserver<T, E> { MockObserver::new(self.clock.clone()) }

  /// Creates the pipeline at `created`, subscribes a fresh [`MockObserver`]
  /// to it at `subscribed` and disposes that subscription at `disposed`,
  /// running the clock until no work is left.
  pub fn start_with_timing<T, E, F>(
    &self, create: F, created: Ticks, subscribed: Ticks, disposed: Ticks,
  ) -> MockObserver<T, E>
  where
    F: FnOnce() -> Observable<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
  {
    let observer = self.create_observer();
    let source: MutArc<Option<Observable<T, E>>> = MutArc::own(None);
    let subscription: MutArc<Option<Subscription>> = MutArc::own(None);

    let c_source = source.clone();
    self.schedule_absolute_fn(created, move |_| {
      *c_source.rc_deref_mut() = Some(create());
    });

    let (c_observer, c_subscription) = (observer.clone(), subscription.clone());
    self.schedule_absolute_fn(subscribed, move |_| {
      let pipeline = source.rc_deref_mut().take();
      if let Some(pipeline) = pipeline {
        *c_subscription.rc_deref_mut() = Some(pipeline.subscribe_observer(c_observer));
      }
    });

    self.schedule_absolute_fn(disposed, move |_| {
      let live = subscription.rc_deref_mut().take();
      if let Some(live) = live {
        live.dispose();
      }
    });

    self.start();
    observer
  }

  /// [`start_with_timing`](Self::start_with_timing) at the conventional
  /// times: created at [`CREATED`], subscribed at [`SUBSCRIBED`], disposed at
  /// [`DISPOSED`].
  pub fn start_with<T, E, F>(&self, create: F) -> MockObserver<T, E>
  where
    F: FnOnce() -> Observable<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
  {
    self.start_with_timing(create, CREATED, SUBSCRIBED, DISPOSED)
  }
}

impl Scheduler for TestScheduler {
  fn now(&self) -> Duration { self.clock.now() }

  fn schedule_relative(&self, delay: Duration, action: Action) -> DisposableRef {
    self.clock.schedule_relative(delay, action)
  }
}
