use std::collections::BTreeMap;

use super::{Recorded, SubscriptionRecord};
use crate::{
  notification::Notification,
  observable::Observable,
  rc::MutArc,
  scheduler::{
    virtual_time::{Ticks, VirtualTimeScheduler},
    Duration, Scheduler, SchedulerExt,
  },
  subscriber::Subscriber,
  subscription::ActionDisposable,
};

type Messages<T, E> = Vec<Recorded<Notification<T, E>>>;

/// Opens a subscription record at the current clock and closes it when
/// `subscriber`'s subscription ends.
fn track_subscription<T, E>(
  scheduler: &VirtualTimeScheduler, records: &MutArc<Vec<SubscriptionRecord>>,
  subscriber: &Subscriber<T, E>,
) {
  let index = {
    let mut records = records.rc_deref_mut();
    records.push(SubscriptionRecord::open(scheduler.clock()));
    records.len() - 1
  };
  let (scheduler, records) = (scheduler.clone(), records.clone());
  subscriber.add(ActionDisposable::new(move || {
    records.rc_deref_mut()[index].unsubscribe = scheduler.clock();
  }));
}

fn deliver<T, E>(subscriber: &Subscriber<T, E>, notification: Notification<T, E>) {
  match notification {
    Notification::Next(v) => subscriber.next(v),
    Notification::Error(e) => subscriber.error(e),
    Notification::Completed => subscriber.complete(),
  }
}

// ==================== Hot ====================

/// A test source whose notifications happen at absolute virtual times,
/// whether or not anyone is subscribed. Subscribers see only what happens
/// while they are subscribed.
pub struct HotObservable<T, E> {
  scheduler: VirtualTimeScheduler,
  observers: MutArc<HotObservers<T, E>>,
  records: MutArc<Vec<SubscriptionRecord>>,
}

struct HotObservers<T, E> {
  by_id: BTreeMap<usize, Subscriber<T, E>>,
  next_id: usize,
}

impl<T, E> Clone for HotObservable<T, E> {
  fn clone(&self) -> Self {
    Self {
      scheduler: self.scheduler.clone(),
      observers: self.observers.clone(),
      records: self.records.clone(),
    }
  }
}

impl<T, E> HotObservable<T, E>
where
  T: Clone + Send + 'static,
  E: Clone + Send + 'static,
{
  pub(crate) fn new(scheduler: VirtualTimeScheduler, messages: Messages<T, E>) -> Self {
    let observers = MutArc::own(HotObservers { by_id: BTreeMap::new(), next_id: 0 });
    for Recorded { time, value } in messages {
      let observers = observers.clone();
      scheduler.schedule_absolute(
        time,
        Box::new(move |_: &dyn Scheduler| {
          let targets: Vec<_> = observers.rc_deref_mut().by_id.values().cloned().collect();
          for target in targets {
            deliver(&target, value.clone());
          }
        }),
      );
    }
    Self { scheduler, observers, records: MutArc::own(Vec::new()) }
  }

  pub fn as_observable(&self) -> Observable<T, E> {
    let this = self.clone();
    Observable::create(move |subscriber: Subscriber<T, E>| {
      track_subscription(&this.scheduler, &this.records, &subscriber);
      let id = {
        let mut observers = this.observers.rc_deref_mut();
        let id = observers.next_id;
        observers.next_id += 1;
        observers.by_id.insert(id, subscriber.clone());
        id
      };
      let observers = this.observers.clone();
      subscriber.add(ActionDisposable::new(move || {
        let removed = observers.rc_deref_mut().by_id.remove(&id);
        drop(removed);
      }));
    })
  }

  /// Every subscription made so far, in subscription order.
  pub fn subscriptions(&self) -> Vec<SubscriptionRecord> { self.records.rc_deref_mut().clone() }
}

// ==================== Cold ====================

/// A test source that replays its notifications for every subscriber, each
/// at its time offset from the moment of subscription.
pub struct ColdObservable<T, E> {
  scheduler: VirtualTimeScheduler,
  messages: std::sync::Arc<Messages<T, E>>,
  records: MutArc<Vec<SubscriptionRecord>>,
}

impl<T, E> Clone for ColdObservable<T, E> {
  fn clone(&self) -> Self {
    Self {
      scheduler: self.scheduler.clone(),
      messages: self.messages.clone(),
      records: self.records.clone(),
    }
  }
}

impl<T, E> ColdObservable<T, E>
where
  T: Clone + Send + Sync + 'static,
  E: Clone + Send + Sync + 'static,
{
  pub(crate) fn new(scheduler: VirtualTimeScheduler, messages: Messages<T, E>) -> Self {
    Self {
      scheduler,
      messages: std::sync::Arc::new(messages),
      records: MutArc::own(Vec::new()),
    }
  }

  pub fn as_observable(&self) -> Observable<T, E> {
    let this = self.clone();
    Observable::create(move |subscriber: Subscriber<T, E>| {
      track_subscription(&this.scheduler, &this.records, &subscriber);
      for Recorded { time, value } in this.messages.iter().cloned() {
        let target = subscriber.clone();
        let handle = this
          .scheduler
          .schedule_relative_fn(ticks(time), move |_| deliver(&target, value));
        subscriber.add(handle);
      }
    })
  }

  /// Every subscription made so far, in subscription order.
  pub fn subscriptions(&self) -> Vec<SubscriptionRecord> { self.records.rc_deref_mut().clone() }
}

fn ticks(time: Ticks) -> Duration { Duration::from_millis(time) }
