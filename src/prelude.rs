//! Prelude module for convenient imports.

pub use crate::{
  error::SchedulerError,
  hooks::ErrorHooks,
  notification::Notification,
  observable::{self, Observable},
  observer::{FnObserver, Observer},
  scheduler::{
    virtual_time::Ticks, CurrentThreadScheduler, Duration, Instant, Scheduler, SchedulerExt,
    VirtualTimeScheduler,
  },
  subject::{BehaviorSubject, PublishSubject, ReplaySubject},
  subscriber::Subscriber,
  subscription::{
    ActionDisposable, BooleanDisposable, CompositeDisposable, Disposable, SerialDisposable,
    SingleAssignmentDisposable, Subscription, SubscriptionGuard,
  },
  testing::{MockObserver, Recorded, SubscriptionRecord, TestScheduler},
};
#[cfg(feature = "pool-scheduler")]
pub use crate::scheduler::PoolScheduler;
