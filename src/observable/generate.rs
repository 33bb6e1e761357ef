use std::{convert::Infallible, sync::Arc};

use super::Observable;
use crate::{
  rc::MutArc,
  scheduler::{Action, Scheduler, SchedulerRef},
  subscriber::Subscriber,
  subscription::SerialDisposable,
};

type Condition<S, E> = dyn Fn(&S) -> Result<bool, E> + Send + Sync;
type Iterate<S, E> = dyn Fn(&S) -> Result<S, E> + Send + Sync;

/// Scheduler-driven unfold.
///
/// Each step runs as one action on `scheduler`: if `condition(&state)` is
/// false the sequence completes, otherwise `state` is emitted, replaced by
/// `iterate(&state)`, and the next step is scheduled. Under the
/// current-thread scheduler the whole sequence runs synchronously inside
/// `subscribe`; under other schedulers it runs as the scheduler dispatches.
///
/// ```rust
/// use rxcore::prelude::*;
/// use std::sync::{Arc, Mutex};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let c_seen = seen.clone();
/// observable::generate(1, |v| *v < 50, |v| v * 3, CurrentThreadScheduler)
///   .subscribe(move |v| c_seen.lock().unwrap().push(v));
/// assert_eq!(*seen.lock().unwrap(), vec![1, 3, 9, 27]);
/// ```
pub fn generate<S, C, I, Sch>(
  initial: S, condition: C, iterate: I, scheduler: Sch,
) -> Observable<S, Infallible>
where
  S: Clone + Send + Sync + 'static,
  C: Fn(&S) -> bool + Send + Sync + 'static,
  I: Fn(&S) -> S + Send + Sync + 'static,
  Sch: Scheduler,
{
  try_generate(initial, move |s: &S| Ok(condition(s)), move |s: &S| Ok(iterate(s)), scheduler)
}

/// [`generate`] with fallible callbacks: an `Err` from either callback
/// terminates the sequence with that error.
pub fn try_generate<S, E, C, I, Sch>(
  initial: S, condition: C, iterate: I, scheduler: Sch,
) -> Observable<S, E>
where
  S: Clone + Send + Sync + 'static,
  E: Send + 'static,
  C: Fn(&S) -> Result<bool, E> + Send + Sync + 'static,
  I: Fn(&S) -> Result<S, E> + Send + Sync + 'static,
  Sch: Scheduler,
{
  let condition: Arc<Condition<S, E>> = Arc::new(condition);
  let iterate: Arc<Iterate<S, E>> = Arc::new(iterate);
  let scheduler: SchedulerRef = Arc::new(scheduler);

  Observable::create(move |subscriber: Subscriber<S, E>| {
    let pending = Arc::new(SerialDisposable::new());
    let step = Arc::new(GenerateStep {
      state: MutArc::own(Some(initial.clone())),
      condition: condition.clone(),
      iterate: iterate.clone(),
      subscriber: subscriber.clone(),
      pending: pending.clone(),
    });
    subscriber.add(pending);
    // The first step may run, and chain the next, before `schedule` returns,
    // so its handle is kept apart from the re-armed `pending` one.
    let first = scheduler.schedule(generate_step(step));
    subscriber.add(first);
  })
}

struct GenerateStep<S, E> {
  state: MutArc<Option<S>>,
  condition: Arc<Condition<S, E>>,
  iterate: Arc<Iterate<S, E>>,
  subscriber: Subscriber<S, E>,
  pending: Arc<SerialDisposable>,
}

fn generate_step<S, E>(step: Arc<GenerateStep<S, E>>) -> Action
where
  S: Clone + Send + Sync + 'static,
  E: Send + 'static,
{
  Box::new(move |scheduler: &dyn Scheduler| {
    if step.subscriber.is_closed() {
      return;
    }
    let Some(state) = step.state.rc_deref_mut().take() else {
      return;
    };
    match (step.condition)(&state) {
      Err(e) => return step.subscriber.error(e),
      Ok(false) => return step.subscriber.complete(),
      Ok(true) => {}
    }
    step.subscriber.next(state.clone());
    match (step.iterate)(&state) {
      Err(e) => step.subscriber.error(e),
      Ok(next) => {
        *step.state.rc_deref_mut() = Some(next);
        if !step.subscriber.is_closed() {
          let handle = scheduler.schedule(generate_step(step.clone()));
          step.pending.replace(handle);
        }
      }
    }
  })
}
