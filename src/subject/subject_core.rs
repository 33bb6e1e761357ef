use std::{
  collections::VecDeque,
  sync::{Arc, Condvar, PoisonError},
  thread::{self, ThreadId},
};

use super::{
  subject_subscription::SubjectSubscription,
  subscribers::{broadcast_complete, broadcast_error, broadcast_value, Subscribers},
};
use crate::{
  notification::Notification, observable::Observable, rc::MutArc, subscriber::Subscriber,
};

// ============================================================================
// Replay policy
// ============================================================================

/// What a subject remembers for subscribers that arrive later.
pub(crate) trait ReplayBuffer<T>: Send + 'static {
  fn record(&mut self, value: &T);

  /// Values sent to a new subscriber before it goes live.
  fn replay(&self) -> Vec<T>;

  /// Whether the replay is still sent once the subject has terminated.
  fn replays_after_terminal(&self) -> bool;
}

/// No history.
pub(crate) struct NoReplay;

impl<T> ReplayBuffer<T> for NoReplay {
  fn record(&mut self, _: &T) {}
  fn replay(&self) -> Vec<T> { Vec::new() }
  fn replays_after_terminal(&self) -> bool { false }
}

/// The latest value only, dropped from the replay after termination.
pub(crate) struct Latest<T>(pub(crate) T);

impl<T: Clone + Send + 'static> ReplayBuffer<T> for Latest<T> {
  fn record(&mut self, value: &T) { self.0 = value.clone(); }
  fn replay(&self) -> Vec<T> { vec![self.0.clone()] }
  fn replays_after_terminal(&self) -> bool { false }
}

/// The `capacity` most recent values, replayed even after termination.
pub(crate) struct Bounded<T> {
  values: VecDeque<T>,
  capacity: usize,
}

impl<T> Bounded<T> {
  pub(crate) fn new(capacity: usize) -> Self {
    Self { values: VecDeque::with_capacity(capacity.min(64)), capacity }
  }
}

impl<T: Clone + Send + 'static> ReplayBuffer<T> for Bounded<T> {
  fn record(&mut self, value: &T) {
    if self.capacity == 0 {
      return;
    }
    if self.values.len() == self.capacity {
      self.values.pop_front();
    }
    self.values.push_back(value.clone());
  }

  fn replay(&self) -> Vec<T> { self.values.iter().cloned().collect() }

  fn replays_after_terminal(&self) -> bool { true }
}

// ============================================================================
// Core
// ============================================================================

pub(crate) enum Terminal<E> {
  Error(E),
  Completed,
}

enum PendingOp<T, E> {
  Emit(Notification<T, E>),
  Subscribe(usize, Subscriber<T, E>),
}

pub(crate) struct CoreState<T, E, B> {
  pub(crate) observers: Subscribers<T, E>,
  buffer: B,
  terminal: Option<Terminal<E>>,
  // The thread running a pass, if any.
  owner: Option<ThreadId>,
  // Re-entrant operations of the owner, run after the pass in flight.
  queue: VecDeque<PendingOp<T, E>>,
}

/// Registry, history and fan-out shared by every subject flavour.
///
/// Emissions and registrations of one subject run one at a time, in a
/// section owned by one thread. An operation made re-entrantly by the owner,
/// from inside an observer callback, is queued and run once the operation in
/// flight is finished. Any other thread waits for the section to be free and
/// then runs its own operation, so a `subscribe` or `next` has taken effect
/// when it returns. No lock is held while observers run.
pub(crate) struct SubjectCore<T, E, B> {
  pub(crate) state: MutArc<CoreState<T, E, B>>,
  released: Arc<Condvar>,
}

impl<T, E, B> Clone for SubjectCore<T, E, B> {
  fn clone(&self) -> Self { Self { state: self.state.clone(), released: self.released.clone() } }
}

impl<T, E, B> SubjectCore<T, E, B>
where
  T: Clone + Send + 'static,
  E: Clone + Send + 'static,
  B: ReplayBuffer<T>,
{
  pub(crate) fn new(buffer: B) -> Self {
    Self {
      state: MutArc::own(CoreState {
        observers: Subscribers::default(),
        buffer,
        terminal: None,
        owner: None,
        queue: VecDeque::new(),
      }),
      released: Arc::new(Condvar::new()),
    }
  }

  pub(crate) fn emit(&self, notification: Notification<T, E>) {
    self.enqueue_or_own(PendingOp::Emit(notification));
  }

  pub(crate) fn subscribe(&self, subscriber: Subscriber<T, E>) {
    let id = self.state.rc_deref_mut().observers.reserve_id();
    subscriber.add(SubjectSubscription::new(self.state.downgrade(), id));
    self.enqueue_or_own(PendingOp::Subscribe(id, subscriber));
  }

  pub(crate) fn as_observable(&self) -> Observable<T, E> {
    let core = self.clone();
    Observable::create(move |subscriber: Subscriber<T, E>| core.subscribe(subscriber))
  }

  pub(crate) fn observer_count(&self) -> usize { self.state.rc_deref_mut().observers.len() }

  pub(crate) fn is_terminated(&self) -> bool { self.state.rc_deref_mut().terminal.is_some() }

  pub(crate) fn with_buffer<R>(&self, f: impl FnOnce(&B) -> R) -> R {
    f(&self.state.rc_deref_mut().buffer)
  }

  fn enqueue_or_own(&self, op: PendingOp<T, E>) {
    let me = thread::current().id();
    {
      let mut state = self.state.rc_deref_mut();
      loop {
        let owner = state.owner;
        match owner {
          None => break,
          Some(owner) if owner == me => {
            state.queue.push_back(op);
            return;
          }
          Some(_) => {
            state = self
              .released
              .wait(state)
              .unwrap_or_else(PoisonError::into_inner);
          }
        }
      }
      state.owner = Some(me);
    }
    let _owner = OwnerGuard(self);
    let mut op = op;
    loop {
      self.run(op);
      // Popping and releasing ownership happen under one lock, so an op
      // queued by the owner is never stranded.
      let mut state = self.state.rc_deref_mut();
      match state.queue.pop_front() {
        Some(next) => op = next,
        None => {
          state.owner = None;
          break;
        }
      }
    }
    self.released.notify_all();
  }

  fn run(&self, op: PendingOp<T, E>) {
    match op {
      PendingOp::Emit(Notification::Next(value)) => {
        let targets = {
          let mut state = self.state.rc_deref_mut();
          if state.terminal.is_some() {
            return;
          }
          state.buffer.record(&value);
          state.observers.snapshot()
        };
        broadcast_value(&targets, value);
      }
      PendingOp::Emit(Notification::Error(err)) => {
        let targets = {
          let mut state = self.state.rc_deref_mut();
          if state.terminal.is_some() {
            return;
          }
          state.terminal = Some(Terminal::Error(err.clone()));
          state.observers.drain()
        };
        broadcast_error(targets, err);
      }
      PendingOp::Emit(Notification::Completed) => {
        let targets = {
          let mut state = self.state.rc_deref_mut();
          if state.terminal.is_some() {
            return;
          }
          state.terminal = Some(Terminal::Completed);
          state.observers.drain()
        };
        broadcast_complete(targets);
      }
      PendingOp::Subscribe(id, subscriber) => self.register(id, subscriber),
    }
  }

  fn register(&self, id: usize, subscriber: Subscriber<T, E>) {
    let (replay, terminal) = {
      let state = self.state.rc_deref_mut();
      let terminal = state.terminal.as_ref().map(|t| match t {
        Terminal::Error(e) => Terminal::Error(e.clone()),
        Terminal::Completed => Terminal::Completed,
      });
      let replay = if terminal.is_none() || state.buffer.replays_after_terminal() {
        state.buffer.replay()
      } else {
        Vec::new()
      };
      (replay, terminal)
    };

    for value in replay {
      subscriber.next(value);
    }
    match terminal {
      Some(Terminal::Error(e)) => subscriber.error(e),
      Some(Terminal::Completed) => subscriber.complete(),
      None => {
        if !subscriber.is_closed() {
          self.state.rc_deref_mut().observers.insert(id, subscriber);
        }
      }
    }
  }
}

/// Releases the section if an observer callback unwinds out of the owning
/// pass; ops still queued are dropped.
struct OwnerGuard<'a, T, E, B>(&'a SubjectCore<T, E, B>);

impl<T, E, B> Drop for OwnerGuard<'_, T, E, B> {
  fn drop(&mut self) {
    if !thread::panicking() {
      return;
    }
    let leftover = {
      let mut state = self.0.state.rc_deref_mut();
      state.owner = None;
      std::mem::take(&mut state.queue)
    };
    self.0.released.notify_all();
    drop(leftover);
  }
}
