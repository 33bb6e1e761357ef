use super::Recorded;
use crate::{
  notification::Notification, observer::Observer, rc::MutArc,
  scheduler::virtual_time::VirtualTimeScheduler,
};

/// An observer that records every notification with the virtual time it
/// arrived at. Clones share the recording.
pub struct MockObserver<T, E> {
  scheduler: VirtualTimeScheduler,
  messages: MutArc<Vec<Recorded<Notification<T, E>>>>,
}

impl<T, E> Clone for MockObserver<T, E> {
  fn clone(&self) -> Self {
    Self { scheduler: self.scheduler.clone(), messages: self.messages.clone() }
  }
}

impl<T, E> MockObserver<T, E> {
  pub(crate) fn new(scheduler: VirtualTimeScheduler) -> Self {
    Self { scheduler, messages: MutArc::own(Vec::new()) }
  }

  /// The notifications recorded so far, in arrival order.
  pub fn messages(&self) -> Vec<Recorded<Notification<T, E>>>
  where
    T: Clone,
    E: Clone,
  {
    self.messages.rc_deref_mut().clone()
  }

  fn record(&self, notification: Notification<T, E>) {
    let time = self.scheduler.clock();
    self
      .messages
      .rc_deref_mut()
      .push(Recorded::new(time, notification));
  }
}

impl<T, E> Observer<T, E> for MockObserver<T, E> {
  fn next(&mut self, value: T) { self.record(Notification::Next(value)) }

  fn error(self, err: E) { self.record(Notification::Error(err)) }

  fn complete(self) { self.record(Notification::Completed) }

  fn is_closed(&self) -> bool { false }
}
