use std::sync::atomic::{AtomicBool, Ordering};

use super::subject_core::CoreState;
use crate::{rc::WeakMutArc, subscription::Disposable};

/// Removes one observer from a subject when its subscription is disposed.
///
/// The id is reserved before registration completes, so disposing a
/// subscription whose registration is still queued is a no-op here; the
/// queued registration sees the closed subscriber and skips it. Only a weak
/// reference to the subject is held, so an outstanding subscription does not
/// keep a dropped subject alive.
pub(crate) struct SubjectSubscription<T, E, B> {
  core: WeakMutArc<CoreState<T, E, B>>,
  id: usize,
  disposed: AtomicBool,
}

impl<T, E, B> SubjectSubscription<T, E, B> {
  pub(crate) fn new(core: WeakMutArc<CoreState<T, E, B>>, id: usize) -> Self {
    Self { core, id, disposed: AtomicBool::new(false) }
  }
}

impl<T, E, B> Disposable for SubjectSubscription<T, E, B>
where
  T: Send,
  E: Send,
  B: Send,
{
  fn dispose(&self) {
    if self.disposed.swap(true, Ordering::AcqRel) {
      return;
    }
    if let Some(core) = self.core.upgrade() {
      let removed = core.rc_deref_mut().observers.remove(self.id);
      // Dropped after the lock is released.
      drop(removed);
    }
  }

  fn is_disposed(&self) -> bool { self.disposed.load(Ordering::Acquire) }
}
