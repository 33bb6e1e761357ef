//! Disposables: the one cancellation path of the engine.
//!
//! Every subscription and every scheduled action hands back something that
//! implements [`Disposable`]. `dispose()` is idempotent and thread-safe; after
//! the first call every further call is a no-op.
//!
//! | Type | Role |
//! |------|------|
//! | [`ActionDisposable`] | runs a closure once |
//! | [`BooleanDisposable`] | a flag, used as a cancellation token |
//! | [`SingleAssignmentDisposable`] | holds at most one inner disposable |
//! | [`SerialDisposable`] | replaceable inner disposable |
//! | [`CompositeDisposable`] | an open set of disposables |
//! | [`Subscription`] | handle returned by `Observable::subscribe*` |

use std::{
  fmt::{Debug, Formatter},
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
};

use crate::{diagnostics::Tracked, rc::MutArc};

mod dynamic;
pub use dynamic::DynamicSubscriptions;

pub trait Disposable: Send + Sync {
  /// Release the resource. Calling it more than once has no further effect.
  fn dispose(&self);

  fn is_disposed(&self) -> bool;
}

pub type DisposableRef = Arc<dyn Disposable>;
pub type BoxedDisposable = Box<dyn Disposable>;

impl<T: Disposable + ?Sized> Disposable for Arc<T> {
  #[inline]
  fn dispose(&self) { (**self).dispose() }
  #[inline]
  fn is_disposed(&self) -> bool { (**self).is_disposed() }
}

impl<T: Disposable + ?Sized> Disposable for Box<T> {
  #[inline]
  fn dispose(&self) { (**self).dispose() }
  #[inline]
  fn is_disposed(&self) -> bool { (**self).is_disposed() }
}

impl Debug for dyn Disposable {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("dyn Disposable")
      .field("is_disposed", &self.is_disposed())
      .finish()
  }
}

// ==================== ActionDisposable ====================

/// Runs `action` the first time it is disposed.
pub struct ActionDisposable {
  disposed: AtomicBool,
  action: MutArc<Option<Box<dyn FnOnce() + Send>>>,
  _tracked: Tracked,
}

impl ActionDisposable {
  pub fn new(action: impl FnOnce() + Send + 'static) -> Self {
    Self {
      disposed: AtomicBool::new(false),
      action: MutArc::own(Some(Box::new(action))),
      _tracked: Tracked::new(),
    }
  }
}

impl Disposable for ActionDisposable {
  fn dispose(&self) {
    if !self.disposed.swap(true, Ordering::AcqRel) {
      let action = self.action.rc_deref_mut().take();
      if let Some(action) = action {
        action();
      }
    }
  }

  #[inline]
  fn is_disposed(&self) -> bool { self.disposed.load(Ordering::Acquire) }
}

// ==================== BooleanDisposable ====================

#[derive(Debug, Default)]
pub struct BooleanDisposable {
  disposed: AtomicBool,
  _tracked: Tracked,
}

impl BooleanDisposable {
  #[inline]
  pub fn new() -> Self { Self::default() }
}

impl Disposable for BooleanDisposable {
  #[inline]
  fn dispose(&self) { self.disposed.store(true, Ordering::Release) }

  #[inline]
  fn is_disposed(&self) -> bool { self.disposed.load(Ordering::Acquire) }
}

/// A disposable that is already disposed and owns nothing.
pub fn disposed() -> DisposableRef {
  let d = BooleanDisposable::new();
  d.dispose();
  Arc::new(d)
}

// ==================== SingleAssignmentDisposable ====================

struct SingleAssignmentState {
  disposed: bool,
  assigned: bool,
  current: Option<BoxedDisposable>,
}

/// Holds at most one inner disposable.
///
/// Assigning twice while not disposed is a lifecycle bug and panics. If the
/// holder is disposed before the assignment, the assigned disposable is
/// disposed right away instead of being stored.
pub struct SingleAssignmentDisposable {
  disposed: AtomicBool,
  state: MutArc<SingleAssignmentState>,
  _tracked: Tracked,
}

impl Default for SingleAssignmentDisposable {
  fn default() -> Self {
    Self {
      disposed: AtomicBool::new(false),
      state: MutArc::own(SingleAssignmentState { disposed: false, assigned: false, current: None }),
      _tracked: Tracked::new(),
    }
  }
}

impl SingleAssignmentDisposable {
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// # Panics
  ///
  /// Panics if a disposable was already assigned and the holder is still
  /// live.
  pub fn set(&self, disposable: impl Disposable + 'static) {
    let mut state = self.state.rc_deref_mut();
    if state.disposed {
      drop(state);
      disposable.dispose();
      return;
    }
    assert!(!state.assigned, "SingleAssignmentDisposable assigned more than once");
    state.assigned = true;
    state.current = Some(Box::new(disposable));
  }

  pub fn is_assigned(&self) -> bool { self.state.rc_deref_mut().assigned }
}

impl Disposable for SingleAssignmentDisposable {
  fn dispose(&self) {
    if self.disposed.swap(true, Ordering::AcqRel) {
      return;
    }
    let current = {
      let mut state = self.state.rc_deref_mut();
      state.disposed = true;
      state.current.take()
    };
    if let Some(d) = current {
      d.dispose();
    }
  }

  #[inline]
  fn is_disposed(&self) -> bool { self.disposed.load(Ordering::Acquire) }
}

// ==================== SerialDisposable ====================

/// Holds one replaceable inner disposable; replacing disposes the previous
/// one.
pub struct SerialDisposable {
  disposed: AtomicBool,
  current: MutArc<Option<BoxedDisposable>>,
  _tracked: Tracked,
}

impl Default for SerialDisposable {
  fn default() -> Self {
    Self { disposed: AtomicBool::new(false), current: MutArc::own(None), _tracked: Tracked::new() }
  }
}

impl SerialDisposable {
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// Swaps in `disposable` and disposes the previous one. After disposal the
  /// argument is disposed immediately instead.
  pub fn replace(&self, disposable: impl Disposable + 'static) {
    let mut current = self.current.rc_deref_mut();
    if self.is_disposed() {
      drop(current);
      disposable.dispose();
      return;
    }
    let previous = current.replace(Box::new(disposable));
    drop(current);
    if let Some(previous) = previous {
      previous.dispose();
    }
  }
}

impl Disposable for SerialDisposable {
  fn dispose(&self) {
    if self.disposed.swap(true, Ordering::AcqRel) {
      return;
    }
    let current = self.current.rc_deref_mut().take();
    if let Some(d) = current {
      d.dispose();
    }
  }

  #[inline]
  fn is_disposed(&self) -> bool { self.disposed.load(Ordering::Acquire) }
}

// ==================== CompositeDisposable ====================

/// Opaque handle to one member of a [`CompositeDisposable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DisposeKey(usize);

/// An open set of disposables disposed together.
///
/// Cloning yields another handle to the same set.
#[derive(Clone)]
pub struct CompositeDisposable(Arc<CompositeInner>);

struct CompositeInner {
  disposed: AtomicBool,
  members: MutArc<DynamicSubscriptions<BoxedDisposable>>,
  _tracked: Tracked,
}

impl Default for CompositeDisposable {
  fn default() -> Self {
    Self(Arc::new(CompositeInner {
      disposed: AtomicBool::new(false),
      members: MutArc::default(),
      _tracked: Tracked::new(),
    }))
  }
}

impl CompositeDisposable {
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// Adds a member. If the set is already disposed the member is disposed
  /// immediately and `None` is returned.
  pub fn add(&self, disposable: impl Disposable + 'static) -> Option<DisposeKey> {
    {
      let mut members = self.0.members.rc_deref_mut();
      if !self.is_disposed() {
        members.retain(|m| !m.is_disposed());
        return Some(DisposeKey(members.add(Box::new(disposable))));
      }
    }
    disposable.dispose();
    None
  }

  /// Detaches a member without disposing it.
  pub fn remove(&self, key: DisposeKey) -> Option<BoxedDisposable> {
    self.0.members.rc_deref_mut().remove(key.0)
  }

  pub fn len(&self) -> usize { self.0.members.rc_deref_mut().len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.0, &other.0) }
}

impl Disposable for CompositeDisposable {
  fn dispose(&self) {
    if self.0.disposed.swap(true, Ordering::AcqRel) {
      return;
    }
    // Members are disposed outside the lock: a member may call back into
    // `remove` on this very set.
    let members = self.0.members.rc_deref_mut().take_all();
    for m in members {
      m.dispose();
    }
  }

  #[inline]
  fn is_disposed(&self) -> bool { self.0.disposed.load(Ordering::Acquire) }
}

impl Debug for CompositeDisposable {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CompositeDisposable")
      .field("is_disposed", &self.is_disposed())
      .field("len", &self.len())
      .finish()
  }
}

// ==================== Subscription ====================

/// Handle returned by `Observable::subscribe*`.
#[derive(Clone)]
pub struct Subscription(DisposableRef);

impl Subscription {
  #[inline]
  pub fn new(disposable: DisposableRef) -> Self { Self(disposable) }

  #[inline]
  pub fn dispose(&self) { self.0.dispose() }

  #[inline]
  pub fn is_disposed(&self) -> bool { self.0.is_disposed() }

  /// Activates "RAII" behavior for this subscription: `dispose()` is called
  /// as soon as the returned guard goes out of scope.
  ///
  /// **Attention:** If you don't assign the return value to a variable,
  /// the subscription is disposed immediately.
  pub fn dispose_when_dropped(self) -> SubscriptionGuard { SubscriptionGuard(self) }

  pub fn into_inner(self) -> DisposableRef { self.0 }
}

impl Disposable for Subscription {
  #[inline]
  fn dispose(&self) { self.0.dispose() }
  #[inline]
  fn is_disposed(&self) -> bool { self.0.is_disposed() }
}

impl Debug for Subscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription")
      .field("is_disposed", &self.is_disposed())
      .finish()
  }
}

/// Disposes the wrapped subscription when dropped.
#[derive(Debug)]
#[must_use]
pub struct SubscriptionGuard(Subscription);

impl SubscriptionGuard {
  pub fn new(subscription: Subscription) -> SubscriptionGuard { SubscriptionGuard(subscription) }
}

impl Drop for SubscriptionGuard {
  #[inline]
  fn drop(&mut self) { self.0.dispose() }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::AtomicUsize;

  use super::*;

  fn counting() -> (Arc<AtomicUsize>, ActionDisposable) {
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    (count, ActionDisposable::new(move || {
      c.fetch_add(1, Ordering::SeqCst);
    }))
  }

  #[test]
  fn action_runs_once() {
    let (count, d) = counting();
    d.dispose();
    d.dispose();
    assert!(d.is_disposed());
    assert_eq!(count.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn action_dispose_from_many_threads() {
    let (count, d) = counting();
    let d = Arc::new(d);
    let handles: Vec<_> = (0..8)
      .map(|_| {
        let d = d.clone();
        std::thread::spawn(move || d.dispose())
      })
      .collect();
    for h in handles {
      h.join().unwrap();
    }
    assert_eq!(count.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn single_assignment_disposes_late_assignment() {
    let sad = SingleAssignmentDisposable::new();
    sad.dispose();
    let (count, d) = counting();
    sad.set(d);
    assert_eq!(count.load(Ordering::SeqCst), 1);
    // a second assignment after disposal is still fine
    let (count2, d2) = counting();
    sad.set(d2);
    assert_eq!(count2.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn single_assignment_disposes_inner_once() {
    let sad = SingleAssignmentDisposable::new();
    let (count, d) = counting();
    sad.set(d);
    assert!(sad.is_assigned());
    sad.dispose();
    sad.dispose();
    assert_eq!(count.load(Ordering::SeqCst), 1);
  }

  #[test]
  #[should_panic(expected = "assigned more than once")]
  fn single_assignment_twice_panics() {
    let sad = SingleAssignmentDisposable::new();
    sad.set(BooleanDisposable::new());
    sad.set(BooleanDisposable::new());
  }

  #[test]
  fn serial_replaces_and_disposes_previous() {
    let serial = SerialDisposable::new();
    let (first, d1) = counting();
    let (second, d2) = counting();
    serial.replace(d1);
    serial.replace(d2);
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 0);
    serial.dispose();
    assert_eq!(second.load(Ordering::SeqCst), 1);

    let (third, d3) = counting();
    serial.replace(d3);
    assert_eq!(third.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn composite_disposes_all_members_once() {
    let composite = CompositeDisposable::new();
    let (a, da) = counting();
    let (b, db) = counting();
    composite.add(da);
    composite.add(db);
    assert_eq!(composite.len(), 2);

    composite.dispose();
    composite.dispose();

    assert_eq!(a.load(Ordering::SeqCst), 1);
    assert_eq!(b.load(Ordering::SeqCst), 1);
    assert!(composite.is_empty());
  }

  #[test]
  fn composite_add_after_dispose() {
    let composite = CompositeDisposable::new();
    composite.dispose();
    let (count, d) = counting();
    assert!(composite.add(d).is_none());
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(composite.is_empty());
  }

  #[test]
  fn composite_remove_does_not_dispose() {
    let composite = CompositeDisposable::new();
    let (count, d) = counting();
    let key = composite.add(d).unwrap();
    let removed = composite.remove(key).unwrap();
    assert!(composite.remove(key).is_none());
    composite.dispose();
    assert_eq!(count.load(Ordering::SeqCst), 0);
    removed.dispose();
    assert_eq!(count.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn composite_prunes_disposed_members() {
    let composite = CompositeDisposable::new();
    let flag = Arc::new(BooleanDisposable::new());
    composite.add(flag.clone());
    flag.dispose();
    composite.add(BooleanDisposable::new());
    assert_eq!(composite.len(), 1);
  }

  #[test]
  fn member_may_remove_itself_during_dispose() {
    let composite = CompositeDisposable::new();
    let key_slot: MutArc<Option<DisposeKey>> = MutArc::own(None);
    let c_composite = composite.clone();
    let c_slot = key_slot.clone();
    let key = composite.add(ActionDisposable::new(move || {
      if let Some(key) = *c_slot.rc_deref_mut() {
        c_composite.remove(key);
      }
    }));
    *key_slot.rc_deref_mut() = key;
    composite.dispose();
    assert!(composite.is_disposed());
  }

  #[test]
  fn guard_disposes_on_drop() {
    let (count, d) = counting();
    {
      let _guard = Subscription::new(Arc::new(d)).dispose_when_dropped();
    }
    assert_eq!(count.load(Ordering::SeqCst), 1);
  }
}
