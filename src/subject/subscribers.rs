use std::collections::BTreeMap;

use crate::subscriber::Subscriber;

/// The observers registered with one subject, keyed by registration id.
///
/// Ids only grow, so iterating the map visits observers in registration
/// order, and removal by id is logarithmic.
pub(crate) struct Subscribers<T, E> {
  inner: BTreeMap<usize, Subscriber<T, E>>,
  next_id: usize,
}

impl<T, E> Default for Subscribers<T, E> {
  fn default() -> Self { Self { inner: BTreeMap::new(), next_id: 0 } }
}

impl<T, E> Subscribers<T, E> {
  /// Reserves the id of a subscriber whose registration may be deferred.
  pub(crate) fn reserve_id(&mut self) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    id
  }

  pub(crate) fn insert(&mut self, id: usize, subscriber: Subscriber<T, E>) {
    self.inner.insert(id, subscriber);
  }

  pub(crate) fn remove(&mut self, id: usize) -> Option<Subscriber<T, E>> { self.inner.remove(&id) }

  pub(crate) fn len(&self) -> usize { self.inner.len() }

  /// The current observers, in registration order.
  pub(crate) fn snapshot(&self) -> Vec<Subscriber<T, E>> { self.inner.values().cloned().collect() }

  /// Removes and returns every observer, in registration order.
  pub(crate) fn drain(&mut self) -> Vec<Subscriber<T, E>> {
    std::mem::take(&mut self.inner).into_values().collect()
  }
}

/// Sends `value` to every subscriber, cloning for all but the last, which
/// receives the moved value.
pub(crate) fn broadcast_value<T: Clone, E>(subscribers: &[Subscriber<T, E>], value: T) {
  let mut iter = subscribers.iter().peekable();
  while let Some(subscriber) = iter.next() {
    if iter.peek().is_some() {
      subscriber.next(value.clone());
    } else {
      subscriber.next(value);
      break;
    }
  }
}

pub(crate) fn broadcast_error<T, E: Clone>(subscribers: Vec<Subscriber<T, E>>, err: E) {
  let mut iter = subscribers.into_iter().peekable();
  while let Some(subscriber) = iter.next() {
    if iter.peek().is_some() {
      subscriber.error(err.clone());
    } else {
      subscriber.error(err);
      break;
    }
  }
}

pub(crate) fn broadcast_complete<T, E>(subscribers: Vec<Subscriber<T, E>>) {
  for subscriber in subscribers {
    subscriber.complete();
  }
}
