use smallvec::SmallVec;

/// A container of items addressed by a unique, monotonically increasing id.
///
/// Backs `CompositeDisposable`. Ids are never reused, so a stale id held by
/// a caller can never remove an item that was added later.
///
/// - **SmallVec Optimization**: `SmallVec<[_; 2]>` avoids a heap allocation for
///   the common case of 0-2 members (a source subscription plus one timer).
/// - Items are kept in insertion order.
///
/// ```rust
/// use rxcore::subscription::DynamicSubscriptions;
///
/// let mut subs: DynamicSubscriptions<&str> = DynamicSubscriptions::default();
/// let a = subs.add("a");
/// let _b = subs.add("b");
/// assert_eq!(subs.remove(a), Some("a"));
/// assert_eq!(subs.remove(a), None);
/// assert_eq!(subs.len(), 1);
/// ```
pub struct DynamicSubscriptions<U> {
  next_id: usize,
  items: SmallVec<[(usize, U); 2]>,
}

impl<U> Default for DynamicSubscriptions<U> {
  fn default() -> Self { Self { next_id: 0, items: SmallVec::new() } }
}

impl<U> DynamicSubscriptions<U> {
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// Add an item and return its unique ID.
  #[inline]
  pub fn add(&mut self, item: U) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.items.push((id, item));
    id
  }

  pub fn remove(&mut self, id: usize) -> Option<U> {
    self
      .items
      .iter()
      .position(|(i, _)| *i == id)
      .map(|pos| self.items.remove(pos).1)
  }

  #[inline]
  pub fn contains(&self, id: usize) -> bool { self.items.iter().any(|(i, _)| *i == id) }

  #[inline]
  pub fn len(&self) -> usize { self.items.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.items.is_empty() }

  /// Keep only the items for which `f` returns true.
  #[inline]
  pub fn retain(&mut self, mut f: impl FnMut(&U) -> bool) { self.items.retain(|(_, item)| f(item)); }

  /// Remove every item, returning them in insertion order.
  #[inline]
  pub fn take_all(&mut self) -> Vec<U> { self.items.drain(..).map(|(_, item)| item).collect() }

  #[inline]
  pub fn iter(&self) -> impl Iterator<Item = &U> { self.items.iter().map(|(_, item)| item) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ids_are_not_reused() {
    let mut subs = DynamicSubscriptions::new();
    let a = subs.add(1);
    subs.remove(a);
    let b = subs.add(2);
    assert_ne!(a, b);
    assert!(!subs.contains(a));
    assert!(subs.contains(b));
  }

  #[test]
  fn take_all_keeps_order() {
    let mut subs = DynamicSubscriptions::new();
    for i in 0..5 {
      subs.add(i);
    }
    subs.retain(|v| v % 2 == 0);
    assert_eq!(subs.take_all(), vec![0, 2, 4]);
    assert!(subs.is_empty());
  }
}
