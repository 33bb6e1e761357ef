use std::convert::Infallible;

use super::Observable;
use crate::subscriber::Subscriber;

/// Creates an observable that emits every item of `iter` and completes.
///
/// Emission is synchronous and stops early once the subscriber is closed,
/// e.g. by a downstream `take`.
///
/// ```
/// use rxcore::prelude::*;
///
/// observable::from_iter(vec![0, 1, 2, 3]).subscribe(|v| println!("{v},"));
/// ```
pub fn from_iter<I>(iter: I) -> Observable<I::Item, Infallible>
where
  I: IntoIterator + Clone + Send + Sync + 'static,
{
  Observable::create(move |subscriber: Subscriber<I::Item, Infallible>| {
    for v in iter.clone() {
      if subscriber.is_closed() {
        return;
      }
      subscriber.next(v);
    }
    subscriber.complete();
  })
}

/// Creates an observable that emits `value` once and completes.
pub fn of<T>(value: T) -> Observable<T, Infallible>
where
  T: Clone + Send + Sync + 'static,
{
  Observable::create(move |subscriber: Subscriber<T, Infallible>| {
    subscriber.next(value.clone());
    subscriber.complete();
  })
}
