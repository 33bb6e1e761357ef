use super::Observable;
use crate::subscriber::Subscriber;

/// Creates an observable that completes immediately without emitting.
pub fn empty<T, E>() -> Observable<T, E> {
  Observable::create(|subscriber: Subscriber<T, E>| subscriber.complete())
}

/// Creates an observable that never emits and never terminates.
pub fn never<T, E>() -> Observable<T, E> { Observable::create(|_: Subscriber<T, E>| {}) }

/// Creates an observable that emits no items, just terminates with `err`.
pub fn throw<T, E>(err: E) -> Observable<T, E>
where
  E: Clone + Send + Sync + 'static,
{
  Observable::create(move |subscriber: Subscriber<T, E>| subscriber.error(err.clone()))
}
