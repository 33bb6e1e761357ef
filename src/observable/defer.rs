use super::Observable;
use crate::subscriber::Subscriber;

/// Creates an observable that calls `factory` on every subscription and
/// subscribes to the observable it returns.
///
/// ```rust
/// use rxcore::prelude::*;
///
/// observable::defer(|| {
///   println!("Hi!");
///   observable::of("Hello!")
/// })
/// .subscribe(move |v| println!("{v}"));
/// // Prints: Hi!\nHello!\n
/// ```
pub fn defer<T, E, F>(factory: F) -> Observable<T, E>
where
  F: Fn() -> Observable<T, E> + Send + Sync + 'static,
  T: 'static,
  E: 'static,
{
  Observable::create(move |subscriber: Subscriber<T, E>| {
    factory().subscribe_with(subscriber);
  })
}
