//! A sequence event reified as a value.

use crate::observer::Observer;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Notification<T, E> {
  Next(T),
  Error(E),
  Completed,
}

impl<T, E> Notification<T, E> {
  /// Replays this event into `observer`.
  pub fn accept<O: Observer<T, E>>(self, mut observer: O) -> Option<O> {
    match self {
      Notification::Next(v) => {
        observer.next(v);
        Some(observer)
      }
      Notification::Error(e) => {
        observer.error(e);
        None
      }
      Notification::Completed => {
        observer.complete();
        None
      }
    }
  }

  pub fn is_terminal(&self) -> bool { !matches!(self, Notification::Next(_)) }

  pub fn value(&self) -> Option<&T> {
    match self {
      Notification::Next(v) => Some(v),
      _ => None,
    }
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Notification<U, E> {
    match self {
      Notification::Next(v) => Notification::Next(f(v)),
      Notification::Error(e) => Notification::Error(e),
      Notification::Completed => Notification::Completed,
    }
  }
}
