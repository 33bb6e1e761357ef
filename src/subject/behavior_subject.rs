use std::convert::Infallible;

use super::{
  impl_subject_surface,
  subject_core::{Latest, SubjectCore},
};

/// A subject holding a current value. Every new subscriber first receives the
/// latest value (initially `initial`), then live notifications. Once the
/// subject has terminated, new subscribers receive only the terminal
/// notification.
pub struct BehaviorSubject<T, E = Infallible> {
  core: SubjectCore<T, E, Latest<T>>,
}

impl<T, E> BehaviorSubject<T, E>
where
  T: Clone + Send + 'static,
  E: Clone + Send + 'static,
{
  pub fn new(initial: T) -> Self { Self { core: SubjectCore::new(Latest(initial)) } }

  /// The latest value pushed, or the initial one.
  pub fn value(&self) -> T { self.core.with_buffer(|latest| latest.0.clone()) }
}

impl_subject_surface!(BehaviorSubject);
