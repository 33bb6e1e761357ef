use std::convert::Infallible;

use super::{
  impl_subject_surface,
  subject_core::{Bounded, SubjectCore},
};

/// A subject that remembers its `capacity` most recent values and replays
/// them to every new subscriber, before live notifications or, once the
/// subject has terminated, before the terminal notification.
pub struct ReplaySubject<T, E = Infallible> {
  core: SubjectCore<T, E, Bounded<T>>,
}

impl<T, E> ReplaySubject<T, E>
where
  T: Clone + Send + 'static,
  E: Clone + Send + 'static,
{
  pub fn new(capacity: usize) -> Self { Self { core: SubjectCore::new(Bounded::new(capacity)) } }
}

impl_subject_surface!(ReplaySubject);
