use std::convert::Infallible;

use super::{
  impl_subject_surface,
  subject_core::{NoReplay, SubjectCore},
};

/// A subject without memory: subscribers see only the notifications pushed
/// after they subscribed. Subscribing after termination yields the terminal
/// notification alone.
pub struct PublishSubject<T, E = Infallible> {
  core: SubjectCore<T, E, NoReplay>,
}

impl<T, E> PublishSubject<T, E>
where
  T: Clone + Send + 'static,
  E: Clone + Send + 'static,
{
  pub fn new() -> Self { Self { core: SubjectCore::new(NoReplay) } }
}

impl<T, E> Default for PublishSubject<T, E>
where
  T: Clone + Send + 'static,
  E: Clone + Send + 'static,
{
  fn default() -> Self { Self::new() }
}

impl_subject_surface!(PublishSubject);
