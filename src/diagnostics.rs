//! Resource-leak diagnostics.
//!
//! With the `resource-tracking` feature every tracked primitive (observables,
//! subscribers, disposables, schedulers) carries a [`Tracked`] token that
//! increments a process-wide counter when created and decrements it when
//! dropped. Without the feature the token is zero-sized and does nothing.
//! Reporting is left to the caller; the crate only keeps the count.

#[cfg(feature = "resource-tracking")]
use crate::atomic::AtomicCounter;

#[cfg(feature = "resource-tracking")]
static LIVE_RESOURCES: AtomicCounter = AtomicCounter::new(0);

/// Number of tracked primitives currently alive.
#[cfg(feature = "resource-tracking")]
pub fn resource_count() -> i32 { LIVE_RESOURCES.load() }

#[derive(Debug)]
pub struct Tracked(());

impl Tracked {
  #[inline]
  pub fn new() -> Self {
    #[cfg(feature = "resource-tracking")]
    LIVE_RESOURCES.add(1);
    Tracked(())
  }
}

impl Default for Tracked {
  #[inline]
  fn default() -> Self { Self::new() }
}

impl Clone for Tracked {
  #[inline]
  fn clone(&self) -> Self { Self::new() }
}

#[cfg(feature = "resource-tracking")]
impl Drop for Tracked {
  fn drop(&mut self) { LIVE_RESOURCES.sub(1); }
}
