//! Lock-free 32-bit counter.
//!
//! `AtomicCounter` is the only primitive in the crate meant to be shared
//! across threads without a lock. Every operation is a single linearizable
//! step and returns the value observed *before* the update.

use std::sync::atomic::{AtomicI32, Ordering};

#[derive(Debug, Default)]
pub struct AtomicCounter(AtomicI32);

impl AtomicCounter {
  #[inline]
  pub const fn new(value: i32) -> Self { Self(AtomicI32::new(value)) }

  #[inline]
  pub fn load(&self) -> i32 { self.0.load(Ordering::SeqCst) }

  #[inline]
  pub fn store(&self, value: i32) { self.0.store(value, Ordering::SeqCst) }

  /// Adds `v` (wrapping) and returns the prior value.
  #[inline]
  pub fn add(&self, v: i32) -> i32 { self.0.fetch_add(v, Ordering::SeqCst) }

  /// Subtracts `v` (wrapping) and returns the prior value.
  #[inline]
  pub fn sub(&self, v: i32) -> i32 { self.0.fetch_sub(v, Ordering::SeqCst) }

  /// Bitwise-or with `v`, returns the prior value.
  ///
  /// Written as a CAS loop so the read-modify-write is observed as one step
  /// even on targets without a native fetch-or.
  pub fn fetch_or(&self, v: i32) -> i32 {
    let mut current = self.0.load(Ordering::SeqCst);
    loop {
      match self
        .0
        .compare_exchange_weak(current, current | v, Ordering::SeqCst, Ordering::SeqCst)
      {
        Ok(prior) => return prior,
        Err(actual) => current = actual,
      }
    }
  }
}
