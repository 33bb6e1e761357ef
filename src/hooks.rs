//! Replaceable diagnostics hooks.
//!
//! An [`ErrorHooks`] value bundles the handler invoked for errors that reach
//! a subscriber without an error callback, and the function used to capture a
//! callstack for that report. Hooks are plain configuration: they are only
//! consulted for diagnostics and never change how a sequence behaves.
//!
//! The process-wide instance is [`ErrorHooks::global`]. Subscribers capture a
//! hooks handle when they are created, so tests can inject an isolated
//! instance through `Observable::subscribe_with_hooks` instead of mutating the
//! global one.

use std::{
  fmt::Debug,
  sync::{Arc, PoisonError, RwLock},
};

use once_cell::sync::Lazy;

pub type ErrorHandler = Arc<dyn Fn(&[String], &dyn Debug) + Send + Sync>;
pub type CallstackCapture = Arc<dyn Fn() -> Vec<String> + Send + Sync>;

static GLOBAL_HOOKS: Lazy<ErrorHooks> = Lazy::new(ErrorHooks::default);

struct HooksInner {
  error_handler: ErrorHandler,
  callstack: Option<CallstackCapture>,
}

impl Default for HooksInner {
  fn default() -> Self { Self { error_handler: default_error_handler(), callstack: None } }
}

#[derive(Clone, Default)]
pub struct ErrorHooks(Arc<RwLock<HooksInner>>);

fn default_error_handler() -> ErrorHandler {
  Arc::new(|callstack: &[String], err: &dyn Debug| {
    tracing::error!(error = ?err, callstack = ?callstack, "unhandled error in observable sequence");
  })
}

impl ErrorHooks {
  /// The process-wide hooks used by subscribers that were not given any.
  pub fn global() -> &'static ErrorHooks { &GLOBAL_HOOKS }

  pub fn set_error_handler<F>(&self, handler: F)
  where
    F: Fn(&[String], &dyn Debug) + Send + Sync + 'static,
  {
    self.write().error_handler = Arc::new(handler);
  }

  pub fn error_handler(&self) -> ErrorHandler { self.read().error_handler.clone() }

  pub fn set_callstack_capture<F>(&self, capture: F)
  where
    F: Fn() -> Vec<String> + Send + Sync + 'static,
  {
    self.write().callstack = Some(Arc::new(capture));
  }

  pub fn callstack_capture(&self) -> Option<CallstackCapture> { self.read().callstack.clone() }

  /// Restores the logging handler and removes the callstack capture.
  pub fn reset(&self) { *self.write() = HooksInner::default(); }

  pub fn capture_callstack(&self) -> Vec<String> {
    // Clone out of the lock so a capture function may itself touch the hooks.
    let capture = self.callstack_capture();
    capture.map(|f| f()).unwrap_or_default()
  }

  /// Routes an unhandled error to the configured handler.
  pub fn report(&self, err: &dyn Debug) {
    let callstack = self.capture_callstack();
    let handler = self.error_handler();
    handler(&callstack, err);
  }

  fn read(&self) -> std::sync::RwLockReadGuard<'_, HooksInner> {
    self.0.read().unwrap_or_else(PoisonError::into_inner)
  }

  fn write(&self) -> std::sync::RwLockWriteGuard<'_, HooksInner> {
    self.0.write().unwrap_or_else(PoisonError::into_inner)
  }
}

impl Debug for ErrorHooks {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ErrorHooks")
      .field("has_callstack_capture", &self.read().callstack.is_some())
      .finish()
  }
}

/// A capture function built on `std::backtrace`, one frame description per
/// line. Install it with [`ErrorHooks::set_callstack_capture`].
pub fn backtrace_callstack() -> Vec<String> {
  std::backtrace::Backtrace::force_capture()
    .to_string()
    .lines()
    .map(|l| l.trim().to_owned())
    .collect()
}
