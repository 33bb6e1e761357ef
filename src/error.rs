//! Infrastructure errors.
//!
//! Errors flowing *through* a sequence are the user's own `Err` type and are
//! delivered with `Observer::error`. The types here cover failures of the
//! engine itself, such as being unable to start worker threads.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
  #[error("failed to start the worker pool `{name}`")]
  WorkerPool {
    name: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to start the timer thread `{name}`")]
  TimerThread {
    name: String,
    #[source]
    source: std::io::Error,
  },
}
