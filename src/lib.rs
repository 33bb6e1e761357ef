//! # rxcore: a reactive-stream execution engine
//!
//! The subscription and disposal contract, schedulers spanning real time and
//! a deterministic virtual clock, multicast subjects, and a handful of
//! operators that compose time and threads.
//!
//! ## Quick Start
//!
//! ```rust
//! use rxcore::prelude::*;
//! use std::sync::{Arc, Mutex};
//!
//! let out = Arc::new(Mutex::new(Vec::new()));
//! let c_out = out.clone();
//! observable::from_iter(0..10)
//!   .filter(|v| v % 2 == 0)
//!   .map(|v| v * 2)
//!   .take(3)
//!   .subscribe(move |v| c_out.lock().unwrap().push(v));
//! assert_eq!(*out.lock().unwrap(), vec![0, 4, 8]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | Lazy producer, started once per subscription |
//! | [`Observer`] | Consumes `next`, `error` and `complete` events |
//! | [`Subscriber`] | Thread-safe observer guard owning the subscription's resources |
//! | [`Subscription`] | Handle that disposes an active subscription |
//! | [`Scheduler`] | Decides when and where work runs |
//! | [`TestScheduler`] | Virtual-time harness for scenario tests |
//!
//! ## Feature Flags
//!
//! - **`pool-scheduler`** (default): [`PoolScheduler`] over OS worker threads
//! - **`resource-tracking`**: live-resource counter in [`diagnostics`]
//!
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Subscriber`]: subscriber::Subscriber
//! [`Subscription`]: subscription::Subscription
//! [`Scheduler`]: scheduler::Scheduler
//! [`TestScheduler`]: testing::TestScheduler
//! [`PoolScheduler`]: scheduler::PoolScheduler

pub mod atomic;
pub mod diagnostics;
pub mod error;
pub mod hooks;
pub mod notification;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod rc;
pub mod scheduler;
pub mod subject;
pub mod subscriber;
pub mod subscription;
pub mod testing;

pub use crate::scheduler::{Duration, Instant};

// Keeps the README examples compiling.
#[cfg(doctest)]
mod readme_doctests {
  #![doc = include_str!("../README.md")]
}
