//! Operators, as methods on [`Observable`](crate::observable::Observable).
//!
//! Most are built on `Observable::lift`: each subscription wraps the
//! downstream [`Subscriber`](crate::subscriber::Subscriber) in an operator
//! observer that is itself subscribed to the source, and disposing the
//! downstream disposes that upstream subscription.

mod buffer_time;
mod delay_subscription;
mod filter;
mod finalize;
mod map;
mod materialize;
mod subscribe_on;
mod take;
mod window;
