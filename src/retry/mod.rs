// src/retry/mod.rs

//! Retrying step executor.
//!
//! - [`step`] defines the unit of work and a closure adapter.
//! - [`policy`] holds attempt bounds and backoff timing.
//! - [`notify`] provides the notification sinks.
//! - [`state`] is the pure attempt state machine.
//! - [`executor`] runs the loop on top of `tokio::time`.
//! - [`cancel`] lets a caller abandon a run from outside.

pub mod cancel;
pub mod error;
pub mod executor;
pub mod notify;
pub mod policy;
pub mod state;
pub mod step;

pub use cancel::{CancelHandle, CancelSignal, cancel_pair};
pub use error::{AttemptError, RetryError};
pub use executor::{RetryExecutor, Succeeded, run_with_retry};
pub use notify::{ChannelNotifier, Level, NoopNotifier, Notification, Notifier, TracingNotifier};
pub use policy::RetryPolicy;
pub use state::{AttemptOutcome, AttemptRecord, RetryState};
pub use step::{FnStep, Step, step_fn};
