// src/retry/notify.rs

//! Notification sinks for attempt outcomes.
//!
//! A [`Notifier`] is write-only and fire-and-forget: the executor never reads
//! anything back and never waits on it. Sinks that can fail (a full channel,
//! a dropped receiver) swallow the failure themselves.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Outcome level attached to a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Success,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Success => f.write_str("success"),
            Level::Error => f.write_str("error"),
        }
    }
}

/// An owned notification, as delivered by [`ChannelNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

/// Sink receiving one message per attempt plus one summary on exhaustion.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: Level, message: &str);
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, level: Level, message: &str) {
        (**self).notify(level, message)
    }
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, level: Level, message: &str) {
        (**self).notify(level, message)
    }
}

/// Deliver to both sinks, first `A` then `B`.
impl<A: Notifier, B: Notifier> Notifier for (A, B) {
    fn notify(&self, level: Level, message: &str) {
        self.0.notify(level, message);
        self.1.notify(level, message);
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _level: Level, _message: &str) {}
}

/// Writes notifications to the `tracing` subscriber.
///
/// Successes are logged at INFO, failures at ERROR.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, level: Level, message: &str) {
        match level {
            Level::Success => info!(target: "steprun::status", %level, "{message}"),
            Level::Error => error!(target: "steprun::status", %level, "{message}"),
        }
    }
}

/// Forwards notifications over a bounded channel without ever blocking.
///
/// When the channel is full or the receiver is gone, the notification is
/// dropped and a debug line is logged. A consumer on the other end can
/// forward to an external status service at its own pace.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<Notification>,
}

impl ChannelNotifier {
    pub fn new(tx: mpsc::Sender<Notification>) -> Self {
        Self { tx }
    }

    /// Create a notifier together with the receiving end of its channel.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, level: Level, message: &str) {
        let notification = Notification {
            level,
            message: message.to_string(),
        };
        if let Err(e) = self.tx.try_send(notification) {
            debug!(error = %e, "dropping status notification");
        }
    }
}
