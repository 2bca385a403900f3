use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use steprun::retry::Step;

/// A step that fails a fixed number of times before succeeding.
///
/// Failure messages are `"<message> #<attempt>"` unless `same_error` is set,
/// in which case every failure reports exactly `message`.
#[derive(Debug, Clone)]
pub struct ScriptedStep {
    name: String,
    failures_before_success: u32,
    message: String,
    same_error: bool,
    hang: Option<Duration>,
    calls: Arc<AtomicU32>,
}

impl ScriptedStep {
    /// Fails `failures` times, then succeeds.
    pub fn failing(name: &str, failures: u32) -> Self {
        Self {
            name: name.to_string(),
            failures_before_success: failures,
            message: "failure".to_string(),
            same_error: false,
            hang: None,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Never fails.
    pub fn succeeding(name: &str) -> Self {
        Self::failing(name, 0)
    }

    /// Never succeeds.
    pub fn always_failing(name: &str) -> Self {
        Self::failing(name, u32::MAX)
    }

    /// Use `message` verbatim for every failure.
    pub fn with_error(mut self, message: &str) -> Self {
        self.message = message.to_string();
        self.same_error = true;
        self
    }

    /// Sleep this long inside every attempt before resolving.
    pub fn hanging_for(mut self, duration: Duration) -> Self {
        self.hang = Some(duration);
        self
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Step for ScriptedStep {
    type Error = String;

    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self) -> impl Future<Output = Result<(), String>> + Send {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let fail = attempt <= self.failures_before_success;
        let message = if self.same_error {
            self.message.clone()
        } else {
            format!("{} #{}", self.message, attempt)
        };
        let hang = self.hang;

        async move {
            if let Some(d) = hang {
                tokio::time::sleep(d).await;
            }
            if fail { Err(message) } else { Ok(()) }
        }
    }
}
