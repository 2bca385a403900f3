// src/retry/step.rs

//! The unit of retryable work.

use std::fmt;
use std::future::Future;

/// A named, retryable unit of asynchronous work.
///
/// The executor calls [`Step::run`] once per attempt and never resumes a
/// previous attempt, so every call starts from scratch. A step with side
/// effects that must not be duplicated (creating a remote resource, sending
/// a message) has to make them idempotent itself, e.g. by reusing a request
/// id it owns across calls.
pub trait Step: Send {
    /// Failure reported by one attempt. Only its message reaches notifiers.
    type Error: fmt::Display + Send;

    /// Name used in notifications and logs.
    fn name(&self) -> &str;

    /// Run one attempt.
    fn run(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// A [`Step`] backed by a closure returning a future.
///
/// Build one with [`step_fn`].
pub struct FnStep<F> {
    name: String,
    action: F,
}

impl<F> fmt::Debug for FnStep<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStep")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Wrap a closure as a named step.
///
/// ```rust,ignore
/// let mut step = step_fn("deploy", || async { deploy().await });
/// run_with_retry(&mut step, &policy, &TracingNotifier).await?;
/// ```
pub fn step_fn<F, Fut, E>(name: impl Into<String>, action: F) -> FnStep<F>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<(), E>> + Send,
    E: fmt::Display + Send,
{
    FnStep {
        name: name.into(),
        action,
    }
}

impl<F, Fut, E> Step for FnStep<F>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<(), E>> + Send,
    E: fmt::Display + Send,
{
    type Error = E;

    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self) -> impl Future<Output = Result<(), E>> + Send {
        (self.action)()
    }
}
