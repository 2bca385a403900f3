// src/retry/executor.rs

//! The retry loop.
//!
//! [`RetryExecutor`] is the async shell around [`RetryState`]: it runs
//! attempts, reports each outcome to the notifier, and sleeps between
//! failed attempts. Attempts are strictly sequential; the backoff sleep is
//! the only place the executor itself suspends.

use tokio::time;
use tracing::debug;

use super::cancel::CancelSignal;
use super::error::{AttemptError, RetryError};
use super::notify::{Level, Notifier};
use super::policy::RetryPolicy;
use super::state::{AttemptOutcome, AttemptRecord, RetryState};
use super::step::Step;

/// Successful completion of a retried step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Succeeded {
    /// Attempts made, including the successful one.
    pub attempts: u32,
}

/// Run `step` under `policy`, reporting every attempt to `notifier`.
///
/// Returns `Ok(())` as soon as one attempt succeeds. If all attempts fail,
/// the error of the last attempt is returned inside
/// [`RetryError::Exhausted`]. A policy with `max_attempts == 0` fails with
/// [`RetryError::InvalidPolicy`] without invoking the step.
pub async fn run_with_retry<S, N>(
    step: &mut S,
    policy: &RetryPolicy,
    notifier: &N,
) -> Result<(), RetryError<S::Error>>
where
    S: Step,
    N: Notifier + ?Sized,
{
    RetryExecutor::new(policy.clone(), notifier)
        .run(step)
        .await
        .map(|_| ())
}

/// Reusable retry loop with an optional cancellation signal.
#[derive(Debug)]
pub struct RetryExecutor<N> {
    policy: RetryPolicy,
    notifier: N,
    cancel: Option<CancelSignal>,
}

impl<N: Notifier> RetryExecutor<N> {
    pub fn new(policy: RetryPolicy, notifier: N) -> Self {
        Self {
            policy,
            notifier,
            cancel: None,
        }
    }

    /// Stop retrying once `signal` fires.
    ///
    /// Cancellation drops an in-flight attempt or interrupts the backoff
    /// sleep, emits one error notification and returns
    /// [`RetryError::Cancelled`].
    pub fn with_cancel(mut self, signal: CancelSignal) -> Self {
        self.cancel = Some(signal);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn run<S: Step>(&self, step: &mut S) -> Result<Succeeded, RetryError<S::Error>> {
        self.policy.validate().map_err(RetryError::InvalidPolicy)?;

        let name = step.name().to_string();
        let max_attempts = self.policy.max_attempts;
        let mut state = RetryState::initial();

        while let Some(attempt) = state.next_attempt() {
            if self.is_cancelled() {
                return Err(self.cancelled(&name, attempt - 1));
            }

            debug!(step = %name, attempt, max_attempts, "starting attempt");

            let Some(result) = self.attempt(step).await else {
                return Err(self.cancelled(&name, attempt));
            };

            match result {
                Ok(()) => {
                    self.notifier.notify(
                        Level::Success,
                        &format!("step '{name}' succeeded on attempt {attempt}"),
                    );
                    state = state.advance(
                        AttemptRecord {
                            attempt,
                            outcome: AttemptOutcome::Success,
                        },
                        max_attempts,
                    );
                }
                Err(err) => {
                    self.notifier.notify(
                        Level::Error,
                        &format!("step '{name}' failed on attempt {attempt}: {err}"),
                    );
                    state = state.advance(
                        AttemptRecord {
                            attempt,
                            outcome: AttemptOutcome::Failure,
                        },
                        max_attempts,
                    );

                    match state {
                        RetryState::Running { failures } => {
                            let delay = self.policy.delay_after(failures);
                            if !self.backoff(&name, attempt, delay).await {
                                return Err(self.cancelled(&name, attempt));
                            }
                        }
                        RetryState::Failed { attempts } => {
                            self.notifier.notify(
                                Level::Error,
                                &format!("step '{name}' failed after {attempts} attempts"),
                            );
                            return Err(RetryError::Exhausted {
                                step: name,
                                attempts,
                                last: err,
                            });
                        }
                        RetryState::Succeeded { .. } => {}
                    }
                }
            }
        }

        // Exhaustion and cancellation return from inside the loop.
        Ok(Succeeded {
            attempts: state.attempts(),
        })
    }

    /// Run one attempt, honouring the timeout. `None` means cancelled.
    async fn attempt<S: Step>(&self, step: &mut S) -> Option<Result<(), AttemptError<S::Error>>> {
        let timeout = self.policy.attempt_timeout;
        let attempt = async move {
            match timeout {
                Some(limit) => match time::timeout(limit, step.run()).await {
                    Ok(result) => result.map_err(AttemptError::Step),
                    Err(_elapsed) => Err(AttemptError::TimedOut(limit)),
                },
                None => step.run().await.map_err(AttemptError::Step),
            }
        };

        match &self.cancel {
            Some(cancel) => tokio::select! {
                result = attempt => Some(result),
                _ = cancel.cancelled() => None,
            },
            None => Some(attempt.await),
        }
    }

    /// Sleep before the next attempt. Returns `false` if cancelled meanwhile.
    async fn backoff(&self, name: &str, attempt: u32, delay: std::time::Duration) -> bool {
        if delay.is_zero() {
            return !self.is_cancelled();
        }

        debug!(
            step = %name,
            attempt,
            delay_ms = delay.as_millis() as u64,
            "backing off before next attempt"
        );

        match &self.cancel {
            Some(cancel) => tokio::select! {
                _ = time::sleep(delay) => true,
                _ = cancel.cancelled() => false,
            },
            None => {
                time::sleep(delay).await;
                true
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelSignal::is_cancelled)
    }

    fn cancelled<E>(&self, name: &str, attempts: u32) -> RetryError<E> {
        self.notifier.notify(
            Level::Error,
            &format!("step '{name}' cancelled after {attempts} attempts"),
        );
        RetryError::Cancelled {
            step: name.to_string(),
            attempts,
        }
    }
}
