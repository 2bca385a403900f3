// src/retry/error.rs

use std::time::Duration;

use thiserror::Error;

/// Why a single attempt failed.
#[derive(Error, Debug)]
pub enum AttemptError<E> {
    /// The step itself reported a failure.
    #[error("{0}")]
    Step(E),

    /// The attempt ran past the policy's `attempt_timeout` and was dropped.
    #[error("attempt timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),
}

impl<E> AttemptError<E> {
    /// The step's own error, if this was not a timeout.
    pub fn step_error(&self) -> Option<&E> {
        match self {
            AttemptError::Step(e) => Some(e),
            AttemptError::TimedOut(_) => None,
        }
    }

    pub fn into_step_error(self) -> Option<E> {
        match self {
            AttemptError::Step(e) => Some(e),
            AttemptError::TimedOut(_) => None,
        }
    }
}

/// Terminal failure of the retry loop.
#[derive(Error, Debug)]
pub enum RetryError<E> {
    /// The policy was unusable; the step was never invoked.
    #[error("invalid retry policy: {0}")]
    InvalidPolicy(String),

    /// Every permitted attempt failed. Carries the last attempt's error only;
    /// earlier failures were reported through the notifier.
    #[error("step '{step}' failed after {attempts} attempts: {last}")]
    Exhausted {
        step: String,
        attempts: u32,
        last: AttemptError<E>,
    },

    /// Cancellation was requested before the step could succeed.
    #[error("step '{step}' cancelled after {attempts} attempts")]
    Cancelled { step: String, attempts: u32 },
}

impl<E> RetryError<E> {
    /// Error of the final attempt, when the loop ran out of attempts.
    pub fn last_error(&self) -> Option<&AttemptError<E>> {
        match self {
            RetryError::Exhausted { last, .. } => Some(last),
            _ => None,
        }
    }

    pub fn into_last_error(self) -> Option<AttemptError<E>> {
        match self {
            RetryError::Exhausted { last, .. } => Some(last),
            _ => None,
        }
    }

    /// Number of attempts actually started.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::InvalidPolicy(_) => 0,
            RetryError::Exhausted { attempts, .. } | RetryError::Cancelled { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn is_config_error(&self) -> bool {
        matches!(self, RetryError::InvalidPolicy(_))
    }
}
