// src/retry/state.rs

//! Pure state machine for the retry loop.
//!
//! The async executor feeds one [`AttemptRecord`] per attempt into
//! [`RetryState::advance`] and acts on the resulting state; no timing or IO
//! happens here.

/// Outcome of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Failure,
}

/// One finished attempt, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub outcome: AttemptOutcome,
}

/// Where the retry loop stands.
///
/// `Running { failures }` counts failed attempts so far, so the next attempt
/// is number `failures + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Running { failures: u32 },
    Succeeded { attempts: u32 },
    Failed { attempts: u32 },
}

impl RetryState {
    pub fn initial() -> Self {
        RetryState::Running { failures: 0 }
    }

    /// 1-based number of the attempt about to run, if still running.
    pub fn next_attempt(&self) -> Option<u32> {
        match self {
            RetryState::Running { failures } => Some(failures + 1),
            _ => None,
        }
    }

    /// Attempts made so far.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryState::Running { failures } => *failures,
            RetryState::Succeeded { attempts } | RetryState::Failed { attempts } => *attempts,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RetryState::Running { .. })
    }

    /// Apply the outcome of the attempt that just finished.
    ///
    /// Terminal states absorb any further records.
    pub fn advance(self, record: AttemptRecord, max_attempts: u32) -> Self {
        match self {
            RetryState::Running { failures } => match record.outcome {
                AttemptOutcome::Success => RetryState::Succeeded {
                    attempts: failures + 1,
                },
                AttemptOutcome::Failure => {
                    let failures = failures + 1;
                    if failures < max_attempts {
                        RetryState::Running { failures }
                    } else {
                        RetryState::Failed { attempts: failures }
                    }
                }
            },
            terminal => terminal,
        }
    }
}

impl Default for RetryState {
    fn default() -> Self {
        Self::initial()
    }
}
