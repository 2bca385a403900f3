// src/pipeline/report.rs

//! Pipeline results and their on-disk form.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use crate::errors::Result;

/// Final status of one planned step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Succeeded { attempts: u32 },
    /// Every attempt failed; `error` is the last attempt's message.
    Failed { attempts: u32, error: String },
    Cancelled { attempts: u32 },
    Skipped { reason: String },
}

impl StepStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, StepStatus::Succeeded { .. })
    }

    fn kind(&self) -> &'static str {
        match self {
            StepStatus::Succeeded { .. } => "succeeded",
            StepStatus::Failed { .. } => "failed",
            StepStatus::Cancelled { .. } => "cancelled",
            StepStatus::Skipped { .. } => "skipped",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Succeeded { attempts } => write!(f, "ok ({attempts} attempt(s))"),
            StepStatus::Failed { attempts, error } => {
                write!(f, "FAILED after {attempts} attempt(s): {error}")
            }
            StepStatus::Cancelled { attempts } => {
                write!(f, "cancelled after {attempts} attempt(s)")
            }
            StepStatus::Skipped { reason } => write!(f, "skipped ({reason})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub name: String,
    pub status: StepStatus,
    /// Wall time spent in the step, backoff included. Zero for skipped steps.
    pub duration: Duration,
}

/// Per-step results, in plan order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub steps: Vec<StepReport>,
}

impl PipelineReport {
    /// True if every planned step succeeded.
    pub fn is_success(&self) -> bool {
        self.steps.iter().all(|s| s.status.is_success())
    }

    pub fn status_of(&self, name: &str) -> Option<&StepStatus> {
        self.step(name).map(|s| &s.status)
    }

    pub fn step(&self, name: &str) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Names of steps that did not succeed and were not merely skipped.
    pub fn failed_steps(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|s| {
                matches!(
                    s.status,
                    StepStatus::Failed { .. } | StepStatus::Cancelled { .. }
                )
            })
            .map(|s| s.name.as_str())
            .collect()
    }

    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(|s| s.duration).sum()
    }

    /// Render as TOML:
    ///
    /// ```toml
    /// success = false
    /// duration_ms = 5210
    ///
    /// [[step]]
    /// name = "build"
    /// status = "failed"
    /// attempts = 3
    /// error = "command exited with code 1: boom"
    /// duration_ms = 5204
    /// ```
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(&SavedReport::from(self))?)
    }

    /// Write [`PipelineReport::to_toml`] to `path`.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }
}

#[derive(Serialize)]
struct SavedReport<'a> {
    success: bool,
    duration_ms: i64,
    step: Vec<SavedStep<'a>>,
}

#[derive(Serialize)]
struct SavedStep<'a> {
    name: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
    duration_ms: i64,
}

impl<'a> From<&'a PipelineReport> for SavedReport<'a> {
    fn from(report: &'a PipelineReport) -> Self {
        Self {
            success: report.is_success(),
            duration_ms: millis(report.total_duration()),
            step: report.steps.iter().map(SavedStep::from).collect(),
        }
    }
}

impl<'a> From<&'a StepReport> for SavedStep<'a> {
    fn from(step: &'a StepReport) -> Self {
        let (attempts, error, reason) = match &step.status {
            StepStatus::Succeeded { attempts } | StepStatus::Cancelled { attempts } => {
                (Some(*attempts), None, None)
            }
            StepStatus::Failed { attempts, error } => (Some(*attempts), Some(error.as_str()), None),
            StepStatus::Skipped { reason } => (None, None, Some(reason.as_str())),
        };
        Self {
            name: &step.name,
            status: step.status.kind(),
            attempts,
            error,
            reason,
            duration_ms: millis(step.duration),
        }
    }
}

fn millis(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}
