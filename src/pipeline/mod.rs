// src/pipeline/mod.rs

//! Command pipelines built on the retry executor.
//!
//! - [`plan`] orders steps by their `after` dependencies.
//! - [`command`] runs a shell command as a [`crate::retry::Step`].
//! - [`runner`] executes a plan step by step.
//! - [`report`] holds per-step results and writes them to disk.

pub mod command;
pub mod plan;
pub mod report;
pub mod runner;

pub use command::{CommandError, CommandStep};
pub use plan::ExecutionPlan;
pub use report::{PipelineReport, StepReport, StepStatus};
pub use runner::PipelineRunner;
