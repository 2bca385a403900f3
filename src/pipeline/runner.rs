// src/pipeline/runner.rs

//! Sequential pipeline runner.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::ConfigFile;
use crate::pipeline::command::CommandStep;
use crate::pipeline::plan::ExecutionPlan;
use crate::pipeline::report::{PipelineReport, StepReport, StepStatus};
use crate::retry::{CancelSignal, Notifier, RetryError, RetryExecutor};

/// Runs the steps of an [`ExecutionPlan`] one after another, each under its
/// own retry policy.
///
/// - A step runs only if all of its `after` dependencies succeeded.
/// - When a step is exhausted, the remaining steps are skipped unless it
///   has `continue_on_error = true`, in which case only its dependents are.
/// - Cancellation stops the running step and skips everything after it.
#[derive(Debug)]
pub struct PipelineRunner<N> {
    config: ConfigFile,
    plan: ExecutionPlan,
    root_dir: PathBuf,
    notifier: N,
    cancel: Option<CancelSignal>,
}

impl<N: Notifier> PipelineRunner<N> {
    pub fn new(
        config: ConfigFile,
        plan: ExecutionPlan,
        root_dir: impl Into<PathBuf>,
        notifier: N,
    ) -> Self {
        Self {
            config,
            plan,
            root_dir: root_dir.into(),
            notifier,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, signal: CancelSignal) -> Self {
        self.cancel = Some(signal);
        self
    }

    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    pub async fn run(&self) -> PipelineReport {
        info!(steps = ?self.plan.steps(), "pipeline started");

        let mut report = PipelineReport::default();
        let mut succeeded: HashSet<&str> = HashSet::new();
        let mut halted: Option<String> = None;

        for name in self.plan.steps() {
            let started = Instant::now();
            let status = if let Some(reason) = &halted {
                StepStatus::Skipped {
                    reason: reason.clone(),
                }
            } else if let Some(dep) = self.unmet_dependency(name, &succeeded) {
                StepStatus::Skipped {
                    reason: format!("dependency '{dep}' did not succeed"),
                }
            } else {
                let status = self.run_step(name).await;
                match &status {
                    StepStatus::Succeeded { .. } => {
                        succeeded.insert(name.as_str());
                    }
                    StepStatus::Cancelled { .. } => {
                        halted = Some("pipeline cancelled".to_string());
                    }
                    StepStatus::Failed { .. } if !self.continues_on_error(name) => {
                        halted = Some(format!("pipeline halted after '{name}' failed"));
                    }
                    _ => {}
                }
                status
            };

            if let StepStatus::Skipped { reason } = &status {
                info!(step = %name, %reason, "skipping step");
            }

            let duration = match status {
                StepStatus::Skipped { .. } => Duration::ZERO,
                _ => started.elapsed(),
            };
            report.steps.push(StepReport {
                name: name.clone(),
                status,
                duration,
            });
        }

        info!(success = report.is_success(), "pipeline finished");
        report
    }

    fn unmet_dependency<'a>(&'a self, name: &str, succeeded: &HashSet<&str>) -> Option<&'a str> {
        self.config
            .step(name)?
            .after
            .iter()
            .find(|dep| !succeeded.contains(dep.as_str()))
            .map(String::as_str)
    }

    fn continues_on_error(&self, name: &str) -> bool {
        self.config
            .step(name)
            .is_some_and(|s| s.continue_on_error)
    }

    async fn run_step(&self, name: &str) -> StepStatus {
        let (Some(step_cfg), Some(policy)) =
            (self.config.step(name), self.config.policy_for(name))
        else {
            return StepStatus::Skipped {
                reason: "step missing from config".to_string(),
            };
        };

        let mut step = CommandStep::from_config(step_cfg, &self.root_dir);
        let mut executor = RetryExecutor::new(policy.clone(), &self.notifier);
        if let Some(cancel) = &self.cancel {
            executor = executor.with_cancel(cancel.clone());
        }

        info!(
            step = %name,
            max_attempts = executor.policy().max_attempts,
            base_delay_ms = executor.policy().base_delay.as_millis() as u64,
            "running step"
        );

        match executor.run(&mut step).await {
            Ok(done) => StepStatus::Succeeded {
                attempts: done.attempts,
            },
            Err(RetryError::Cancelled { attempts, .. }) => StepStatus::Cancelled { attempts },
            Err(err) => {
                warn!(step = %name, error = %err, "step gave up");
                let attempts = err.attempts();
                let summary = err.to_string();
                let error = err
                    .into_last_error()
                    .map(|last| last.to_string())
                    .unwrap_or(summary);
                StepStatus::Failed { attempts, error }
            }
        }
    }
}
