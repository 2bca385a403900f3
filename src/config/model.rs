// src/config/model.rs

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde::Deserialize;

use crate::errors::{Result, SteprunError};
use crate::retry::RetryPolicy;

/// Pipeline file exactly as read from TOML, before validation.
///
/// ```toml
/// [retry]
/// max_attempts = 3
/// base_delay_ms = 1000
///
/// [[step]]
/// name = "build"
/// cmd = "npm run build"
///
/// [[step]]
/// name = "deploy"
/// cmd = "./deploy.sh"
/// after = ["build"]
/// retry = { max_attempts = 5 }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    /// Defaults from `[retry]`, applied to every step.
    #[serde(default)]
    pub retry: RetrySection,

    /// All `[[step]]` entries, in declaration order.
    #[serde(default)]
    pub step: Vec<StepConfig>,
}

/// `[retry]` table, also accepted inline as a per-step `retry = { ... }`.
///
/// Values are signed so that negative input is rejected with a clear
/// message during validation instead of a TOML type error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RetrySection {
    #[serde(default)]
    pub max_attempts: Option<i64>,

    #[serde(default)]
    pub base_delay_ms: Option<i64>,

    #[serde(default)]
    pub max_delay_ms: Option<i64>,

    #[serde(default)]
    pub attempt_timeout_ms: Option<i64>,
}

impl RetrySection {
    /// Keys set in `over` win; everything else comes from `self`.
    pub fn overlay(&self, over: &RetrySection) -> RetrySection {
        RetrySection {
            max_attempts: over.max_attempts.or(self.max_attempts),
            base_delay_ms: over.base_delay_ms.or(self.base_delay_ms),
            max_delay_ms: over.max_delay_ms.or(self.max_delay_ms),
            attempt_timeout_ms: over.attempt_timeout_ms.or(self.attempt_timeout_ms),
        }
    }
}

/// One `[[step]]` entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StepConfig {
    /// Unique step name.
    pub name: String,

    /// Shell command run on every attempt.
    pub cmd: String,

    /// Steps that must succeed before this one runs.
    #[serde(default)]
    pub after: Vec<String>,

    /// Command run before each retry (not before the first attempt).
    #[serde(default)]
    pub fix: Option<String>,

    /// If true, a failure here only skips this step's dependents.
    #[serde(default)]
    pub continue_on_error: bool,

    /// Working directory, relative to the pipeline file's directory.
    #[serde(default)]
    pub workdir: Option<String>,

    /// Extra environment variables for `cmd` and `fix`.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Per-step overrides of `[retry]`.
    #[serde(default)]
    pub retry: Option<RetrySection>,
}

/// Validated pipeline file.
///
/// Built from a [`RawConfigFile`] through `TryFrom`, which guarantees step
/// names are unique, dependencies exist and are acyclic, and every step has
/// a usable [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    steps: Vec<StepConfig>,
    policies: HashMap<String, RetryPolicy>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        steps: Vec<StepConfig>,
        policies: HashMap<String, RetryPolicy>,
    ) -> Self {
        Self { steps, policies }
    }

    /// Steps in declaration order.
    pub fn steps(&self) -> &[StepConfig] {
        &self.steps
    }

    pub fn step(&self, name: &str) -> Option<&StepConfig> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Resolved retry policy of a step.
    pub fn policy_for(&self, name: &str) -> Option<&RetryPolicy> {
        self.policies.get(name)
    }

    /// Apply CLI overrides to every step's policy.
    pub fn apply_overrides(
        &mut self,
        max_attempts: Option<u32>,
        base_delay: Option<Duration>,
    ) -> Result<()> {
        if max_attempts == Some(0) {
            return Err(SteprunError::ConfigError(
                "--max-attempts must be >= 1 (got 0)".to_string(),
            ));
        }

        for policy in self.policies.values_mut() {
            if let Some(n) = max_attempts {
                policy.max_attempts = n;
            }
            if let Some(delay) = base_delay {
                policy.base_delay = delay;
            }
        }
        Ok(())
    }
}
