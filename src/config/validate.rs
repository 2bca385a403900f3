// src/config/validate.rs

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile, RetrySection};
use crate::errors::{Result, SteprunError};
use crate::retry::RetryPolicy;

const DEFAULT_MAX_ATTEMPTS: i64 = 3;
const DEFAULT_BASE_DELAY_MS: i64 = 1000;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SteprunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let policies = resolve_policies(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.step, policies))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_steps(cfg)?;
    validate_step_names(cfg)?;
    validate_commands(cfg)?;
    validate_step_dependencies(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_steps(cfg: &RawConfigFile) -> Result<()> {
    if cfg.step.is_empty() {
        return Err(SteprunError::ConfigError(
            "config must contain at least one [[step]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_step_names(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for (idx, step) in cfg.step.iter().enumerate() {
        if step.name.trim().is_empty() {
            return Err(SteprunError::ConfigError(format!(
                "step #{} has an empty name",
                idx + 1
            )));
        }
        if !seen.insert(step.name.as_str()) {
            return Err(SteprunError::ConfigError(format!(
                "duplicate step name '{}'",
                step.name
            )));
        }
    }
    Ok(())
}

fn validate_commands(cfg: &RawConfigFile) -> Result<()> {
    for step in cfg.step.iter() {
        if step.cmd.trim().is_empty() {
            return Err(SteprunError::ConfigError(format!(
                "step '{}' has an empty `cmd`",
                step.name
            )));
        }
        if let Some(fix) = &step.fix {
            if fix.trim().is_empty() {
                return Err(SteprunError::ConfigError(format!(
                    "step '{}' has an empty `fix` command",
                    step.name
                )));
            }
        }
    }
    Ok(())
}

fn validate_step_dependencies(cfg: &RawConfigFile) -> Result<()> {
    let names: HashSet<&str> = cfg.step.iter().map(|s| s.name.as_str()).collect();
    for step in cfg.step.iter() {
        for dep in step.after.iter() {
            if dep == &step.name {
                return Err(SteprunError::ConfigError(format!(
                    "step '{}' cannot depend on itself in `after`",
                    step.name
                )));
            }
            if !names.contains(dep.as_str()) {
                return Err(SteprunError::ConfigError(format!(
                    "step '{}' has unknown dependency '{}' in `after`",
                    step.name, dep
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: dep -> step.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for step in cfg.step.iter() {
        graph.add_node(step.name.as_str());
    }
    for step in cfg.step.iter() {
        for dep in step.after.iter() {
            graph.add_edge(dep.as_str(), step.name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(SteprunError::DependencyCycle(format!(
            "cycle detected in step dependencies involving step '{}'",
            cycle.node_id()
        ))),
    }
}

fn resolve_policies(cfg: &RawConfigFile) -> Result<HashMap<String, RetryPolicy>> {
    let mut policies = HashMap::new();
    for step in cfg.step.iter() {
        let section = match &step.retry {
            Some(over) => cfg.retry.overlay(over),
            None => cfg.retry.clone(),
        };
        let policy = resolve_policy(&section).map_err(|msg| {
            SteprunError::ConfigError(format!("step '{}': {}", step.name, msg))
        })?;
        policies.insert(step.name.clone(), policy);
    }
    Ok(policies)
}

/// Turn a merged retry section into a policy, rejecting out-of-range values.
pub fn resolve_policy(section: &RetrySection) -> std::result::Result<RetryPolicy, String> {
    let max_attempts = section.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS);
    if max_attempts < 1 {
        return Err(format!("max_attempts must be >= 1 (got {max_attempts})"));
    }
    let max_attempts = u32::try_from(max_attempts)
        .map_err(|_| format!("max_attempts is too large (got {max_attempts})"))?;

    let base_delay = millis(
        "base_delay_ms",
        section.base_delay_ms.unwrap_or(DEFAULT_BASE_DELAY_MS),
    )?;
    let max_delay = section
        .max_delay_ms
        .map(|ms| millis("max_delay_ms", ms))
        .transpose()?;

    let attempt_timeout = match section.attempt_timeout_ms {
        Some(ms) if ms <= 0 => {
            return Err(format!("attempt_timeout_ms must be > 0 (got {ms})"));
        }
        Some(ms) => Some(millis("attempt_timeout_ms", ms)?),
        None => None,
    };

    Ok(RetryPolicy {
        max_attempts,
        base_delay,
        max_delay,
        attempt_timeout,
    })
}

fn millis(key: &str, ms: i64) -> std::result::Result<Duration, String> {
    u64::try_from(ms)
        .map(Duration::from_millis)
        .map_err(|_| format!("{key} must be >= 0 (got {ms})"))
}
