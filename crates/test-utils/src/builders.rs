#![allow(dead_code)]

use std::collections::BTreeMap;

use steprun::config::{ConfigFile, RawConfigFile, RetrySection, StepConfig};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                retry: RetrySection::default(),
                step: Vec::new(),
            },
        }
    }

    pub fn with_step(mut self, step: StepConfig) -> Self {
        self.config.step.push(step);
        self
    }

    pub fn max_attempts(mut self, n: i64) -> Self {
        self.config.retry.max_attempts = Some(n);
        self
    }

    pub fn base_delay_ms(mut self, ms: i64) -> Self {
        self.config.retry.base_delay_ms = Some(ms);
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `StepConfig`.
pub struct StepConfigBuilder {
    step: StepConfig,
}

impl StepConfigBuilder {
    pub fn new(name: &str, cmd: &str) -> Self {
        Self {
            step: StepConfig {
                name: name.to_string(),
                cmd: cmd.to_string(),
                after: vec![],
                fix: None,
                continue_on_error: false,
                workdir: None,
                env: BTreeMap::new(),
                retry: None,
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.step.after.push(dep.to_string());
        self
    }

    pub fn fix(mut self, cmd: &str) -> Self {
        self.step.fix = Some(cmd.to_string());
        self
    }

    pub fn continue_on_error(mut self, val: bool) -> Self {
        self.step.continue_on_error = val;
        self
    }

    pub fn workdir(mut self, dir: &str) -> Self {
        self.step.workdir = Some(dir.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.step.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn max_attempts(mut self, n: i64) -> Self {
        self.step.retry.get_or_insert_with(RetrySection::default).max_attempts = Some(n);
        self
    }

    pub fn base_delay_ms(mut self, ms: i64) -> Self {
        self.step.retry.get_or_insert_with(RetrySection::default).base_delay_ms = Some(ms);
        self
    }

    pub fn attempt_timeout_ms(mut self, ms: i64) -> Self {
        self.step
            .retry
            .get_or_insert_with(RetrySection::default)
            .attempt_timeout_ms = Some(ms);
        self
    }

    pub fn build(self) -> StepConfig {
        self.step
    }
}
