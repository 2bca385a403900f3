// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `steprun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "steprun",
    version,
    about = "Run pipeline steps in order, retrying failures with exponential backoff.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the pipeline file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Steprun.toml")]
    pub config: String,

    /// Run only this step plus everything it depends on via `after`.
    #[arg(long, value_name = "NAME")]
    pub step: Option<String>,

    /// Override `[retry].max_attempts` for every step.
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u32>,

    /// Override `[retry].base_delay_ms` for every step.
    #[arg(long, value_name = "MS")]
    pub base_delay_ms: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `STEPRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Write the run report (TOML) to this path when the pipeline finishes.
    #[arg(long, value_name = "PATH")]
    pub report: Option<String>,

    /// Parse + validate, print the plan, but don't execute any commands.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
