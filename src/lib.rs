// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod pipeline;
pub mod retry;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::ConfigFile;
use crate::config::loader::load_and_validate;
use crate::pipeline::{ExecutionPlan, PipelineReport, PipelineRunner};
use crate::retry::{TracingNotifier, cancel_pair};

pub use crate::retry::{
    Level, Notifier, RetryError, RetryExecutor, RetryPolicy, Step, run_with_retry, step_fn,
};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - execution planning (`--step` narrows the plan)
/// - the pipeline runner with a tracing notifier
/// - Ctrl-C handling
/// - the optional `--report` file
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let mut cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading pipeline file '{}'", config_path.display()))?;

    cfg.apply_overrides(
        args.max_attempts,
        args.base_delay_ms.map(Duration::from_millis),
    )?;

    let plan = match &args.step {
        Some(name) => ExecutionPlan::for_target(&cfg, name)?,
        None => ExecutionPlan::from_config(&cfg)?,
    };

    if args.dry_run {
        print_dry_run(&cfg, &plan);
        return Ok(());
    }

    // Ctrl-C → cancel the running step and skip the rest.
    let (cancel, signal) = cancel_pair();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        info!("Ctrl-C received; cancelling pipeline");
        cancel.cancel();
    });

    let runner = PipelineRunner::new(cfg, plan, config_root_dir(&config_path), TracingNotifier)
        .with_cancel(signal);
    debug!(steps = runner.plan().len(), "starting pipeline run");
    let report = runner.run().await;

    print_summary(&report);

    if let Some(path) = &args.report {
        report
            .write_to(Path::new(path))
            .with_context(|| format!("writing run report to '{path}'"))?;
        info!(path = %path, "run report written");
    }

    if !report.is_success() {
        bail!("pipeline failed: {}", report.failed_steps().join(", "));
    }
    Ok(())
}

/// Directory that relative `workdir`s are resolved against.
///
/// A bare filename like "Steprun.toml" has an empty parent, in which case
/// the current working directory is used.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn print_dry_run(cfg: &ConfigFile, plan: &ExecutionPlan) {
    println!("steprun dry-run");
    println!();

    println!("plan ({} steps):", plan.len());
    for (idx, name) in plan.steps().iter().enumerate() {
        println!("  {}. {name}", idx + 1);
        let Some(step) = cfg.step(name) else {
            continue;
        };
        println!("      cmd: {}", step.cmd);
        if !step.after.is_empty() {
            println!("      after: {:?}", step.after);
        }
        if let Some(ref fix) = step.fix {
            println!("      fix: {fix}");
        }
        if step.continue_on_error {
            println!("      continue_on_error: true");
        }
        if let Some(ref dir) = step.workdir {
            println!("      workdir: {dir}");
        }
        if let Some(policy) = cfg.policy_for(name) {
            print!(
                "      retry: max_attempts={} base_delay_ms={}",
                policy.max_attempts,
                policy.base_delay.as_millis()
            );
            if let Some(cap) = policy.max_delay {
                print!(" max_delay_ms={}", cap.as_millis());
            }
            if let Some(timeout) = policy.attempt_timeout {
                print!(" attempt_timeout_ms={}", timeout.as_millis());
            }
            println!();
        }
    }

    debug!("dry-run complete (no execution)");
}

fn print_summary(report: &PipelineReport) {
    println!();
    println!("steprun summary:");
    for step in report.steps.iter() {
        println!(
            "  {:<20} {:>8}  {}",
            step.name,
            format_duration(step.duration),
            step.status
        );
    }
    println!("  total: {}", format_duration(report.total_duration()));
}

fn format_duration(d: Duration) -> String {
    if d.as_secs() >= 1 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}ms", d.as_millis())
    }
}
