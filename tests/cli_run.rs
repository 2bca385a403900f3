// tests/cli_run.rs
#![cfg(unix)]

use std::error::Error;
use std::fs;

use clap::Parser;
use tempfile::TempDir;

use steprun::cli::CliArgs;
use steprun_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

const PIPELINE: &str = r#"
[retry]
max_attempts = 5
base_delay_ms = 0

[[step]]
name = "build"
cmd = "touch built"

[[step]]
name = "deploy"
cmd = "exit 1"
after = ["build"]
"#;

fn write_pipeline(dir: &TempDir) -> std::io::Result<String> {
    let path = dir.path().join("Steprun.toml");
    fs::write(&path, PIPELINE)?;
    Ok(path.to_string_lossy().into_owned())
}

#[test]
fn cli_defaults_and_overrides_parse() {
    let args = CliArgs::try_parse_from(["steprun"]).unwrap();
    assert_eq!(args.config, "Steprun.toml");
    assert!(args.step.is_none());
    assert!(args.report.is_none());
    assert!(!args.dry_run);

    let args = CliArgs::try_parse_from([
        "steprun",
        "--config",
        "ci/Steprun.toml",
        "--step",
        "deploy",
        "--max-attempts",
        "2",
        "--base-delay-ms",
        "50",
        "--log-level",
        "debug",
        "--dry-run",
    ])
    .unwrap();
    assert_eq!(args.config, "ci/Steprun.toml");
    assert_eq!(args.step.as_deref(), Some("deploy"));
    assert_eq!(args.max_attempts, Some(2));
    assert_eq!(args.base_delay_ms, Some(50));
    assert!(args.dry_run);
}

#[tokio::test]
async fn dry_run_executes_nothing() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let config = write_pipeline(&dir)?;

    let args = CliArgs::try_parse_from(["steprun", "--config", &config, "--dry-run"])?;
    steprun::run(args).await?;

    assert!(!dir.path().join("built").exists());
    Ok(())
}

#[tokio::test]
async fn failing_pipeline_is_an_error() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let config = write_pipeline(&dir)?;

    let args = CliArgs::try_parse_from(["steprun", "--config", &config, "--max-attempts", "1"])?;
    let err = steprun::run(args).await.unwrap_err();

    assert!(err.to_string().contains("deploy"), "got: {err}");
    assert!(dir.path().join("built").exists());
    Ok(())
}

#[tokio::test]
async fn step_flag_limits_the_run() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let config = write_pipeline(&dir)?;

    let args = CliArgs::try_parse_from(["steprun", "--config", &config, "--step", "build"])?;
    steprun::run(args).await?;

    assert!(dir.path().join("built").exists());
    Ok(())
}

#[tokio::test]
async fn unknown_step_flag_is_rejected() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let config = write_pipeline(&dir)?;

    let args = CliArgs::try_parse_from(["steprun", "--config", &config, "--step", "ship"])?;
    let err = steprun::run(args).await.unwrap_err();

    assert!(err.to_string().contains("ship"), "got: {err}");
    Ok(())
}

#[tokio::test]
async fn report_flag_writes_the_run_report() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let config = write_pipeline(&dir)?;
    let report = dir.path().join("run.toml");
    let report_arg = report.to_string_lossy().into_owned();

    let args = CliArgs::try_parse_from([
        "steprun",
        "--config",
        &config,
        "--max-attempts",
        "1",
        "--report",
        &report_arg,
    ])?;
    assert!(steprun::run(args).await.is_err());

    let saved: toml::Table = toml::from_str(&fs::read_to_string(&report)?)?;
    assert_eq!(saved["success"].as_bool(), Some(false));
    let steps = saved["step"].as_array().expect("step array");
    assert_eq!(steps[0]["status"].as_str(), Some("succeeded"));
    assert_eq!(steps[1]["name"].as_str(), Some("deploy"));
    assert_eq!(steps[1]["status"].as_str(), Some("failed"));
    Ok(())
}
