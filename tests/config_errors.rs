// tests/config_errors.rs

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;
use steprun::config::{ConfigFile, load_and_validate, load_from_str};
use steprun::errors::SteprunError;

fn validate(toml: &str) -> Result<ConfigFile, SteprunError> {
    let raw = load_from_str(toml)?;
    ConfigFile::try_from(raw)
}

fn expect_config_error(toml: &str, needle: &str) {
    match validate(toml) {
        Err(SteprunError::ConfigError(msg)) => {
            assert!(msg.contains(needle), "expected '{needle}' in: {msg}");
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_dependency_cycle_returns_structured_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[[step]]
name = "A"
cmd = "echo A"
after = ["B"]

[[step]]
name = "B"
cmd = "echo B"
after = ["A"]
"#
    )
    .unwrap();

    match load_and_validate(file.path()) {
        Err(SteprunError::DependencyCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains("A") || msg.contains("B"));
        }
        Err(e) => panic!("Expected DependencyCycle error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_unknown_dependency_returns_config_error() {
    expect_config_error(
        r#"
[[step]]
name = "A"
cmd = "echo A"
after = ["NonExistent"]
"#,
        "unknown dependency 'NonExistent'",
    );
}

#[test]
fn test_self_dependency_is_rejected() {
    expect_config_error(
        r#"
[[step]]
name = "A"
cmd = "echo A"
after = ["A"]
"#,
        "cannot depend on itself",
    );
}

#[test]
fn test_empty_pipeline_is_rejected() {
    expect_config_error("[retry]\nmax_attempts = 2\n", "at least one [[step]]");
}

#[test]
fn test_duplicate_and_empty_names_are_rejected() {
    expect_config_error(
        r#"
[[step]]
name = "build"
cmd = "make"

[[step]]
name = "build"
cmd = "make again"
"#,
        "duplicate step name 'build'",
    );

    expect_config_error(
        r#"
[[step]]
name = "  "
cmd = "make"
"#,
        "empty name",
    );
}

#[test]
fn test_empty_commands_are_rejected() {
    expect_config_error(
        r#"
[[step]]
name = "build"
cmd = ""
"#,
        "empty `cmd`",
    );

    expect_config_error(
        r#"
[[step]]
name = "build"
cmd = "make"
fix = " "
"#,
        "empty `fix`",
    );
}

#[test]
fn test_zero_and_negative_max_attempts_are_rejected() {
    expect_config_error(
        r#"
[retry]
max_attempts = 0

[[step]]
name = "build"
cmd = "make"
"#,
        "max_attempts must be >= 1 (got 0)",
    );

    expect_config_error(
        r#"
[[step]]
name = "build"
cmd = "make"
retry = { max_attempts = -2 }
"#,
        "step 'build': max_attempts must be >= 1 (got -2)",
    );
}

#[test]
fn test_negative_delays_and_zero_timeout_are_rejected() {
    expect_config_error(
        r#"
[retry]
base_delay_ms = -1

[[step]]
name = "build"
cmd = "make"
"#,
        "base_delay_ms must be >= 0",
    );

    expect_config_error(
        r#"
[retry]
max_delay_ms = -5

[[step]]
name = "build"
cmd = "make"
"#,
        "max_delay_ms must be >= 0",
    );

    expect_config_error(
        r#"
[[step]]
name = "build"
cmd = "make"
retry = { attempt_timeout_ms = 0 }
"#,
        "attempt_timeout_ms must be > 0",
    );
}

#[test]
fn test_malformed_toml_is_a_toml_error() {
    match load_from_str("[[step]\nname = ") {
        Err(SteprunError::TomlError(_)) => {}
        other => panic!("Expected TomlError, got: {:?}", other),
    }
}

#[test]
fn test_defaults_and_per_step_overrides_are_merged() {
    let cfg = validate(
        r#"
[retry]
max_attempts = 4
base_delay_ms = 250
max_delay_ms = 2000

[[step]]
name = "install"
cmd = "npm ci"

[[step]]
name = "deploy"
cmd = "./deploy.sh"
after = ["install"]
retry = { max_attempts = 6, attempt_timeout_ms = 30000 }
"#,
    )
    .expect("valid config");

    let install = cfg.policy_for("install").unwrap();
    assert_eq!(install.max_attempts, 4);
    assert_eq!(install.base_delay, Duration::from_millis(250));
    assert_eq!(install.max_delay, Some(Duration::from_secs(2)));
    assert_eq!(install.attempt_timeout, None);

    let deploy = cfg.policy_for("deploy").unwrap();
    assert_eq!(deploy.max_attempts, 6);
    assert_eq!(deploy.base_delay, Duration::from_millis(250));
    assert_eq!(deploy.attempt_timeout, Some(Duration::from_secs(30)));
}

#[test]
fn test_missing_retry_section_uses_defaults() {
    let cfg = validate(
        r#"
[[step]]
name = "build"
cmd = "make"
"#,
    )
    .unwrap();

    let policy = cfg.policy_for("build").unwrap();
    assert_eq!(policy.max_attempts, 3);
    assert_eq!(policy.base_delay, Duration::from_secs(1));
    assert_eq!(policy.max_delay, None);
}

#[test]
fn test_cli_overrides_apply_to_every_step() {
    let mut cfg = validate(
        r#"
[[step]]
name = "a"
cmd = "true"

[[step]]
name = "b"
cmd = "true"
retry = { max_attempts = 9 }
"#,
    )
    .unwrap();

    cfg.apply_overrides(Some(2), Some(Duration::ZERO)).unwrap();
    for name in ["a", "b"] {
        let policy = cfg.policy_for(name).unwrap();
        assert_eq!(policy.max_attempts, 2);
        assert_eq!(policy.base_delay, Duration::ZERO);
    }

    match cfg.apply_overrides(Some(0), None) {
        Err(SteprunError::ConfigError(msg)) => assert!(msg.contains("--max-attempts")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}
