// src/pipeline/command.rs

//! Shell commands as retryable steps.

use std::collections::{BTreeMap, VecDeque};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::StepConfig;
use crate::retry::Step;

/// Number of trailing stderr lines kept for error reporting.
const STDERR_TAIL_LINES: usize = 20;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("failed to spawn `{cmd}`: {source}")]
    Spawn {
        cmd: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for `{cmd}`: {source}")]
    Wait {
        cmd: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{}", exit_message(.code, .stderr))]
    Exited { code: Option<i32>, stderr: String },
}

fn exit_message(code: &Option<i32>, stderr: &str) -> String {
    let status = match *code {
        Some(code) => format!("command exited with code {code}"),
        None => "command terminated by signal".to_string(),
    };
    match stderr.lines().rev().find(|l| !l.trim().is_empty()) {
        Some(last) => format!("{status}: {}", last.trim()),
        None => status,
    }
}

/// A pipeline step that runs `cmd` through the platform shell.
///
/// When a `fix` command is set, it runs before every attempt except the
/// first. A failing fix is logged and otherwise ignored; the attempt still
/// runs.
#[derive(Debug, Clone)]
pub struct CommandStep {
    name: String,
    cmd: String,
    fix: Option<String>,
    workdir: Option<PathBuf>,
    env: BTreeMap<String, String>,
    attempts: u32,
}

impl CommandStep {
    pub fn new(name: impl Into<String>, cmd: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cmd: cmd.into(),
            fix: None,
            workdir: None,
            env: BTreeMap::new(),
            attempts: 0,
        }
    }

    /// Build from a `[[step]]` entry; `workdir` is resolved against `root`.
    pub fn from_config(cfg: &StepConfig, root: &Path) -> Self {
        let workdir = match &cfg.workdir {
            Some(dir) => Some(root.join(dir)),
            None => Some(root.to_path_buf()),
        };
        Self {
            name: cfg.name.clone(),
            cmd: cfg.cmd.clone(),
            fix: cfg.fix.clone(),
            workdir,
            env: cfg.env.clone(),
            attempts: 0,
        }
    }

    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.fix = Some(fix.into());
        self
    }

    pub fn with_workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Attempts started so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    async fn run_fix(&self, fix: &str, attempt: u32) {
        info!(step = %self.name, attempt, cmd = %fix, "running fix command before retry");
        if let Err(e) = run_shell(&self.name, fix, self.workdir.as_deref(), &self.env).await {
            warn!(step = %self.name, attempt, error = %e, "fix command failed; retrying anyway");
        }
    }
}

impl Step for CommandStep {
    type Error = CommandError;

    fn name(&self) -> &str {
        &self.name
    }

    fn run(&mut self) -> impl Future<Output = Result<(), CommandError>> + Send {
        self.attempts += 1;
        let attempt = self.attempts;
        let this = &*self;

        async move {
            if attempt > 1 {
                if let Some(fix) = &this.fix {
                    this.run_fix(fix, attempt).await;
                }
            }
            info!(step = %this.name, attempt, cmd = %this.cmd, "starting step process");
            run_shell(&this.name, &this.cmd, this.workdir.as_deref(), &this.env).await
        }
    }
}

/// Build a shell command appropriate for the platform.
fn shell_command(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}

/// Run `cmd` to completion.
///
/// Stdout lines are logged at info; stderr lines at debug, with the last
/// few kept for the error. The child is killed if this future is dropped.
async fn run_shell(
    step: &str,
    cmd: &str,
    workdir: Option<&Path>,
    env: &BTreeMap<String, String>,
) -> Result<(), CommandError> {
    let mut command = shell_command(cmd);
    if let Some(dir) = workdir {
        command.current_dir(dir);
    }
    command
        .envs(env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|source| CommandError::Spawn {
        cmd: cmd.to_string(),
        source,
    })?;

    let stdout_task = child.stdout.take().map(|stdout| {
        let step = step.to_string();
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            while let Some(line) = next_line_lossy(&mut reader).await {
                info!(step = %step, "stdout: {}", line);
            }
        })
    });

    // Always consume stderr so buffers don't fill.
    let stderr_task = child.stderr.take().map(|stderr| {
        let step = step.to_string();
        tokio::spawn(async move {
            let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
            let mut reader = BufReader::new(stderr);
            while let Some(line) = next_line_lossy(&mut reader).await {
                debug!(step = %step, "stderr: {}", line);
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            tail
        })
    });

    let status = child.wait().await.map_err(|source| CommandError::Wait {
        cmd: cmd.to_string(),
        source,
    })?;

    if let Some(task) = stdout_task {
        let _ = task.await;
    }
    let tail = match stderr_task {
        Some(task) => task.await.unwrap_or_default(),
        None => VecDeque::new(),
    };

    debug!(step = %step, exit_code = ?status.code(), success = status.success(), "process exited");

    if status.success() {
        Ok(())
    } else {
        Err(CommandError::Exited {
            code: status.code(),
            stderr: Vec::from(tail).join("\n"),
        })
    }
}

/// Next output line, decoded lossily. Returns `None` at end of stream or on
/// a read error.
///
/// Invalid UTF-8 must not end the loop: a reader that stops early closes the
/// pipe and the child dies of SIGPIPE on its next write.
async fn next_line_lossy<R>(reader: &mut R) -> Option<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    match reader.read_until(b'\n', &mut buf).await {
        Ok(0) => None,
        Ok(_) => {
            if buf.ends_with(b"\n") {
                buf.pop();
                if buf.ends_with(b"\r") {
                    buf.pop();
                }
            }
            Some(String::from_utf8_lossy(&buf).into_owned())
        }
        Err(e) => {
            debug!(error = %e, "stopped reading process output");
            None
        }
    }
}
