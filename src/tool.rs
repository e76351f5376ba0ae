//! Structured external tool invocation.
//!
//! Commands are built from a program name plus an explicit argument list
//! (never an interpolated shell string), and executed through the
//! [`ToolRunner`] trait so tests can substitute recording runners. Every
//! invocation is bounded by a timeout; an external tool hang fails the stage
//! instead of blocking the run indefinitely.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default bound on a single external tool invocation.
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 600;

/// A fully specified external command: program, arguments, working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
}

impl ToolCommand {
    /// Creates a command for `program` with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the working directory for the invocation.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Program name as invoked.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Argument list.
    pub fn arg_list(&self) -> &[String] {
        &self.args
    }

    /// Configured working directory, if any.
    pub fn dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }
}

impl std::fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured outcome of a completed tool invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

/// Seam for executing external tools.
///
/// The production implementation shells out; tests inject runners that
/// record invocations or fabricate artifacts.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Runs the command to completion, failing on non-zero exit status.
    async fn run(&self, command: &ToolCommand) -> Result<ToolOutput>;
}

/// Per-invocation timeout from configuration (`build.tool_timeout_secs`),
/// falling back to [`DEFAULT_TOOL_TIMEOUT_SECS`].
pub fn timeout_from(cfg: &crate::config::ConfigStore) -> Duration {
    let secs = cfg
        .get("build", "tool_timeout_secs")
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_TOOL_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

/// Production runner backed by `tokio::process` with a bounded timeout.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    timeout: Duration,
}

impl ProcessRunner {
    /// Creates a runner with the given per-invocation timeout.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Resolves `program` on the search path before first use, so a missing
    /// tool fails with a clear message rather than a raw spawn error.
    pub fn resolve_program(program: &str) -> Result<PathBuf> {
        which::which(program).map_err(|e| Error::ExternalTool {
            tool: program.to_string(),
            reason: format!("not found on PATH: {e}"),
        })
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS))
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
        log::info!("running: {command}");

        let program = Self::resolve_program(command.program())?;
        let mut cmd = tokio::process::Command::new(program);
        cmd.args(command.arg_list());
        if let Some(dir) = command.dir() {
            cmd.current_dir(dir);
        }

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| Error::ExternalTool {
                tool: command.program().to_string(),
                reason: format!("timed out after {}s", self.timeout.as_secs()),
            })?
            .map_err(|e| Error::ExternalTool {
                tool: command.program().to_string(),
                reason: format!("failed to start: {e}"),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(Error::ExternalTool {
                tool: command.program().to_string(),
                reason: match output.status.code() {
                    Some(code) => format!("exit code {code}: {}", stderr.trim()),
                    None => format!("terminated by signal: {}", stderr.trim()),
                },
            });
        }

        log::debug!("{} completed", command.program());
        Ok(ToolOutput { stdout, stderr })
    }
}
