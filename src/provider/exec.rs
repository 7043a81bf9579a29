// ABOUTME: Runs external programs for the process-backed adapters.
// ABOUTME: Captures stdout, maps failures to ExecError and enforces an optional deadline.

use snafu::ResultExt;
use std::ffi::OsStr;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::error::{ExecError, ExitSnafu, SpawnSnafu, TimeoutSnafu};

/// A program invocation under construction.
#[derive(Debug)]
pub struct Exec {
    program: String,
    command: Command,
    timeout: Option<Duration>,
}

impl Exec {
    pub fn new(program: impl Into<String>) -> Self {
        let program = program.into();
        let mut command = Command::new(&program);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        Self {
            program,
            command,
            timeout: None,
        }
    }

    /// Run `script` through `sh -c`.
    pub fn shell(script: &str) -> Self {
        let mut exec = Self::new("sh");
        exec.command.arg("-c").arg(script);
        exec
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.command.arg(arg);
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.command.args(args);
        self
    }

    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.command.env(key, value);
        self
    }

    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        self.command.envs(vars);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run to completion and return stdout.
    pub async fn output(mut self) -> Result<String, ExecError> {
        tracing::debug!(program = %self.program, command = ?self.command.as_std(), "running");

        let child = self.command.spawn().context(SpawnSnafu {
            program: self.program.clone(),
        })?;

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| {
                    TimeoutSnafu {
                        program: self.program.clone(),
                        timeout: limit,
                    }
                    .build()
                })?,
            None => child.wait_with_output().await,
        }
        .context(SpawnSnafu {
            program: self.program.clone(),
        })?;

        if !output.status.success() {
            return ExitSnafu {
                program: self.program,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }
            .fail();
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
