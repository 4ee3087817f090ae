// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! The two sandbox primitives: [`Sandbox::exec`] for one-shot commands and
//! [`Sandbox::spawn`] for long-running streaming children. Both shell out to
//! `docker exec`/`podman exec` against a fixed container name — no shell
//! interpolation, arguments are passed to `Command` individually.
use std::process::Stdio;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tracing::{debug, warn};

use crate::error::SandboxError;
use crate::types::{ContainerRuntime, ExecOptions, ExecResult, SpawnOptions};

const MAX_CAPTURE_BYTES: usize = 1_048_576;

/// Handle onto the fixed-name sandbox container.
#[derive(Debug, Clone)]
pub struct Sandbox {
    runtime: ContainerRuntime,
    container: String,
}

impl Sandbox {
    pub fn new(container: impl Into<String>) -> Self {
        Self { runtime: ContainerRuntime::Docker, container: container.into() }
    }

    pub fn with_runtime(container: impl Into<String>, runtime: ContainerRuntime) -> Self {
        Self { runtime, container: container.into() }
    }

    /// Is the container up and accepting `exec`? Checked before every spawn.
    pub async fn is_ready(&self) -> bool {
        Command::new(self.runtime.binary())
            .args(["inspect", "--format", "{{.State.Running}}", &self.container])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map(|o| o.status.success() && String::from_utf8_lossy(&o.stdout).trim() == "true")
            .unwrap_or(false)
    }

    fn exec_command(&self, command: &str, args: &[String], opts: &ExecOptions) -> Command {
        let mut cmd = Command::new(self.runtime.binary());
        cmd.arg("exec");
        if let Some(user) = &opts.user {
            cmd.args(["--user", user]);
        }
        if let Some(cwd) = &opts.cwd {
            cmd.args(["--workdir", cwd]);
        }
        for (k, v) in &opts.env {
            cmd.arg("--env").arg(format!("{k}={v}"));
        }
        cmd.arg(&self.container).arg(command).args(args);
        cmd
    }

    /// One-shot command execution. `exitCode`/`stdout`/`stderr`/`timedOut`.
    pub async fn exec(
        &self,
        command: &str,
        args: &[String],
        opts: ExecOptions,
    ) -> Result<ExecResult, SandboxError> {
        if !self.is_ready().await {
            return Err(SandboxError::Unavailable);
        }

        let mut cmd = self.exec_command(command, args, &opts);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        debug!(command, container = %self.container, "exec_in_sandbox");

        let child = cmd.spawn().map_err(|source| SandboxError::Spawn {
            command: command.to_string(),
            source,
        })?;

        match tokio::time::timeout(opts.timeout(), child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(ExecResult {
                exit_code: output.status.code().unwrap_or(-1),
                stdout: truncate(&String::from_utf8_lossy(&output.stdout)),
                stderr: truncate(&String::from_utf8_lossy(&output.stderr)),
                timed_out: false,
            }),
            Ok(Err(source)) => {
                Err(SandboxError::Spawn { command: command.to_string(), source })
            }
            Err(_) => {
                warn!(command, "exec_in_sandbox timed out");
                Ok(ExecResult {
                    exit_code: -1,
                    stdout: String::new(),
                    stderr: String::new(),
                    timed_out: true,
                })
            }
        }
    }

    /// Start a streaming child process inside the sandbox. The returned
    /// [`SpawnedProcess`] owns stdin/stdout/stderr handles; the caller is
    /// responsible for reading output and waiting for exit.
    pub async fn spawn(
        &self,
        command: &str,
        args: &[String],
        opts: SpawnOptions,
    ) -> Result<SpawnedProcess, SandboxError> {
        if !self.is_ready().await {
            return Err(SandboxError::Unavailable);
        }

        let exec_opts = ExecOptions { cwd: opts.cwd, env: opts.env, timeout_ms: None, user: None };
        let mut cmd = self.exec_command(command, args, &exec_opts);
        cmd.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped());

        debug!(command, container = %self.container, "spawn_in_sandbox");

        let mut child = cmd.spawn().map_err(|source| SandboxError::Spawn {
            command: command.to_string(),
            source,
        })?;

        let pid = child.id().unwrap_or(0);
        let stdin = child.stdin.take();
        let stdout = Some(BufReader::new(child.stdout.take().expect("piped stdout")));
        let stderr = Some(BufReader::new(child.stderr.take().expect("piped stderr")));

        Ok(SpawnedProcess { pid, child, stdin, stdout, stderr })
    }
}

/// A running sandboxed child process. `stdout`/`stderr` are `Option` so
/// callers can `.take()` them to build a line reader while still holding
/// `child`/`stdin` for kill/respond.
pub struct SpawnedProcess {
    pub pid: u32,
    pub child: Child,
    pub stdin: Option<ChildStdin>,
    pub stdout: Option<BufReader<tokio::process::ChildStdout>>,
    pub stderr: Option<BufReader<tokio::process::ChildStderr>>,
}

impl SpawnedProcess {
    /// Write a line to the child's stdin, appending `\n`.
    pub async fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        if let Some(stdin) = self.stdin.as_mut() {
            stdin.write_all(line.as_bytes()).await?;
            stdin.write_all(b"\n").await?;
            stdin.flush().await?;
        }
        Ok(())
    }

    pub async fn kill(&mut self) -> std::io::Result<()> {
        self.child.kill().await
    }
}

fn truncate(s: &str) -> String {
    if s.len() <= MAX_CAPTURE_BYTES {
        s.to_string()
    } else {
        format!("{}...[truncated {} bytes]", &s[..MAX_CAPTURE_BYTES], s.len() - MAX_CAPTURE_BYTES)
    }
}
