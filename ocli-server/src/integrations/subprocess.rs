// ocli Integration Layer - Subprocess Manager
//
// Runs odoo-bin invocations:
// - Spawning with argument vectors, never through a shell
// - Capturing combined output, or inheriting stdio for long operations
// - Optional per-call timeout
// - Graceful shutdown (SIGTERM, wait, SIGKILL)

use std::future::Future;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tokio::time::timeout;

use super::adapter::{CommandRunner, RunnerConfig};
use super::error::{ProcessError, ProcessResult};

/// Runs a single program, one invocation at a time.
///
/// Children are spawned with `kill_on_drop`, so dropping an in-flight call
/// (for example on timeout) does not leave the process behind.
pub struct SubprocessManager {
    /// Program to execute (e.g. "/workspace/odoo/odoo-bin")
    program: String,

    /// Timeouts for calls and shutdown
    config: RunnerConfig,
}

impl SubprocessManager {
    pub fn new(program: &str, config: RunnerConfig) -> Self {
        Self {
            program: program.to_string(),
            config,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    fn command(&self, args: &[String]) -> Command {
        let mut command = Command::new(&self.program);
        command.args(args).kill_on_drop(true);
        command
    }

    fn spawn_error(&self, err: std::io::Error) -> ProcessError {
        if err.kind() == std::io::ErrorKind::NotFound {
            ProcessError::BinaryNotFound(self.program.clone())
        } else {
            ProcessError::SpawnFailed(err.to_string())
        }
    }

    async fn bounded<T, F>(&self, args: &[String], fut: F) -> ProcessResult<T>
    where
        F: Future<Output = std::io::Result<T>>,
    {
        let result = match self.config.call_timeout {
            Some(limit) => timeout(limit, fut)
                .await
                .map_err(|_| ProcessError::Timeout {
                    operation: format!("{} {}", self.program, args.join(" ")),
                    duration: limit,
                })?,
            None => fut.await,
        };
        result.map_err(|e| self.spawn_error(e))
    }
}

#[async_trait]
impl CommandRunner for SubprocessManager {
    async fn capture(&self, args: &[String]) -> ProcessResult<String> {
        log::info!("Running {} {}", self.program, args.join(" "));

        let mut command = self.command(args);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let output = self.bounded(args, command.output()).await?;

        let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if output.status.success() {
            Ok(combined)
        } else {
            Err(ProcessError::ProcessExited {
                code: output.status.code(),
                output: combined,
            })
        }
    }

    async fn stream(&self, args: &[String]) -> ProcessResult<()> {
        log::info!("Running {} {}", self.program, args.join(" "));

        let mut command = self.command(args);
        command
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        let status = self.bounded(args, command.status()).await?;

        if status.success() {
            Ok(())
        } else {
            Err(ProcessError::ProcessExited {
                code: status.code(),
                output: String::new(),
            })
        }
    }

    fn program(&self) -> &str {
        &self.program
    }
}

/// Stop `child` gracefully.
///
/// Sends SIGTERM, waits up to `grace`, then SIGKILL if needed. Returns the
/// final exit status and whether the kill was forced.
pub async fn terminate(child: &mut Child, grace: Duration) -> ProcessResult<(ExitStatus, bool)> {
    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        if let Some(pid) = child.id() {
            if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                log::warn!("Failed to send SIGTERM to {}: {}", pid, e);
            }
        }
    }

    match timeout(grace, child.wait()).await {
        Ok(status) => Ok((status?, false)),
        Err(_) => {
            log::warn!(
                "Process didn't exit within {:?}, sending SIGKILL",
                grace
            );
            child
                .kill()
                .await
                .map_err(|e| ProcessError::KillFailed(e.to_string()))?;
            let status = child.wait().await?;
            Ok((status, true))
        }
    }
}
