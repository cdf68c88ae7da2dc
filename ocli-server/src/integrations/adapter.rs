// ocli Integration Layer - Runner Trait
//
// Defines the CommandRunner trait that odoo-bin invocations go through, so
// argument construction can be tested without the binary installed.

use std::time::Duration;

use async_trait::async_trait;

use super::error::ProcessResult;

/// Runs a program with an argument vector.
///
/// Arguments are passed via `Command::args()`, never through a shell.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion and return combined stdout and stderr.
    ///
    /// A non-zero exit becomes `ProcessError::ProcessExited` carrying the
    /// captured output.
    async fn capture(&self, args: &[String]) -> ProcessResult<String>;

    /// Run to completion with stdio inherited from this process.
    async fn stream(&self, args: &[String]) -> ProcessResult<()>;

    /// Path or name of the program being run, for logs and errors.
    fn program(&self) -> &str;
}

/// Configuration for runner behavior
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Bound on a single invocation, `None` to wait indefinitely
    pub call_timeout: Option<Duration>,

    /// Grace period between SIGTERM and SIGKILL
    pub shutdown_timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            call_timeout: None,
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}
