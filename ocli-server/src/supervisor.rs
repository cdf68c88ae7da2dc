//! Runs the Odoo server as a child process and forwards termination to it.
//!
//! Signal listeners are registered before the child is spawned. Whichever
//! comes first, a termination signal or the child's own exit, decides the
//! outcome. On a signal the child gets SIGTERM and a grace period, then
//! SIGKILL.

use std::fmt;
use std::future::Future;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::process::{Child, Command};
use tokio::signal::unix::{signal, Signal, SignalKind};

use crate::integrations::{terminate, ProcessError, ProcessResult};

/// What asked the server to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownTrigger {
    Interrupt,
    Terminate,
    Quit,
    /// Shutdown requested programmatically rather than by a signal
    Requested,
}

impl fmt::Display for ShutdownTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownTrigger::Interrupt => write!(f, "SIGINT"),
            ShutdownTrigger::Terminate => write!(f, "SIGTERM"),
            ShutdownTrigger::Quit => write!(f, "SIGQUIT"),
            ShutdownTrigger::Requested => write!(f, "shutdown request"),
        }
    }
}

/// Listeners for SIGINT, SIGTERM and SIGQUIT. Dropping this value stops
/// listening.
pub struct ShutdownSignals {
    interrupt: Signal,
    terminate: Signal,
    quit: Signal,
}

impl ShutdownSignals {
    pub fn register() -> io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            quit: signal(SignalKind::quit())?,
        })
    }

    /// Wait for the next termination signal.
    pub async fn recv(&mut self) -> ShutdownTrigger {
        tokio::select! {
            _ = self.interrupt.recv() => ShutdownTrigger::Interrupt,
            _ = self.terminate.recv() => ShutdownTrigger::Terminate,
            _ = self.quit.recv() => ShutdownTrigger::Quit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Starting,
    Running,
    ShuttingDown,
    /// Stopped on request
    Terminated,
    /// Exited on its own with success
    Completed,
    Failed,
}

/// How a supervised run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerOutcome {
    /// `None` when the server exited on its own
    pub trigger: Option<ShutdownTrigger>,
    pub status: ExitStatus,
    /// The grace period ran out and the server was killed
    pub forced: bool,
}

enum Event {
    Shutdown(ShutdownTrigger),
    Exited(io::Result<ExitStatus>),
}

pub struct ServerSupervisor {
    program: String,
    args: Vec<String>,
    shutdown_timeout: Duration,
    state: SupervisorState,
}

impl ServerSupervisor {
    pub fn new(program: &str, args: Vec<String>, shutdown_timeout: Duration) -> Self {
        Self {
            program: program.to_string(),
            args,
            shutdown_timeout,
            state: SupervisorState::Idle,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    fn set_state(&mut self, state: SupervisorState) {
        debug!("Supervisor {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Run until the server exits or a termination signal arrives.
    pub async fn run(&mut self) -> ProcessResult<ServerOutcome> {
        let mut signals = ShutdownSignals::register()?;
        self.run_until(signals.recv()).await
    }

    /// Run until the server exits or `shutdown` resolves.
    pub async fn run_until<F>(&mut self, shutdown: F) -> ProcessResult<ServerOutcome>
    where
        F: Future<Output = ShutdownTrigger>,
    {
        self.set_state(SupervisorState::Starting);
        let mut child = match self.spawn() {
            Ok(child) => child,
            Err(e) => {
                self.set_state(SupervisorState::Failed);
                return Err(e);
            }
        };

        self.set_state(SupervisorState::Running);
        if let Some(pid) = child.id() {
            info!("Started {} with PID {}", self.program, pid);
        }

        let event = tokio::select! {
            trigger = shutdown => Event::Shutdown(trigger),
            status = child.wait() => Event::Exited(status),
        };

        match event {
            Event::Exited(status) => {
                let status = match status {
                    Ok(status) => status,
                    Err(e) => {
                        self.set_state(SupervisorState::Failed);
                        return Err(e.into());
                    }
                };
                self.set_state(if status.success() {
                    SupervisorState::Completed
                } else {
                    SupervisorState::Failed
                });
                Ok(ServerOutcome {
                    trigger: None,
                    status,
                    forced: false,
                })
            }
            Event::Shutdown(trigger) => {
                info!("Received {}, shutting down {}", trigger, self.program);
                self.set_state(SupervisorState::ShuttingDown);

                match terminate(&mut child, self.shutdown_timeout).await {
                    Ok((status, forced)) => {
                        if forced {
                            warn!(
                                "{} ignored SIGTERM for {:?} and was killed",
                                self.program, self.shutdown_timeout
                            );
                        }
                        self.set_state(SupervisorState::Terminated);
                        Ok(ServerOutcome {
                            trigger: Some(trigger),
                            status,
                            forced,
                        })
                    }
                    Err(e) => {
                        self.set_state(SupervisorState::Failed);
                        Err(e)
                    }
                }
            }
        }
    }

    fn spawn(&self) -> ProcessResult<Child> {
        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    ProcessError::BinaryNotFound(self.program.clone())
                } else {
                    ProcessError::SpawnFailed(e.to_string())
                }
            })
    }
}
