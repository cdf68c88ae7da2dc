// ocli Integration Layer - Error Types
//
// Errors from invoking odoo-bin and from supervising the long-running
// server process.

use std::fmt;
use std::io;
use std::time::Duration;

/// Errors that can occur while running an external process
#[derive(Debug)]
pub enum ProcessError {
    /// Executable not found
    BinaryNotFound(String),

    /// Process spawn failed
    SpawnFailed(String),

    /// Process exited unsuccessfully. `code` is `None` when the process was
    /// ended by a signal; `output` holds whatever was captured.
    ProcessExited { code: Option<i32>, output: String },

    /// Call did not finish in time
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// I/O error while talking to the process
    IoError(String),

    /// Could not force-kill a process that ignored SIGTERM
    KillFailed(String),

    /// Argument rejected before the process was started
    InvalidArgument(String),
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BinaryNotFound(bin) => {
                write!(f, "executable not found: '{}'", bin)
            }
            Self::SpawnFailed(msg) => write!(f, "Failed to spawn subprocess: {}", msg),
            Self::ProcessExited { code, output } => {
                match code {
                    Some(code) => write!(f, "Process exited with code {}", code)?,
                    None => write!(f, "Process terminated by signal")?,
                }
                let output = output.trim_end();
                if output.is_empty() {
                    Ok(())
                } else {
                    write!(f, "\n{}", output)
                }
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} waiting for: {}", duration, operation)
            }
            Self::IoError(msg) => write!(f, "I/O error: {}", msg),
            Self::KillFailed(msg) => write!(f, "failed to kill process: {}", msg),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for ProcessError {}

impl From<io::Error> for ProcessError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::BinaryNotFound(err.to_string()),
            _ => Self::IoError(err.to_string()),
        }
    }
}

/// Result type for process operations
pub type ProcessResult<T> = Result<T, ProcessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProcessError::BinaryNotFound("/opt/odoo/odoo-bin".to_string());
        assert!(err.to_string().contains("odoo-bin"));
        assert!(err.to_string().contains("not found"));

        let err = ProcessError::ProcessExited {
            code: Some(1),
            output: "database \"prod\" already exists\n".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Process exited with code 1\ndatabase \"prod\" already exists"
        );

        let err = ProcessError::ProcessExited {
            code: None,
            output: String::new(),
        };
        assert_eq!(err.to_string(), "Process terminated by signal");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: ProcessError = io_err.into();
        assert!(matches!(err, ProcessError::BinaryNotFound(_)));

        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed");
        let err: ProcessError = io_err.into();
        assert!(matches!(err, ProcessError::IoError(_)));
    }
}
