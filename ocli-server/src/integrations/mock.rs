// ocli Integration Layer - Mock Runner
//
// Mock implementation of CommandRunner for unit testing.
// Records every argument vector and replays a configured outcome.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::adapter::CommandRunner;
use super::error::{ProcessError, ProcessResult};

/// Outcome the mock returns from `capture()` and `stream()`.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Success(String),
    Exit { code: i32, output: String },
    NotFound,
}

/// Mock runner for testing command construction without odoo-bin.
///
/// # Example
///
/// ```ignore
/// let mock = MockRunner::new("odoo-bin");
/// mock.set_outcome(MockOutcome::Exit { code: 1, output: "boom".into() });
/// let db = OdooDb::new(mock, "/etc/odoo.conf");
/// assert!(db.drop_db("prod").await.is_err());
/// ```
pub struct MockRunner {
    program: String,

    /// Outcome of every call
    outcome: Mutex<MockOutcome>,

    /// Argument vectors in call order
    calls: Mutex<Vec<Vec<String>>>,

    /// Count of `capture()` invocations
    capture_count: AtomicUsize,

    /// Count of `stream()` invocations
    stream_count: AtomicUsize,
}

impl MockRunner {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            outcome: Mutex::new(MockOutcome::Success(String::new())),
            calls: Mutex::new(Vec::new()),
            capture_count: AtomicUsize::new(0),
            stream_count: AtomicUsize::new(0),
        }
    }

    pub fn set_outcome(&self, outcome: MockOutcome) {
        *self.outcome.lock().unwrap() = outcome;
    }

    /// All argument vectors received so far.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    /// The most recent argument vector, empty if never called.
    pub fn last_call(&self) -> Vec<String> {
        self.calls.lock().unwrap().last().cloned().unwrap_or_default()
    }

    pub fn capture_count(&self) -> usize {
        self.capture_count.load(Ordering::Relaxed)
    }

    pub fn stream_count(&self) -> usize {
        self.stream_count.load(Ordering::Relaxed)
    }

    fn record(&self, args: &[String]) -> ProcessResult<String> {
        self.calls.lock().unwrap().push(args.to_vec());

        match &*self.outcome.lock().unwrap() {
            MockOutcome::Success(output) => Ok(output.clone()),
            MockOutcome::Exit { code, output } => Err(ProcessError::ProcessExited {
                code: Some(*code),
                output: output.clone(),
            }),
            MockOutcome::NotFound => Err(ProcessError::BinaryNotFound(self.program.clone())),
        }
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn capture(&self, args: &[String]) -> ProcessResult<String> {
        self.capture_count.fetch_add(1, Ordering::Relaxed);
        self.record(args)
    }

    async fn stream(&self, args: &[String]) -> ProcessResult<()> {
        self.stream_count.fetch_add(1, Ordering::Relaxed);
        self.record(args).map(|_| ())
    }

    fn program(&self) -> &str {
        &self.program
    }
}
