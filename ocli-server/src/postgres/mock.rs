// ocli Postgres Layer - Mock Session
//
// In-memory AdminSession that records what would have been sent to the
// server. Lets tests check ordering and best-effort rules without PostgreSQL.

use async_trait::async_trait;
use std::sync::Mutex;

use super::error::{PgAdminError, PgAdminResult};
use super::session::AdminSession;

#[derive(Default)]
pub struct MockSession {
    /// Databases whose backends were asked to terminate, in order
    terminated: Mutex<Vec<String>>,

    /// DDL statements executed, in order
    statements: Mutex<Vec<String>>,

    /// Error message returned by `terminate_backends()`
    terminate_error: Mutex<Option<String>>,

    /// Error message returned by `execute_ddl()`
    ddl_error: Mutex<Option<String>>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `terminate_backends()` fail with `message`.
    pub fn fail_terminate(&self, message: &str) {
        *self.terminate_error.lock().unwrap() = Some(message.to_string());
    }

    /// Make `execute_ddl()` fail with `message`.
    pub fn fail_ddl(&self, message: &str) {
        *self.ddl_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn terminated(&self) -> Vec<String> {
        self.terminated.lock().unwrap().clone()
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }
}

#[async_trait]
impl AdminSession for MockSession {
    async fn terminate_backends(&self, dbname: &str) -> PgAdminResult<u64> {
        self.terminated.lock().unwrap().push(dbname.to_string());

        match &*self.terminate_error.lock().unwrap() {
            Some(message) => Err(PgAdminError::QueryFailed {
                context: "terminate connections".to_string(),
                message: message.clone(),
            }),
            None => Ok(0),
        }
    }

    async fn execute_ddl(&self, statement: &str) -> PgAdminResult<()> {
        self.statements.lock().unwrap().push(statement.to_string());

        match &*self.ddl_error.lock().unwrap() {
            Some(message) => Err(PgAdminError::QueryFailed {
                context: "execute statement".to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}
