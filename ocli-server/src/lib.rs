pub mod integrations;
pub mod postgres;
pub mod supervisor;

pub use integrations::{OdooDb, ProcessError, SubprocessManager};
pub use postgres::{PgAdmin, PgAdminError, PgConfig};
pub use supervisor::{ServerOutcome, ServerSupervisor, ShutdownTrigger};
