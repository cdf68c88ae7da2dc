// ocli Integration Layer
//
// Runs the external odoo-bin executable. It handles:
//
// - Argument construction for `odoo-bin db` subcommands
// - Captured or streamed execution with optional timeouts
// - Graceful shutdown (SIGTERM, wait, SIGKILL)
//
// # Architecture
//
// ```text
// Command handler
//         │
//         ▼
// ┌───────────────────┐
// │      OdooDb       │  ← Builds argument vectors
// └───────────────────┘
//         │
//         ▼
// ┌───────────────────┐
// │   CommandRunner   │  ← Trait: SubprocessManager or MockRunner
// └───────────────────┘
//         │
//         ▼
// ┌───────────────────┐
// │     odoo-bin      │
// └───────────────────┘
// ```
//
// # Usage
//
// ```ignore
// let runner = SubprocessManager::new("/workspace/odoo/odoo-bin", RunnerConfig::default());
// let db = OdooDb::new(runner, "/workspace/odoo.conf");
// let file = db.dump("prod", Path::new("/workspace/dbs"), "zip", false).await?;
// ```

mod adapter;
mod error;
mod mock;
mod odoo_db;
mod subprocess;

// Re-export public API
pub use adapter::{CommandRunner, RunnerConfig};
pub use error::{ProcessError, ProcessResult};
pub use mock::{MockOutcome, MockRunner};
pub use odoo_db::{
    drop_args, dump_args, duplicate_args, init_args, load_args, rename_args, InitOptions,
    LoadOptions, OdooDb, RenameOptions,
};
pub use subprocess::{terminate, SubprocessManager};
