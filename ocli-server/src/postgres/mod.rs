// ocli Postgres Layer
//
// Direct PostgreSQL administration: listing, sizing and inspecting
// databases, plus create/copy/rename/drop with connection termination.
// Connections are opened per invocation against the `postgres` maintenance
// database; per-database queries open a short-lived pool of their own.
//
// # Usage
//
// ```ignore
// let admin = PgAdmin::connect(config).await?;
// for name in admin.list_databases().await? {
//     println!("{} ({})", name, admin.database_size(&name).await?);
// }
// admin.copy_database("prod", "prod_copy").await?;
// admin.close().await;
// ```

mod client;
mod config;
mod error;
mod mock;
mod naming;
mod session;

pub use client::{connect, PgAdmin};
pub use config::{PgConfig, ADMIN_DATABASE};
pub use error::{PgAdminError, PgAdminResult};
pub use mock::MockSession;
pub use naming::{format_bytes, is_valid_db_name, quote_identifier};
pub use session::{
    copy_database, create_database, create_database_from_template, drop_database,
    rename_database, AdminSession,
};
