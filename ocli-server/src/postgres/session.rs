// ocli Postgres Layer - Destructive Operations
//
// CREATE/DROP/ALTER DATABASE are written against the AdminSession trait so
// the ordering rules hold for every backend:
//
// 1. the target name is validated before anything is sent,
// 2. backends connected to the affected database are terminated, and a
//    failure to do so is logged and ignored,
// 3. the DDL statement runs.

use async_trait::async_trait;
use log::{info, warn};

use super::error::{PgAdminError, PgAdminResult};
use super::naming::{is_valid_db_name, quote_identifier};

/// The two primitives destructive operations are built from.
#[async_trait]
pub trait AdminSession: Send + Sync {
    /// Terminate every backend connected to `dbname` except our own.
    /// Returns how many backends were signalled.
    async fn terminate_backends(&self, dbname: &str) -> PgAdminResult<u64>;

    /// Run a single DDL statement outside any transaction.
    async fn execute_ddl(&self, statement: &str) -> PgAdminResult<()>;
}

fn validate(name: &str) -> PgAdminResult<()> {
    if is_valid_db_name(name) {
        Ok(())
    } else {
        Err(PgAdminError::InvalidName(name.to_string()))
    }
}

async fn terminate_best_effort<S: AdminSession + ?Sized>(session: &S, dbname: &str) {
    match session.terminate_backends(dbname).await {
        Ok(0) => {}
        Ok(count) => info!("Terminated {} connection(s) to {}", count, dbname),
        Err(e) => warn!(
            "Failed to terminate connections to {}, continuing anyway: {}",
            dbname, e
        ),
    }
}

pub async fn create_database<S: AdminSession + ?Sized>(session: &S, name: &str) -> PgAdminResult<()> {
    validate(name)?;

    let statement = format!("CREATE DATABASE {} ENCODING 'UTF8'", quote_identifier(name));
    session
        .execute_ddl(&statement)
        .await
        .map_err(|e| with_context(e, "create database"))?;

    info!("Database {} created", name);
    Ok(())
}

/// Create `name` as a copy of `template`. Connections to the template are
/// terminated first, since PostgreSQL refuses to copy a database in use.
pub async fn create_database_from_template<S: AdminSession + ?Sized>(
    session: &S,
    name: &str,
    template: &str,
) -> PgAdminResult<()> {
    validate(name)?;

    terminate_best_effort(session, template).await;

    let statement = format!(
        "CREATE DATABASE {} WITH TEMPLATE {}",
        quote_identifier(name),
        quote_identifier(template)
    );
    session
        .execute_ddl(&statement)
        .await
        .map_err(|e| with_context(e, "create database from template"))?;

    info!("Database {} created from template {}", name, template);
    Ok(())
}

pub async fn copy_database<S: AdminSession + ?Sized>(
    session: &S,
    source: &str,
    target: &str,
) -> PgAdminResult<()> {
    create_database_from_template(session, target, source).await
}

pub async fn drop_database<S: AdminSession + ?Sized>(session: &S, name: &str) -> PgAdminResult<()> {
    validate(name)?;

    terminate_best_effort(session, name).await;

    let statement = format!("DROP DATABASE IF EXISTS {}", quote_identifier(name));
    session
        .execute_ddl(&statement)
        .await
        .map_err(|e| with_context(e, "drop database"))?;

    info!("Database {} dropped", name);
    Ok(())
}

pub async fn rename_database<S: AdminSession + ?Sized>(
    session: &S,
    old_name: &str,
    new_name: &str,
) -> PgAdminResult<()> {
    validate(new_name)?;

    terminate_best_effort(session, old_name).await;

    let statement = format!(
        "ALTER DATABASE {} RENAME TO {}",
        quote_identifier(old_name),
        quote_identifier(new_name)
    );
    session
        .execute_ddl(&statement)
        .await
        .map_err(|e| with_context(e, "rename database"))?;

    info!("Database {} renamed to {}", old_name, new_name);
    Ok(())
}

fn with_context(err: PgAdminError, context: &str) -> PgAdminError {
    match err {
        PgAdminError::QueryFailed { message, .. } => PgAdminError::QueryFailed {
            context: context.to_string(),
            message,
        },
        other => other,
    }
}
