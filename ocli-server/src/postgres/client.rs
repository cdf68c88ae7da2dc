// ocli Postgres Layer - Administration Client
//
// Short-lived pooled connections to the `postgres` database for listing,
// sizing, existence checks and DDL. Each CLI invocation connects once and
// closes the pool before exiting.

use async_trait::async_trait;
use log::{info, warn};
use sqlx::{postgres::PgPool, Executor};
use tokio::time::timeout;

use super::config::{PgConfig, ADMIN_DATABASE};
use super::error::{PgAdminError, PgAdminResult};
use super::naming::format_bytes;
use super::session::{self, AdminSession};

/// Table whose presence marks a database as initialized by Odoo.
const MODULE_TABLE: &str = "ir_module_module";

const NEUTRALIZE_STATEMENTS: [&str; 4] = [
    "UPDATE ir_cron SET active = false",
    "UPDATE ir_mail_server SET active = false",
    "UPDATE ir_config_parameter SET value = 'test' WHERE key LIKE '%api_key%'",
    "UPDATE ir_config_parameter SET value = 'http://localhost' WHERE key LIKE '%base_url%'",
];

/// Counts only the backends `pg_terminate_backend` actually signalled.
const TERMINATE_BACKENDS: &str = "SELECT count(*) FILTER (WHERE pg_terminate_backend(pid))
     FROM pg_stat_activity
     WHERE datname = $1 AND pid <> pg_backend_pid()";

/// Open a pool on `dbname` and verify it with a ping, both bounded by
/// `config.connect_timeout`.
pub async fn connect(config: &PgConfig, dbname: &str) -> PgAdminResult<PgPool> {
    let options = config.connect_options(dbname)?;

    let pool = timeout(
        config.connect_timeout,
        config.pool_options().connect_with(options),
    )
    .await
    .map_err(|_| PgAdminError::Timeout {
        operation: format!("connect to {}@{}:{}", dbname, config.host, config.port),
        duration: config.connect_timeout,
    })?
    .map_err(|e| PgAdminError::ConnectionFailed(format!("{}: {}", dbname, e)))?;

    let ping = async {
        let mut conn = pool.acquire().await?;
        sqlx::Connection::ping(&mut *conn).await?;
        Ok::<(), sqlx::Error>(())
    };
    match timeout(config.connect_timeout, ping).await {
        Ok(Ok(())) => Ok(pool),
        Ok(Err(e)) => {
            pool.close().await;
            Err(PgAdminError::ConnectionFailed(format!(
                "failed to ping {}: {}",
                dbname, e
            )))
        }
        Err(_) => {
            pool.close().await;
            Err(PgAdminError::Timeout {
                operation: format!("ping {}", dbname),
                duration: config.connect_timeout,
            })
        }
    }
}

/// Administration client bound to the `postgres` maintenance database.
pub struct PgAdmin {
    config: PgConfig,
    pool: PgPool,
}

impl PgAdmin {
    pub async fn connect(config: PgConfig) -> PgAdminResult<Self> {
        let pool = connect(&config, ADMIN_DATABASE).await?;
        info!(
            "Connected to PostgreSQL at {}:{} as {}",
            config.host, config.port, config.user
        );
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &PgConfig {
        &self.config
    }

    /// Close the pool, waiting for in-flight connections to be released.
    pub async fn close(self) {
        self.pool.close().await;
    }

    pub async fn ping(&self) -> PgAdminResult<()> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| PgAdminError::query("acquire connection", e))?;
        sqlx::Connection::ping(&mut *conn)
            .await
            .map_err(|e| PgAdminError::query("ping server", e))
    }

    /// Non-template databases other than `postgres`, ordered by name.
    pub async fn list_databases(&self) -> PgAdminResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT datname FROM pg_database
             WHERE datistemplate = false AND datname <> 'postgres'
             ORDER BY datname",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PgAdminError::query("list databases", e))
    }

    /// Databases from [`Self::list_databases`] that hold an Odoo schema.
    /// A database that cannot be inspected is skipped.
    pub async fn list_initialized_databases(&self) -> PgAdminResult<Vec<String>> {
        let mut initialized = Vec::new();
        for name in self.list_databases().await? {
            match self.is_initialized(&name).await {
                Ok(true) => initialized.push(name),
                Ok(false) => {}
                Err(e) => warn!("Skipping {}: {}", name, e),
            }
        }
        Ok(initialized)
    }

    pub async fn database_size_bytes(&self, dbname: &str) -> PgAdminResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT pg_database_size($1)")
            .bind(dbname)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PgAdminError::query(format!("get size of {}", dbname), e))
    }

    /// Size of `dbname` formatted for display, e.g. `12.40 MB`.
    pub async fn database_size(&self, dbname: &str) -> PgAdminResult<String> {
        Ok(format_bytes(self.database_size_bytes(dbname).await?))
    }

    pub async fn database_exists(&self, dbname: &str) -> PgAdminResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(dbname)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PgAdminError::query("check database existence", e))
    }

    /// Whether `dbname` exists and contains the Odoo module registry.
    pub async fn is_initialized(&self, dbname: &str) -> PgAdminResult<bool> {
        if !self.database_exists(dbname).await? {
            return Ok(false);
        }

        let pool = connect(&self.config, dbname).await?;
        let found = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )",
        )
        .bind(MODULE_TABLE)
        .fetch_one(&pool)
        .await
        .map_err(|e| PgAdminError::query("check table existence", e));
        pool.close().await;

        found
    }

    pub async fn create_database(&self, name: &str) -> PgAdminResult<()> {
        session::create_database(self, name).await
    }

    pub async fn create_database_from_template(
        &self,
        name: &str,
        template: &str,
    ) -> PgAdminResult<()> {
        session::create_database_from_template(self, name, template).await
    }

    pub async fn copy_database(&self, source: &str, target: &str) -> PgAdminResult<()> {
        session::copy_database(self, source, target).await
    }

    pub async fn drop_database(&self, name: &str) -> PgAdminResult<()> {
        session::drop_database(self, name).await
    }

    pub async fn rename_database(&self, old_name: &str, new_name: &str) -> PgAdminResult<()> {
        session::rename_database(self, old_name, new_name).await
    }

    /// Modules in state `installed` or `to upgrade`, ordered by name.
    pub async fn installed_modules(&self, dbname: &str) -> PgAdminResult<Vec<String>> {
        let pool = connect(&self.config, dbname).await?;
        let modules = sqlx::query_scalar::<_, String>(
            "SELECT name FROM ir_module_module
             WHERE state IN ('installed', 'to upgrade')
             ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .map_err(|e| PgAdminError::query("query modules", e));
        pool.close().await;

        modules
    }

    /// Disable scheduled jobs and mail servers and blank out integration
    /// parameters. Individual statement failures are logged and skipped.
    pub async fn neutralize(&self, dbname: &str) -> PgAdminResult<()> {
        let pool = connect(&self.config, dbname).await?;
        for statement in NEUTRALIZE_STATEMENTS {
            if let Err(e) = pool.execute(statement).await {
                warn!("Failed to execute neutralization query {:?}: {}", statement, e);
            }
        }
        pool.close().await;

        info!("Database {} neutralized", dbname);
        Ok(())
    }

    /// Value of an `ir_config_parameter` key, `None` when it is not set.
    pub async fn get_config_parameter(
        &self,
        dbname: &str,
        key: &str,
    ) -> PgAdminResult<Option<String>> {
        let pool = connect(&self.config, dbname).await?;
        let value = sqlx::query_scalar::<_, String>(
            "SELECT value FROM ir_config_parameter WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&pool)
        .await
        .map_err(|e| PgAdminError::query("get config parameter", e));
        pool.close().await;

        value
    }

    pub async fn set_config_parameter(
        &self,
        dbname: &str,
        key: &str,
        value: &str,
    ) -> PgAdminResult<()> {
        let pool = connect(&self.config, dbname).await?;
        let result = sqlx::query(
            "INSERT INTO ir_config_parameter (key, value, create_uid, create_date, write_uid, write_date)
             VALUES ($1, $2, 1, NOW(), 1, NOW())
             ON CONFLICT (key)
             DO UPDATE SET value = $2, write_date = NOW(), write_uid = 1",
        )
        .bind(key)
        .bind(value)
        .execute(&pool)
        .await
        .map_err(|e| PgAdminError::query("set config parameter", e));
        pool.close().await;

        result.map(|_| ())
    }
}

#[async_trait]
impl AdminSession for PgAdmin {
    async fn terminate_backends(&self, dbname: &str) -> PgAdminResult<u64> {
        let terminated = sqlx::query_scalar::<_, i64>(TERMINATE_BACKENDS)
            .bind(dbname)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PgAdminError::query("terminate connections", e))?;

        Ok(u64::try_from(terminated).unwrap_or(0))
    }

    async fn execute_ddl(&self, statement: &str) -> PgAdminResult<()> {
        // A bare &str goes through the simple query protocol, which is what
        // CREATE/DROP DATABASE need.
        self.pool
            .execute(statement)
            .await
            .map(|_| ())
            .map_err(|e| PgAdminError::query("execute statement", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminate_counts_signalled_backends_only() {
        assert!(TERMINATE_BACKENDS
            .starts_with("SELECT count(*) FILTER (WHERE pg_terminate_backend(pid))"));
        assert!(TERMINATE_BACKENDS.contains("pid <> pg_backend_pid()"));
    }

    #[test]
    fn test_neutralize_statements_only_update() {
        for statement in NEUTRALIZE_STATEMENTS {
            assert!(statement.starts_with("UPDATE "), "{}", statement);
        }
    }
}
