// ocli Postgres Layer - Connection Configuration

use std::str::FromStr;
use std::time::Duration;

use log::debug;
use ocli_utils::odoo_conf::ResolvedDbParams;
use ocli_utils::settings::PostgresSection;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};

use super::error::{PgAdminError, PgAdminResult};

/// Database every administrative connection is opened against.
pub const ADMIN_DATABASE: &str = "postgres";

/// PostgreSQL connection and pool configuration, built per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// `disable`, `allow`, `prefer`, `require`, `verify-ca` or `verify-full`
    pub ssl_mode: String,
    pub max_open_conns: u32,
    /// Idle ceiling from the settings file. sqlx pools have none, so it is
    /// not applied.
    pub max_idle_conns: u32,
    pub conn_max_lifetime: Duration,
    pub conn_max_idle_time: Duration,
    /// Bound on opening a connection and on waiting for a pooled one.
    pub connect_timeout: Duration,
}

impl Default for PgConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            ssl_mode: "disable".to_string(),
            max_open_conns: 25,
            max_idle_conns: 5,
            conn_max_lifetime: Duration::from_secs(5 * 60),
            conn_max_idle_time: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl PgConfig {
    /// Combine connection parameters with pool tuning from the settings file.
    /// `ssl_mode` overrides the settings value when given.
    pub fn from_parts(
        params: ResolvedDbParams,
        tuning: &PostgresSection,
        ssl_mode: Option<String>,
    ) -> Self {
        Self {
            host: params.host,
            port: params.port,
            user: params.user,
            password: params.password,
            ssl_mode: ssl_mode.unwrap_or_else(|| tuning.ssl_mode.clone()),
            max_open_conns: tuning.max_open_conns,
            max_idle_conns: tuning.max_idle_conns,
            conn_max_lifetime: tuning.conn_max_lifetime,
            conn_max_idle_time: tuning.conn_max_idle_time,
            connect_timeout: tuning.connect_timeout,
        }
    }

    pub fn ssl_mode(&self) -> PgAdminResult<PgSslMode> {
        if self.ssl_mode.is_empty() {
            return Ok(PgSslMode::Disable);
        }
        PgSslMode::from_str(&self.ssl_mode)
            .map_err(|_| PgAdminError::InvalidSslMode(self.ssl_mode.clone()))
    }

    /// Connect options for `dbname`.
    pub fn connect_options(&self, dbname: &str) -> PgAdminResult<PgConnectOptions> {
        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(dbname)
            .ssl_mode(self.ssl_mode()?))
    }

    pub fn pool_options(&self) -> PgPoolOptions {
        let mut options = PgPoolOptions::new().acquire_timeout(self.connect_timeout);

        // Zero leaves the sqlx default in place.
        if self.max_open_conns > 0 {
            options = options.max_connections(self.max_open_conns);
        }
        if self.max_idle_conns > 0 {
            debug!(
                "Ignoring max_idle_conns={}: connections are opened on demand",
                self.max_idle_conns
            );
        }
        if !self.conn_max_lifetime.is_zero() {
            options = options.max_lifetime(self.conn_max_lifetime);
        }
        if !self.conn_max_idle_time.is_zero() {
            options = options.idle_timeout(self.conn_max_idle_time);
        }

        options
    }
}
