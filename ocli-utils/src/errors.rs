//! Configuration error types shared by the settings loader and the
//! config-file editors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or rewriting configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("malformed settings file {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{path} must contain a JSON object at the top level")]
    NotAnObject { path: PathBuf },

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("missing database parameters in {path}: {}", .missing.join(", "))]
    MissingDbParams {
        path: PathBuf,
        missing: Vec<&'static str>,
    },

    #[error("config file {0} already exists")]
    AlreadyExists(PathBuf),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_params_lists_every_key() {
        let err = ConfigError::MissingDbParams {
            path: PathBuf::from("/etc/odoo.conf"),
            missing: vec!["db_host", "db_password"],
        };
        let msg = err.to_string();
        assert!(msg.contains("/etc/odoo.conf"));
        assert!(msg.contains("db_host, db_password"));
    }
}
