//! The `ocli.yml` settings file.
//!
//! Settings are loaded once at startup and handed to every command by
//! reference. A missing file is not an error: the built-in defaults point at
//! the conventional `/workspace` layout.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, ConfigResult};

pub const DEFAULT_SETTINGS_FILE: &str = "ocli.yml";

/// Written by `ocli init`.
pub const DEFAULT_SETTINGS_TEMPLATE: &str = "odoo:
  config_file: /workspace/odoo.conf
  odoo_bin: /workspace/odoo/odoo-bin
  addons:
    - /workspace/odoo/addons
    - /workspace/enterprise
    - /workspace/custom-addons
  shutdown_timeout: 10s

db:
  dump_path: /workspace/dbs
  dump_format: zip

postgres:
  ssl_mode: disable
  max_open_conns: 25
  max_idle_conns: 5
  conn_max_lifetime: 5m
  conn_max_idle_time: 1m
  connect_timeout: 10s
";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub odoo: OdooSection,
    pub db: DbSection,
    pub postgres: PostgresSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OdooSection {
    pub config_file: PathBuf,
    pub odoo_bin: PathBuf,
    pub addons: Vec<String>,
    /// Grace period between SIGTERM and SIGKILL when `ocli start` stops.
    #[serde(with = "duration_str")]
    pub shutdown_timeout: Duration,
}

impl Default for OdooSection {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from("/workspace/odoo.conf"),
            odoo_bin: PathBuf::from("/workspace/odoo/odoo-bin"),
            addons: Vec::new(),
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbSection {
    pub dump_path: PathBuf,
    pub dump_format: String,
}

impl Default for DbSection {
    fn default() -> Self {
        Self {
            dump_path: PathBuf::from("/workspace/dbs"),
            dump_format: "zip".to_string(),
        }
    }
}

/// Connection pool tuning for the direct PostgreSQL client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostgresSection {
    pub ssl_mode: String,
    pub max_open_conns: u32,
    pub max_idle_conns: u32,
    #[serde(with = "duration_str")]
    pub conn_max_lifetime: Duration,
    #[serde(with = "duration_str")]
    pub conn_max_idle_time: Duration,
    #[serde(with = "duration_str")]
    pub connect_timeout: Duration,
}

impl Default for PostgresSection {
    fn default() -> Self {
        Self {
            ssl_mode: "disable".to_string(),
            max_open_conns: 25,
            max_idle_conns: 5,
            conn_max_lifetime: Duration::from_secs(5 * 60),
            conn_max_idle_time: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            log::info!(
                "No settings file at {}, using built-in defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes to unit, not to a mapping.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Write the default settings template to `path`. Refuses to overwrite.
    pub fn write_template(path: &Path) -> ConfigResult<()> {
        if path.exists() {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }
        fs::write(path, DEFAULT_SETTINGS_TEMPLATE).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Durations in humantime notation (`10s`, `5m`, `1h 30m`).
mod duration_str {
    use std::time::Duration;

    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("ocli.yml")).unwrap();

        assert_eq!(settings, Settings::default());
        assert_eq!(
            settings.odoo.config_file,
            PathBuf::from("/workspace/odoo.conf")
        );
        assert!(settings.odoo.addons.is_empty());
        assert_eq!(settings.db.dump_format, "zip");
    }

    #[test]
    fn test_template_round_trips_through_loader() {
        let settings = Settings::from_yaml(DEFAULT_SETTINGS_TEMPLATE).unwrap();

        assert_eq!(
            settings.odoo.odoo_bin,
            PathBuf::from("/workspace/odoo/odoo-bin")
        );
        assert_eq!(
            settings.odoo.addons,
            vec![
                "/workspace/odoo/addons",
                "/workspace/enterprise",
                "/workspace/custom-addons"
            ]
        );
        assert_eq!(settings.db.dump_path, PathBuf::from("/workspace/dbs"));
        assert_eq!(settings.postgres, PostgresSection::default());
        assert_eq!(settings.odoo.shutdown_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_absent_keys() {
        let yaml = "odoo:\n  odoo_bin: /opt/odoo/odoo-bin\ndb:\n  dump_format: dump\n";
        let settings = Settings::from_yaml(yaml).unwrap();

        assert_eq!(settings.odoo.odoo_bin, PathBuf::from("/opt/odoo/odoo-bin"));
        assert_eq!(
            settings.odoo.config_file,
            PathBuf::from("/workspace/odoo.conf")
        );
        assert_eq!(settings.db.dump_format, "dump");
        assert_eq!(settings.db.dump_path, PathBuf::from("/workspace/dbs"));
    }

    #[test]
    fn test_humantime_durations() {
        let yaml = "postgres:\n  conn_max_lifetime: 90s\n  connect_timeout: 2m\n";
        let settings = Settings::from_yaml(yaml).unwrap();

        assert_eq!(
            settings.postgres.conn_max_lifetime,
            Duration::from_secs(90)
        );
        assert_eq!(settings.postgres.connect_timeout, Duration::from_secs(120));
        assert!(Settings::from_yaml("postgres:\n  connect_timeout: soon\n").is_err());
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ocli.yml");
        fs::write(&path, "odoo: [unclosed").unwrap();

        assert!(matches!(
            Settings::load(&path),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn test_write_template_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ocli.yml");

        Settings::write_template(&path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            DEFAULT_SETTINGS_TEMPLATE
        );
        assert!(matches!(
            Settings::write_template(&path),
            Err(ConfigError::AlreadyExists(_))
        ));
    }
}
