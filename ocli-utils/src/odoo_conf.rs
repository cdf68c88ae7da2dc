//! Reading and rewriting the server's INI-style `odoo.conf`.

use std::fs;
use std::path::Path;

use crate::errors::{ConfigError, ConfigResult};

const ADDONS_PATH_KEY: &str = "addons_path";

/// Database connection parameters as declared in `odoo.conf`.
///
/// Every field is optional here; command-line overrides are merged in before
/// [`DbParams::require`] turns the set into a complete connection target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbParams {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
}

/// A fully specified connection target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDbParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl DbParams {
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> ConfigResult<Self> {
        let mut params = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty()
                || line.starts_with(';')
                || line.starts_with('#')
                || (line.starts_with('[') && line.ends_with(']'))
            {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "db_host" => params.host = Some(value.to_string()),
                "db_port" => {
                    let port = value.parse().map_err(|_| ConfigError::InvalidValue {
                        key: "db_port",
                        value: value.to_string(),
                    })?;
                    params.port = Some(port);
                }
                "db_user" => params.user = Some(value.to_string()),
                "db_password" => params.password = Some(value.to_string()),
                _ => {}
            }
        }

        Ok(params)
    }

    /// Overlay `other` on top of `self`; set fields in `other` win.
    pub fn merge(self, other: DbParams) -> Self {
        Self {
            host: other.host.or(self.host),
            port: other.port.or(self.port),
            user: other.user.or(self.user),
            password: other.password.or(self.password),
        }
    }

    /// Fail with every missing key named when the set is incomplete.
    /// `source` is the file reported in the error.
    pub fn require(self, source: &Path) -> ConfigResult<ResolvedDbParams> {
        let mut missing = Vec::new();
        let host = non_empty(self.host);
        let user = non_empty(self.user);
        let password = non_empty(self.password);
        let port = self.port.filter(|port| *port != 0);

        if host.is_none() {
            missing.push("db_host");
        }
        if port.is_none() {
            missing.push("db_port");
        }
        if user.is_none() {
            missing.push("db_user");
        }
        if password.is_none() {
            missing.push("db_password");
        }

        match (host, port, user, password) {
            (Some(host), Some(port), Some(user), Some(password)) => Ok(ResolvedDbParams {
                host,
                port,
                user,
                password,
            }),
            _ => Err(ConfigError::MissingDbParams {
                path: source.to_path_buf(),
                missing,
            }),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Replace the first `addons_path` line, or append one, leaving every other
/// line untouched and in order.
pub fn set_addons_path(content: &str, addons: &[String]) -> String {
    let new_line = format!("{} = {}", ADDONS_PATH_KEY, addons.join(","));
    let mut lines: Vec<&str> = content.split('\n').collect();

    match lines
        .iter()
        .position(|line| line.trim().starts_with(ADDONS_PATH_KEY))
    {
        Some(idx) => lines[idx] = new_line.as_str(),
        // Keep a trailing newline at the end of the file.
        None if lines.last() == Some(&"") => {
            let idx = lines.len() - 1;
            lines.insert(idx, new_line.as_str());
        }
        None => lines.push(new_line.as_str()),
    }

    lines.join("\n")
}

pub fn update_addons_path(path: &Path, addons: &[String]) -> ConfigResult<()> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, set_addons_path(&content, addons)).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_db_params() {
        let conf = "[options]\n; comment\n# other comment\n\ndb_host = localhost\ndb_port = 5433\ndb_user = odoo\ndb_password = s3cr=t\nhttp_port = 8069\n";
        let params = DbParams::parse(conf).unwrap();

        assert_eq!(params.host.as_deref(), Some("localhost"));
        assert_eq!(params.port, Some(5433));
        assert_eq!(params.user.as_deref(), Some("odoo"));
        // Only the first '=' separates key and value.
        assert_eq!(params.password.as_deref(), Some("s3cr=t"));
    }

    #[test]
    fn test_parse_rejects_non_numeric_port() {
        let err = DbParams::parse("db_port = five").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key: "db_port", .. }
        ));
    }

    #[test]
    fn test_require_names_missing_keys() {
        let params = DbParams::parse("db_host = localhost\ndb_user = odoo\n").unwrap();
        match params.require(Path::new("odoo.conf")) {
            Err(ConfigError::MissingDbParams { missing, .. }) => {
                assert_eq!(missing, vec!["db_port", "db_password"]);
            }
            other => panic!("Expected MissingDbParams, got {:?}", other),
        }
    }

    #[test]
    fn test_merge_prefers_overrides() {
        let file = DbParams::parse("db_host = db\ndb_port = 5432\ndb_user = odoo\ndb_password = odoo\n")
            .unwrap();
        let overrides = DbParams {
            host: Some("127.0.0.1".to_string()),
            port: Some(6543),
            ..Default::default()
        };
        let resolved = file.merge(overrides).require(Path::new("odoo.conf")).unwrap();

        assert_eq!(resolved.host, "127.0.0.1");
        assert_eq!(resolved.port, 6543);
        assert_eq!(resolved.user, "odoo");
    }

    #[test]
    fn test_set_addons_path_replaces_existing_line() {
        let conf = "[options]\naddons_path = /a,/b\ndb_host = localhost\n";
        let updated = set_addons_path(conf, &paths(&["/c", "/d"]));

        assert_eq!(
            updated,
            "[options]\naddons_path = /c,/d\ndb_host = localhost\n"
        );
        assert_eq!(
            updated
                .lines()
                .filter(|l| l.trim().starts_with("addons_path"))
                .count(),
            1
        );
    }

    #[test]
    fn test_set_addons_path_matches_indented_line_once() {
        let conf = "  addons_path=/old\naddons_path = /second\n";
        let updated = set_addons_path(conf, &paths(&["/new"]));
        assert_eq!(updated, "addons_path = /new\naddons_path = /second\n");
    }

    #[test]
    fn test_set_addons_path_appends_when_absent() {
        assert_eq!(
            set_addons_path("[options]\ndb_host = x\n", &paths(&["/a"])),
            "[options]\ndb_host = x\naddons_path = /a\n"
        );
        assert_eq!(
            set_addons_path("[options]", &paths(&["/a", "/b"])),
            "[options]\naddons_path = /a,/b"
        );
    }

    #[test]
    fn test_update_addons_path_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("odoo.conf");
        fs::write(&path, "[options]\naddons_path = /a,/b\nlogfile = False\n").unwrap();

        update_addons_path(&path, &paths(&["/c", "/d"])).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "[options]\naddons_path = /c,/d\nlogfile = False\n"
        );
    }

    #[test]
    fn test_update_addons_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = update_addons_path(&dir.path().join("missing.conf"), &paths(&["/a"]));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
