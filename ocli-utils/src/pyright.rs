//! Keeps `extraPaths` in `pyrightconfig.json` in step with the addon list.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Map, Value};

use crate::errors::{ConfigError, ConfigResult};

pub const PYRIGHT_CONFIG_FILE: &str = "pyrightconfig.json";
const EXTRA_PATHS_KEY: &str = "extraPaths";

/// Split comma-joined entries, trim them, and drop the empty ones.
pub fn clean_paths(addons: &[String]) -> Vec<String> {
    addons
        .iter()
        .flat_map(|entry| entry.split(','))
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(str::to_string)
        .collect()
}

/// Return `content` with `extraPaths` replaced, rendered with 4-space indentation.
pub fn set_extra_paths(path: &Path, content: &str, addons: &[String]) -> ConfigResult<String> {
    let value: Value = serde_json::from_str(content).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config: Map<String, Value> = match value {
        Value::Object(map) => map,
        _ => {
            return Err(ConfigError::NotAnObject {
                path: path.to_path_buf(),
            })
        }
    };

    let extra_paths = clean_paths(addons).into_iter().map(Value::String).collect();
    config.insert(EXTRA_PATHS_KEY.to_string(), Value::Array(extra_paths));

    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    config
        .serialize(&mut serializer)
        .map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    // serde_json only ever emits UTF-8.
    Ok(String::from_utf8_lossy(&out).into_owned())
}

pub fn update_extra_paths(path: &Path, addons: &[String]) -> ConfigResult<()> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let updated = set_extra_paths(path, &content, addons)?;
    fs::write(path, updated).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}
