//! Config file discovery and loading.
//!
//! A config file is found in one of three ways, checked in order:
//!
//! 1. An **explicit** path, from the builder's `config_file()` or the config
//!    file flag given on the command line. It must exist and parse.
//! 2. A **fallback** path, the config file flag's default value. Loaded if it
//!    exists, skipped otherwise.
//! 3. A **search**: each [`SearchPath`] is resolved to a directory and checked
//!    for `{name}.{ext}` for every candidate format. Earlier directories take
//!    priority; the working directory is always searched last. Nothing found
//!    is not an error.
//!
//! TOML, JSON and YAML files are all read into a `toml::Table`, so later
//! layers do not care which format a file used.

use std::path::{Path, PathBuf};

use toml::{Table, Value};

use crate::error::MapflagError;
use crate::types::{ConfigFormat, SearchPath};

/// Everything needed to locate the config file for one parse.
#[derive(Debug, Clone)]
pub struct ConfigLookup<'a> {
    pub explicit: Option<PathBuf>,
    pub fallback: Option<PathBuf>,
    /// File name without extension, e.g. `"config"`.
    pub name: &'a str,
    pub paths: &'a [SearchPath],
    /// Fixed format; `None` tries every format and detects explicit files by
    /// extension.
    pub format: Option<ConfigFormat>,
    /// Used by [`SearchPath::Platform`].
    pub app_name: &'a str,
}

/// Resolve a [`SearchPath`] to a concrete directory.
///
/// Returns `None` if the path cannot be resolved (e.g. no home directory found).
pub fn resolve_search_path(sp: &SearchPath, app_name: &str) -> Option<PathBuf> {
    match sp {
        SearchPath::Platform => {
            let proj = directories::ProjectDirs::from("", "", app_name)?;
            Some(proj.config_dir().to_path_buf())
        }
        SearchPath::Home(subdir) => {
            let user = directories::UserDirs::new()?;
            Some(user.home_dir().join(subdir))
        }
        SearchPath::Cwd => std::env::current_dir().ok(),
        SearchPath::Path(p) => Some(p.clone()),
    }
}

/// Resolve all search paths, in priority order, with the working directory
/// appended.
pub fn expand_search_paths(search_paths: &[SearchPath], app_name: &str) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    for dir in search_paths
        .iter()
        .chain(std::iter::once(&SearchPath::Cwd))
        .filter_map(|sp| resolve_search_path(sp, app_name))
    {
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }
    dirs
}

/// Locate and load the config file described by `lookup`.
///
/// Returns the path that was read along with its contents as a table, or
/// `None` when no file is configured or found.
pub fn load_config(lookup: &ConfigLookup) -> Result<Option<(PathBuf, Table)>, MapflagError> {
    if let Some(path) = &lookup.explicit {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MapflagError::config_file(path.clone(), e))?;
        let table = parse_content(&content, format_of(path, lookup.format)?, path)?;
        return Ok(Some((path.clone(), table)));
    }

    if let Some(path) = &lookup.fallback
        && let Some(content) = read_optional(path)?
    {
        let table = parse_content(&content, format_of(path, lookup.format)?, path)?;
        return Ok(Some((path.clone(), table)));
    }

    let dirs = expand_search_paths(lookup.paths, lookup.app_name);
    match find_first(&dirs, lookup.name, lookup.format)? {
        Some((path, format, content)) => {
            let table = parse_content(&content, format, &path)?;
            Ok(Some((path, table)))
        }
        None => Ok(None),
    }
}

/// The first `{dir}/{name}.{ext}` that exists, searching directories in
/// order and formats in [`ConfigFormat::ALL`] order within each directory.
fn find_first(
    dirs: &[PathBuf],
    name: &str,
    format: Option<ConfigFormat>,
) -> Result<Option<(PathBuf, ConfigFormat, String)>, MapflagError> {
    let formats: &[ConfigFormat] = match &format {
        Some(f) => std::slice::from_ref(f),
        None => &ConfigFormat::ALL,
    };
    for dir in dirs {
        for format in formats {
            let file_path = dir.join(format!("{name}.{}", format.extension()));
            if let Some(content) = read_optional(&file_path)? {
                return Ok(Some((file_path, *format, content)));
            }
        }
    }
    Ok(None)
}

/// Read a file, mapping "not found" to `None`. Other I/O errors propagate.
fn read_optional(path: &Path) -> Result<Option<String>, MapflagError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(MapflagError::config_file(path, e)),
    }
}

fn format_of(path: &Path, fixed: Option<ConfigFormat>) -> Result<ConfigFormat, MapflagError> {
    fixed
        .or_else(|| ConfigFormat::from_path(path))
        .ok_or_else(|| MapflagError::config_file(path, "cannot determine config format"))
}

/// Parse file contents into a table.
pub fn parse_content(
    content: &str,
    format: ConfigFormat,
    path: &Path,
) -> Result<Table, MapflagError> {
    match format {
        ConfigFormat::Toml => {
            toml::from_str::<Table>(content).map_err(|e| MapflagError::config_file(path, e))
        }
        ConfigFormat::Json => {
            let json: serde_json::Value =
                serde_json::from_str(content).map_err(|e| MapflagError::config_file(path, e))?;
            match json_to_toml(json) {
                Some(Value::Table(table)) => Ok(table),
                _ => Err(MapflagError::config_file(
                    path,
                    "top-level JSON value must be an object",
                )),
            }
        }
        ConfigFormat::Yaml => {
            // Decoded through the JSON data model, so mapping keys must be strings.
            let yaml: serde_json::Value = serde_yaml_bw::from_str(content)
                .map_err(|e| MapflagError::config_file(path, e))?;
            match json_to_toml(yaml) {
                Some(Value::Table(table)) => Ok(table),
                None => Ok(Table::new()),
                Some(_) => Err(MapflagError::config_file(
                    path,
                    "top-level YAML value must be a mapping",
                )),
            }
        }
    }
}

/// Convert JSON (or YAML read as JSON) to TOML. `null` has no TOML counterpart and is dropped, both
/// as an object member and as an array element.
fn json_to_toml(value: serde_json::Value) -> Option<Value> {
    use serde_json::Value as Json;
    match value {
        Json::Null => None,
        Json::Bool(b) => Some(Value::Boolean(b)),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Some(Value::Integer(i)),
            None => n.as_f64().map(Value::Float),
        },
        Json::String(s) => Some(Value::String(s)),
        Json::Array(items) => Some(Value::Array(
            items.into_iter().filter_map(json_to_toml).collect(),
        )),
        Json::Object(map) => Some(Value::Table(
            map.into_iter()
                .filter_map(|(k, v)| json_to_toml(v).map(|v| (k, v)))
                .collect(),
        )),
    }
}
