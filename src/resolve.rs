//! Core resolution pipeline: discover keys, parse flags, layer every source
//! and produce a typed config.
//!
//! Operates on pre-loaded arguments and environment (`ResolveInput`); the only
//! I/O is reading the config file. Steps:
//!
//! 1. Walk the schema into the parameter table
//! 2. Register the config file flag and one flag per parameter
//! 3. Discover concrete map keys from argument and environment names, and
//!    register a flag for each
//! 4. Parse the arguments
//! 5. Load the config file
//! 6. Layer defaults < file < environment < explicit flags
//! 7. Materialize into `C`

use std::collections::HashMap;
use std::path::PathBuf;

use clap::Command;
use clap::parser::ValueSource;
use serde::Serialize;
use serde::de::DeserializeOwned;
use toml::{Table, Value};

use crate::env::{EnvScheme, env_values};
use crate::error::MapflagError;
use crate::file::{ConfigLookup, load_config};
use crate::flags::{explicit_values, register, register_config_file_arg};
use crate::materialize::materialize;
use crate::matcher::{discover, flag_name};
use crate::schema::Schema;
use crate::store::{KeyStore, flatten, non_zero};
use crate::types::{ConfigFormat, SearchPath};
use crate::walk::{DEFAULT_MAP_KEY, Param, normalize_token, walk};

/// The flag naming an explicit config file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigArg {
    pub long: String,
    pub short: Option<char>,
    /// Tried when the flag is not given; a missing file is then not an error.
    pub default: String,
}

/// Engine settings that stay fixed across parses.
#[derive(Debug, Clone)]
pub struct Settings {
    pub map_key: String,
    /// `None` disables the environment source.
    pub env: Option<EnvScheme>,
    pub config_arg: Option<ConfigArg>,
    pub config_file: Option<PathBuf>,
    pub config_name: String,
    pub search_paths: Vec<SearchPath>,
    pub config_format: Option<ConfigFormat>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            map_key: DEFAULT_MAP_KEY.into(),
            env: Some(EnvScheme::default()),
            config_arg: None,
            config_file: None,
            config_name: "config".into(),
            search_paths: Vec::new(),
            config_format: None,
        }
    }
}

/// Per-parse inputs. No I/O happens here.
pub struct ResolveInput {
    /// The host's command, before any config flag is added.
    pub command: Command,
    /// Arguments without the binary name.
    pub args: Vec<String>,
    /// Raw environment variable pairs (pass `std::env::vars().collect()` or synthetic data).
    pub env_vars: Vec<(String, String)>,
}

/// The outcome of one parse: the typed config and the command its flags were
/// parsed with, for usage rendering.
pub struct Resolved<C> {
    pub config: C,
    pub command: Command,
}

/// Resolve configuration for `C`, treating `current` as the lowest layer above
/// declared defaults.
pub fn resolve<C>(
    settings: &Settings,
    input: ResolveInput,
    current: &C,
) -> Result<Resolved<C>, MapflagError>
where
    C: Schema + Serialize + DeserializeOwned,
{
    let token = normalize_token(&settings.map_key)?;
    let table = walk(&C::META, &token)?;
    let preset = current_table(current)?;
    let current: HashMap<String, Value> = flatten(&preset).into_iter().collect();

    // 1-2: Static and wildcard flags
    let mut cmd = input.command;
    if let Some(arg) = &settings.config_arg {
        cmd = register_config_file_arg(cmd, &arg.long, arg.short, &arg.default);
    }
    for param in table.iter() {
        cmd = register_once(cmd, param, current.get(&param.path))?;
    }

    // 3: Discovery over argument names, then environment names
    let arg_names = input.args.iter().filter_map(|a| flag_name(a));
    let env_names: Vec<String> = match &settings.env {
        Some(scheme) => input
            .env_vars
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .filter_map(|(k, _)| scheme.candidate(k))
            .chain(scheme.bound_keys(&input.env_vars))
            .collect(),
        None => Vec::new(),
    };
    let discovered = discover(
        arg_names
            .map(str::to_string)
            .chain(env_names),
        &table,
    );
    for param in &discovered {
        cmd = register_once(cmd, param, current.get(&param.path))?;
    }

    // 4: Parse
    let argv = std::iter::once(cmd.get_name().to_string()).chain(input.args);
    let matches = cmd.try_get_matches_from_mut(argv)?;

    // 5: Config file
    let (explicit, fallback) = match &settings.config_arg {
        Some(arg) => match matches.value_source(&arg.long) {
            Some(ValueSource::CommandLine) => (
                matches
                    .try_get_one::<String>(&arg.long)
                    .map_err(|e| MapflagError::decode(arg.long.as_str(), e))?
                    .map(PathBuf::from),
                None,
            ),
            _ => (
                settings.config_file.clone(),
                (!arg.default.is_empty()).then(|| PathBuf::from(&arg.default)),
            ),
        },
        None => (settings.config_file.clone(), None),
    };
    let loaded = load_config(&ConfigLookup {
        explicit,
        fallback,
        name: &settings.config_name,
        paths: &settings.search_paths,
        format: settings.config_format,
        app_name: cmd.get_name(),
    })?;

    // 6: Layers, lowest first
    let concrete: Vec<&Param> = table
        .iter()
        .filter(|p| !p.is_wildcard())
        .chain(discovered.iter())
        .collect();

    let mut store = KeyStore::new();
    let defaults: Vec<(String, Value)> = concrete
        .iter()
        .filter_map(|p| p.default.clone().map(|d| (p.path.clone(), d)))
        .collect();
    store.apply_entries(&defaults)?;
    store.apply(non_zero(preset));

    if let Some((path, file_table)) = loaded {
        tracing::debug!(path = %path.display(), keys = file_table.len(), "loaded config file");
        store.apply(file_table);
    }

    if let Some(scheme) = &settings.env {
        let env = env_values(scheme, concrete.iter().copied(), &input.env_vars)?;
        tracing::debug!(count = env.len(), "environment layer");
        store.apply_entries(&env)?;
    }

    let flags = explicit_values(&matches, table.iter().chain(discovered.iter()))?;
    tracing::debug!(count = flags.len(), "flag layer");
    store.apply_entries(&flags)?;

    // 7: Materialize
    let mut tokens = table.tokens();
    tokens.insert(token);
    let config = materialize::<C>(store.into_table(), &tokens)?;
    Ok(Resolved {
        config,
        command: cmd,
    })
}

/// The destination's values as a table.
fn current_table<C: Schema + Serialize>(current: &C) -> Result<Table, MapflagError> {
    let value = Value::try_from(current).map_err(|e| MapflagError::decode(C::META.name, e))?;
    Ok(match value {
        Value::Table(t) => t,
        _ => Table::new(),
    })
}

fn register_once(
    cmd: Command,
    param: &Param,
    current: Option<&Value>,
) -> Result<Command, MapflagError> {
    if cmd.get_arguments().any(|a| a.get_id() == param.path.as_str()) {
        tracing::debug!(flag = %param.path, "flag already defined by the host command");
        return Ok(cmd);
    }
    register(cmd, param, current)
}
