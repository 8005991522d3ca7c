//! Flag synthesis: one typed `clap::Arg` per parameter.
//!
//! Flags are registered on the host's [`Command`] at runtime, so static keys
//! and discovered map keys (`--database.default.host`) share one parser and
//! one usage text. Wildcard parameters are registered too; their usage lines
//! (`--database.<dbkey>.host`) document the keys a user may invent.

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use toml::Value;

use crate::error::MapflagError;
use crate::schema::{ValueType, is_zero};
use crate::walk::Param;

/// The default a parameter's flag starts from: the destination's current value
/// if it is non-zero, else the declared default.
pub fn effective_default(param: &Param, current: Option<&Value>) -> Option<Value> {
    match current {
        Some(value) if !is_zero(value) => Some(value.clone()),
        _ => param.default.clone(),
    }
}

/// Register the flag for `param` on `cmd`.
pub fn register(
    cmd: Command,
    param: &Param,
    current: Option<&Value>,
) -> Result<Command, MapflagError> {
    let arg = build_arg(param, current)?;
    tracing::trace!(flag = %param.path, ty = %param.ty.name(), "registered flag");
    Ok(cmd.arg(arg))
}

/// Register the string flag naming an explicit config file.
pub fn register_config_file_arg(
    cmd: Command,
    long: &str,
    short: Option<char>,
    default: &str,
) -> Command {
    let mut arg = Arg::new(long.to_string())
        .long(long.to_string())
        .help("config file path")
        .value_name("string")
        .action(ArgAction::Set);
    if let Some(short) = short {
        arg = arg.short(short);
    }
    if !default.is_empty() {
        arg = arg.default_value(default.to_string());
    }
    cmd.arg(arg)
}

fn build_arg(param: &Param, current: Option<&Value>) -> Result<Arg, MapflagError> {
    let unsupported = || MapflagError::UnsupportedFlagType {
        path: param.path.clone(),
        kind: param.ty.name(),
    };

    let mut arg = Arg::new(param.path.clone())
        .long(param.path.clone())
        .help(param.description);
    if let Some(short) = param.short {
        arg = arg.short(short);
    }
    if let Some(group) = param.group {
        arg = arg.help_heading(group);
    }

    let arg = match &param.ty {
        ValueType::Bool => arg
            .value_parser(value_parser!(bool))
            .num_args(0..=1)
            .require_equals(true)
            .default_missing_value("true")
            .action(ArgAction::Set),
        ValueType::Int => arg
            .value_parser(value_parser!(i64))
            .allow_negative_numbers(true)
            .action(ArgAction::Set),
        ValueType::UInt => arg
            .value_parser(value_parser!(u64))
            .action(ArgAction::Set),
        ValueType::Float => arg
            .value_parser(value_parser!(f64))
            .allow_negative_numbers(true)
            .action(ArgAction::Set),
        ValueType::Str => arg
            .value_parser(value_parser!(String))
            .action(ArgAction::Set),
        ValueType::Seq(inner) => {
            let arg = match inner {
                ValueType::Bool => arg.value_parser(value_parser!(bool)),
                ValueType::Int => arg
                    .value_parser(value_parser!(i64))
                    .allow_negative_numbers(true),
                ValueType::UInt => arg.value_parser(value_parser!(u64)),
                ValueType::Float => arg
                    .value_parser(value_parser!(f64))
                    .allow_negative_numbers(true),
                ValueType::Str => arg.value_parser(value_parser!(String)),
                _ => return Err(unsupported()),
            };
            // Sequences always start empty.
            return Ok(arg
                .value_name(format!("{}s", inner.name()))
                .value_delimiter(',')
                .action(ArgAction::Append));
        }
        ValueType::Opaque(_) => return Err(unsupported()),
    };

    let arg = arg.value_name(param.ty.name());
    Ok(match effective_default(param, current) {
        Some(value) if !is_zero(&value) => arg.default_value(display(&value)),
        _ => arg,
    })
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Values of the parameters that were set on the command line.
///
/// Defaults registered on the flags are not reported; they take part in
/// resolution at the default tier instead.
pub fn explicit_values<'a>(
    matches: &ArgMatches,
    params: impl IntoIterator<Item = &'a Param>,
) -> Result<Vec<(String, Value)>, MapflagError> {
    let mut out = Vec::new();
    for param in params {
        if matches.value_source(&param.path) != Some(ValueSource::CommandLine) {
            continue;
        }
        out.push((param.path.clone(), read(matches, param)?));
    }
    Ok(out)
}

fn read(matches: &ArgMatches, param: &Param) -> Result<Value, MapflagError> {
    let id = param.path.as_str();
    let value = match &param.ty {
        ValueType::Seq(inner) => Some(Value::Array(read_many(matches, id, inner)?)),
        scalar => read_one(matches, id, scalar)?,
    };
    value.ok_or_else(|| MapflagError::decode(id, "flag was set without a value"))
}

fn read_one(
    matches: &ArgMatches,
    id: &str,
    ty: &ValueType,
) -> Result<Option<Value>, MapflagError> {
    let err = |e: clap::parser::MatchesError| MapflagError::decode(id, e);
    Ok(match ty {
        ValueType::Bool => matches
            .try_get_one::<bool>(id)
            .map_err(err)?
            .map(|b| Value::Boolean(*b)),
        ValueType::Int => matches
            .try_get_one::<i64>(id)
            .map_err(err)?
            .map(|i| Value::Integer(*i)),
        ValueType::UInt => matches
            .try_get_one::<u64>(id)
            .map_err(err)?
            .map(|u| unsigned(id, *u))
            .transpose()?,
        ValueType::Float => matches
            .try_get_one::<f64>(id)
            .map_err(err)?
            .map(|f| Value::Float(*f)),
        ValueType::Str => matches
            .try_get_one::<String>(id)
            .map_err(err)?
            .map(|s| Value::String(s.clone())),
        _ => None,
    })
}

fn read_many(
    matches: &ArgMatches,
    id: &str,
    inner: &ValueType,
) -> Result<Vec<Value>, MapflagError> {
    let err = |e: clap::parser::MatchesError| MapflagError::decode(id, e);
    let values: Option<Vec<Value>> = match inner {
        ValueType::Bool => matches
            .try_get_many::<bool>(id)
            .map_err(err)?
            .map(|vals| vals.map(|b| Value::Boolean(*b)).collect()),
        ValueType::Int => matches
            .try_get_many::<i64>(id)
            .map_err(err)?
            .map(|vals| vals.map(|i| Value::Integer(*i)).collect()),
        ValueType::UInt => matches
            .try_get_many::<u64>(id)
            .map_err(err)?
            .map(|vals| vals.map(|u| unsigned(id, *u)).collect::<Result<Vec<_>, _>>())
            .transpose()?,
        ValueType::Float => matches
            .try_get_many::<f64>(id)
            .map_err(err)?
            .map(|vals| vals.map(|f| Value::Float(*f)).collect()),
        ValueType::Str => matches
            .try_get_many::<String>(id)
            .map_err(err)?
            .map(|vals| vals.map(|s| Value::String(s.clone())).collect()),
        _ => None,
    };
    Ok(values.unwrap_or_default())
}

fn unsigned(id: &str, value: u64) -> Result<Value, MapflagError> {
    i64::try_from(value)
        .map(Value::Integer)
        .map_err(|_| MapflagError::decode(id, format!("{value} is out of range")))
}
