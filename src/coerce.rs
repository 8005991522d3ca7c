//! Weakly typed conversion of raw values into a field's declared type.
//!
//! Sources disagree on how they represent values: flags arrive typed, env vars
//! are always strings, and config files may quote numbers. Every value passes
//! through [`coerce`] before decoding so that `"3306"` fills an integer field
//! and `8080` fills a string field.

use toml::Value;

use crate::error::MapflagError;
use crate::schema::ValueType;

/// Convert `value` to the representation of `ty`. `path` names the key in errors.
pub fn coerce(value: Value, ty: &ValueType, path: &str) -> Result<Value, MapflagError> {
    match ty {
        ValueType::Bool => match value {
            Value::Boolean(_) => Ok(value),
            Value::Integer(0) => Ok(Value::Boolean(false)),
            Value::Integer(1) => Ok(Value::Boolean(true)),
            Value::String(s) => parse_bool(&s)
                .map(Value::Boolean)
                .ok_or_else(|| MapflagError::decode(path, format!("'{s}' is not a bool"))),
            other => Err(mismatch(path, ty, &other)),
        },
        ValueType::Int => match value {
            Value::Integer(_) => Ok(value),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|e| MapflagError::decode(path, format!("'{s}': {e}"))),
            other => Err(mismatch(path, ty, &other)),
        },
        ValueType::UInt => {
            let value = coerce(value, &ValueType::Int, path)?;
            match value {
                Value::Integer(i) if i < 0 => Err(MapflagError::decode(
                    path,
                    format!("{i} is negative but the field is unsigned"),
                )),
                other => Ok(other),
            }
        }
        ValueType::Float => match value {
            Value::Float(_) => Ok(value),
            Value::Integer(i) => Ok(Value::Float(i as f64)),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| MapflagError::decode(path, format!("'{s}': {e}"))),
            other => Err(mismatch(path, ty, &other)),
        },
        ValueType::Str => match value {
            Value::String(_) => Ok(value),
            Value::Integer(i) => Ok(Value::String(i.to_string())),
            Value::Float(f) => Ok(Value::String(f.to_string())),
            Value::Boolean(b) => Ok(Value::String(b.to_string())),
            Value::Datetime(d) => Ok(Value::String(d.to_string())),
            other => Err(mismatch(path, ty, &other)),
        },
        ValueType::Seq(inner) => {
            let items = match value {
                Value::Array(items) => items,
                Value::String(s) => split_list(&s),
                Value::Table(_) => return Err(mismatch(path, ty, &value)),
                scalar => vec![scalar],
            };
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| coerce(item, inner, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        ValueType::Opaque(_) => Ok(value),
    }
}

/// Parse a raw string (env var or flag text) as `ty`.
pub fn parse_raw(raw: &str, ty: &ValueType, path: &str) -> Result<Value, MapflagError> {
    coerce(Value::String(raw.to_string()), ty, path)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Some(true),
        "false" | "f" | "0" => Some(false),
        _ => None,
    }
}

fn split_list(s: &str) -> Vec<Value> {
    if s.trim().is_empty() {
        return Vec::new();
    }
    s.split(',')
        .map(|item| Value::String(item.trim().to_string()))
        .collect()
}

fn mismatch(path: &str, ty: &ValueType, value: &Value) -> MapflagError {
    MapflagError::decode(
        path,
        format!("expected {}, found {}", ty.name(), value.type_str()),
    )
}
