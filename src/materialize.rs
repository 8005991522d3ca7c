//! Materializer: turn the merged key store into the destination type.
//!
//! Three passes over the merged table:
//!
//! 1. Strip every key that still contains a wildcard token. Such keys come from
//!    a user literally passing `--database.<dbkey>.host` or a file written
//!    against the usage text, and must never become a map entry.
//! 2. Fill the table against the schema: absent leaves get their declared
//!    default (or the zero value of their type), present leaves are coerced to
//!    their declared type, and every map entry is filled with the element
//!    schema so runtime-named sections get their defaults too.
//! 3. Decode the table into `C` with serde.

use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use toml::{Table, Value};

use crate::coerce::coerce;
use crate::error::MapflagError;
use crate::schema::{Field, FieldKind, Meta, Schema};

/// Remove every key containing any of `tokens`, at every depth.
pub fn strip_tokens(table: &mut Table, tokens: &BTreeSet<String>) {
    let doomed: Vec<String> = table
        .keys()
        .filter(|key| tokens.iter().any(|t| key.contains(t.as_str())))
        .cloned()
        .collect();
    for key in doomed {
        table.remove(&key);
    }
    for (_, value) in table.iter_mut() {
        if let Value::Table(inner) = value {
            strip_tokens(inner, tokens);
        }
    }
}

/// Fill `table` in place so it holds a complete, correctly typed value for
/// every exported field of `meta`.
pub fn fill(table: &mut Table, meta: &Meta, prefix: &str) -> Result<(), MapflagError> {
    for field in meta.fields {
        if !field.exported {
            table.remove(field.name);
            continue;
        }
        let path = if prefix.is_empty() {
            field.name.to_string()
        } else {
            format!("{prefix}.{}", field.name)
        };

        match &field.kind {
            FieldKind::Leaf(ty) => {
                let value = match table.remove(field.name) {
                    Some(value) => coerce(value, ty, &path)?,
                    None => absent_leaf(field, &path)?,
                };
                table.insert(field.name.to_string(), value);
            }
            FieldKind::Nested(inner) => {
                fill(child_table(table, field.name, &path)?, inner, &path)?;
            }
            FieldKind::Map(inner) => {
                let entries = child_table(table, field.name, &path)?;
                for (key, entry) in entries.iter_mut() {
                    let entry_path = format!("{path}.{key}");
                    match entry {
                        Value::Table(entry) => fill(entry, inner, &entry_path)?,
                        other => {
                            return Err(MapflagError::decode(
                                entry_path,
                                format!("expected a table, found {}", other.type_str()),
                            ));
                        }
                    }
                }
            }
            FieldKind::ValueMap(ty) => {
                let entries = child_table(table, field.name, &path)?;
                for (key, entry) in entries.iter_mut() {
                    let value = std::mem::replace(entry, Value::Boolean(false));
                    *entry = coerce(value, ty, &format!("{path}.{key}"))?;
                }
            }
        }
    }
    Ok(())
}

fn absent_leaf(field: &Field, path: &str) -> Result<Value, MapflagError> {
    let FieldKind::Leaf(ty) = &field.kind else {
        return Err(MapflagError::decode(path, "not a leaf"));
    };
    match field.default {
        Some(default) if !field.hidden => coerce(default.to_value(), ty, path),
        _ => Ok(ty.zero()),
    }
}

fn child_table<'t>(
    table: &'t mut Table,
    name: &str,
    path: &str,
) -> Result<&'t mut Table, MapflagError> {
    let value = table
        .entry(name)
        .or_insert_with(|| Value::Table(Table::new()));
    match value {
        Value::Table(inner) => Ok(inner),
        other => Err(MapflagError::decode(
            path,
            format!("expected a table, found {}", other.type_str()),
        )),
    }
}

/// Strip, fill and decode `table` into `C`.
pub fn materialize<C>(mut table: Table, tokens: &BTreeSet<String>) -> Result<C, MapflagError>
where
    C: Schema + DeserializeOwned,
{
    strip_tokens(&mut table, tokens);
    fill(&mut table, &C::META, "")?;
    Value::Table(table)
        .try_into::<C>()
        .map_err(|e| MapflagError::decode(C::META.name, e))
}
