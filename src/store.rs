//! The resolved key store: a nested `toml::Table` built up layer by layer.
//!
//! Layers are applied in ascending precedence. Each layer is sparse and is
//! deep-merged over what is already there, so a later layer only replaces the
//! keys it actually carries.

use toml::{Table, Value};

use crate::error::MapflagError;
use crate::schema::is_zero;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyStore {
    table: Table,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deep-merge a whole table over the store.
    pub fn apply(&mut self, layer: Table) {
        let base = std::mem::take(&mut self.table);
        self.table = deep_merge(base, layer);
    }

    /// Apply dotted-key entries as one layer. Later entries for the same key win.
    pub fn apply_entries(&mut self, entries: &[(String, Value)]) -> Result<(), MapflagError> {
        let mut layer = Table::new();
        for (key, value) in entries {
            set_nested(&mut layer, key, value.clone())?;
        }
        self.apply(layer);
        Ok(())
    }

    #[cfg(test)]
    pub fn get(&self, dotted_key: &str) -> Option<&Value> {
        let mut segments = dotted_key.split('.');
        let first = segments.next()?;
        segments.try_fold(self.table.get(first)?, |value, segment| {
            value.as_table()?.get(segment)
        })
    }

    pub fn into_table(self) -> Table {
        self.table
    }
}

/// Deep-merge `overlay` on top of `base`.
/// If both sides have a Table for the same key, recurse.
/// Otherwise, `overlay`'s value wins.
pub fn deep_merge(mut base: Table, overlay: Table) -> Table {
    for (key, overlay_val) in overlay {
        match (base.remove(&key), overlay_val) {
            (Some(Value::Table(base_tbl)), Value::Table(overlay_tbl)) => {
                base.insert(key, Value::Table(deep_merge(base_tbl, overlay_tbl)));
            }
            (_, overlay_val) => {
                base.insert(key, overlay_val);
            }
        }
    }
    base
}

/// Set `a.b.c = value`, creating intermediate tables.
///
/// A scalar sitting where an intermediate table is needed is a conflict
/// (`a = 1` then `a.b = 2`) and reported as a decode error on the full key.
pub fn set_nested(table: &mut Table, dotted_key: &str, value: Value) -> Result<(), MapflagError> {
    let Some((parents, leaf)) = dotted_key.rsplit_once('.') else {
        table.insert(dotted_key.to_string(), value);
        return Ok(());
    };

    let mut current = table;
    for segment in parents.split('.') {
        current = current
            .entry(segment)
            .or_insert_with(|| Value::Table(Table::new()))
            .as_table_mut()
            .ok_or_else(|| {
                MapflagError::decode(dotted_key, format!("'{segment}' is not a table"))
            })?;
    }
    current.insert(leaf.to_string(), value);
    Ok(())
}

/// Drop zero-valued leaves at every depth, and tables left empty by that.
/// Keys are kept whole, so a map key containing `.` survives.
pub fn non_zero(table: Table) -> Table {
    table
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Table(inner) => {
                let inner = non_zero(inner);
                (!inner.is_empty()).then(|| (key, Value::Table(inner)))
            }
            other => (!is_zero(&other)).then_some((key, other)),
        })
        .collect()
}

/// Flatten a nested table into dotted-key pairs. Arrays count as leaves.
pub fn flatten(table: &Table) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    flatten_into(table, "", &mut out);
    out
}

fn flatten_into(table: &Table, prefix: &str, out: &mut Vec<(String, Value)>) {
    for (key, value) in table {
        let dotted = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Table(inner) => flatten_into(inner, &dotted, out),
            other => out.push((dotted, other.clone())),
        }
    }
}
