//! Descriptor walker: flatten a [`Meta`] tree into a table of leaf parameters.
//!
//! Every visible leaf becomes one [`Param`] keyed by its dotted path. Map fields
//! contribute the leaves of a single synthetic element under a wildcard
//! segment, e.g. `database.<dbkey>.host`; the concrete keys are discovered
//! later from the actual arguments and environment (see [`matcher`](crate::matcher)).

use std::collections::BTreeSet;

use toml::Value;

use crate::coerce::coerce;
use crate::error::MapflagError;
use crate::schema::{FieldKind, Meta, ValueType};

/// The token standing for an unresolved map key when no field declares its own.
pub const DEFAULT_MAP_KEY: &str = "<mapkey>";

/// One leaf of the configuration schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Dotted path, possibly containing wildcard segments.
    pub path: String,
    pub short: Option<char>,
    pub description: &'static str,
    pub group: Option<&'static str>,
    pub ty: ValueType,
    /// Declared default, already converted to `ty`.
    pub default: Option<Value>,
    /// Token of the innermost map level above this leaf.
    pub map_key: Option<String>,
    /// Tokens of every map level above this leaf, outermost first.
    pub tokens: Vec<String>,
}

impl Param {
    /// Whether the path still contains an unresolved map key.
    pub fn is_wildcard(&self) -> bool {
        self.path
            .split('.')
            .any(|segment| self.tokens.iter().any(|t| t == segment))
    }

    /// A copy of this parameter bound to a concrete path.
    ///
    /// The short alias stays with the wildcard parameter; a concrete key never
    /// claims it.
    pub fn resolved(&self, path: &str) -> Param {
        Param {
            path: path.to_string(),
            short: None,
            ..self.clone()
        }
    }
}

/// Flat parameter table in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ParamTable {
    params: Vec<Param>,
}

impl ParamTable {
    pub fn get(&self, path: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.path == path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Every wildcard token used anywhere in the table.
    pub fn tokens(&self) -> BTreeSet<String> {
        self.params
            .iter()
            .flat_map(|p| p.tokens.iter().cloned())
            .collect()
    }

    pub(crate) fn push(&mut self, param: Param) {
        self.params.push(param);
    }
}

/// Normalize a wildcard token: wrap it in `<`…`>` and reject dots.
pub fn normalize_token(token: &str) -> Result<String, MapflagError> {
    if token.contains('.') {
        return Err(MapflagError::InvalidMapKey(token.to_string()));
    }
    let token = if token.is_empty() {
        DEFAULT_MAP_KEY
    } else {
        token
    };
    let mut out = String::with_capacity(token.len() + 2);
    if !token.starts_with('<') {
        out.push('<');
    }
    out.push_str(token);
    if !token.ends_with('>') {
        out.push('>');
    }
    Ok(out)
}

/// Walk `meta` and collect all visible leaves. `token` is the engine-level
/// wildcard token, used by map fields that do not declare their own.
pub fn walk(meta: &Meta, token: &str) -> Result<ParamTable, MapflagError> {
    let token = normalize_token(token)?;
    let mut table = ParamTable::default();
    walk_meta(meta, "", &token, &[], None, &mut table)?;
    Ok(table)
}

fn dotted(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn walk_meta(
    meta: &Meta,
    prefix: &str,
    token: &str,
    tokens: &[String],
    group: Option<&'static str>,
    table: &mut ParamTable,
) -> Result<(), MapflagError> {
    for field in meta.fields {
        let path = dotted(prefix, field.name);
        // Sections pass their heading down to leaves that declare none.
        let group = field.group.or(group);

        if !field.exported {
            if field.default.is_some() {
                return Err(MapflagError::UnexportedField { path });
            }
            continue;
        }

        match &field.kind {
            FieldKind::Leaf(ty) | FieldKind::ValueMap(ty) => {
                if let ValueType::Opaque(kind) = ty {
                    return Err(MapflagError::UnsupportedType {
                        path,
                        kind: (*kind).to_string(),
                    });
                }
                if field.hidden {
                    continue;
                }
                let (path, map_key, tokens) = match &field.kind {
                    FieldKind::ValueMap(_) => {
                        let level = level_token(field.map_key, token)?;
                        let path = dotted(&path, &level);
                        let mut tokens = tokens.to_vec();
                        tokens.push(level.clone());
                        (path, Some(level), tokens)
                    }
                    _ => (path, tokens.last().cloned(), tokens.to_vec()),
                };
                let default = field
                    .default
                    .map(|d| coerce(d.to_value(), ty, &path))
                    .transpose()?;
                table.push(Param {
                    path,
                    short: field.short,
                    description: field.description,
                    group,
                    ty: *ty,
                    default,
                    map_key,
                    tokens,
                });
            }
            FieldKind::Nested(inner) => {
                walk_meta(inner, &path, token, tokens, group, table)?;
            }
            FieldKind::Map(inner) => {
                let level = level_token(field.map_key, token)?;
                let mut tokens = tokens.to_vec();
                tokens.push(level.clone());
                // The element's own maps fall back to this level's token.
                walk_meta(inner, &dotted(&path, &level), &level, &tokens, group, table)?;
            }
        }
    }
    Ok(())
}

fn level_token(declared: Option<&str>, inherited: &str) -> Result<String, MapflagError> {
    match declared {
        Some(t) => normalize_token(t),
        None => Ok(inherited.to_string()),
    }
}
