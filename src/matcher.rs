//! Placeholder matching and discovery of runtime-named map keys.
//!
//! The walker leaves map keys as wildcard segments (`database.<dbkey>.host`).
//! Discovery runs over the raw names the user actually supplied, flag names
//! and env-derived names alike, and binds each one that fits a wildcard path to
//! a concrete copy of that parameter (`database.default.host`).

use std::collections::HashSet;

use crate::walk::{Param, ParamTable};

/// Whether two dotted paths match, treating `token` as a wildcard segment.
///
/// Both paths must have the same number of segments and no empty segment. Each
/// pair of segments must be equal, or one of the two must be the token. The
/// relation is symmetric.
pub fn matches(candidate: &str, schema: &str, token: &str) -> bool {
    matches_any(candidate, schema, &[token])
}

/// Like [`matches`], with any of `tokens` acting as a wildcard.
pub fn matches_any<T: AsRef<str>>(candidate: &str, schema: &str, tokens: &[T]) -> bool {
    let is_token = |segment: &str| tokens.iter().any(|t| t.as_ref() == segment);

    let left: Vec<&str> = candidate.split('.').collect();
    let right: Vec<&str> = schema.split('.').collect();
    if left.len() != right.len() {
        return false;
    }
    left.iter().zip(&right).all(|(l, r)| {
        if l.is_empty() || r.is_empty() {
            return false;
        }
        l == r || is_token(l) || is_token(r)
    })
}

/// Extract the candidate name from a raw argument: leading dashes stripped,
/// anything from the first `=` dropped. Returns `None` for plain values.
pub fn flag_name(arg: &str) -> Option<&str> {
    if !arg.starts_with('-') {
        return None;
    }
    let name = arg.trim_start_matches('-');
    let name = name.split_once('=').map_or(name, |(name, _)| name);
    (!name.is_empty()).then_some(name)
}

/// Bind raw names to wildcard parameters.
///
/// Names that are already static keys, repeated, or match nothing are
/// skipped. When several wildcard parameters fit the same name, the first one
/// in table order wins.
pub fn discover<I, S>(names: I, table: &ParamTable) -> Vec<Param>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut found = Vec::new();

    for name in names {
        let name = name.as_ref();
        if table.contains(name) || !seen.insert(name.to_string()) {
            continue;
        }
        let hit = table
            .iter()
            .filter(|p| p.is_wildcard())
            .find(|p| matches_any(name, &p.path, &p.tokens));
        if let Some(param) = hit {
            tracing::debug!(key = name, pattern = %param.path, "discovered map key");
            found.push(param.resolved(name));
        }
    }
    found
}
