use std::collections::{BTreeMap, HashMap};

use toml::Value;

use crate::coerce::parse_raw;
use crate::error::MapflagError;
use crate::walk::Param;

/// How dotted keys map to environment variable names.
///
/// With prefix `APP` and separator `_`, `database.default.host` reads
/// `APP_DATABASE_DEFAULT_HOST`. Without a prefix it reads
/// `DATABASE_DEFAULT_HOST`.
///
/// Names are matched without regard to case, and a variable set to the empty
/// string counts as unset.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvScheme {
    pub prefix: Option<String>,
    pub separator: String,
    /// Extra variable names per dotted key, used as-is (no prefix) and tried
    /// in order before the derived name.
    pub bindings: BTreeMap<String, Vec<String>>,
}

impl Default for EnvScheme {
    fn default() -> Self {
        Self {
            prefix: None,
            separator: "_".into(),
            bindings: BTreeMap::new(),
        }
    }
}

impl EnvScheme {
    /// The variable name bound to a dotted key.
    pub fn var_name(&self, key: &str) -> String {
        let key = key.replace('.', &self.separator);
        match self.needle() {
            Some(needle) => format!("{needle}{key}").to_uppercase(),
            None => key.to_uppercase(),
        }
    }

    /// The dotted candidate key for a variable name, used for map key discovery.
    ///
    /// The prefix and its separator are stripped exactly once; variables
    /// without the prefix yield `None`.
    pub fn candidate(&self, var: &str) -> Option<String> {
        let var = var.to_lowercase();
        let rest = match self.needle() {
            Some(needle) => var.strip_prefix(&needle.to_lowercase())?,
            None => var.as_str(),
        };
        if rest.is_empty() {
            return None;
        }
        Some(rest.replace(&self.separator.to_lowercase(), "."))
    }

    /// Keys whose bound variables are set, for map key discovery.
    pub fn bound_keys(&self, vars: &[(String, String)]) -> Vec<String> {
        let set = lookup(vars);
        self.bindings
            .iter()
            .filter(|(_, names)| names.iter().any(|n| set.contains_key(&n.to_uppercase())))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Every variable name tried for `key`, in priority order.
    fn names_for(&self, key: &str) -> impl Iterator<Item = String> + '_ {
        self.bindings
            .get(key)
            .into_iter()
            .flatten()
            .map(|n| n.to_uppercase())
            .chain(std::iter::once(self.var_name(key)))
    }

    fn needle(&self) -> Option<String> {
        self.prefix
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| format!("{p}{}", self.separator))
    }
}

/// Set variables keyed by upper-cased name. Empty values are dropped, and
/// when a name repeats the last pair wins.
fn lookup(vars: &[(String, String)]) -> HashMap<String, &str> {
    vars.iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| (k.to_uppercase(), v.as_str()))
        .collect()
}

/// Look up every concrete parameter's variable in `vars` and parse it to the
/// parameter's type.
///
/// Takes the variables as a slice so tests can pass synthetic data instead of
/// `std::env::vars()`.
pub fn env_values<'a>(
    scheme: &EnvScheme,
    params: impl IntoIterator<Item = &'a Param>,
    vars: &[(String, String)],
) -> Result<Vec<(String, Value)>, MapflagError> {
    let set = lookup(vars);

    let mut out = Vec::new();
    for param in params {
        if param.is_wildcard() {
            continue;
        }
        let found = scheme
            .names_for(&param.path)
            .find_map(|name| set.get(&name).map(|raw| (name, *raw)));
        if let Some((name, raw)) = found {
            let value = parse_raw(raw, &param.ty, &param.path)?;
            tracing::trace!(var = %name, key = %param.path, "bound environment variable");
            out.push((param.path.clone(), value));
        }
    }
    Ok(out)
}
