use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapflagError {
    #[error("Unsupported field type '{kind}' at '{path}'")]
    UnsupportedType { path: String, kind: String },

    #[error("Cannot register a flag of type '{kind}' for '{path}'")]
    UnsupportedFlagType { path: String, kind: String },

    #[error("Field '{path}' is not exported but carries a default value")]
    UnexportedField { path: String },

    #[error("Invalid map key token '{0}': a token must not contain '.'")]
    InvalidMapKey(String),

    #[error("Failed to load config file {path}: {reason}")]
    ConfigFile { path: PathBuf, reason: String },

    #[error("Failed to decode '{path}': {reason}")]
    Decode { path: String, reason: String },

    #[error("Argument error: {0}")]
    Argument(#[from] clap::Error),
}

impl MapflagError {
    pub(crate) fn decode(path: impl Into<String>, reason: impl ToString) -> Self {
        MapflagError::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn config_file(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        MapflagError::ConfigFile {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
