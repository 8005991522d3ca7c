//! Layered flag, environment and file configuration for clap applications,
//! with map sections named at runtime.
//!
//! Mapflag resolves one typed configuration struct from command-line flags,
//! environment variables and a config file. Every leaf of the struct gets a
//! flag, an environment variable and a file key, all derived from one schema
//! declaration.
//!
//! ```ignore
//! let mut config = AppConfig::default();
//! Mapflag::new()
//!     .default_config_file_arg()
//!     .default_config_paths()
//!     .env_prefix("APP")
//!     .parse_args(&mut config)?;
//! ```
//!
//! # Map sections named at runtime
//!
//! Some configuration has one block per named thing: a database connection,
//! an upstream, a region. The names are chosen by whoever runs the program,
//! so no flag for them can exist up front. Mapflag declares such a field as
//! a map, and its leaves get a **wildcard** path:
//!
//! ```text
//! --database.<dbkey>.host   host
//! --database.<dbkey>.port   port [default: 3306]
//! ```
//!
//! Before parsing, every flag name on the command line and every environment
//! variable name is matched against the wildcard paths. `--database.main.host`
//! matches `database.<dbkey>.host`, so a concrete flag `--database.main.host`
//! is registered on the spot and `APP_DATABASE_MAIN_PORT` is read as
//! `database.main.port`. The resulting `database["main"]` entry gets the
//! declared defaults for every field nobody set.
//!
//! The token defaults to `<mapkey>`. A map field can declare its own with
//! [`Field::map_key`], and the engine-wide default is changed with
//! [`Mapflag::map_key`]. A token always stands for one whole path segment.
//!
//! # Schema
//!
//! A destination type implements [`Schema`] with a `const META` describing its
//! fields, and `Serialize`/`Deserialize` for the values themselves:
//!
//! ```ignore
//! impl Schema for AppConfig {
//!     const META: Meta = Meta {
//!         name: "AppConfig",
//!         fields: &[
//!             Field::leaf("debug", ValueType::Bool).short('d').description("debug mode"),
//!             Field::leaf("timezone", ValueType::Str).default(DefaultValue::Str("UTC")),
//!             Field::nested("server", &Server::META),
//!             Field::map("database", &Database::META).map_key("<dbkey>"),
//!         ],
//!     };
//! }
//! ```
//!
//! - **`default`** is typed and checked against the field type when the schema
//!   is walked.
//! - **`hidden`** leaves get no flag and no declared default; they can still be
//!   set from a config file.
//! - **`private`** fields take part in nothing and must be `#[serde(skip)]`.
//! - **`group`** becomes the help heading of the field's flags.
//!
//! # Layer precedence
//!
//! ```text
//! Zero value            0, "", false, []
//!        ↑ overridden by
//! Declared defaults     Field::default
//!        ↑ overridden by
//! Destination values    non-zero fields of the struct passed to parse
//!        ↑ overridden by
//! Config file           explicit file, or the first one found
//!        ↑ overridden by
//! Environment vars      PREFIX_KEY
//!        ↑ overridden by
//! Flags                 only those given on the command line
//! ```
//!
//! Every layer is sparse and applies per key. A flag's registered default is
//! shown in usage text but never counts as "given".
//!
//! # Config files
//!
//! An explicit file, from [`Mapflag::config_file`] or the config file flag
//! ([`Mapflag::config_file_arg`]), must exist and parse. Otherwise the engine
//! searches each [`SearchPath`] in order, then the working directory, for
//! `{name}.toml`, `{name}.json` and `{name}.yaml`. Nothing found is not an
//! error.
//!
//! # Environment variables
//!
//! With prefix `APP` and the default `_` separator:
//!
//! | Env var | Config key |
//! |---------|------------|
//! | `APP_TIMEZONE` | `timezone` |
//! | `APP_SERVER_PORT` | `server.port` |
//! | `APP_DATABASE_MAIN_HOST` | `database.main.host` |
//!
//! Names match regardless of case, and a variable set to the empty string
//! counts as unset. [`Mapflag::bind_env`] adds further names for a key, read
//! verbatim and tried before the derived one.
//!
//! Values are parsed to the field's declared type, so `APP_SERVER_PORT=abc`
//! fails with a decode error naming `server.port`. Because separators become
//! dots, env discovery of map keys only works for names without the
//! separator in them; use [`Mapflag::env_separator`] (e.g. `"__"`) when keys
//! contain underscores.
//!
//! # Error handling
//!
//! All fallible operations return [`MapflagError`]. Schema errors name the
//! offending field path, decode errors name the key, and argument errors carry
//! the underlying `clap::Error` so the host can print it or exit with it.

pub mod error;
pub mod matcher;
pub mod schema;
pub mod store;
pub mod types;
pub mod walk;

mod builder;
mod coerce;
mod env;
mod file;
mod flags;
mod materialize;
mod resolve;

#[cfg(test)]
mod fixtures;

pub use builder::Mapflag;
pub use env::EnvScheme;
pub use error::MapflagError;
pub use schema::{DefaultValue, Field, FieldKind, Meta, Schema, ValueType};
pub use types::{ConfigFormat, SearchPath};
