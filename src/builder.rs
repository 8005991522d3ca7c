use std::path::PathBuf;

use clap::Command;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::env::EnvScheme;
use crate::error::MapflagError;
use crate::resolve::{self, ConfigArg, ResolveInput, Settings};
use crate::schema::Schema;
use crate::types::{ConfigFormat, SearchPath};

/// The resolution engine.
///
/// Configured through consuming setters, then used with [`parse`](Self::parse)
/// (or [`parse_args`](Self::parse_args) for the process arguments). Each engine
/// owns its own command and settings; independent engines share nothing.
///
/// ```ignore
/// let mut engine = Mapflag::new()
///     .default_config_file_arg()
///     .default_config_paths()
///     .env_prefix("APP");
/// let mut config = AppConfig::default();
/// engine.parse_args(&mut config)?;
/// ```
#[derive(Debug, Clone)]
pub struct Mapflag {
    base: Command,
    augmented: Option<Command>,
    settings: Settings,
}

impl Default for Mapflag {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapflag {
    /// An engine with a bare command named after the running binary.
    pub fn new() -> Self {
        Self {
            base: Command::new(binary_name()),
            augmented: None,
            settings: Settings::default(),
        }
    }

    /// Register config flags on the host's own command instead of a bare one.
    /// The host's arguments, subcommands and help settings are kept.
    pub fn flags(mut self, cmd: Command) -> Self {
        self.base = cmd;
        self.augmented = None;
        self
    }

    /// Add a string flag naming an explicit config file.
    ///
    /// A path given on the command line must exist and parse. A non-empty
    /// `default` is tried when the flag is absent, and skipped if missing.
    pub fn config_file_arg(mut self, long: &str, short: Option<char>, default: &str) -> Self {
        self.settings.config_arg = Some(ConfigArg {
            long: long.to_string(),
            short,
            default: default.to_string(),
        });
        self
    }

    /// `--config` / `-c`, no default.
    pub fn default_config_file_arg(self) -> Self {
        self.config_file_arg("config", Some('c'), "")
    }

    /// Append directories to search for the config file. Earlier directories
    /// take priority; the working directory is always searched last.
    pub fn config_paths<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.settings
            .search_paths
            .extend(dirs.into_iter().map(|d| SearchPath::Path(d.into())));
        self
    }

    /// Append a search path of any kind, e.g. [`SearchPath::Platform`].
    pub fn add_search_path(mut self, path: SearchPath) -> Self {
        self.settings.search_paths.push(path);
        self
    }

    /// Search `./` and `./config/`.
    pub fn default_config_paths(self) -> Self {
        self.config_paths(["./", "./config/"])
    }

    /// Always read this config file; it must exist and parse. The config
    /// file flag, when given, takes precedence.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.config_file = Some(path.into());
        self
    }

    /// File name searched for, without extension (default: `"config"`).
    pub fn config_name(mut self, name: &str) -> Self {
        self.settings.config_name = name.to_string();
        self
    }

    /// Fix the config file format instead of detecting it by extension.
    pub fn config_format(mut self, format: ConfigFormat) -> Self {
        self.settings.config_format = Some(format);
        self
    }

    /// Prefix environment variable names, e.g. `APP` reads `APP_SERVER_PORT`.
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_scheme().prefix = Some(prefix.to_string());
        self
    }

    /// Separator between env name segments (default: `"_"`).
    pub fn env_separator(mut self, separator: &str) -> Self {
        self.env_scheme().separator = separator.to_string();
        self
    }

    /// Also read `key` from the variable `var`, used verbatim without the
    /// prefix. Bound names are tried in the order added, before the derived
    /// name. `key` may name a map entry, e.g. `database.main.host`.
    pub fn bind_env(mut self, key: &str, var: &str) -> Self {
        self.env_scheme()
            .bindings
            .entry(key.to_string())
            .or_default()
            .push(var.to_string());
        self
    }

    /// Disable environment variable loading entirely.
    pub fn no_env(mut self) -> Self {
        self.settings.env = None;
        self
    }

    /// Token for map fields that do not declare their own (default: `<mapkey>`).
    /// Bare tokens are wrapped, so `"name"` becomes `<name>`.
    pub fn map_key(mut self, token: &str) -> Self {
        self.settings.map_key = token.to_string();
        self
    }

    fn env_scheme(&mut self) -> &mut EnvScheme {
        self.settings.env.get_or_insert_with(EnvScheme::default)
    }

    /// Resolve `dest` from `args` (without the binary name) and the process
    /// environment.
    ///
    /// `dest`'s current non-zero values act as defaults. On error `dest` is
    /// left unchanged.
    pub fn parse<C, I, S>(&mut self, dest: &mut C, args: I) -> Result<(), MapflagError>
    where
        C: Schema + Serialize + DeserializeOwned,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parse_with(dest, args, std::env::vars().collect())
    }

    /// Like [`parse`](Self::parse) with an explicit environment.
    pub fn parse_with<C, I, S>(
        &mut self,
        dest: &mut C,
        args: I,
        env_vars: Vec<(String, String)>,
    ) -> Result<(), MapflagError>
    where
        C: Schema + Serialize + DeserializeOwned,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let input = ResolveInput {
            command: self.base.clone(),
            args: args.into_iter().map(Into::into).collect(),
            env_vars,
        };
        let resolved = resolve::resolve(&self.settings, input, &*dest)?;
        *dest = resolved.config;
        self.augmented = Some(resolved.command);
        Ok(())
    }

    /// Resolve `dest` from the process arguments and environment.
    pub fn parse_args<C>(&mut self, dest: &mut C) -> Result<(), MapflagError>
    where
        C: Schema + Serialize + DeserializeOwned,
    {
        self.parse(dest, std::env::args().skip(1))
    }

    /// The command with every config flag registered, for usage rendering.
    /// Before the first parse this is the host command alone.
    pub fn command(&self) -> Command {
        self.augmented.clone().unwrap_or_else(|| self.base.clone())
    }
}

fn binary_name() -> String {
    std::env::args_os()
        .next()
        .as_ref()
        .map(std::path::Path::new)
        .and_then(|p| p.file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "app".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{AppConfig, Database, Leaky, Opaque};
    use std::fs;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// An engine that never reads a stray config file from the working directory.
    fn engine() -> Mapflag {
        Mapflag::new()
            .flags(Command::new("app"))
            .config_name("mapflag-builder-test-none")
    }

    #[test]
    fn static_keys_discovered_map_and_env() {
        let mut config = AppConfig::default();
        engine()
            .parse_with(
                &mut config,
                [
                    "-d=true",
                    "--timezone=Asia/Shanghai",
                    "--database.default.host=127.0.0.1",
                ],
                env(&[("SERVER_PORT", "9090")]),
            )
            .unwrap();

        assert!(config.debug);
        assert_eq!(config.timezone, "Asia/Shanghai");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.database.len(), 1);
        assert_eq!(
            config.database["default"],
            Database {
                host: "127.0.0.1".into(),
                port: 3306,
                user: "root".into(),
                pass: String::new(),
            }
        );
    }

    #[test]
    fn usage_shows_wildcard_pattern() {
        let mut engine = engine();
        let mut config = AppConfig::default();
        engine
            .parse_with(
                &mut config,
                [
                    "-d=false",
                    "--timezone=US/Pacific",
                    "--database.default.host=1.1.1.1",
                ],
                vec![],
            )
            .unwrap();

        assert!(!config.debug);
        assert_eq!(config.timezone, "US/Pacific");
        assert_eq!(config.database["default"].host, "1.1.1.1");

        let help = engine.command().render_help().to_string();
        assert!(help.contains("database.<dbkey>.host"));
        assert!(help.contains("database.default.host"));
    }

    #[test]
    fn command_before_parse_is_host_command() {
        let engine = engine();
        let help = engine.command().render_help().to_string();
        assert!(!help.contains("timezone"));
    }

    #[test]
    fn repeated_parses_are_idempotent() {
        let mut engine = engine();
        let args = ["--database.main.port=3307", "--timezone=UTC"];
        let vars = env(&[("PARAM_AD", "z")]);

        let mut first = AppConfig::default();
        engine.parse_with(&mut first, args, vars.clone()).unwrap();
        let mut second = AppConfig::default();
        engine.parse_with(&mut second, args, vars).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.database["main"].port, 3307);
        assert_eq!(first.param_ad, "z");
    }

    #[test]
    fn precedence_law() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("config.toml");
        fs::write(
            &file,
            "timezone = \"file\"\nparamAb = \"file\"\nparam_ad = \"file\"\n",
        )
        .unwrap();

        let mut config = AppConfig::default();
        engine()
            .config_name("config")
            .config_paths([dir.path()])
            .parse_with(
                &mut config,
                ["--timezone=flag"],
                env(&[("TIMEZONE", "env"), ("PARAM_AD", "env")]),
            )
            .unwrap();

        assert_eq!(config.timezone, "flag");
        assert_eq!(config.param_ad, "env");
        assert_eq!(config.param_ab, "file");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.param_ae, "");
    }

    #[test]
    fn env_prefix_and_separator() {
        let mut config = AppConfig::default();
        engine()
            .env_prefix("APP")
            .env_separator("__")
            .parse_with(
                &mut config,
                Vec::<String>::new(),
                env(&[
                    ("APP__SERVER__PORT", "7000"),
                    ("APP__DATABASE__AUDIT__HOST", "audit.local"),
                    ("SERVER__PORT", "1"),
                ]),
            )
            .unwrap();
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.database["audit"].host, "audit.local");
    }

    #[test]
    fn no_env_ignores_environment() {
        let mut config = AppConfig::default();
        engine()
            .no_env()
            .parse_with(&mut config, Vec::<String>::new(), env(&[("TIMEZONE", "env")]))
            .unwrap();
        assert_eq!(config.timezone, "UTC");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        let result = engine()
            .config_file(dir.path().join("missing.toml"))
            .parse_with(&mut config, Vec::<String>::new(), vec![]);
        assert!(matches!(result, Err(MapflagError::ConfigFile { .. })));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn implicit_missing_file_is_fine() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        engine()
            .default_config_file_arg()
            .config_paths([dir.path()])
            .parse_with(&mut config, Vec::<String>::new(), vec![])
            .unwrap();
        assert_eq!(config.timezone, "UTC");
    }

    #[test]
    fn config_flag_reads_json() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("app.json");
        fs::write(&file, r#"{"debug": true, "labels": {"team": "core"}}"#).unwrap();
        let mut config = AppConfig::default();
        engine()
            .default_config_file_arg()
            .parse_with(
                &mut config,
                ["-c".to_string(), file.display().to_string()],
                vec![],
            )
            .unwrap();
        assert!(config.debug);
        assert_eq!(config.labels["team"], "core");
    }

    #[test]
    fn searched_yaml_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            "timezone: Europe/Berlin\ndatabase:\n  reports:\n    user: analyst\n",
        )
        .unwrap();
        let mut config = AppConfig::default();
        engine()
            .config_name("config")
            .config_paths([dir.path()])
            .config_format(ConfigFormat::Yaml)
            .parse_with(&mut config, Vec::<String>::new(), vec![])
            .unwrap();
        assert_eq!(config.timezone, "Europe/Berlin");
        assert_eq!(config.database["reports"].user, "analyst");
        assert_eq!(config.database["reports"].host, "localhost");
    }

    #[test]
    fn bind_env_adds_variable_names() {
        let mut config = AppConfig::default();
        engine()
            .env_prefix("APP")
            .bind_env("timezone", "TZ")
            .bind_env("database.main.pass", "DB_PASSWORD")
            .parse_with(
                &mut config,
                Vec::<String>::new(),
                env(&[
                    ("TZ", "America/Lima"),
                    ("APP_TIMEZONE", "ignored"),
                    ("DB_PASSWORD", "s3cret"),
                ]),
            )
            .unwrap();
        assert_eq!(config.timezone, "America/Lima");
        assert_eq!(config.database["main"].pass, "s3cret");
        assert_eq!(config.database["main"].user, "root");
    }

    #[test]
    fn empty_env_keeps_defaults() {
        let mut config = AppConfig::default();
        engine()
            .parse_with(
                &mut config,
                Vec::<String>::new(),
                env(&[("SERVER_PORT", ""), ("TIMEZONE", "")]),
            )
            .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.timezone, "UTC");
    }

    #[test]
    fn fixed_format_for_extensionless_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("apprc");
        fs::write(&file, "timezone = \"Asia/Tokyo\"\n").unwrap();
        let mut config = AppConfig::default();
        engine()
            .config_file(&file)
            .config_format(ConfigFormat::Toml)
            .parse_with(&mut config, Vec::<String>::new(), vec![])
            .unwrap();
        assert_eq!(config.timezone, "Asia/Tokyo");
    }

    #[test]
    fn custom_map_key() {
        let mut engine = engine().map_key("label");
        let mut config = AppConfig::default();
        engine
            .parse_with(&mut config, ["--labels.tier=gold"], vec![])
            .unwrap();
        assert_eq!(config.labels["tier"], "gold");
        assert!(
            engine
                .command()
                .render_help()
                .to_string()
                .contains("labels.<label>")
        );
    }

    #[test]
    fn dotted_map_key_rejected() {
        let mut config = AppConfig::default();
        let err = engine()
            .map_key("a.b")
            .parse_with(&mut config, Vec::<String>::new(), vec![])
            .unwrap_err();
        assert!(matches!(err, MapflagError::InvalidMapKey(_)));
    }

    #[test]
    fn schema_errors_surface_from_parse() {
        #[derive(serde::Serialize, serde::Deserialize, Default)]
        struct Wrapped;

        // Rejection fixtures carry no data; decode them through a unit struct.
        impl Schema for Wrapped {
            const META: crate::schema::Meta = Opaque::META;
        }
        let err = engine()
            .parse_with(&mut Wrapped, Vec::<String>::new(), vec![])
            .unwrap_err();
        assert!(matches!(err, MapflagError::UnsupportedType { .. }));

        #[derive(serde::Serialize, serde::Deserialize, Default)]
        struct WrappedLeaky;
        impl Schema for WrappedLeaky {
            const META: crate::schema::Meta = Leaky::META;
        }
        let err = engine()
            .parse_with(&mut WrappedLeaky, Vec::<String>::new(), vec![])
            .unwrap_err();
        assert!(matches!(err, MapflagError::UnexportedField { .. }));
    }

    #[test]
    fn host_command_is_kept() {
        let host = Command::new("server")
            .about("runs the server")
            .arg(clap::Arg::new("verbose").long("verbose").action(clap::ArgAction::SetTrue));
        let mut engine = engine().flags(host);
        let mut config = AppConfig::default();
        engine
            .parse_with(&mut config, ["--verbose", "--server.port=1"], vec![])
            .unwrap();
        let help = engine.command().render_help().to_string();
        assert!(help.contains("runs the server"));
        assert!(help.contains("--verbose"));
        assert_eq!(config.server.port, 1);
    }
}
