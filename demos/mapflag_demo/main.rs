//! # mapflag demo application
//!
//! A sample service launcher that resolves its configuration with mapflag.
//! It exists to demonstrate and manually verify the engine's features.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example mapflag_demo -- --help
//! cargo run --example mapflag_demo -- --database.main.host=db1 --database.audit.pool=1
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature                  | How to exercise it                                                   |
//! |--------------------------|----------------------------------------------------------------------|
//! | Declared defaults        | `cargo run --example mapflag_demo`                                   |
//! | Wildcard usage text      | `cargo run --example mapflag_demo -- --help`                         |
//! | Map key from a flag      | `cargo run --example mapflag_demo -- --database.main.host=db1`       |
//! | Map key from env         | `MAPFLAG_DEMO_DATABASE_AUDIT_USER=ro cargo run --example mapflag_demo` |
//! | Extra env binding        | `DATABASE_PASSWORD=pw cargo run --example mapflag_demo`              |
//! | Scalar map entries       | `cargo run --example mapflag_demo -- --upstreams.auth=http://a:9000` |
//! | Config file (cwd)        | Create `config.toml` in `./` or `./config/`, then run                |
//! | Explicit config file     | `cargo run --example mapflag_demo -- -c other.yaml`                  |
//! | Debug logging            | `RUST_LOG=mapflag=debug cargo run --example mapflag_demo`            |

mod config;

use clap::{CommandFactory, FromArgMatches, Parser};
use mapflag::{Mapflag, MapflagError, SearchPath};
use tracing_subscriber::EnvFilter;

use config::ServiceConfig;

/// mapflag demo: print the resolved service configuration.
#[derive(Parser, Debug)]
#[command(name = "mapflag-demo")]
struct Cli {
    /// Print the configuration as TOML instead of a summary.
    #[arg(long)]
    dump: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut engine = Mapflag::new()
        .flags(Cli::command())
        .default_config_file_arg()
        .default_config_paths()
        .add_search_path(SearchPath::Platform)
        .env_prefix("MAPFLAG_DEMO")
        .bind_env("database.main.pass", "DATABASE_PASSWORD");

    let mut config = ServiceConfig::default();
    if let Err(err) = engine.parse_args(&mut config) {
        match err {
            MapflagError::Argument(e) => e.exit(),
            other => {
                eprintln!("error: {other}");
                std::process::exit(1);
            }
        }
    }

    // The augmented command knows every discovered flag, so the host's own
    // arguments can be read back from it.
    let cli = engine
        .command()
        .try_get_matches()
        .and_then(|m| Cli::from_arg_matches(&m))
        .unwrap_or_else(|e| e.exit());

    if cli.dump {
        match toml::to_string_pretty(&config) {
            Ok(text) => print!("{text}"),
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    summary(&config);
}

fn summary(config: &ServiceConfig) {
    println!("{} listening on {}:{}", config.name, config.listen.host, config.listen.port);
    if config.verbose {
        println!("tags: {}", config.tags.join(", "));
    }
    for (key, db) in &config.database {
        println!(
            "database {key}: {}@{}:{} (pool {})",
            db.user, db.host, db.port, db.pool
        );
    }
    for (name, url) in &config.upstreams {
        println!("upstream {name}: {url}");
    }
    if config.token.is_empty() {
        println!("no token configured");
    }
}
