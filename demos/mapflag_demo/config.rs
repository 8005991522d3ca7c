//! Configuration structs for the mapflag demo application.
//!
//! [`ServiceConfig`] has one nested section ([`Listen`]), one map of records
//! keyed at runtime ([`Database`], token `<dbkey>`) and one map of plain
//! strings (`upstreams`, token `<name>`).
//!
//! # Env var mapping
//!
//! With the prefix `MAPFLAG_DEMO`:
//!
//! | Env var                              | Config key             |
//! |--------------------------------------|------------------------|
//! | `MAPFLAG_DEMO_VERBOSE`               | `verbose`              |
//! | `MAPFLAG_DEMO_LISTEN_PORT`           | `listen.port`          |
//! | `MAPFLAG_DEMO_DATABASE_MAIN_HOST`    | `database.main.host`   |
//! | `MAPFLAG_DEMO_UPSTREAMS_AUTH`        | `upstreams.auth`       |

use std::collections::BTreeMap;

use mapflag::{DefaultValue, Field, Meta, Schema, ValueType};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ServiceConfig {
    pub verbose: bool,
    pub name: String,
    pub tags: Vec<String>,
    pub listen: Listen,
    pub database: BTreeMap<String, Database>,
    pub upstreams: BTreeMap<String, String>,
    pub token: String,
}

impl Schema for ServiceConfig {
    const META: Meta = Meta {
        name: "ServiceConfig",
        fields: &[
            Field::leaf("verbose", ValueType::Bool)
                .short('v')
                .description("Enable verbose output"),
            Field::leaf("name", ValueType::Str)
                .description("Service name shown in the banner")
                .default(DefaultValue::Str("mapflag-demo")),
            Field::leaf("tags", ValueType::Seq(&ValueType::Str))
                .description("Free-form tags, comma separated"),
            Field::nested("listen", &Listen::META).group("Listen"),
            Field::map("database", &Database::META)
                .group("Databases")
                .map_key("<dbkey>"),
            Field::value_map("upstreams", ValueType::Str)
                .description("Upstream base URL")
                .group("Upstreams")
                .map_key("name"),
            // File only: never shown in --help.
            Field::leaf("token", ValueType::Str).hidden(),
        ],
    };
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Listen {
    pub host: String,
    pub port: u16,
}

impl Schema for Listen {
    const META: Meta = Meta {
        name: "Listen",
        fields: &[
            Field::leaf("host", ValueType::Str)
                .description("Bind address")
                .default(DefaultValue::Str("127.0.0.1")),
            Field::leaf("port", ValueType::UInt)
                .short('p')
                .description("Bind port")
                .default(DefaultValue::UInt(8080)),
        ],
    };
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Database {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub pool: u32,
}

impl Schema for Database {
    const META: Meta = Meta {
        name: "Database",
        fields: &[
            Field::leaf("host", ValueType::Str)
                .description("Database host")
                .default(DefaultValue::Str("localhost")),
            Field::leaf("port", ValueType::UInt)
                .description("Database port")
                .default(DefaultValue::UInt(5432)),
            Field::leaf("user", ValueType::Str)
                .description("Database user")
                .default(DefaultValue::Str("postgres")),
            Field::leaf("pass", ValueType::Str).description("Database password"),
            Field::leaf("pool", ValueType::UInt)
                .description("Connection pool size")
                .default(DefaultValue::UInt(4)),
        ],
    };
}
