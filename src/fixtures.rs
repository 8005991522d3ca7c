#[cfg(test)]
pub mod test {
    use std::collections::HashMap;

    use serde::{Deserialize, Serialize};

    use crate::schema::{DefaultValue, Field, Meta, Schema, ValueType};

    #[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
    pub struct AppConfig {
        pub debug: bool,
        pub timezone: String,
        pub server: Server,
        pub database: HashMap<String, Database>,
        #[serde(rename = "paramAb")]
        pub param_ab: String,
        pub param_ad: String,
        #[serde(rename = "param-ae")]
        pub param_ae: String,
        pub labels: HashMap<String, String>,
        pub secret: String,
        #[serde(skip)]
        pub param_internal: String,
    }

    impl Schema for AppConfig {
        const META: Meta = Meta {
            name: "AppConfig",
            fields: &[
                Field::leaf("debug", ValueType::Bool)
                    .short('d')
                    .description("debug mode")
                    .default(DefaultValue::Bool(false)),
                Field::leaf("timezone", ValueType::Str)
                    .description("timezone")
                    .default(DefaultValue::Str("UTC")),
                Field::nested("server", &Server::META).group("server"),
                Field::map("database", &Database::META)
                    .group("database")
                    .map_key("<dbkey>"),
                Field::leaf("paramAb", ValueType::Str),
                Field::leaf("param_ad", ValueType::Str).short('z'),
                Field::leaf("param-ae", ValueType::Str),
                Field::value_map("labels", ValueType::Str).description("free-form labels"),
                Field::leaf("secret", ValueType::Str)
                    .default(DefaultValue::Str("changeme"))
                    .hidden(),
                Field::private("param_internal", ValueType::Str),
            ],
        };
    }

    #[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
    pub struct Server {
        pub port: i64,
    }

    impl Schema for Server {
        const META: Meta = Meta {
            name: "Server",
            fields: &[Field::leaf("port", ValueType::Int)
                .description("port")
                .default(DefaultValue::Int(8080))
                .group("server")],
        };
    }

    #[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
    pub struct Database {
        pub host: String,
        pub port: u16,
        pub user: String,
        pub pass: String,
    }

    impl Schema for Database {
        const META: Meta = Meta {
            name: "Database",
            fields: &[
                Field::leaf("host", ValueType::Str)
                    .description("host")
                    .default(DefaultValue::Str("localhost")),
                Field::leaf("port", ValueType::UInt)
                    .description("port")
                    .default(DefaultValue::UInt(3306)),
                Field::leaf("user", ValueType::Str)
                    .description("user")
                    .default(DefaultValue::Str("root")),
                Field::leaf("pass", ValueType::Str).description("pass"),
            ],
        };
    }

    // -- Nested maps with distinct tokens ---------------------------------------

    #[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
    pub struct Cluster {
        pub regions: HashMap<String, Region>,
    }

    impl Schema for Cluster {
        const META: Meta = Meta {
            name: "Cluster",
            fields: &[Field::map("regions", &Region::META).map_key("<region>")],
        };
    }

    #[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
    pub struct Region {
        pub nodes: HashMap<String, Node>,
    }

    impl Schema for Region {
        const META: Meta = Meta {
            name: "Region",
            fields: &[Field::map("nodes", &Node::META).map_key("node")],
        };
    }

    #[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
    pub struct Node {
        pub addr: String,
        pub weight: i64,
    }

    impl Schema for Node {
        const META: Meta = Meta {
            name: "Node",
            fields: &[
                Field::leaf("addr", ValueType::Str).short('a'),
                Field::leaf("weight", ValueType::Int).default(DefaultValue::Int(1)),
            ],
        };
    }

    // -- Sequences and floats ---------------------------------------------------

    #[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
    pub struct Tuning {
        pub tags: Vec<String>,
        pub ids: Vec<i64>,
        pub ratio: f64,
        pub workers: u32,
    }

    impl Schema for Tuning {
        const META: Meta = Meta {
            name: "Tuning",
            fields: &[
                Field::leaf("tags", ValueType::Seq(&ValueType::Str))
                    .description("tags")
                    .default(DefaultValue::List(&[DefaultValue::Str("base")])),
                Field::leaf("ids", ValueType::Seq(&ValueType::Int)),
                Field::leaf("ratio", ValueType::Float).default(DefaultValue::Float(0.5)),
                Field::leaf("workers", ValueType::UInt).short('w'),
            ],
        };
    }

    // -- Schemas the engine must reject -----------------------------------------

    #[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
    pub struct Private {
        pub name: String,
        #[serde(skip)]
        pub internal: String,
    }

    impl Schema for Private {
        const META: Meta = Meta {
            name: "Private",
            fields: &[
                Field::leaf("name", ValueType::Str),
                Field::private("internal", ValueType::Str),
            ],
        };
    }

    pub struct Leaky;

    impl Schema for Leaky {
        const META: Meta = Meta {
            name: "Leaky",
            fields: &[Field::private("internal", ValueType::Str)
                .default(DefaultValue::Str("oops"))],
        };
    }

    pub struct Opaque;

    impl Schema for Opaque {
        const META: Meta = Meta {
            name: "Opaque",
            fields: &[Field::leaf("timeout", ValueType::Opaque("Duration"))],
        };
    }

    pub struct BadDefault;

    impl Schema for BadDefault {
        const META: Meta = Meta {
            name: "BadDefault",
            fields: &[Field::leaf("port", ValueType::Int).default(DefaultValue::Str("eighty"))],
        };
    }

    #[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
    pub struct Matrix {
        pub rows: Vec<Vec<i64>>,
    }

    impl Schema for Matrix {
        const META: Meta = Meta {
            name: "Matrix",
            fields: &[Field::leaf(
                "rows",
                ValueType::Seq(&ValueType::Seq(&ValueType::Int)),
            )],
        };
    }
}
