//! Declarative description of a configuration type.
//!
//! A destination type implements [`Schema`] by declaring a `const META`: a
//! `'static` tree of [`Field`]s that names every key, its value type, and the
//! metadata used for flags and usage text. The tree is plain data built with
//! `const fn` helpers, so nothing is inspected at runtime:
//!
//! ```ignore
//! impl Schema for AppConfig {
//!     const META: Meta = Meta {
//!         name: "AppConfig",
//!         fields: &[
//!             Field::leaf("debug", ValueType::Bool)
//!                 .short('d')
//!                 .description("debug mode")
//!                 .default(DefaultValue::Bool(false)),
//!             Field::nested("server", &Server::META),
//!             Field::map("database", &Database::META).map_key("<dbkey>"),
//!         ],
//!     };
//! }
//! ```
//!
//! Field names are the serialized names of the destination type's fields, so
//! `Meta` and the type's `Serialize`/`Deserialize` impls must agree.

use toml::Value;

/// Implemented by every type that can be filled by [`Mapflag::parse`](crate::Mapflag::parse).
pub trait Schema {
    const META: Meta;
}

/// The field list of one record type.
#[derive(Debug, Clone, Copy)]
pub struct Meta {
    /// Type name, used in decode errors.
    pub name: &'static str,
    pub fields: &'static [Field],
}

/// One declared field of a record.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    /// Path segment for this field.
    pub name: &'static str,
    /// Single-character flag alias.
    pub short: Option<char>,
    pub description: &'static str,
    /// Help heading for the generated flags. Documentation only.
    pub group: Option<&'static str>,
    pub default: Option<DefaultValue>,
    /// Wildcard token for the map level this field opens. Falls back to the
    /// engine's token when unset.
    pub map_key: Option<&'static str>,
    /// Hidden fields get no flag, no env binding and no injected default.
    pub hidden: bool,
    /// Private fields are never bound to any source.
    pub exported: bool,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// A scalar or sequence value.
    Leaf(ValueType),
    /// A nested record.
    Nested(&'static Meta),
    /// A map from a user-chosen key to a record.
    Map(&'static Meta),
    /// A map from a user-chosen key to a scalar.
    ValueMap(ValueType),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueType {
    Bool,
    Int,
    UInt,
    Float,
    Str,
    Seq(&'static ValueType),
    /// A type with no flag or config representation, named for error reporting.
    Opaque(&'static str),
}

/// A typed default value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(&'static str),
    List(&'static [DefaultValue]),
}

impl Field {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            short: None,
            description: "",
            group: None,
            default: None,
            map_key: None,
            hidden: false,
            exported: true,
            kind,
        }
    }

    pub const fn leaf(name: &'static str, ty: ValueType) -> Self {
        Self::new(name, FieldKind::Leaf(ty))
    }

    pub const fn nested(name: &'static str, meta: &'static Meta) -> Self {
        Self::new(name, FieldKind::Nested(meta))
    }

    pub const fn map(name: &'static str, meta: &'static Meta) -> Self {
        Self::new(name, FieldKind::Map(meta))
    }

    pub const fn value_map(name: &'static str, ty: ValueType) -> Self {
        Self::new(name, FieldKind::ValueMap(ty))
    }

    /// A field that exists on the type but is not part of the configuration.
    pub const fn private(name: &'static str, ty: ValueType) -> Self {
        let mut field = Self::leaf(name, ty);
        field.exported = false;
        field
    }

    pub const fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub const fn description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub const fn group(mut self, group: &'static str) -> Self {
        self.group = Some(group);
        self
    }

    pub const fn default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }

    pub const fn map_key(mut self, token: &'static str) -> Self {
        self.map_key = Some(token);
        self
    }

    pub const fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

impl ValueType {
    pub fn name(&self) -> String {
        match self {
            ValueType::Bool => "bool".into(),
            ValueType::Int => "int".into(),
            ValueType::UInt => "uint".into(),
            ValueType::Float => "float".into(),
            ValueType::Str => "string".into(),
            ValueType::Seq(inner) => format!("[]{}", inner.name()),
            ValueType::Opaque(kind) => (*kind).into(),
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            ValueType::Bool | ValueType::Int | ValueType::UInt | ValueType::Float | ValueType::Str
        )
    }

    /// The value a field of this type holds when no source provides one.
    pub fn zero(&self) -> Value {
        match self {
            ValueType::Bool => Value::Boolean(false),
            ValueType::Int | ValueType::UInt => Value::Integer(0),
            ValueType::Float => Value::Float(0.0),
            ValueType::Str | ValueType::Opaque(_) => Value::String(String::new()),
            ValueType::Seq(_) => Value::Array(Vec::new()),
        }
    }
}

impl DefaultValue {
    pub fn to_value(&self) -> Value {
        match self {
            DefaultValue::Bool(b) => Value::Boolean(*b),
            DefaultValue::Int(i) => Value::Integer(*i),
            DefaultValue::UInt(u) => match i64::try_from(*u) {
                Ok(i) => Value::Integer(i),
                Err(_) => Value::String(u.to_string()),
            },
            DefaultValue::Float(f) => Value::Float(*f),
            DefaultValue::Str(s) => Value::String((*s).to_string()),
            DefaultValue::List(items) => Value::Array(items.iter().map(Self::to_value).collect()),
        }
    }
}

/// Whether a value equals the zero value of its type.
pub fn is_zero(value: &Value) -> bool {
    match value {
        Value::Boolean(b) => !b,
        Value::Integer(i) => *i == 0,
        Value::Float(f) => *f == 0.0,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Table(t) => t.is_empty(),
        Value::Datetime(_) => false,
    }
}
