//! Shared types for the autorest workspace.
//!
//! Everything that more than one crate needs to agree on lives here: the
//! configuration model, the error taxonomy, the column metadata shape, the
//! validated query intents handed to adapters and the paginated envelope.

use serde::{Deserialize, Serialize};

pub mod config;
pub mod error;
pub mod intent;
pub mod page;

pub use config::{
    AccessConfig, AppConfig, AuthConfig, CatalogConfig, ConfigError, PaginationConfig,
    ServerConfig, StaticToken, UpstreamConfig,
};
pub use error::{EngineError, ErrorKind};
pub use intent::{
    Assignment, ColumnFilter, FilterOp, FilterSpec, ListQuery, ListRequest, Operation, OrderBy,
    RowKey, Search,
};
pub use page::PaginatedResult;

/// A discovered `(schema, table)` pair. The pair is the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaTableEntry {
    pub schema: String,
    pub table: String,
}

impl SchemaTableEntry {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }
}

impl std::fmt::Display for SchemaTableEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// Broad classification of a column's SQL type.
///
/// Drives bind-parameter typing, id coercion and the choice of searchable
/// columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFamily {
    Integer,
    Numeric,
    Boolean,
    Uuid,
    Json,
    Temporal,
    Text,
    Other,
}

/// Column metadata as reported by the backing store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// SQL data type (`information_schema.columns.data_type`).
    pub data_type: String,
    /// Whether the column is nullable.
    pub nullable: bool,
    /// Whether the column is part of the primary key.
    #[serde(default)]
    pub is_primary_key: bool,
    /// Default expression, if any.
    #[serde(default)]
    pub default: Option<String>,
    /// Underlying type as `(udt_schema, udt_name)`. Needed to cast text into
    /// enum, array and other types without a native binding.
    #[serde(skip)]
    pub udt: Option<(String, String)>,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            is_primary_key: false,
            default: None,
            udt: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_udt(mut self, schema: impl Into<String>, name: impl Into<String>) -> Self {
        self.udt = Some((schema.into(), name.into()));
        self
    }

    pub fn type_family(&self) -> TypeFamily {
        match self.data_type.to_ascii_lowercase().as_str() {
            "integer" | "bigint" | "smallint" | "int" | "int2" | "int4" | "int8" | "serial"
            | "bigserial" | "smallserial" => TypeFamily::Integer,
            "numeric" | "decimal" | "real" | "double precision" | "float4" | "float8"
            | "money" => TypeFamily::Numeric,
            "boolean" | "bool" => TypeFamily::Boolean,
            "uuid" => TypeFamily::Uuid,
            "json" | "jsonb" => TypeFamily::Json,
            "date"
            | "timestamp with time zone"
            | "timestamp without time zone"
            | "timestamptz"
            | "timestamp"
            | "time with time zone"
            | "time without time zone"
            | "time" => TypeFamily::Temporal,
            "text" | "character varying" | "varchar" | "character" | "char" | "bpchar"
            | "citext" | "name" => TypeFamily::Text,
            _ => TypeFamily::Other,
        }
    }

    /// Whether the column holds free text and is worth searching.
    pub fn is_text(&self) -> bool {
        self.type_family() == TypeFamily::Text
    }
}
