//! Access policy configuration.

use serde::{Deserialize, Serialize};

/// Allow/deny lists applied on top of the discovered catalog.
///
/// Names are matched case-insensitively. `excluded_tables` entries are
/// either bare table names (excluded in every schema) or `schema.table`.
/// A name containing a dot is written double-quoted: `"v1.orders"` or
/// `sales."v1.orders"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Schemas to expose. Empty means every discovered schema.
    #[serde(default)]
    pub allowed_schemas: Vec<String>,

    /// Schemas that are never exposed.
    #[serde(default)]
    pub excluded_schemas: Vec<String>,

    /// Tables that are never exposed.
    #[serde(default)]
    pub excluded_tables: Vec<String>,
}
