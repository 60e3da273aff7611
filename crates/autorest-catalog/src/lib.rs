//! # autorest-catalog
//!
//! Discovers which schemas and tables exist in the backing store and caches
//! the answer.
//!
//! ```text
//!  discover() ──► cached snapshot? ──yes──► Arc<CatalogSnapshot>
//!                      │ no
//!                      ▼
//!             refresh lock (one caller queries,
//!             the rest wait and reuse its result)
//!                      │
//!                      ▼
//!          MetadataSource::list_tables()
//!                      │
//!          trim names, drop system schemas/tables
//!                      ▼
//!               CatalogSnapshot
//! ```
//!
//! A [`TableRef`] can only be obtained by resolving a name against a
//! snapshot, so any code holding one is holding a discovered identifier.

use async_trait::async_trait;
use autorest_core::{ColumnInfo, SchemaTableEntry};

pub mod cache;
pub mod description;
pub mod snapshot;
pub mod system;

pub use cache::SchemaCatalog;
pub use description::{TableDescription, TableSchemaView};
pub use snapshot::{CatalogSnapshot, TableRef};

/// The backing store's metadata facility.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// List every `(schema, table)` pair visible to the connection.
    ///
    /// Implementations may return system tables; the catalog filters them.
    async fn list_tables(&self) -> anyhow::Result<Vec<SchemaTableEntry>>;

    /// Columns of `table` in ordinal order, with primary-key flags set.
    /// An empty list means the table no longer exists.
    async fn describe_table(&self, table: &TableRef) -> anyhow::Result<Vec<ColumnInfo>>;
}
