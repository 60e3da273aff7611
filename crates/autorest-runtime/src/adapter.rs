use async_trait::async_trait;
use autorest_catalog::TableDescription;
use autorest_core::{Assignment, EngineError, ListQuery, RowKey};
use serde_json::Value;

/// One page of rows plus the total matching count.
#[derive(Debug, Clone, PartialEq)]
pub struct RowPage {
    pub rows: Vec<Value>,
    pub total_count: u64,
}

/// Executes validated intents against a backing store.
///
/// Every method receives a [`TableDescription`] obtained from the catalog,
/// so the table and all columns referenced by the intent are known to exist.
/// Implementations translate driver failures into [`EngineError`] before
/// returning.
#[async_trait]
pub trait DataAdapter: Send + Sync {
    /// Filtered, searched, ordered page of rows plus the total count for the
    /// same predicate.
    async fn list(&self, table: &TableDescription, query: &ListQuery)
    -> Result<RowPage, EngineError>;

    /// Row whose key column equals `key`.
    async fn get(&self, table: &TableDescription, key: &RowKey)
    -> Result<Option<Value>, EngineError>;

    /// Insert a row and return it as stored, server defaults included.
    async fn insert(
        &self,
        table: &TableDescription,
        values: Vec<Assignment>,
    ) -> Result<Value, EngineError>;

    /// Update the row matching `key`. `None` when no row matched.
    async fn update(
        &self,
        table: &TableDescription,
        key: &RowKey,
        values: Vec<Assignment>,
    ) -> Result<Option<Value>, EngineError>;

    /// Delete the row matching `key`, returning the affected row count.
    async fn delete(&self, table: &TableDescription, key: &RowKey) -> Result<u64, EngineError>;
}
