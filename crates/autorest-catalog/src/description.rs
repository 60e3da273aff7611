//! Column-level metadata for one discovered table.

use crate::snapshot::TableRef;
use autorest_core::{ColumnInfo, EngineError, OrderBy};
use serde::Serialize;

/// Columns and primary key of a table, fetched from the backing store.
///
/// Every column reference a request makes is looked up here before any SQL
/// is built.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDescription {
    table: TableRef,
    columns: Vec<ColumnInfo>,
    primary_key: Vec<String>,
}

/// Wire shape for `GET /api/tables/{schema}/{table}/schema`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchemaView<'a> {
    pub schema: &'a str,
    pub table: &'a str,
    pub primary_key: &'a [String],
    pub columns: &'a [ColumnInfo],
}

impl TableDescription {
    pub fn new(table: TableRef, columns: Vec<ColumnInfo>) -> Self {
        let primary_key = columns
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| c.name.clone())
            .collect();
        Self {
            table,
            columns,
            primary_key,
        }
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    pub fn view(&self) -> TableSchemaView<'_> {
        TableSchemaView {
            schema: self.table.schema(),
            table: self.table.table(),
            primary_key: &self.primary_key,
            columns: &self.columns,
        }
    }

    /// Look up a column: exact name first, then a unique case-insensitive
    /// match.
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        let name = name.trim();
        if let Some(col) = self.columns.iter().find(|c| c.name == name) {
            return Some(col);
        }
        let mut matches = self
            .columns
            .iter()
            .filter(|c| c.name.eq_ignore_ascii_case(name));
        match (matches.next(), matches.next()) {
            (Some(col), None) => Some(col),
            _ => None,
        }
    }

    pub fn require_column(&self, name: &str) -> Result<&ColumnInfo, EngineError> {
        self.column(name).ok_or_else(|| {
            EngineError::validation(format!(
                "Unknown column '{}' on table {}",
                name, self.table
            ))
        })
    }

    /// Column used by by-id operations: the single primary-key column,
    /// otherwise a column named `id`.
    pub fn key_column(&self) -> Option<&ColumnInfo> {
        if let [pk] = self.primary_key.as_slice() {
            return self.columns.iter().find(|c| &c.name == pk);
        }
        if self.primary_key.len() > 1 {
            return None;
        }
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case("id"))
    }

    pub fn require_key_column(&self) -> Result<&ColumnInfo, EngineError> {
        self.key_column().ok_or_else(|| {
            EngineError::validation(format!(
                "Table {} has no single-column key; by-id operations are not available",
                self.table
            ))
        })
    }

    /// Columns the free-text search runs over.
    ///
    /// Text columns when the table has any, otherwise the key column (which
    /// the builder casts to text).
    pub fn searchable_columns(&self) -> Vec<ColumnInfo> {
        let text: Vec<ColumnInfo> = self
            .columns
            .iter()
            .filter(|c| c.is_text())
            .cloned()
            .collect();
        if !text.is_empty() {
            return text;
        }
        self.key_column()
            .or_else(|| self.columns.first())
            .cloned()
            .into_iter()
            .collect()
    }

    /// Deterministic ordering: `sort` (if it names a known column) followed by
    /// the primary-key columns as tie-breakers. Falls back to the first column
    /// when there is no primary key.
    pub fn order_by(&self, sort: Option<&str>, descending: bool) -> Vec<OrderBy> {
        let mut order: Vec<OrderBy> = Vec::new();
        if let Some(col) = sort.and_then(|s| self.column(s)) {
            order.push(OrderBy {
                column: col.clone(),
                descending,
            });
        }
        for pk in &self.primary_key {
            if order.iter().any(|o| &o.column.name == pk) {
                continue;
            }
            if let Some(col) = self.columns.iter().find(|c| &c.name == pk) {
                order.push(OrderBy {
                    column: col.clone(),
                    descending: false,
                });
            }
        }
        if order.is_empty()
            && let Some(first) = self.columns.first()
        {
            order.push(OrderBy {
                column: first.clone(),
                descending: false,
            });
        }
        order
    }
}
