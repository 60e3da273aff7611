//! Response envelopes.
//!
//! Lists use [`PaginatedResult`](autorest_core::PaginatedResult) directly;
//! get/create/update return the bare row.

use autorest_catalog::CatalogSnapshot;
use autorest_core::SchemaTableEntry;
use serde::Serialize;
use serde_json::Value;

/// Body of every error response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub status_code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

/// Body of a successful delete.
#[derive(Debug, Serialize)]
pub struct DeleteConfirmation {
    pub message: String,
    pub id: Value,
}

impl DeleteConfirmation {
    pub fn new(id: Value) -> Self {
        Self {
            message: "Record deleted successfully".to_string(),
            id,
        }
    }
}

/// Body of `GET /api/tables`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableList {
    pub tables: Vec<SchemaTableEntry>,
    pub total_count: usize,
}

impl From<&CatalogSnapshot> for TableList {
    fn from(snapshot: &CatalogSnapshot) -> Self {
        let tables: Vec<SchemaTableEntry> = snapshot.entries().collect();
        Self {
            total_count: tables.len(),
            tables,
        }
    }
}
