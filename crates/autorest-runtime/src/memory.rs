//! In-memory backing store.
//!
//! Implements both [`MetadataSource`] and [`DataAdapter`] over JSON rows held
//! in process. Filter, search and ordering follow the same rules as the SQL
//! adapter: `like` and search are case-insensitive substring matches, a NULL
//! never satisfies a comparison, and NULLs sort last.

use crate::adapter::{DataAdapter, RowPage};
use async_trait::async_trait;
use autorest_catalog::{MetadataSource, TableDescription, TableRef};
use autorest_core::{
    Assignment, ColumnFilter, ColumnInfo, EngineError, FilterOp, ListQuery, OrderBy, RowKey,
    SchemaTableEntry, TypeFamily,
};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Clone)]
struct MemoryTable {
    columns: Vec<ColumnInfo>,
    rows: Vec<Map<String, Value>>,
}

impl MemoryTable {
    /// Next value for an integer key column left out of an insert.
    fn next_sequence(&self, column: &str) -> i64 {
        self.rows
            .iter()
            .filter_map(|r| r.get(column).and_then(Value::as_i64))
            .max()
            .unwrap_or(0)
            + 1
    }

    fn check_constraints(&self, row: &Map<String, Value>, skip: Option<usize>) -> Result<(), EngineError> {
        for col in &self.columns {
            let value = row.get(&col.name).unwrap_or(&Value::Null);
            if !col.nullable && value.is_null() {
                return Err(EngineError::constraint_violation());
            }
            if col.is_primary_key {
                let duplicate = self
                    .rows
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| Some(*i) != skip)
                    .any(|(_, r)| r.get(&col.name).is_some_and(|v| values_equal(v, value)));
                if duplicate {
                    return Err(EngineError::constraint_violation());
                }
            }
        }
        Ok(())
    }
}

/// Tables and rows held in memory, keyed by `(schema, table)`.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    tables: RwLock<BTreeMap<SchemaTableEntry, MemoryTable>>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert_table`](Self::insert_table).
    pub fn with_table(
        self,
        schema: &str,
        table: &str,
        columns: Vec<ColumnInfo>,
        rows: Vec<Value>,
    ) -> Self {
        self.insert_table(schema, table, columns, rows);
        self
    }

    /// Create an empty table.
    pub fn create_table(&self, schema: &str, table: &str, columns: Vec<ColumnInfo>) {
        self.insert_table(schema, table, columns, Vec::new());
    }

    /// Create or replace a table with the given rows. Non-object rows are
    /// ignored.
    pub fn insert_table(&self, schema: &str, table: &str, columns: Vec<ColumnInfo>, rows: Vec<Value>) {
        let rows = rows
            .into_iter()
            .filter_map(|row| match row {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        tables.insert(SchemaTableEntry::new(schema, table), MemoryTable { columns, rows });
    }

    pub fn drop_table(&self, schema: &str, table: &str) {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        tables.remove(&SchemaTableEntry::new(schema, table));
    }

    pub fn row_count(&self, schema: &str, table: &str) -> usize {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables
            .get(&SchemaTableEntry::new(schema, table))
            .map_or(0, |t| t.rows.len())
    }

    fn with_rows<T>(
        &self,
        table: &TableDescription,
        f: impl FnOnce(&MemoryTable) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let stored = tables
            .get(table.table().entry())
            .ok_or_else(|| missing_relation(table.table()))?;
        f(stored)
    }

    fn with_rows_mut<T>(
        &self,
        table: &TableDescription,
        f: impl FnOnce(&mut MemoryTable) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let stored = tables
            .get_mut(table.table().entry())
            .ok_or_else(|| missing_relation(table.table()))?;
        f(stored)
    }
}

/// A table dropped after discovery behaves like a failed statement.
fn missing_relation(table: &TableRef) -> EngineError {
    EngineError::Execution(format!("relation \"{}\" does not exist", table))
}

#[async_trait]
impl MetadataSource for MemoryAdapter {
    async fn list_tables(&self) -> anyhow::Result<Vec<SchemaTableEntry>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tables.keys().cloned().collect())
    }

    async fn describe_table(&self, table: &TableRef) -> anyhow::Result<Vec<ColumnInfo>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tables
            .get(table.entry())
            .map(|t| t.columns.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl DataAdapter for MemoryAdapter {
    async fn list(&self, table: &TableDescription, query: &ListQuery) -> Result<RowPage, EngineError> {
        self.with_rows(table, |stored| {
            let mut matched: Vec<&Map<String, Value>> = stored
                .rows
                .iter()
                .filter(|row| query.filters.iter().all(|f| filter_matches(row, f)))
                .filter(|row| {
                    query.search.as_ref().is_none_or(|search| {
                        search
                            .columns
                            .iter()
                            .any(|col| contains_ignore_case(row.get(&col.name), &search.term))
                    })
                })
                .collect();

            matched.sort_by(|a, b| compare_rows(a, b, &query.order));

            let total_count = matched.len() as u64;
            let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
            let rows = matched
                .into_iter()
                .skip(offset)
                .take(query.page_size as usize)
                .map(|row| project(row, table.columns()))
                .collect();
            Ok(RowPage { rows, total_count })
        })
    }

    async fn get(&self, table: &TableDescription, key: &RowKey) -> Result<Option<Value>, EngineError> {
        self.with_rows(table, |stored| {
            Ok(stored
                .rows
                .iter()
                .find(|row| key_matches(row, key))
                .map(|row| project(row, table.columns())))
        })
    }

    async fn insert(&self, table: &TableDescription, values: Vec<Assignment>) -> Result<Value, EngineError> {
        self.with_rows_mut(table, |stored| {
            let mut row = Map::new();
            for col in table.columns() {
                row.insert(col.name.clone(), Value::Null);
            }
            for assignment in values {
                row.insert(assignment.column.name, assignment.value);
            }
            for col in table.columns() {
                if col.is_primary_key
                    && col.type_family() == TypeFamily::Integer
                    && row.get(&col.name).is_none_or(Value::is_null)
                {
                    row.insert(col.name.clone(), Value::from(stored.next_sequence(&col.name)));
                }
            }

            stored.check_constraints(&row, None)?;
            let created = project(&row, table.columns());
            stored.rows.push(row);
            Ok(created)
        })
    }

    async fn update(
        &self,
        table: &TableDescription,
        key: &RowKey,
        values: Vec<Assignment>,
    ) -> Result<Option<Value>, EngineError> {
        self.with_rows_mut(table, |stored| {
            let Some(index) = stored.rows.iter().position(|row| key_matches(row, key)) else {
                return Ok(None);
            };
            let mut row = stored.rows[index].clone();
            for assignment in values {
                row.insert(assignment.column.name, assignment.value);
            }
            stored.check_constraints(&row, Some(index))?;
            let updated = project(&row, table.columns());
            stored.rows[index] = row;
            Ok(Some(updated))
        })
    }

    async fn delete(&self, table: &TableDescription, key: &RowKey) -> Result<u64, EngineError> {
        self.with_rows_mut(table, |stored| {
            let before = stored.rows.len();
            stored.rows.retain(|row| !key_matches(row, key));
            Ok((before - stored.rows.len()) as u64)
        })
    }
}

/// The row restricted to the described columns, as a JSON object.
fn project(row: &Map<String, Value>, columns: &[ColumnInfo]) -> Value {
    let mut out = Map::new();
    for col in columns {
        out.insert(
            col.name.clone(),
            row.get(&col.name).cloned().unwrap_or(Value::Null),
        );
    }
    Value::Object(out)
}

fn key_matches(row: &Map<String, Value>, key: &RowKey) -> bool {
    row.get(&key.column.name)
        .is_some_and(|v| values_equal(v, &key.value))
}

fn filter_matches(row: &Map<String, Value>, filter: &ColumnFilter) -> bool {
    let value = row.get(&filter.column.name).unwrap_or(&Value::Null);
    if value.is_null() {
        return false;
    }
    match filter.op {
        FilterOp::Like => filter
            .values
            .first()
            .and_then(Value::as_str)
            .is_some_and(|term| contains_ignore_case(Some(value), term)),
        FilterOp::In => filter.values.iter().any(|v| values_equal(value, v)),
        op => {
            let Some(expected) = filter.values.first() else {
                return false;
            };
            let Some(ord) = compare_values(value, expected) else {
                return false;
            };
            match op {
                FilterOp::Eq => ord == Ordering::Equal,
                FilterOp::Ne => ord != Ordering::Equal,
                FilterOp::Gt => ord == Ordering::Greater,
                FilterOp::Gte => ord != Ordering::Less,
                FilterOp::Lt => ord == Ordering::Less,
                FilterOp::Lte => ord != Ordering::Greater,
                FilterOp::Like | FilterOp::In => false,
            }
        }
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn contains_ignore_case(value: Option<&Value>, term: &str) -> bool {
    value
        .and_then(as_text)
        .is_some_and(|text| text.to_lowercase().contains(&term.to_lowercase()))
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Compare two non-null values. Numbers compare numerically even when one
/// side arrived as a decimal string.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, _) | (_, Value::Null) => None,
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::String(y)) => match (as_number(a), as_number(b)) {
            (Some(nx), Some(ny)) => nx.partial_cmp(&ny),
            _ => Some(x.cmp(y)),
        },
        _ => match (as_number(a), as_number(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => as_text(a)?.partial_cmp(&as_text(b)?),
        },
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    compare_values(a, b) == Some(Ordering::Equal)
}

fn compare_rows(a: &Map<String, Value>, b: &Map<String, Value>, order: &[OrderBy]) -> Ordering {
    for term in order {
        let x = a.get(&term.column.name).unwrap_or(&Value::Null);
        let y = b.get(&term.column.name).unwrap_or(&Value::Null);
        let ord = match (x.is_null(), y.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let ord = compare_values(x, y).unwrap_or(Ordering::Equal);
                if term.descending { ord.reverse() } else { ord }
            }
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use autorest_catalog::CatalogSnapshot;
    use autorest_core::{FilterSpec, Search};
    use serde_json::json;

    fn describe(adapter: &MemoryAdapter, schema: &str, table: &str) -> TableDescription {
        let entries = adapter.tables.read().unwrap().keys().cloned().collect::<Vec<_>>();
        let snapshot = CatalogSnapshot::from_entries(entries);
        let table_ref = snapshot.resolve(schema, table).unwrap();
        let columns = adapter.tables.read().unwrap()[table_ref.entry()].columns.clone();
        TableDescription::new(table_ref, columns)
    }

    fn adapter() -> MemoryAdapter {
        MemoryAdapter::new().with_table(
            "public",
            "item",
            vec![
                ColumnInfo::new("id", "integer").primary_key(),
                ColumnInfo::new("label", "text"),
                ColumnInfo::new("price", "numeric"),
            ],
            vec![
                json!({"id": 1, "label": "Apple", "price": 1.5}),
                json!({"id": 2, "label": "banana", "price": null}),
                json!({"id": 3, "label": null, "price": 3}),
            ],
        )
    }

    fn query(desc: &TableDescription) -> ListQuery {
        ListQuery {
            page: 1,
            page_size: 10,
            filters: Vec::new(),
            search: None,
            order: desc.order_by(None, false),
        }
    }

    #[tokio::test]
    async fn test_null_never_matches_comparison() {
        let adapter = adapter();
        let desc = describe(&adapter, "public", "item");
        let mut q = query(&desc);
        let spec = FilterSpec::parse("price:ne:1.5").unwrap();
        q.filters
            .push(ColumnFilter::new(desc.column("price").unwrap().clone(), &spec).unwrap());

        let page = adapter.list(&desc, &q).await.unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.rows[0]["id"], json!(3));
    }

    #[tokio::test]
    async fn test_like_and_search_are_case_insensitive() {
        let adapter = adapter();
        let desc = describe(&adapter, "public", "item");
        let mut q = query(&desc);
        q.search = Some(Search {
            term: "AN".to_string(),
            columns: desc.searchable_columns(),
        });
        let page = adapter.list(&desc, &q).await.unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.rows[0]["label"], json!("banana"));

        let mut q = query(&desc);
        let spec = FilterSpec::parse("label:like:PP").unwrap();
        q.filters
            .push(ColumnFilter::new(desc.column("label").unwrap().clone(), &spec).unwrap());
        assert_eq!(adapter.list(&desc, &q).await.unwrap().total_count, 1);
    }

    #[tokio::test]
    async fn test_nulls_sort_last() {
        let adapter = adapter();
        let desc = describe(&adapter, "public", "item");
        let mut q = query(&desc);
        q.order = desc.order_by(Some("price"), true);
        let ids: Vec<Value> = adapter
            .list(&desc, &q)
            .await
            .unwrap()
            .rows
            .iter()
            .map(|r| r["id"].clone())
            .collect();
        assert_eq!(ids, vec![json!(3), json!(1), json!(2)]);
    }

    #[tokio::test]
    async fn test_duplicate_key_is_constraint_violation() {
        let adapter = adapter();
        let desc = describe(&adapter, "public", "item");
        let id = desc.column("id").unwrap().clone();
        let err = adapter
            .insert(&desc, vec![Assignment { column: id, value: json!(2) }])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(adapter.row_count("public", "item"), 3);
    }

    #[tokio::test]
    async fn test_dropped_table_is_execution_error() {
        let adapter = adapter();
        let desc = describe(&adapter, "public", "item");
        adapter.drop_table("public", "item");
        let err = adapter.list(&desc, &query(&desc)).await.unwrap_err();
        assert!(matches!(err, EngineError::Execution(_)));
    }
}
