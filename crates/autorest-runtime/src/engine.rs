use crate::adapter::DataAdapter;
use autorest_catalog::{CatalogSnapshot, SchemaCatalog, TableDescription};
use autorest_core::{
    Assignment, ColumnFilter, EngineError, ListQuery, ListRequest, Operation, PaginatedResult,
    PaginationConfig, RowKey, Search,
};
use autorest_policy::AccessPolicy;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// The catalog-gated execution path.
///
/// Every operation first resolves `(schema, table)` against the cached
/// catalog and the access policy. Anything absent or hidden ends in
/// `NotFound` before the adapter is called. Column references are then
/// looked up in the table's fetched column list, so adapters only ever see
/// discovered identifiers.
pub struct Engine {
    catalog: Arc<SchemaCatalog>,
    policy: AccessPolicy,
    adapter: Arc<dyn DataAdapter>,
    pagination: PaginationConfig,
}

impl Engine {
    pub fn new(
        catalog: Arc<SchemaCatalog>,
        policy: AccessPolicy,
        adapter: Arc<dyn DataAdapter>,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            catalog,
            policy,
            adapter,
            pagination,
        }
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    pub fn pagination(&self) -> PaginationConfig {
        self.pagination
    }

    /// Tables visible through the API.
    pub async fn exposed_tables(&self) -> Result<CatalogSnapshot, EngineError> {
        let snapshot = self.catalog.discover().await?;
        Ok(self.policy.exposed_set(&snapshot))
    }

    /// Re-run discovery and return the new exposed set.
    pub async fn refresh_catalog(&self) -> Result<CatalogSnapshot, EngineError> {
        let snapshot = self.catalog.refresh().await?;
        Ok(self.policy.exposed_set(&snapshot))
    }

    /// Resolve a table name pair to its description, or `NotFound`.
    pub async fn validate_table(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Arc<TableDescription>, EngineError> {
        let snapshot = self.catalog.discover().await?;
        let not_found = || EngineError::not_found(format!("Table {}.{} not found", schema, table));

        if !self.policy.is_exposed(schema, table, &snapshot) {
            debug!(schema, table, "Rejected request for unknown or hidden table");
            return Err(not_found());
        }
        let table_ref = snapshot.resolve(schema, table).ok_or_else(not_found)?;
        self.catalog.describe(&table_ref).await
    }

    pub async fn list(
        &self,
        schema: &str,
        table: &str,
        request: &ListRequest,
    ) -> Result<PaginatedResult<Value>, EngineError> {
        let desc = self.validate_table(schema, table).await?;
        let query = self.build_list_query(&desc, request)?;
        debug!(
            schema = desc.table().schema(),
            table = desc.table().table(),
            operation = %Operation::Select,
            page = query.page,
            page_size = query.page_size,
            filters = query.filters.len(),
            "Listing rows"
        );

        let page = self.adapter.list(&desc, &query).await?;
        Ok(PaginatedResult::new(
            page.rows,
            page.total_count,
            query.page,
            query.page_size,
        ))
    }

    pub async fn get(&self, schema: &str, table: &str, id: &str) -> Result<Value, EngineError> {
        let desc = self.validate_table(schema, table).await?;
        let key = row_key(&desc, id)?;
        self.adapter
            .get(&desc, &key)
            .await?
            .ok_or_else(|| row_not_found(&desc, id))
    }

    pub async fn create(
        &self,
        schema: &str,
        table: &str,
        payload: Value,
    ) -> Result<Value, EngineError> {
        let desc = self.validate_table(schema, table).await?;
        let values = assignments(&desc, payload)?;
        let row = self.adapter.insert(&desc, values).await?;
        info!(
            schema = desc.table().schema(),
            table = desc.table().table(),
            operation = %Operation::Insert,
            "Row created"
        );
        Ok(row)
    }

    pub async fn update(
        &self,
        schema: &str,
        table: &str,
        id: &str,
        payload: Value,
    ) -> Result<Value, EngineError> {
        let desc = self.validate_table(schema, table).await?;
        let key = row_key(&desc, id)?;
        let values = assignments(&desc, payload)?;
        if values.is_empty() {
            return Err(EngineError::validation(
                "Update payload must contain at least one column",
            ));
        }

        let row = self
            .adapter
            .update(&desc, &key, values)
            .await?
            .ok_or_else(|| row_not_found(&desc, id))?;
        info!(
            schema = desc.table().schema(),
            table = desc.table().table(),
            operation = %Operation::Update,
            id,
            "Row updated"
        );
        Ok(row)
    }

    /// Delete a row, returning the coerced key value.
    pub async fn delete(&self, schema: &str, table: &str, id: &str) -> Result<Value, EngineError> {
        let desc = self.validate_table(schema, table).await?;
        let key = row_key(&desc, id)?;
        let affected = self.adapter.delete(&desc, &key).await?;
        if affected == 0 {
            return Err(row_not_found(&desc, id));
        }
        info!(
            schema = desc.table().schema(),
            table = desc.table().table(),
            operation = %Operation::Delete,
            id,
            affected,
            "Row deleted"
        );
        Ok(key.value)
    }

    fn build_list_query(
        &self,
        desc: &TableDescription,
        request: &ListRequest,
    ) -> Result<ListQuery, EngineError> {
        let (page, page_size) = request.pagination(&self.pagination)?;

        let filters = request
            .filters
            .iter()
            .map(|spec| {
                let column = desc.require_column(&spec.field)?.clone();
                ColumnFilter::new(column, spec)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let search = request
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(|term| Search {
                term: term.to_string(),
                columns: desc.searchable_columns(),
            });

        if let Some(sort) = request.sort_column.as_deref()
            && desc.column(sort).is_none()
        {
            debug!(
                table = %desc.table(),
                sort,
                "Unknown sort column; using default order"
            );
        }
        let order = desc.order_by(request.sort_column.as_deref(), request.sort_descending);

        Ok(ListQuery {
            page,
            page_size,
            filters,
            search,
            order,
        })
    }
}

fn row_key(desc: &TableDescription, id: &str) -> Result<RowKey, EngineError> {
    let column = desc.require_key_column()?;
    RowKey::parse(column, id)
}

fn row_not_found(desc: &TableDescription, id: &str) -> EngineError {
    EngineError::not_found(format!("Row with id {} not found in {}", id, desc.table()))
}

/// Map a JSON object onto the table's columns.
fn assignments(desc: &TableDescription, payload: Value) -> Result<Vec<Assignment>, EngineError> {
    let Value::Object(map) = payload else {
        return Err(EngineError::validation("Request body must be a JSON object"));
    };

    let mut values: Vec<Assignment> = Vec::with_capacity(map.len());
    for (key, value) in map {
        let column = desc.require_column(&key)?;
        if values.iter().any(|a| a.column.name == column.name) {
            return Err(EngineError::validation(format!(
                "Column '{}' is assigned more than once",
                column.name
            )));
        }
        values.push(Assignment {
            column: column.clone(),
            value,
        });
    }
    Ok(values)
}
