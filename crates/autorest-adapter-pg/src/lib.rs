//! PostgreSQL backing store for autorest.
//!
//! [`PgMetadataSource`] feeds the catalog from `information_schema`;
//! [`PgAdapter`] runs the statements built by [`query`] through one sqlx
//! pool. Driver errors are converted to [`EngineError`] here and never
//! cross the crate boundary.

use async_trait::async_trait;
use autorest_catalog::TableDescription;
use autorest_core::{Assignment, EngineError, ListQuery, RowKey, UpstreamConfig};
use autorest_runtime::{DataAdapter, RowPage};
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::time::Duration;
use tracing::{debug, error, warn};

pub mod bind;
pub mod introspect;
pub mod query;

pub use introspect::PgMetadataSource;
pub use query::{Bind, ListStatements, Statement};

/// Executes validated intents against PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgAdapter {
    pool: PgPool,
}

impl PgAdapter {
    /// Open a pool sized by the upstream configuration.
    pub async fn connect(config: &UpstreamConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(config.pool.min_connections)
            .max_connections(config.pool.max_connections)
            .acquire_timeout(Duration::from_secs(config.pool.acquire_timeout_seconds))
            .connect(&config.connection_string())
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A metadata source sharing this adapter's pool.
    pub fn metadata_source(&self) -> PgMetadataSource {
        PgMetadataSource::new(self.pool.clone())
    }
}

/// Map a driver error to the engine taxonomy.
///
/// SQLSTATE class 22 (data exception) and 23 (integrity constraint
/// violation) are caller mistakes and become `Validation` with a generic
/// message. Everything else is an `Execution` failure.
pub fn map_sqlx_error(err: sqlx::Error) -> EngineError {
    if let sqlx::Error::Database(db) = &err
        && let Some(code) = db.code()
    {
        if code.starts_with("23") {
            warn!(sqlstate = %code, error = %db, "Statement rejected by constraint");
            return EngineError::constraint_violation();
        }
        if code.starts_with("22") {
            warn!(sqlstate = %code, error = %db, "Statement rejected by data exception");
            return EngineError::invalid_data();
        }
    }
    error!(error = %err, "Statement failed");
    EngineError::Execution(err.to_string())
}

fn log_statement(statement: &Statement) {
    debug!(sql = %statement.sql, binds = statement.binds.len(), "Executing statement");
}

fn row_json(row: PgRow) -> Result<Value, EngineError> {
    row.try_get::<Value, _>("row").map_err(map_sqlx_error)
}

#[async_trait]
impl DataAdapter for PgAdapter {
    async fn list(&self, table: &TableDescription, query: &ListQuery) -> Result<RowPage, EngineError> {
        let ListStatements { count, data } = query::select_page(table, query)?;
        let count_args = bind::arguments(&count.binds)?;
        let data_args = bind::arguments(&data.binds)?;

        // COUNT and SELECT read the same snapshot.
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        log_statement(&count);
        let total: i64 = sqlx::query_with(&count.sql, count_args)
            .fetch_one(&mut *tx)
            .await
            .and_then(|r| r.try_get::<i64, _>("cnt"))
            .map_err(map_sqlx_error)?;

        log_statement(&data);
        let recs = sqlx::query_with(&data.sql, data_args)
            .fetch_all(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        tx.commit().await.map_err(map_sqlx_error)?;

        let rows = recs.into_iter().map(row_json).collect::<Result<Vec<_>, _>>()?;
        Ok(RowPage {
            rows,
            total_count: total.max(0) as u64,
        })
    }

    async fn get(&self, table: &TableDescription, key: &RowKey) -> Result<Option<Value>, EngineError> {
        let stmt = query::select_by_key(table, key);
        let args = bind::arguments(&stmt.binds)?;
        log_statement(&stmt);
        let rec = sqlx::query_with(&stmt.sql, args)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        rec.map(row_json).transpose()
    }

    async fn insert(&self, table: &TableDescription, values: Vec<Assignment>) -> Result<Value, EngineError> {
        let stmt = query::insert(table, &values);
        let args = bind::arguments(&stmt.binds)?;
        log_statement(&stmt);
        let rec = sqlx::query_with(&stmt.sql, args)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row_json(rec)
    }

    async fn update(
        &self,
        table: &TableDescription,
        key: &RowKey,
        values: Vec<Assignment>,
    ) -> Result<Option<Value>, EngineError> {
        let stmt = query::update(table, key, &values)?;
        let args = bind::arguments(&stmt.binds)?;
        log_statement(&stmt);
        let rec = sqlx::query_with(&stmt.sql, args)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        rec.map(row_json).transpose()
    }

    async fn delete(&self, table: &TableDescription, key: &RowKey) -> Result<u64, EngineError> {
        let stmt = query::delete(table, key);
        let args = bind::arguments(&stmt.binds)?;
        log_statement(&stmt);
        let result = sqlx::query_with(&stmt.sql, args)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }
}
