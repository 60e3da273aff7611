//! Shared test infrastructure for the PostgreSQL e2e suite.
//!
//! Provides:
//! - Connection to the database named by `AUTOREST_TEST_DATABASE_URL`
//! - Fixture schemas and seed rows
//! - Engine construction with a test access policy

#![allow(dead_code)]

use autorest_adapter_pg::PgAdapter;
use autorest_catalog::SchemaCatalog;
use autorest_core::{AccessConfig, EngineError, ListRequest, PaginationConfig};
use autorest_policy::AccessPolicy;
use autorest_runtime::Engine;
use sqlx::PgPool;
use std::sync::Arc;

pub const DATABASE_URL_ENV: &str = "AUTOREST_TEST_DATABASE_URL";
pub const SALES: &str = "autorest_sales";
pub const HIDDEN: &str = "autorest_hidden";

// =============================================================================
// DATABASE INITIALIZATION
// =============================================================================

const SCHEMA_SQL: &str = r#"
DROP SCHEMA IF EXISTS autorest_sales CASCADE;
DROP SCHEMA IF EXISTS autorest_hidden CASCADE;
CREATE SCHEMA autorest_sales;
CREATE SCHEMA autorest_hidden;

CREATE TABLE autorest_sales.customer (
    customer_id serial PRIMARY KEY,
    name text NOT NULL,
    email text UNIQUE,
    city varchar(64),
    balance numeric(12, 2) NOT NULL DEFAULT 0,
    active boolean NOT NULL DEFAULT true,
    created_at timestamptz NOT NULL DEFAULT now()
);

CREATE TABLE autorest_sales.event (
    id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
    payload jsonb
);

CREATE TYPE autorest_sales.tier AS ENUM ('bronze', 'silver', 'gold');

CREATE TABLE autorest_sales.account (
    id serial PRIMARY KEY,
    tier autorest_sales.tier NOT NULL DEFAULT 'bronze',
    ip inet,
    tags text[]
);

CREATE TABLE autorest_sales.audit_log (
    id bigserial PRIMARY KEY,
    note text
);

CREATE TABLE autorest_sales._sqlx_internal (
    id integer
);

CREATE TABLE autorest_hidden.secret (
    id integer PRIMARY KEY
);
"#;

const SEED_SQL: &str = r#"
INSERT INTO autorest_sales.customer (name, email, city, balance)
SELECT 'Customer ' || lpad(i::text, 2, '0'),
       'c' || i || '@example.com',
       (ARRAY['Lisbon', 'Porto', 'Faro'])[1 + i % 3],
       i * 100
FROM generate_series(1, 10) AS i;

INSERT INTO autorest_hidden.secret (id) VALUES (1);
"#;

const TEARDOWN_SQL: &str = r#"
DROP SCHEMA IF EXISTS autorest_sales CASCADE;
DROP SCHEMA IF EXISTS autorest_hidden CASCADE;
"#;

// =============================================================================
// TEST CONTEXT
// =============================================================================

pub struct TestContext {
    pub pool: PgPool,
    pub adapter: PgAdapter,
}

impl TestContext {
    /// `Ok(None)` when no database is configured.
    pub async fn setup() -> Result<Option<Self>, String> {
        let Ok(url) = std::env::var(DATABASE_URL_ENV) else {
            return Ok(None);
        };
        let pool = PgPool::connect(&url)
            .await
            .map_err(|e| format!("Failed to connect: {}", e))?;
        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&pool)
            .await
            .map_err(|e| format!("Failed to create schema: {}", e))?;
        sqlx::raw_sql(SEED_SQL)
            .execute(&pool)
            .await
            .map_err(|e| format!("Failed to seed: {}", e))?;
        println!("Database initialized with fixture schemas");

        let adapter = PgAdapter::from_pool(pool.clone());
        Ok(Some(Self { pool, adapter }))
    }

    pub async fn teardown(&self) {
        let _ = sqlx::raw_sql(TEARDOWN_SQL).execute(&self.pool).await;
    }

    /// Engine restricted to the fixture schemas, with `autorest_hidden`
    /// and `autorest_sales.audit_log` hidden by policy.
    pub fn engine(&self) -> Engine {
        self.engine_with(AccessConfig {
            allowed_schemas: vec![SALES.to_string(), HIDDEN.to_string()],
            excluded_schemas: vec![HIDDEN.to_string()],
            excluded_tables: vec![format!("{}.audit_log", SALES)],
        })
    }

    pub fn engine_with(&self, access: AccessConfig) -> Engine {
        let catalog = Arc::new(SchemaCatalog::new(Arc::new(self.adapter.metadata_source())));
        Engine::new(
            catalog,
            AccessPolicy::from_config(&access),
            Arc::new(self.adapter.clone()),
            PaginationConfig::default(),
        )
    }
}

// =============================================================================
// HELPERS
// =============================================================================

pub fn list_request(pairs: &[(&str, &str)]) -> ListRequest {
    let pairs: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ListRequest::from_pairs(&pairs).expect("list request should parse")
}

pub fn assert_not_found<T: std::fmt::Debug>(result: Result<T, EngineError>, context: &str) {
    match result {
        Err(EngineError::NotFound(_)) => {}
        other => panic!("{}: expected NotFound, got {:?}", context, other),
    }
}

pub fn assert_validation<T: std::fmt::Debug>(result: Result<T, EngineError>, context: &str) {
    match result {
        Err(EngineError::Validation(_)) => {}
        other => panic!("{}: expected ValidationError, got {:?}", context, other),
    }
}
