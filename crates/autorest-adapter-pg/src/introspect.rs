use async_trait::async_trait;
use autorest_catalog::{MetadataSource, TableRef};
use autorest_core::{ColumnInfo, SchemaTableEntry};
use sqlx::{PgPool, Row};
use std::collections::HashSet;

/// Reads schema metadata from `information_schema`.
#[derive(Debug, Clone)]
pub struct PgMetadataSource {
    pool: PgPool,
}

impl PgMetadataSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetadataSource for PgMetadataSource {
    async fn list_tables(&self) -> anyhow::Result<Vec<SchemaTableEntry>> {
        let rows = sqlx::query(
            r#"
            select table_schema, table_name
            from information_schema.tables
            where table_type = 'BASE TABLE'
              and table_schema not in ('pg_catalog', 'information_schema')
            order by table_schema, table_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                SchemaTableEntry::new(
                    row.get::<String, _>("table_schema"),
                    row.get::<String, _>("table_name"),
                )
            })
            .collect())
    }

    async fn describe_table(&self, table: &TableRef) -> anyhow::Result<Vec<ColumnInfo>> {
        let col_rows = sqlx::query(
            r#"
            select column_name, data_type, is_nullable, column_default, udt_schema, udt_name
            from information_schema.columns
            where table_schema = $1 and table_name = $2
            order by ordinal_position
            "#,
        )
        .bind(table.schema())
        .bind(table.table())
        .fetch_all(&self.pool)
        .await?;

        // Primary key columns
        let pk_rows = sqlx::query(
            r#"
            select kcu.column_name
            from information_schema.table_constraints tc
            join information_schema.key_column_usage kcu
              on tc.constraint_name = kcu.constraint_name
             and tc.table_schema = kcu.table_schema
             and tc.table_name = kcu.table_name
            where tc.constraint_type = 'PRIMARY KEY'
              and tc.table_schema = $1
              and tc.table_name = $2
            order by kcu.ordinal_position
            "#,
        )
        .bind(table.schema())
        .bind(table.table())
        .fetch_all(&self.pool)
        .await?;

        let primary_key: HashSet<String> = pk_rows
            .into_iter()
            .map(|r| r.get::<String, _>("column_name"))
            .collect();

        Ok(col_rows
            .into_iter()
            .map(|c| {
                let name: String = c.get("column_name");
                let is_nullable: String = c.get("is_nullable");
                let udt_schema: Option<String> = c.get("udt_schema");
                let udt_name: Option<String> = c.get("udt_name");
                ColumnInfo {
                    is_primary_key: primary_key.contains(&name),
                    name,
                    data_type: c.get("data_type"),
                    nullable: is_nullable == "YES",
                    default: c.get("column_default"),
                    udt: udt_schema.zip(udt_name),
                }
            })
            .collect())
    }
}
