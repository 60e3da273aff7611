//! Built-in exclusions for engine-internal schemas and tables.
//!
//! Applied to every discovery result regardless of the access policy.

/// Schemas that belong to the engine, compared case-insensitively.
pub const SYSTEM_SCHEMAS: &[&str] = &["pg_catalog", "information_schema", "pg_toast", "sys"];

/// Schema name prefixes used for per-session temporary schemas.
pub const SYSTEM_SCHEMA_PREFIXES: &[&str] = &["pg_temp_", "pg_toast_temp_"];

/// Table name prefixes reserved for engine and migration-tool bookkeeping.
pub const SYSTEM_TABLE_PREFIXES: &[&str] = &["pg_", "_sqlx_", "__"];

pub fn is_system_schema(schema: &str) -> bool {
    let lower = schema.to_ascii_lowercase();
    SYSTEM_SCHEMAS.contains(&lower.as_str())
        || SYSTEM_SCHEMA_PREFIXES.iter().any(|p| lower.starts_with(p))
}

pub fn is_system_table(table: &str) -> bool {
    let lower = table.to_ascii_lowercase();
    SYSTEM_TABLE_PREFIXES.iter().any(|p| lower.starts_with(p))
}

pub fn is_system_entry(schema: &str, table: &str) -> bool {
    is_system_schema(schema) || is_system_table(table)
}
