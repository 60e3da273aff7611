//! Autorest Access Policy
//!
//! Static allow/deny lists over schemas and tables, applied on top of the
//! discovered catalog. A table is exposed when all of these hold:
//!
//! 1. it is present in the current catalog snapshot
//! 2. `allowed_schemas` is empty or names its schema
//! 3. `excluded_schemas` does not name its schema
//! 4. `excluded_tables` names neither `table` nor `schema.table`
//!
//! All comparisons are ASCII case-insensitive. The policy holds no state
//! beyond its configuration and is evaluated per request.

use autorest_catalog::CatalogSnapshot;
use autorest_core::AccessConfig;
use std::collections::HashSet;

/// Outcome of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exposure {
    Exposed,
    NotInCatalog,
    SchemaNotAllowed,
    SchemaExcluded,
    TableExcluded,
}

impl Exposure {
    pub fn is_exposed(&self) -> bool {
        matches!(self, Exposure::Exposed)
    }

    /// Short reason, for logs only. Clients always see a plain 404.
    pub fn reason(&self) -> &'static str {
        match self {
            Exposure::Exposed => "exposed",
            Exposure::NotInCatalog => "not in catalog",
            Exposure::SchemaNotAllowed => "schema not in allowed_schemas",
            Exposure::SchemaExcluded => "schema in excluded_schemas",
            Exposure::TableExcluded => "table in excluded_tables",
        }
    }
}

/// Compiled access policy.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    allowed_schemas: HashSet<String>,
    excluded_schemas: HashSet<String>,
    /// Bare table names, excluded in every schema.
    excluded_tables: HashSet<String>,
    /// `(schema, table)` pairs from qualified entries.
    excluded_qualified: HashSet<(String, String)>,
}

fn normalize(name: &str) -> Option<String> {
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_ascii_lowercase())
}

/// Split an `excluded_tables` entry into `(schema, table)`.
///
/// Double-quoted parts may contain dots (`"v1.orders"`, `sales."v1.orders"`)
/// and `""` for a literal quote. An entry that is not exactly one or two
/// non-empty parts is taken verbatim as a bare table name.
fn split_table_entry(entry: &str) -> (Option<String>, String) {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = entry.chars().peekable();
    let mut quoted = false;
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
            }
            '"' => quoted = !quoted,
            '.' if !quoted => parts.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    parts.push(current);

    if quoted || parts.iter().any(|p| p.is_empty()) {
        return (None, entry.to_string());
    }
    match <[String; 2]>::try_from(parts) {
        Ok([schema, table]) => (Some(schema), table),
        Err(mut parts) if parts.len() == 1 => (None, parts.remove(0)),
        Err(_) => (None, entry.to_string()),
    }
}

impl AccessPolicy {
    /// A policy that exposes everything in the catalog.
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn from_config(config: &AccessConfig) -> Self {
        let mut excluded_tables = HashSet::new();
        let mut excluded_qualified = HashSet::new();
        for entry in config.excluded_tables.iter().filter_map(|t| normalize(t)) {
            match split_table_entry(&entry) {
                (Some(schema), table) => {
                    excluded_qualified.insert((schema, table));
                }
                (None, table) => {
                    excluded_tables.insert(table);
                }
            }
        }
        Self {
            allowed_schemas: config
                .allowed_schemas
                .iter()
                .filter_map(|s| normalize(s))
                .collect(),
            excluded_schemas: config
                .excluded_schemas
                .iter()
                .filter_map(|s| normalize(s))
                .collect(),
            excluded_tables,
            excluded_qualified,
        }
    }

    /// Evaluate the allow/deny lists alone, ignoring catalog membership.
    pub fn check_names(&self, schema: &str, table: &str) -> Exposure {
        let schema = schema.trim().to_ascii_lowercase();
        let table = table.trim().to_ascii_lowercase();

        if !self.allowed_schemas.is_empty() && !self.allowed_schemas.contains(&schema) {
            return Exposure::SchemaNotAllowed;
        }
        if self.excluded_schemas.contains(&schema) {
            return Exposure::SchemaExcluded;
        }
        if self.excluded_tables.contains(&table)
            || self.excluded_qualified.contains(&(schema, table))
        {
            return Exposure::TableExcluded;
        }
        Exposure::Exposed
    }

    /// Full check against the current snapshot.
    pub fn check(&self, schema: &str, table: &str, catalog: &CatalogSnapshot) -> Exposure {
        let Some(resolved) = catalog.resolve(schema, table) else {
            return Exposure::NotInCatalog;
        };
        let decision = self.check_names(resolved.schema(), resolved.table());
        if !decision.is_exposed() {
            tracing::debug!(
                schema = resolved.schema(),
                table = resolved.table(),
                reason = decision.reason(),
                "Table hidden by access policy"
            );
        }
        decision
    }

    pub fn is_exposed(&self, schema: &str, table: &str, catalog: &CatalogSnapshot) -> bool {
        self.check(schema, table, catalog).is_exposed()
    }

    /// The snapshot restricted to exposed tables.
    pub fn exposed_set(&self, catalog: &CatalogSnapshot) -> CatalogSnapshot {
        catalog.retain(|schema, table| self.check_names(schema, table).is_exposed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autorest_core::SchemaTableEntry;

    fn catalog() -> CatalogSnapshot {
        CatalogSnapshot::from_entries(vec![
            SchemaTableEntry::new("sales", "customer"),
            SchemaTableEntry::new("sales", "audit_log"),
            SchemaTableEntry::new("hr", "employee"),
            SchemaTableEntry::new("hr", "audit_log"),
            SchemaTableEntry::new("staging", "raw_import"),
            SchemaTableEntry::new("sys", "internal"),
        ])
    }

    fn names(snapshot: &CatalogSnapshot) -> Vec<String> {
        snapshot.entries().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_allow_all_exposes_catalog_minus_system() {
        let policy = AccessPolicy::allow_all();
        let exposed = policy.exposed_set(&catalog());
        assert_eq!(exposed.len(), 5);
        assert!(!policy.is_exposed("sys", "internal", &catalog()));
    }

    #[test]
    fn test_allowed_schemas() {
        let policy = AccessPolicy::from_config(&AccessConfig {
            allowed_schemas: vec!["Sales".to_string()],
            ..Default::default()
        });
        assert_eq!(
            names(&policy.exposed_set(&catalog())),
            vec!["sales.audit_log", "sales.customer"]
        );
        assert_eq!(
            policy.check("hr", "employee", &catalog()),
            Exposure::SchemaNotAllowed
        );
    }

    #[test]
    fn test_excluded_schema_wins_over_allowed() {
        let policy = AccessPolicy::from_config(&AccessConfig {
            allowed_schemas: vec!["sales".to_string(), "staging".to_string()],
            excluded_schemas: vec!["staging".to_string()],
            ..Default::default()
        });
        assert_eq!(
            policy.check("staging", "raw_import", &catalog()),
            Exposure::SchemaExcluded
        );
        assert!(policy.is_exposed("sales", "customer", &catalog()));
    }

    #[test]
    fn test_excluded_tables_bare_and_qualified() {
        let policy = AccessPolicy::from_config(&AccessConfig {
            excluded_tables: vec!["AUDIT_LOG".to_string(), "hr.employee".to_string()],
            ..Default::default()
        });
        assert_eq!(
            names(&policy.exposed_set(&catalog())),
            vec!["sales.customer", "staging.raw_import"]
        );

        let qualified_only = AccessPolicy::from_config(&AccessConfig {
            excluded_tables: vec!["sales.audit_log".to_string()],
            ..Default::default()
        });
        assert!(!qualified_only.is_exposed("sales", "audit_log", &catalog()));
        assert!(qualified_only.is_exposed("hr", "audit_log", &catalog()));
    }

    #[test]
    fn test_quoted_table_names_may_contain_dots() {
        let catalog = CatalogSnapshot::from_entries(vec![
            SchemaTableEntry::new("sales", "v1.orders"),
            SchemaTableEntry::new("hr", "v1.orders"),
            SchemaTableEntry::new("sales", "orders"),
        ]);

        let bare = AccessPolicy::from_config(&AccessConfig {
            excluded_tables: vec!["\"V1.Orders\"".to_string()],
            ..Default::default()
        });
        assert_eq!(names(&bare.exposed_set(&catalog)), vec!["sales.orders"]);

        let qualified = AccessPolicy::from_config(&AccessConfig {
            excluded_tables: vec!["hr.\"v1.orders\"".to_string()],
            ..Default::default()
        });
        assert_eq!(
            names(&qualified.exposed_set(&catalog)),
            vec!["sales.orders", "sales.v1.orders"]
        );
    }

    #[test]
    fn test_split_table_entry() {
        assert_eq!(split_table_entry("audit_log"), (None, "audit_log".to_string()));
        assert_eq!(
            split_table_entry("sales.audit_log"),
            (Some("sales".to_string()), "audit_log".to_string())
        );
        assert_eq!(split_table_entry("\"a.b\""), (None, "a.b".to_string()));
        assert_eq!(split_table_entry("\"we\"\"ird\""), (None, "we\"ird".to_string()));
        assert_eq!(split_table_entry("a.b.c"), (None, "a.b.c".to_string()));
        assert_eq!(split_table_entry(".x"), (None, ".x".to_string()));
    }

    #[test]
    fn test_absent_from_catalog_is_never_exposed() {
        let policy = AccessPolicy::allow_all();
        assert_eq!(
            policy.check("sales", "invoice", &catalog()),
            Exposure::NotInCatalog
        );
        assert!(policy.is_exposed("SALES", "Customer", &catalog()));
    }

    #[test]
    fn test_blank_entries_are_ignored() {
        let policy = AccessPolicy::from_config(&AccessConfig {
            allowed_schemas: vec!["  ".to_string()],
            excluded_tables: vec![String::new()],
            ..Default::default()
        });
        assert_eq!(policy.exposed_set(&catalog()).len(), 5);
    }
}
