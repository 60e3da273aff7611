//! Immutable catalog snapshots.

use crate::system::is_system_entry;
use autorest_core::SchemaTableEntry;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A discovered table, resolved against a snapshot.
///
/// There is no public constructor: the only way to get one is
/// [`CatalogSnapshot::resolve`], which returns the canonical names as they
/// were discovered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableRef {
    entry: SchemaTableEntry,
}

impl TableRef {
    pub fn schema(&self) -> &str {
        &self.entry.schema
    }

    pub fn table(&self) -> &str {
        &self.entry.table
    }

    pub fn entry(&self) -> &SchemaTableEntry {
        &self.entry
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.entry.fmt(f)
    }
}

/// Schema name → table names, ordered by schema then table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSnapshot {
    schemas: BTreeMap<String, BTreeSet<String>>,
    discovered_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    /// Build a snapshot from raw discovery output.
    ///
    /// Names are trimmed, empty names and duplicates dropped, and system
    /// schemas/tables removed.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = SchemaTableEntry>,
    {
        let mut schemas: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for entry in entries {
            let schema = entry.schema.trim();
            let table = entry.table.trim();
            if schema.is_empty() || table.is_empty() || is_system_entry(schema, table) {
                continue;
            }
            schemas
                .entry(schema.to_string())
                .or_default()
                .insert(table.to_string());
        }
        Self {
            schemas,
            discovered_at: Utc::now(),
        }
    }

    pub fn discovered_at(&self) -> DateTime<Utc> {
        self.discovered_at
    }

    pub fn len(&self) -> usize {
        self.schemas.values().map(|t| t.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn schemas(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(|s| s.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = SchemaTableEntry> + '_ {
        self.schemas.iter().flat_map(|(schema, tables)| {
            tables
                .iter()
                .map(move |table| SchemaTableEntry::new(schema.clone(), table.clone()))
        })
    }

    /// Exact-name membership.
    pub fn contains(&self, schema: &str, table: &str) -> bool {
        self.schemas
            .get(schema)
            .is_some_and(|tables| tables.contains(table))
    }

    /// Resolve user-supplied names to a discovered table.
    ///
    /// An exact match wins; otherwise a case-insensitive match is accepted
    /// when it is unambiguous.
    pub fn resolve(&self, schema: &str, table: &str) -> Option<TableRef> {
        if self.contains(schema, table) {
            return Some(TableRef {
                entry: SchemaTableEntry::new(schema, table),
            });
        }

        let mut found: Option<TableRef> = None;
        for (s, tables) in &self.schemas {
            if !s.eq_ignore_ascii_case(schema) {
                continue;
            }
            for t in tables {
                if t.eq_ignore_ascii_case(table) {
                    if found.is_some() {
                        return None;
                    }
                    found = Some(TableRef {
                        entry: SchemaTableEntry::new(s.clone(), t.clone()),
                    });
                }
            }
        }
        found
    }

    /// A new snapshot holding only the entries `keep` accepts.
    pub fn retain<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&str, &str) -> bool,
    {
        let mut schemas: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (schema, tables) in &self.schemas {
            let kept: BTreeSet<String> = tables
                .iter()
                .filter(|t| keep(schema, t))
                .cloned()
                .collect();
            if !kept.is_empty() {
                schemas.insert(schema.clone(), kept);
            }
        }
        Self {
            schemas,
            discovered_at: self.discovered_at,
        }
    }
}
