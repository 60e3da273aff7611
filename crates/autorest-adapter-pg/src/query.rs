//! Parameterized statement builder.
//!
//! Pure functions from a validated table and intent to SQL text plus bind
//! values. Identifiers are taken only from [`TableRef`] and catalog
//! [`ColumnInfo`] and are always double-quoted; every value becomes a `$n`
//! placeholder. Rows come back as a single `to_jsonb(t) AS row` column so one
//! code path serves every table shape.

use autorest_catalog::{TableDescription, TableRef};
use autorest_core::{
    Assignment, ColumnFilter, ColumnInfo, EngineError, FilterOp, ListQuery, RowKey, Search,
    TypeFamily,
};
use serde_json::Value;

/// A value waiting to be bound to a placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Bind {
    /// Typed according to the column it is compared with or assigned to.
    Column { column: ColumnInfo, value: Value },
    Text(String),
    Int(i64),
}

/// SQL text plus its binds, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub binds: Vec<Bind>,
}

/// The COUNT and data statements for one list request. Both share the same
/// predicate text and the same leading binds.
#[derive(Debug, Clone, PartialEq)]
pub struct ListStatements {
    pub count: Statement,
    pub data: Statement,
}

/// Quote an identifier, doubling embedded quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// `"schema"."table"`
pub fn table_ident(table: &TableRef) -> String {
    format!("{}.{}", quote_ident(table.schema()), quote_ident(table.table()))
}

/// Explicit cast for columns whose values are bound as text.
pub fn cast_for_pg_type(data_type: &str) -> Option<&'static str> {
    match data_type {
        "numeric" | "real" | "double precision" | "decimal" | "money" => Some("numeric"),
        "date" => Some("date"),
        "timestamp with time zone" => Some("timestamptz"),
        "timestamp without time zone" => Some("timestamp"),
        "time with time zone" => Some("timetz"),
        "time without time zone" => Some("time"),
        _ => None,
    }
}

/// Cast suffix for a placeholder typed for `column`.
///
/// Columns without a native binding are bound as text and cast through
/// `::text` to their catalog type, e.g. `$1::text::"public"."mood"`.
fn column_cast(column: &ColumnInfo) -> String {
    if let Some(cast) = cast_for_pg_type(&column.data_type) {
        return format!("::{}", cast);
    }
    match (&column.udt, column.type_family()) {
        (Some((schema, name)), TypeFamily::Other) => {
            format!("::text::{}.{}", quote_ident(schema), quote_ident(name))
        }
        _ => String::new(),
    }
}

/// Escape `%`, `_` and `\` so a search term matches literally inside
/// `ILIKE '%…%'`.
fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

#[derive(Debug, Default)]
struct Binder {
    binds: Vec<Bind>,
}

impl Binder {
    fn with(binds: Vec<Bind>) -> Self {
        Self { binds }
    }

    fn next(&self) -> usize {
        self.binds.len() + 1
    }

    fn column(&mut self, column: &ColumnInfo, value: Value) -> String {
        let placeholder = format!("${}", self.next());
        let cast = column_cast(column);
        self.binds.push(Bind::Column {
            column: column.clone(),
            value,
        });
        format!("{}{}", placeholder, cast)
    }

    fn text(&mut self, value: String) -> String {
        let placeholder = format!("${}", self.next());
        self.binds.push(Bind::Text(value));
        placeholder
    }

    fn int(&mut self, value: i64) -> String {
        let placeholder = format!("${}", self.next());
        self.binds.push(Bind::Int(value));
        placeholder
    }
}

/// Left-hand side of a comparison. Columns of types the adapter cannot bind
/// natively are compared through their text form.
fn compare_expr(column: &ColumnInfo) -> String {
    match column.type_family() {
        TypeFamily::Other => format!("{}::text", quote_ident(&column.name)),
        _ => quote_ident(&column.name),
    }
}

fn compare_bind(binder: &mut Binder, column: &ColumnInfo, value: &Value) -> String {
    match column.type_family() {
        TypeFamily::Other => binder.text(match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }),
        _ => binder.column(column, value.clone()),
    }
}

fn filter_sql(binder: &mut Binder, filter: &ColumnFilter) -> Result<String, EngineError> {
    let column = &filter.column;
    match filter.op {
        FilterOp::Like => {
            let term = match filter.values.first() {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            };
            let placeholder = binder.text(like_pattern(&term));
            Ok(format!(
                "{}::text ILIKE {}",
                quote_ident(&column.name),
                placeholder
            ))
        }
        FilterOp::In => {
            if filter.values.is_empty() {
                return Err(EngineError::validation(format!(
                    "'in' filter on '{}' requires at least one value",
                    column.name
                )));
            }
            let placeholders: Vec<String> = filter
                .values
                .iter()
                .map(|v| compare_bind(binder, column, v))
                .collect();
            Ok(format!(
                "{} IN ({})",
                compare_expr(column),
                placeholders.join(", ")
            ))
        }
        op => {
            let comparison = op.comparison().unwrap_or("=");
            let value = filter.values.first().cloned().unwrap_or(Value::Null);
            let placeholder = compare_bind(binder, column, &value);
            Ok(format!(
                "{} {} {}",
                compare_expr(column),
                comparison,
                placeholder
            ))
        }
    }
}

fn search_sql(binder: &mut Binder, search: &Search) -> Option<String> {
    if search.columns.is_empty() {
        return None;
    }
    let placeholder = binder.text(like_pattern(&search.term));
    let terms: Vec<String> = search
        .columns
        .iter()
        .map(|c| format!("{}::text ILIKE {}", quote_ident(&c.name), placeholder))
        .collect();
    Some(format!("({})", terms.join(" OR ")))
}

/// `WHERE …` for a list query (empty when unfiltered) and its binds.
fn list_predicate(query: &ListQuery) -> Result<(String, Vec<Bind>), EngineError> {
    let mut binder = Binder::default();
    let mut parts: Vec<String> = Vec::new();
    for filter in &query.filters {
        parts.push(filter_sql(&mut binder, filter)?);
    }
    if let Some(search) = &query.search
        && let Some(sql) = search_sql(&mut binder, search)
    {
        parts.push(sql);
    }
    let clause = if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    };
    Ok((clause, binder.binds))
}

fn order_clause(query: &ListQuery) -> String {
    if query.order.is_empty() {
        return String::new();
    }
    let terms: Vec<String> = query
        .order
        .iter()
        .map(|o| {
            format!(
                "{} {} NULLS LAST",
                quote_ident(&o.column.name),
                if o.descending { "DESC" } else { "ASC" }
            )
        })
        .collect();
    format!(" ORDER BY {}", terms.join(", "))
}

pub fn select_page(table: &TableDescription, query: &ListQuery) -> Result<ListStatements, EngineError> {
    let from = table_ident(table.table());
    let (predicate, binds) = list_predicate(query)?;

    let count = Statement {
        sql: format!("SELECT count(*)::bigint AS cnt FROM {} AS t{}", from, predicate),
        binds: binds.clone(),
    };

    let mut binder = Binder::with(binds);
    let limit = binder.int(i64::from(query.page_size));
    let offset = binder.int(i64::try_from(query.offset()).unwrap_or(i64::MAX));
    let data = Statement {
        sql: format!(
            "SELECT to_jsonb(t) AS row FROM {} AS t{}{} LIMIT {} OFFSET {}",
            from,
            predicate,
            order_clause(query),
            limit,
            offset
        ),
        binds: binder.binds,
    };

    Ok(ListStatements { count, data })
}

pub fn select_by_key(table: &TableDescription, key: &RowKey) -> Statement {
    let mut binder = Binder::default();
    let placeholder = binder.column(&key.column, key.value.clone());
    Statement {
        sql: format!(
            "SELECT to_jsonb(t) AS row FROM {} AS t WHERE {} = {} LIMIT 1",
            table_ident(table.table()),
            quote_ident(&key.column.name),
            placeholder
        ),
        binds: binder.binds,
    }
}

pub fn insert(table: &TableDescription, values: &[Assignment]) -> Statement {
    let into = table_ident(table.table());
    if values.is_empty() {
        return Statement {
            sql: format!(
                "INSERT INTO {} AS t DEFAULT VALUES RETURNING to_jsonb(t) AS row",
                into
            ),
            binds: Vec::new(),
        };
    }

    let mut binder = Binder::default();
    let columns: Vec<String> = values.iter().map(|a| quote_ident(&a.column.name)).collect();
    let placeholders: Vec<String> = values
        .iter()
        .map(|a| binder.column(&a.column, a.value.clone()))
        .collect();
    Statement {
        sql: format!(
            "INSERT INTO {} AS t ({}) VALUES ({}) RETURNING to_jsonb(t) AS row",
            into,
            columns.join(", "),
            placeholders.join(", ")
        ),
        binds: binder.binds,
    }
}

pub fn update(
    table: &TableDescription,
    key: &RowKey,
    values: &[Assignment],
) -> Result<Statement, EngineError> {
    if values.is_empty() {
        return Err(EngineError::validation(
            "Update payload must contain at least one column",
        ));
    }

    let mut binder = Binder::default();
    let set_parts: Vec<String> = values
        .iter()
        .map(|a| {
            let placeholder = binder.column(&a.column, a.value.clone());
            format!("{} = {}", quote_ident(&a.column.name), placeholder)
        })
        .collect();
    let key_placeholder = binder.column(&key.column, key.value.clone());
    Ok(Statement {
        sql: format!(
            "UPDATE {} AS t SET {} WHERE {} = {} RETURNING to_jsonb(t) AS row",
            table_ident(table.table()),
            set_parts.join(", "),
            quote_ident(&key.column.name),
            key_placeholder
        ),
        binds: binder.binds,
    })
}

pub fn delete(table: &TableDescription, key: &RowKey) -> Statement {
    let mut binder = Binder::default();
    let placeholder = binder.column(&key.column, key.value.clone());
    Statement {
        sql: format!(
            "DELETE FROM {} AS t WHERE {} = {}",
            table_ident(table.table()),
            quote_ident(&key.column.name),
            placeholder
        ),
        binds: binder.binds,
    }
}
