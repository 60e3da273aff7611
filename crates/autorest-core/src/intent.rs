//! Query intents.
//!
//! A [`ListRequest`] is what arrives over the wire: plain strings, nothing
//! checked against the table yet. The runtime turns it into a [`ListQuery`],
//! whose every column reference was looked up in the table's fetched column
//! list. Adapters only ever see the validated forms.

use crate::config::PaginationConfig;
use crate::error::EngineError;
use crate::{ColumnInfo, TypeFamily};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The four statement kinds the engine issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Select => "select",
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// Supported filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    In,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Ne => "ne",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::Like => "like",
            FilterOp::In => "in",
        }
    }

    /// SQL comparison operator for the scalar operators.
    pub fn comparison(&self) -> Option<&'static str> {
        match self {
            FilterOp::Eq => Some("="),
            FilterOp::Ne => Some("<>"),
            FilterOp::Gt => Some(">"),
            FilterOp::Gte => Some(">="),
            FilterOp::Lt => Some("<"),
            FilterOp::Lte => Some("<="),
            FilterOp::Like | FilterOp::In => None,
        }
    }
}

impl FromStr for FilterOp {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eq" => Ok(FilterOp::Eq),
            "ne" => Ok(FilterOp::Ne),
            "gt" => Ok(FilterOp::Gt),
            "gte" => Ok(FilterOp::Gte),
            "lt" => Ok(FilterOp::Lt),
            "lte" => Ok(FilterOp::Lte),
            "like" => Ok(FilterOp::Like),
            "in" => Ok(FilterOp::In),
            other => Err(EngineError::validation(format!(
                "Unsupported filter operator '{}' (expected one of eq, ne, gt, gte, lt, lte, like, in)",
                other
            ))),
        }
    }
}

/// A filter as written by the client: `field:op:value`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub field: String,
    pub op: FilterOp,
    pub value: String,
}

impl FilterSpec {
    /// Parse `field:op:value`. The value may itself contain `:`.
    pub fn parse(raw: &str) -> Result<Self, EngineError> {
        let mut parts = raw.splitn(3, ':');
        let field = parts.next().unwrap_or_default().trim();
        let (Some(op), Some(value)) = (parts.next(), parts.next()) else {
            return Err(EngineError::validation(format!(
                "Malformed filter '{}' (expected field:operator:value)",
                raw
            )));
        };
        if field.is_empty() {
            return Err(EngineError::validation(format!(
                "Malformed filter '{}' (empty field name)",
                raw
            )));
        }
        Ok(Self {
            field: field.to_string(),
            op: op.parse()?,
            value: value.to_string(),
        })
    }
}

/// Unvalidated list parameters extracted from a query string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListRequest {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub search: Option<String>,
    pub sort_column: Option<String>,
    pub sort_descending: bool,
    pub filters: Vec<FilterSpec>,
}

impl ListRequest {
    /// Build from decoded query-string pairs. Unknown keys are ignored.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, EngineError> {
        let mut req = ListRequest::default();
        for (key, value) in pairs {
            let value = value.trim();
            match key.as_str() {
                "page" if !value.is_empty() => req.page = Some(parse_int("page", value)?),
                "pageSize" | "page_size" if !value.is_empty() => {
                    req.page_size = Some(parse_int("pageSize", value)?)
                }
                "search" if !value.is_empty() => req.search = Some(value.to_string()),
                "sortColumn" | "sort" if !value.is_empty() => {
                    req.sort_column = Some(value.to_string())
                }
                "sortDescending" | "desc" if !value.is_empty() => {
                    req.sort_descending = parse_bool("sortDescending", value)?
                }
                "filter" if !value.is_empty() => req.filters.push(FilterSpec::parse(value)?),
                _ => {}
            }
        }
        Ok(req)
    }

    /// Resolve `(page, page_size)`.
    ///
    /// Non-positive values are rejected; a page size above the configured
    /// cap (never more than [`PAGE_SIZE_LIMIT`](crate::config::PAGE_SIZE_LIMIT))
    /// is clamped to the cap.
    pub fn pagination(&self, cfg: &PaginationConfig) -> Result<(u32, u32), EngineError> {
        let page = self.page.unwrap_or(1);
        if page < 1 {
            return Err(EngineError::validation(format!(
                "page must be at least 1 (got {})",
                page
            )));
        }
        let page = u32::try_from(page)
            .map_err(|_| EngineError::validation(format!("page {} is out of range", page)))?;

        let size = self.page_size.unwrap_or(i64::from(cfg.default_page_size));
        if size < 1 {
            return Err(EngineError::validation(format!(
                "pageSize must be at least 1 (got {})",
                size
            )));
        }
        let size = size.min(i64::from(cfg.effective_max())) as u32;

        Ok((page, size))
    }
}

fn parse_int(name: &str, value: &str) -> Result<i64, EngineError> {
    value
        .parse::<i64>()
        .map_err(|_| EngineError::validation(format!("{} must be an integer (got '{}')", name, value)))
}

fn parse_bool(name: &str, value: &str) -> Result<bool, EngineError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(EngineError::validation(format!(
            "{} must be a boolean (got '{}')",
            name, value
        ))),
    }
}

/// Coerce a textual value (path segment, query parameter) into the JSON
/// representation expected for `column`.
pub fn coerce_text(column: &ColumnInfo, raw: &str) -> Result<Value, EngineError> {
    let invalid = || {
        EngineError::validation(format!(
            "Value '{}' is not valid for column '{}' ({})",
            raw, column.name, column.data_type
        ))
    };
    match column.type_family() {
        TypeFamily::Integer => raw.trim().parse::<i64>().map(Value::from).map_err(|_| invalid()),
        TypeFamily::Numeric => {
            raw.trim().parse::<f64>().map_err(|_| invalid())?;
            Ok(Value::String(raw.trim().to_string()))
        }
        TypeFamily::Boolean => parse_bool(&column.name, raw.trim())
            .map(Value::Bool)
            .map_err(|_| invalid()),
        TypeFamily::Uuid => uuid::Uuid::parse_str(raw.trim())
            .map(|u| Value::String(u.to_string()))
            .map_err(|_| invalid()),
        TypeFamily::Json => Ok(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))),
        TypeFamily::Temporal | TypeFamily::Text | TypeFamily::Other => {
            Ok(Value::String(raw.to_string()))
        }
    }
}

/// A validated filter: the column came from the table's column list and the
/// values are already coerced to the column type.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnFilter {
    pub column: ColumnInfo,
    pub op: FilterOp,
    /// One value for scalar operators and `like`, one or more for `in`.
    pub values: Vec<Value>,
}

impl ColumnFilter {
    pub fn new(column: ColumnInfo, spec: &FilterSpec) -> Result<Self, EngineError> {
        let values = match spec.op {
            FilterOp::Like => vec![Value::String(spec.value.clone())],
            FilterOp::In => {
                let items = split_in_list(&spec.value)?;
                items
                    .iter()
                    .map(|item| coerce_text(&column, item))
                    .collect::<Result<Vec<_>, _>>()?
            }
            _ => vec![coerce_text(&column, &spec.value)?],
        };
        Ok(Self {
            column,
            op: spec.op,
            values,
        })
    }
}

/// `in` accepts either `a,b,c` or a JSON array `["a","b"]`.
fn split_in_list(raw: &str) -> Result<Vec<String>, EngineError> {
    let trimmed = raw.trim();
    let items: Vec<String> = if trimmed.starts_with('[') {
        let arr: Vec<Value> = serde_json::from_str(trimmed).map_err(|_| {
            EngineError::validation(format!("Malformed array for 'in' filter: {}", raw))
        })?;
        arr.into_iter()
            .map(|v| match v {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect()
    } else {
        trimmed
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect()
    };
    if items.is_empty() {
        return Err(EngineError::validation("'in' filter requires at least one value"));
    }
    Ok(items)
}

/// One `ORDER BY` term.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: ColumnInfo,
    pub descending: bool,
}

/// Free-text search ORed across `columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct Search {
    pub term: String,
    pub columns: Vec<ColumnInfo>,
}

/// A fully validated list query.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub page: u32,
    pub page_size: u32,
    pub filters: Vec<ColumnFilter>,
    pub search: Option<Search>,
    /// Never empty: the runtime always supplies a deterministic order.
    pub order: Vec<OrderBy>,
}

impl ListQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

/// The key used by by-id operations, coerced to the key column's type.
#[derive(Debug, Clone, PartialEq)]
pub struct RowKey {
    pub column: ColumnInfo,
    pub value: Value,
}

impl RowKey {
    pub fn parse(column: &ColumnInfo, raw: &str) -> Result<Self, EngineError> {
        Ok(Self {
            value: coerce_text(column, raw)?,
            column: column.clone(),
        })
    }
}

/// A validated `column = value` pair from a request body.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: ColumnInfo,
    pub value: Value,
}
