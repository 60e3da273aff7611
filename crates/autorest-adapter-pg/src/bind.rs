//! Turning [`Bind`] values into Postgres arguments.

use crate::query::Bind;
use autorest_core::{ColumnInfo, EngineError, TypeFamily};
use serde_json::Value;
use sqlx::Arguments;
use sqlx::postgres::PgArguments;

fn args_add<T>(args: &mut PgArguments, v: T) -> Result<(), EngineError>
where
    T: Send + Sync + 'static,
    for<'q> T: sqlx::Encode<'q, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    args.add(v)
        .map_err(|e| EngineError::Execution(format!("failed to encode argument: {}", e)))
}

pub fn arguments(binds: &[Bind]) -> Result<PgArguments, EngineError> {
    let mut args = PgArguments::default();
    for bind in binds {
        match bind {
            Bind::Column { column, value } => add_arg_for_col(&mut args, column, value)?,
            Bind::Text(s) => args_add(&mut args, s.clone())?,
            Bind::Int(n) => args_add(&mut args, *n)?,
        }
    }
    Ok(args)
}

fn expected(col: &ColumnInfo, what: &str) -> EngineError {
    EngineError::validation(format!("Column '{}' expects {}", col.name, what))
}

/// Bind `v` typed for `col`. Numeric and date/time values are bound as text
/// and rely on the cast the builder put after the placeholder.
pub fn add_arg_for_col(args: &mut PgArguments, col: &ColumnInfo, v: &Value) -> Result<(), EngineError> {
    let family = col.type_family();

    if v.is_null() {
        if !col.nullable {
            return Err(EngineError::validation(format!(
                "Column '{}' is not nullable but received null",
                col.name
            )));
        }
        // Bind a NULL of an appropriate type.
        return match family {
            TypeFamily::Uuid => args_add(args, Option::<uuid::Uuid>::None),
            TypeFamily::Boolean => args_add(args, Option::<bool>::None),
            TypeFamily::Integer => args_add(args, Option::<i64>::None),
            TypeFamily::Json => args_add(args, Option::<sqlx::types::Json<Value>>::None),
            _ => args_add(args, Option::<String>::None),
        };
    }

    match family {
        TypeFamily::Uuid => {
            let s = v.as_str().ok_or_else(|| expected(col, "a uuid string"))?;
            let id = uuid::Uuid::parse_str(s).map_err(|_| expected(col, "a uuid string"))?;
            args_add(args, id)
        }
        TypeFamily::Boolean => {
            let b = v.as_bool().ok_or_else(|| expected(col, "a boolean"))?;
            args_add(args, b)
        }
        TypeFamily::Integer => {
            let n = match v {
                Value::String(s) => s.trim().parse::<i64>().ok(),
                other => other.as_i64(),
            }
            .ok_or_else(|| expected(col, "an integer"))?;
            args_add(args, n)
        }
        TypeFamily::Json => args_add(args, sqlx::types::Json(v.clone())),
        TypeFamily::Numeric => match v {
            Value::Number(n) => args_add(args, n.to_string()),
            Value::String(s) => args_add(args, s.clone()),
            _ => Err(expected(col, "a number")),
        },
        TypeFamily::Temporal => {
            let s = v.as_str().ok_or_else(|| expected(col, "a date/time string"))?;
            args_add(args, s.to_string())
        }
        TypeFamily::Text => {
            let s = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            args_add(args, s)
        }
        TypeFamily::Other => args_add(args, text_literal(v)),
    }
}

/// Text input form of `v` for a column cast from text. JSON arrays become
/// array literals (`{"a","b"}`); scalars keep their plain text form.
fn text_literal(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Array(items) => array_literal(items),
        other => other.to_string(),
    }
}

fn array_literal(items: &[Value]) -> String {
    let elements: Vec<String> = items
        .iter()
        .map(|item| match item {
            Value::Null => "NULL".to_string(),
            Value::Array(nested) => array_literal(nested),
            other => {
                let text = match other {
                    Value::String(s) => s.clone(),
                    v => v.to_string(),
                };
                format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
            }
        })
        .collect();
    format!("{{{}}}", elements.join(","))
}
