//! Generic row and column shaping for executed statements.

mod result_set;
mod row;

pub use result_set::ResultSet;
pub use row::Row;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use crate::value::Literal;

/// Shape raw driver rows into a [`ResultSet`].
///
/// # Errors
/// Returns the driver error when a column value cannot be decoded.
pub(crate) fn build_result_set(
    rows: &[tokio_postgres::Row],
) -> Result<ResultSet, tokio_postgres::Error> {
    let mut result_set = ResultSet::with_capacity(rows.len());
    if let Some(row) = rows.first() {
        let cols: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
        result_set.set_column_names(Arc::new(cols));
    }

    for row in rows {
        let col_count = row.columns().len();
        let mut values = Vec::with_capacity(col_count);
        for idx in 0..col_count {
            values.push(extract_value(row, idx)?);
        }
        result_set.add_row_values(values);
    }

    Ok(result_set)
}

/// Decode one column of a driver row into a [`Literal`].
///
/// Unrecognized types fall back to their text form; decoding stays generic by
/// design, anything richer is the caller's concern.
fn extract_value(
    row: &tokio_postgres::Row,
    idx: usize,
) -> Result<Literal, tokio_postgres::Error> {
    let type_name = row.columns()[idx].type_().name();

    match type_name {
        "int2" => {
            let val: Option<i16> = row.try_get(idx)?;
            Ok(val.map_or(Literal::Null, |v| Literal::Int(i64::from(v))))
        }
        "int4" => {
            let val: Option<i32> = row.try_get(idx)?;
            Ok(val.map_or(Literal::Null, |v| Literal::Int(i64::from(v))))
        }
        "int8" => {
            let val: Option<i64> = row.try_get(idx)?;
            Ok(val.map_or(Literal::Null, Literal::Int))
        }
        "float4" => {
            let val: Option<f32> = row.try_get(idx)?;
            Ok(val.map_or(Literal::Null, |v| Literal::Float(f64::from(v))))
        }
        "float8" => {
            let val: Option<f64> = row.try_get(idx)?;
            Ok(val.map_or(Literal::Null, Literal::Float))
        }
        "bool" => {
            let val: Option<bool> = row.try_get(idx)?;
            Ok(val.map_or(Literal::Null, Literal::Bool))
        }
        "timestamp" => {
            let val: Option<chrono::NaiveDateTime> = row.try_get(idx)?;
            Ok(val.map_or(Literal::Null, |v| Literal::Timestamp(v.and_utc())))
        }
        "timestamptz" => {
            let val: Option<DateTime<Utc>> = row.try_get(idx)?;
            Ok(val.map_or(Literal::Null, Literal::Timestamp))
        }
        "json" | "jsonb" => {
            let val: Option<JsonValue> = row.try_get(idx)?;
            Ok(val.map_or(Literal::Null, Literal::Json))
        }
        _ => {
            let val: Option<String> = row.try_get(idx)?;
            Ok(val.map_or(Literal::Null, Literal::Text))
        }
    }
}
