use polars::prelude::*;
use serde_json::{Number, Value};

use crate::listing_structs::NormalizedRecord;

/// Columns forwarded to ingestion. Everything else the scraper returns is dropped.
pub const KEEP_COLUMNS: [&str; 10] = [
    "property_url",
    "property_id",
    "listing_id",
    "mls_id",
    "formatted_address",
    "city",
    "state",
    "zip_code",
    "list_price",
    "list_date",
];

/// Flattens a scrape result into records, one per row, in row order.
pub fn df_to_items(df: Option<&DataFrame>) -> Vec<NormalizedRecord> {
    let Some(df) = df else {
        return vec![];
    };
    if df.height() == 0 {
        return vec![];
    }

    let columns: Vec<Option<&Series>> = KEEP_COLUMNS
        .iter()
        .map(|name| df.column(name).ok())
        .collect();

    (0..df.height())
        .map(|idx| {
            project_row(|name| {
                let pos = KEEP_COLUMNS.iter().position(|c| *c == name)?;
                columns[pos].and_then(|s| s.get(idx).ok())
            })
        })
        .collect()
}

/// Projects one row onto the record shape. `cell` yields the row's value for
/// a column, or `None` when the column is absent.
pub fn project_row<'a, F>(cell: F) -> NormalizedRecord
where
    F: Fn(&str) -> Option<AnyValue<'a>>,
{
    let text = |name: &str| cell(name).and_then(as_text);

    NormalizedRecord {
        property_url: text("property_url"),
        property_id: text("property_id"),
        listing_id: text("listing_id"),
        mls_id: text("mls_id"),
        formatted_address: text("formatted_address"),
        city: text("city"),
        state: text("state"),
        zip_code: text("zip_code"),
        list_price: cell("list_price").and_then(as_native),
        list_date: text("list_date"),
    }
}

fn as_text(value: AnyValue) -> Option<String> {
    match value {
        AnyValue::Null => None,
        AnyValue::Utf8(s) => Some(s.to_string()),
        AnyValue::Utf8Owned(s) => Some(s.to_string()),
        AnyValue::Int32(v) => Some(v.to_string()),
        AnyValue::Int64(v) => Some(v.to_string()),
        AnyValue::UInt32(v) => Some(v.to_string()),
        AnyValue::UInt64(v) => Some(v.to_string()),
        AnyValue::Float32(v) => Some(float_text(v as f64)),
        AnyValue::Float64(v) => Some(float_text(v)),
        other => Some(other.to_string()),
    }
}

/// Whole floats keep a trailing `.0`, so `78704.0` never reads as an integer id.
fn float_text(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}

/// Keeps the scraper's own type for the value.
fn as_native(value: AnyValue) -> Option<Value> {
    match value {
        AnyValue::Null => None,
        AnyValue::Boolean(b) => Some(Value::Bool(b)),
        AnyValue::Int32(v) => Some(Value::from(v)),
        AnyValue::Int64(v) => Some(Value::from(v)),
        AnyValue::UInt32(v) => Some(Value::from(v)),
        AnyValue::UInt64(v) => Some(Value::from(v)),
        AnyValue::Float32(v) => Number::from_f64(v as f64).map(Value::Number),
        AnyValue::Float64(v) => Number::from_f64(v).map(Value::Number),
        AnyValue::Utf8(s) => Some(Value::String(s.to_string())),
        AnyValue::Utf8Owned(s) => Some(Value::String(s.to_string())),
        other => Some(Value::String(other.to_string())),
    }
}
