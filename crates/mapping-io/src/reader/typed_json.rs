//! The `.json` columnar reader: a direct, schema-carrying encoding of
//! the [`Table`] data model —
//! `{"height": n, "columns": {"name": {"type": "int", "values": [...]}, ...}}`
//! — used in place of the unspecified production "columnar file" format
//! (Parquet/Arrow IPC). `serde_json`'s `preserve_order` feature keeps
//! the `columns` object in file order, matching the spec's requirement
//! that a reader be schema-carrying without losing column order.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value as Json;

use mapping_core::error::{Error, Result};
use mapping_core::table::{Column, Table};
use mapping_core::value::{Value, ValueType};

pub fn read_typed_json(path: &Path) -> Result<Table> {
    let text = fs::read_to_string(path)
        .map_err(|e| Error::mapping(format!("failed to read input file {}: {e}", path.display())))?;
    let root: Json = serde_json::from_str(&text)
        .map_err(|e| Error::mapping(format!("invalid JSON input file {}: {e}", path.display())))?;

    let obj = root
        .as_object()
        .ok_or_else(|| Error::mapping("input file must be a JSON object"))?;
    let height = obj
        .get("height")
        .and_then(Json::as_u64)
        .ok_or_else(|| Error::mapping("input file is missing an integer 'height' field"))? as usize;
    let columns_obj = obj
        .get("columns")
        .and_then(Json::as_object)
        .ok_or_else(|| Error::mapping("input file is missing a 'columns' object"))?;

    let mut columns = Vec::with_capacity(columns_obj.len());
    for (name, spec) in columns_obj {
        columns.push(read_column(name, spec, height)?);
    }
    Table::from_columns(columns)
}

fn read_column(name: &str, spec: &Json, height: usize) -> Result<Column> {
    let ty_str = spec
        .get("type")
        .and_then(Json::as_str)
        .ok_or_else(|| Error::mapping_for("column is missing a 'type' field", name.to_string()))?;
    let value_type = ValueType::from_str(ty_str)
        .map_err(|e| Error::mapping_for(e, name.to_string()))?;
    let raw_values = spec
        .get("values")
        .and_then(Json::as_array)
        .ok_or_else(|| Error::mapping_for("column is missing a 'values' array", name.to_string()))?;
    if raw_values.len() != height {
        return Err(Error::mapping_for(
            format!("column has {} values but table height is {height}", raw_values.len()),
            name.to_string(),
        ));
    }

    let values = raw_values
        .iter()
        .map(|v| json_to_value(v, value_type))
        .collect::<Result<Vec<_>>>()
        .map_err(|e| e.with_target(name.to_string()))?;
    Ok(Column::new(name, value_type, values))
}

fn json_to_value(v: &Json, ty: ValueType) -> Result<Value> {
    if v.is_null() {
        return Ok(Value::Null);
    }
    Ok(match ty {
        ValueType::Int => Value::Int(v.as_i64().ok_or_else(|| Error::mapping("expected an integer value"))?),
        ValueType::Float => Value::Float(v.as_f64().ok_or_else(|| Error::mapping("expected a float value"))?),
        ValueType::Bool => Value::Bool(v.as_bool().ok_or_else(|| Error::mapping("expected a boolean value"))?),
        ValueType::Text => Value::Text(v.as_str().ok_or_else(|| Error::mapping("expected a string value"))?.to_string()),
        ValueType::Date => {
            let s = v.as_str().ok_or_else(|| Error::mapping("expected a date string value"))?;
            Value::Date(
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map_err(|e| Error::mapping(format!("invalid date '{s}': {e}")))?,
            )
        }
        ValueType::DateTime => {
            let s = v.as_str().ok_or_else(|| Error::mapping("expected a datetime string value"))?;
            Value::DateTime(
                NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                    .map_err(|e| Error::mapping(format!("invalid datetime '{s}': {e}")))?,
            )
        }
        ValueType::TextList => {
            let arr = v.as_array().ok_or_else(|| Error::mapping("expected a list-of-text value"))?;
            Value::TextList(
                arr.iter()
                    .map(|e| e.as_str().map(str::to_string).ok_or_else(|| Error::mapping("expected a string element")))
                    .collect::<Result<Vec<_>>>()?,
            )
        }
    })
}
