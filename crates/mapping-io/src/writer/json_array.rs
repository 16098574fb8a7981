//! The `json_array` writer (`.json`): a single pretty-printed JSON
//! array of row objects, column order preserved.

use std::fs;

use mapping_core::error::{Error, Result};
use mapping_core::table::Table;
use serde_json::{Map, Value as Json};

use super::ensure_parent_dir;
use super::value_json::value_to_json;

pub fn write_json_array(table: &Table, path: &str) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut rows = Vec::with_capacity(table.height());
    for row in 0..table.height() {
        let mut obj = Map::with_capacity(table.width());
        for column in table.columns() {
            obj.insert(column.name.clone(), value_to_json(&column.values[row]));
        }
        rows.push(Json::Object(obj));
    }
    let text = serde_json::to_string_pretty(&Json::Array(rows))
        .map_err(|e| Error::writer(format!("failed to serialize JSON array: {e}")))?;
    fs::write(path, text).map_err(|e| Error::writer(format!("failed to write {path}: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapping_core::table::Column;
    use mapping_core::value::{Value, ValueType};

    #[test]
    fn writes_pretty_array_of_objects() {
        let table = Table::from_columns(vec![Column::new(
            "n",
            ValueType::Int,
            vec![Value::Int(1)],
        )])
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json_array(&table, path.to_str().unwrap()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Json = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, serde_json::json!([{"n": 1}]));
        assert!(content.contains('\n'), "expected pretty-printed output");
    }

    #[test]
    fn empty_table_writes_empty_array() {
        let table = Table::from_columns(vec![Column::new("n", ValueType::Int, vec![])]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json_array(&table, path.to_str().unwrap()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim(), "[]");
    }
}
