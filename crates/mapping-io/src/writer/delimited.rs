//! The `delimited` writer (`.csv`): header row followed by one row per
//! input row, every cell text-coerced the same way `STRING[CONCAT...]`
//! coerces its arguments.

use mapping_core::compiler::DelimitedConfig;
use mapping_core::error::{Error, Result};
use mapping_core::table::Table;

use super::ensure_parent_dir;

pub fn write_delimited(table: &Table, path: &str, config: &DelimitedConfig) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(config.delimiter as u8)
        .from_path(path)
        .map_err(|e| Error::writer(format!("failed to open {path} for writing: {e}")))?;

    let headers: Vec<&str> = table.column_names().collect();
    writer
        .write_record(&headers)
        .map_err(|e| Error::writer(format!("failed to write CSV header: {e}")))?;

    for row in 0..table.height() {
        let record: Vec<String> = table.columns().iter().map(|c| c.values[row].coerce_text()).collect();
        writer
            .write_record(&record)
            .map_err(|e| Error::writer(format!("failed to write CSV row {row}: {e}")))?;
    }
    writer.flush().map_err(|e| Error::writer(format!("failed to flush CSV writer: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapping_core::table::Column;
    use mapping_core::value::{Value, ValueType};

    #[test]
    fn writes_header_and_rows() {
        let table = Table::from_columns(vec![
            Column::new("id", ValueType::Int, vec![Value::Int(1), Value::Int(2)]),
            Column::new(
                "name",
                ValueType::Text,
                vec![Value::Text("a".to_string()), Value::Text("b".to_string())],
            ),
        ])
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_delimited(&table, path.to_str().unwrap(), &DelimitedConfig { delimiter: ',' }).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "id,name\n1,a\n2,b\n");
    }

    #[test]
    fn empty_table_writes_header_only() {
        let table = Table::from_columns(vec![Column::new("id", ValueType::Int, vec![])]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_delimited(&table, path.to_str().unwrap(), &DelimitedConfig { delimiter: ',' }).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "id\n");
    }
}
