//! The `fixed_width` writer (`.txt`): one line per row, each mapping's
//! `length` gives its field width. Numeric-looking values are
//! right-aligned, everything else left-aligned; overflow truncates
//! with a logged warning rather than failing the write.

use std::fs::File;
use std::io::{BufWriter, Write};

use mapping_core::compiler::MappingRecord;
use mapping_core::error::{Error, Result};
use mapping_core::table::Table;
use tracing::warn;

use super::ensure_parent_dir;

pub fn write_fixed_width(table: &Table, path: &str, mappings: &[MappingRecord]) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path).map_err(|e| Error::writer(format!("failed to open {path} for writing: {e}")))?;
    let mut writer = BufWriter::new(file);

    // Only the projection mappings (those with a `target`) contribute a
    // field; filter mappings produced no output column to look up.
    let fields: Vec<(&str, Option<usize>)> = mappings
        .iter()
        .filter_map(|m| m.target.as_deref().map(|t| (t, m.length)))
        .collect();

    for row in 0..table.height() {
        let mut line = String::new();
        for (target, length) in &fields {
            let text = table
                .column(target)
                .map(|c| c.values[row].coerce_text())
                .unwrap_or_default();
            line.push_str(&render_field(target, &text, *length, row));
        }
        writeln!(writer, "{line}").map_err(|e| Error::writer(format!("failed to write row {row}: {e}")))?;
    }
    writer.flush().map_err(|e| Error::writer(format!("failed to flush fixed-width writer: {e}")))?;
    Ok(())
}

fn render_field(target: &str, text: &str, length: Option<usize>, row: usize) -> String {
    let width = length.unwrap_or_else(|| text.chars().count());
    let mut s = text.to_string();
    if s.chars().count() > width {
        warn!(target, row, width, value = s, "truncating fixed-width field");
        s = s.chars().take(width).collect();
    }
    if s.trim().parse::<f64>().is_ok() {
        format!("{s:>width$}")
    } else {
        format!("{s:<width$}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapping_core::table::Column;
    use mapping_core::value::{Value, ValueType};

    fn mapping(target: &str, length: Option<usize>) -> MappingRecord {
        MappingRecord {
            id: None,
            target: Some(target.to_string()),
            source: None,
            transform: None,
            default: None,
            length,
        }
    }

    #[test]
    fn right_aligns_numeric_left_aligns_text() {
        let table = Table::from_columns(vec![
            Column::new("id", ValueType::Int, vec![Value::Int(7)]),
            Column::new("name", ValueType::Text, vec![Value::Text("al".to_string())]),
        ])
        .unwrap();
        let mappings = vec![mapping("id", Some(4)), mapping("name", Some(4))];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_fixed_width(&table, path.to_str().unwrap(), &mappings).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "   7al  \n");
    }

    #[test]
    fn truncates_overflowing_field() {
        let table = Table::from_columns(vec![Column::new(
            "name",
            ValueType::Text,
            vec![Value::Text("abcdef".to_string())],
        )])
        .unwrap();
        let mappings = vec![mapping("name", Some(3))];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_fixed_width(&table, path.to_str().unwrap(), &mappings).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "abc\n");
    }

    #[test]
    fn width_falls_back_to_content_length_without_configured_length() {
        let table = Table::from_columns(vec![Column::new(
            "name",
            ValueType::Text,
            vec![Value::Text("abc".to_string())],
        )])
        .unwrap();
        let mappings = vec![mapping("name", None)];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_fixed_width(&table, path.to_str().unwrap(), &mappings).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "abc\n");
    }
}
