//! The `markup` writer (`.xml`): a row-per-element document with a
//! configurable root/row tag, values text-escaped with `quick-xml`
//! rather than hand-rolled entity substitution.

use std::fs::File;
use std::io::{BufWriter, Write};

use mapping_core::compiler::MarkupConfig;
use mapping_core::error::{Error, Result};
use mapping_core::table::Table;
use quick_xml::escape::escape;

use super::ensure_parent_dir;

pub fn write_markup(table: &Table, path: &str, config: &MarkupConfig) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path).map_err(|e| Error::writer(format!("failed to open {path} for writing: {e}")))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "<{}>", config.root_tag).map_err(io_err)?;
    for row in 0..table.height() {
        write!(writer, "  <{}>", config.row_tag).map_err(io_err)?;
        for column in table.columns() {
            let text = column.values[row].coerce_text();
            write!(writer, "<{}>{}</{}>", column.name, escape(&text), column.name).map_err(io_err)?;
        }
        writeln!(writer, "</{}>", config.row_tag).map_err(io_err)?;
    }
    writeln!(writer, "</{}>", config.root_tag).map_err(io_err)?;
    writer.flush().map_err(io_err)?;
    Ok(())
}

fn io_err(e: std::io::Error) -> Error {
    Error::writer(format!("failed to write XML: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapping_core::table::Column;
    use mapping_core::value::{Value, ValueType};

    #[test]
    fn writes_root_and_row_tags_with_escaping() {
        let table = Table::from_columns(vec![Column::new(
            "note",
            ValueType::Text,
            vec![Value::Text("a & b".to_string())],
        )])
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xml");
        write_markup(
            &table,
            path.to_str().unwrap(),
            &MarkupConfig { root_tag: "records".to_string(), row_tag: "record".to_string() },
        )
        .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("<records>\n"));
        assert!(content.contains("<note>a &amp; b</note>"));
        assert!(content.trim_end().ends_with("</records>"));
    }

    #[test]
    fn empty_table_writes_empty_root() {
        let table = Table::from_columns(vec![Column::new("note", ValueType::Text, vec![])]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xml");
        write_markup(&table, path.to_str().unwrap(), &MarkupConfig::default()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "<rows>\n</rows>\n");
    }
}
