//! The `ndjson` writer (`.jsonl`): one JSON object per line, column
//! order preserved from the table.

use std::fs::File;
use std::io::{BufWriter, Write};

use mapping_core::error::{Error, Result};
use mapping_core::table::Table;
use serde_json::{Map, Value as Json};

use super::ensure_parent_dir;
use super::value_json::value_to_json;

pub fn write_ndjson(table: &Table, path: &str) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path).map_err(|e| Error::writer(format!("failed to open {path} for writing: {e}")))?;
    let mut writer = BufWriter::new(file);

    for row in 0..table.height() {
        let mut obj = Map::with_capacity(table.width());
        for column in table.columns() {
            obj.insert(column.name.clone(), value_to_json(&column.values[row]));
        }
        let line = serde_json::to_string(&Json::Object(obj))
            .map_err(|e| Error::writer(format!("failed to serialize row {row}: {e}")))?;
        writeln!(writer, "{line}").map_err(|e| Error::writer(format!("failed to write row {row}: {e}")))?;
    }
    writer.flush().map_err(|e| Error::writer(format!("failed to flush ndjson writer: {e}")))?;
    Ok(())
}
