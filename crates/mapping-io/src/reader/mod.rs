//! Reads an input [`Table`] from a columnar file.
//!
//! The core's spec treats "a columnar file" as an unspecified external
//! format (a stand-in for Parquet/Arrow IPC in a production deployment).
//! Two concrete encodings are supported here, dispatched by extension:
//! a schema-carrying typed-JSON format (`.json`) that encodes the
//! [`Table`] data model directly, and a `.csv` format with column types
//! inferred the same way the DSL's value parser infers literal types.

mod csv_reader;
mod typed_json;

use std::path::Path;

use mapping_core::error::{Error, Result};
use mapping_core::table::Table;

pub use csv_reader::read_csv;
pub use typed_json::read_typed_json;

/// Reads a table from `path`, dispatching on its extension.
pub fn read_table(path: &Path) -> Result<Table> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => read_typed_json(path),
        Some(ext) if ext.eq_ignore_ascii_case("csv") => read_csv(path),
        other => Err(Error::mapping(format!(
            "unsupported input file extension: {other:?} (expected .json or .csv)"
        ))),
    }
}
