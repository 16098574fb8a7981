//! Dispatches a compiled output [`Table`] to the format named by
//! `output_format`, one function per row of the §6 format table.

mod delimited;
mod fixed_width;
mod json_array;
mod markup;
mod ndjson;
mod spreadsheet;
mod value_json;

use std::fs;
use std::path::Path;

use mapping_core::compiler::{DelimitedConfig, MappingRecord, MarkupConfig, OutputFormat};
use mapping_core::error::{Error, Result};
use mapping_core::table::Table;

pub use delimited::write_delimited;
pub use fixed_width::write_fixed_width;
pub use json_array::write_json_array;
pub use markup::write_markup;
pub use ndjson::write_ndjson;
pub use spreadsheet::write_spreadsheet;

/// Format-specific knobs collected from the mapping document, threaded
/// through to whichever writer `output_format` selects.
pub struct WriteOptions<'a> {
    pub delimited: &'a DelimitedConfig,
    pub markup: &'a MarkupConfig,
    pub mappings: &'a [MappingRecord],
}

pub fn extension_for(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Delimited => "csv",
        OutputFormat::Ndjson => "jsonl",
        OutputFormat::JsonArray => "json",
        OutputFormat::Spreadsheet => "xlsx",
        OutputFormat::Markup => "xml",
        OutputFormat::FixedWidth => "txt",
    }
}

/// Writes `table` to `{base_path}.{ext}` (the extension matching
/// `format`) and returns the path actually written.
pub fn write_output(table: &Table, base_path: &str, format: OutputFormat, opts: &WriteOptions) -> Result<String> {
    let path = format!("{base_path}.{}", extension_for(format));
    match format {
        OutputFormat::Delimited => write_delimited(table, &path, opts.delimited)?,
        OutputFormat::Ndjson => write_ndjson(table, &path)?,
        OutputFormat::JsonArray => write_json_array(table, &path)?,
        OutputFormat::Spreadsheet => write_spreadsheet(table, &path)?,
        OutputFormat::Markup => write_markup(table, &path, opts.markup)?,
        OutputFormat::FixedWidth => write_fixed_width(table, &path, opts.mappings)?,
    }
    Ok(path)
}

pub(crate) fn ensure_parent_dir(path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::writer(format!("failed to create output directory {}: {e}", parent.display())))?;
        }
    }
    Ok(())
}
