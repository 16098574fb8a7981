//! The `spreadsheet` writer (`.xlsx`): splits the table across sheets
//! at `ROWS_PER_SHEET` data rows, one under Excel's hard 1,048,576-row
//! limit, the way the original engine's `openpyxl`-based writer did.

use mapping_core::error::{Error, Result};
use mapping_core::table::Table;
use mapping_core::value::Value;
use rust_xlsxwriter::{Workbook, Worksheet};

use super::ensure_parent_dir;

const ROWS_PER_SHEET: usize = 1_048_000;

pub fn write_spreadsheet(table: &Table, path: &str) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut workbook = Workbook::new();

    let height = table.height();
    let mut start = 0;
    let mut sheet_idx = 1;
    loop {
        let end = (start + ROWS_PER_SHEET).min(height);
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(format!("Sheet{sheet_idx}"))
            .map_err(|e| Error::writer(format!("failed to name worksheet: {e}")))?;
        write_sheet(worksheet, table, start, end)?;

        start = end;
        sheet_idx += 1;
        if start >= height {
            break;
        }
    }

    workbook
        .save(path)
        .map_err(|e| Error::writer(format!("failed to write {path}: {e}")))?;
    Ok(())
}

fn write_sheet(worksheet: &mut Worksheet, table: &Table, start: usize, end: usize) -> Result<()> {
    for (col_idx, name) in table.column_names().enumerate() {
        worksheet
            .write_string(0, col_idx as u16, name)
            .map_err(|e| Error::writer(format!("failed to write header '{name}': {e}")))?;
    }
    for (out_row, row) in (start..end).enumerate() {
        let excel_row = (out_row + 1) as u32;
        for (col_idx, column) in table.columns().iter().enumerate() {
            write_cell(worksheet, excel_row, col_idx as u16, &column.values[row])?;
        }
    }
    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, value: &Value) -> Result<()> {
    let result = match value {
        Value::Int(i) => worksheet.write_number(row, col, *i as f64),
        Value::Float(f) => worksheet.write_number(row, col, *f),
        Value::Bool(b) => worksheet.write_boolean(row, col, *b),
        Value::Null => return Ok(()),
        other => worksheet.write_string(row, col, other.coerce_text()),
    };
    result.map(|_| ()).map_err(|e| Error::writer(format!("failed to write cell ({row}, {col}): {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapping_core::table::Column;
    use mapping_core::value::ValueType;

    #[test]
    fn writes_a_single_sheet_for_small_tables() {
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
        let path = dir.path().join("out.xlsx");
        write_spreadsheet(&table, path.to_str().unwrap()).unwrap();
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn writes_empty_table_without_error() {
        let table = Table::from_columns(vec![Column::new("id", ValueType::Int, vec![])]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        write_spreadsheet(&table, path.to_str().unwrap()).unwrap();
        assert!(path.exists());
    }
}
