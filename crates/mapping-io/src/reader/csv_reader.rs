//! The `.csv` columnar reader: an untyped delimited format with column
//! types inferred per-column from the header and data the same way the
//! DSL's value parser infers a bare token's literal type — first
//! boolean, then integer, then float, falling back to text. A column
//! mixing types across rows is widened to `Text`.

use std::fs::File;
use std::path::Path;

use mapping_core::error::{Error, Result};
use mapping_core::table::{Column, Table};
use mapping_core::value::{Value, ValueType};

pub fn read_csv(path: &Path) -> Result<Table> {
    let file = File::open(path)
        .map_err(|e| Error::mapping(format!("failed to open input file {}: {e}", path.display())))?;
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| Error::mapping(format!("failed to read CSV header: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut raw_columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record.map_err(|e| Error::mapping(format!("failed to read CSV row: {e}")))?;
        for (i, field) in record.iter().enumerate() {
            let cell = if field.is_empty() { None } else { Some(field.to_string()) };
            raw_columns[i].push(cell);
        }
    }

    let columns = headers
        .into_iter()
        .zip(raw_columns)
        .map(|(name, cells)| infer_column(name, cells))
        .collect();
    Table::from_columns(columns)
}

fn infer_column(name: String, cells: Vec<Option<String>>) -> Column {
    let value_type = infer_type(&cells);
    let values = cells
        .into_iter()
        .map(|cell| match cell {
            None => Value::Null,
            Some(text) => coerce(&text, value_type),
        })
        .collect();
    Column::new(name, value_type, values)
}

/// A column is `Bool`/`Int`/`Float` only if every non-empty cell parses
/// as that type; otherwise it is `Text`, matching
/// `value_parser::try_parse_literal`'s precedence (bool, then int, then
/// float, then text).
fn infer_type(cells: &[Option<String>]) -> ValueType {
    let present: Vec<&str> = cells.iter().filter_map(|c| c.as_deref()).collect();
    if present.is_empty() {
        return ValueType::Text;
    }
    if present.iter().all(|s| s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false")) {
        return ValueType::Bool;
    }
    if present.iter().all(|s| s.parse::<i64>().is_ok()) {
        return ValueType::Int;
    }
    if present.iter().all(|s| s.parse::<f64>().is_ok()) {
        return ValueType::Float;
    }
    ValueType::Text
}

fn coerce(text: &str, ty: ValueType) -> Value {
    match ty {
        ValueType::Bool => Value::Bool(text.eq_ignore_ascii_case("true")),
        ValueType::Int => text.parse::<i64>().map(Value::Int).unwrap_or(Value::Null),
        ValueType::Float => text.parse::<f64>().map(Value::Float).unwrap_or(Value::Null),
        _ => Value::Text(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn infers_int_column() {
        let f = write_temp("id,name\n1,alice\n2,bob\n");
        let table = read_csv(f.path()).unwrap();
        assert_eq!(table.column("id").unwrap().value_type, ValueType::Int);
        assert_eq!(table.column("id").unwrap().values, vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(table.column("name").unwrap().value_type, ValueType::Text);
    }

    #[test]
    fn mixed_numeric_and_text_widens_to_text() {
        let f = write_temp("code\n1\nABC\n");
        let table = read_csv(f.path()).unwrap();
        assert_eq!(table.column("code").unwrap().value_type, ValueType::Text);
    }

    #[test]
    fn empty_cell_becomes_null() {
        let f = write_temp("age\n20\n\n");
        let table = read_csv(f.path()).unwrap();
        assert_eq!(table.column("age").unwrap().values, vec![Value::Int(20), Value::Null]);
    }
}
