//! The in-memory columnar table: an ordered set of equal-length columns.

use crate::error::{Error, Result};
use crate::value::{Value, ValueType};
use std::collections::HashMap;

/// One named, typed column. All values share `value_type`, except for
/// `Value::Null` which is allowed in any column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub value_type: ValueType,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, value_type: ValueType, values: Vec<Value>) -> Self {
        Column {
            name: name.into(),
            value_type,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// An ordered collection of columns of equal height, indexed by name.
///
/// Column order is preserved as loaded or produced, matching the spec's
/// requirement that output preserves mapping declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    height: usize,
}

impl Table {
    pub fn new() -> Self {
        Table::default()
    }

    /// Builds a table from columns, verifying every column has the same
    /// height. Returns a `MappingError` if the shapes disagree.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let height = columns.first().map(Column::len).unwrap_or(0);
        for c in &columns {
            if c.len() != height {
                return Err(Error::mapping_for(
                    format!(
                        "column height mismatch: expected {height} rows, got {}",
                        c.len()
                    ),
                    c.name.clone(),
                ));
            }
        }
        let mut index = HashMap::with_capacity(columns.len());
        for (i, c) in columns.iter().enumerate() {
            index.insert(c.name.clone(), i);
        }
        Ok(Table {
            columns,
            index,
            height,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Appends a column, rejecting a height mismatch or a duplicate name.
    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if self.index.contains_key(&column.name) {
            return Err(Error::mapping_for("duplicate column name", column.name));
        }
        if !self.columns.is_empty() && column.len() != self.height {
            return Err(Error::mapping_for(
                format!(
                    "column height mismatch: expected {} rows, got {}",
                    self.height,
                    column.len()
                ),
                column.name,
            ));
        }
        if self.columns.is_empty() {
            self.height = column.len();
        }
        self.index.insert(column.name.clone(), self.columns.len());
        self.columns.push(column);
        Ok(())
    }

    /// Returns a new table keeping only the rows whose mask entry is `true`.
    pub fn filter_rows(&self, mask: &[bool]) -> Table {
        debug_assert_eq!(mask.len(), self.height);
        let columns = self
            .columns
            .iter()
            .map(|c| {
                let values = c
                    .values
                    .iter()
                    .zip(mask)
                    .filter(|(_, keep)| **keep)
                    .map(|(v, _)| v.clone())
                    .collect();
                Column::new(c.name.clone(), c.value_type, values)
            })
            .collect();
        Table::from_columns(columns).expect("filtered columns retain uniform height")
    }

    pub fn row(&self, i: usize) -> Vec<&Value> {
        self.columns.iter().map(|c| &c.values[i]).collect()
    }
}
