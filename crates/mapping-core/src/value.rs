//! Scalar value model shared by the table, the AST, and the evaluator.

use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

/// The type tag of a [`Value`] or a [`Column`](crate::table::Column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Int,
    Float,
    Bool,
    Text,
    Date,
    DateTime,
    TextList,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Bool => "bool",
            ValueType::Text => "text",
            ValueType::Date => "date",
            ValueType::DateTime => "datetime",
            ValueType::TextList => "list<text>",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "int" => ValueType::Int,
            "float" => ValueType::Float,
            "bool" => ValueType::Bool,
            "text" => ValueType::Text,
            "date" => ValueType::Date,
            "datetime" => ValueType::DateTime,
            "list<text>" => ValueType::TextList,
            other => return Err(format!("unknown column type: {other}")),
        })
    }
}

/// A single scalar cell. `Null` represents a missing value in any column.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    TextList(Vec<String>),
    Null,
}

impl Value {
    /// The type of this value, or `None` for `Null` (which is typeless: it
    /// unifies with any column type).
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Int(_) => Some(ValueType::Int),
            Value::Float(_) => Some(ValueType::Float),
            Value::Bool(_) => Some(ValueType::Bool),
            Value::Text(_) => Some(ValueType::Text),
            Value::Date(_) => Some(ValueType::Date),
            Value::DateTime(_) => Some(ValueType::DateTime),
            Value::TextList(_) => Some(ValueType::TextList),
            Value::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text coercion used by `STRING[...]` operators and `CONCAT` in
    /// particular: every scalar type renders to a human string, `Null`
    /// renders as the empty string (matching the original engine's
    /// `"" if value is None else str(value)` convention).
    pub fn coerce_text(&self) -> String {
        match self {
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Text(s) => s.clone(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            Value::TextList(xs) => xs.join(","),
            Value::Null => String::new(),
        }
    }

    /// SQL-like three-valued truthiness used by the filter phase: a `Null`
    /// or non-boolean value is "not true".
    pub fn is_truthy(&self) -> bool {
        matches!(self, Value::Bool(true))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.coerce_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_coerces_to_empty_text() {
        assert_eq!(Value::Null.coerce_text(), "");
    }

    #[test]
    fn numeric_coerces_to_text() {
        assert_eq!(Value::Int(42).coerce_text(), "42");
        assert_eq!(Value::Float(1.5).coerce_text(), "1.5");
    }

    #[test]
    fn truthiness_is_three_valued() {
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Int(1).is_truthy());
    }

    #[test]
    fn value_type_round_trips_through_display_and_from_str() {
        use std::str::FromStr;
        for ty in [
            ValueType::Int,
            ValueType::Float,
            ValueType::Bool,
            ValueType::Text,
            ValueType::Date,
            ValueType::DateTime,
            ValueType::TextList,
        ] {
            assert_eq!(ValueType::from_str(&ty.to_string()).unwrap(), ty);
        }
    }
}
