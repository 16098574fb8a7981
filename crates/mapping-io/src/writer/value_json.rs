//! Shared `Value` → `serde_json::Value` conversion used by the
//! `ndjson` and `json_array` writers: non-JSON-native scalars (dates,
//! text lists) are serialized via the same text coercion the DSL's
//! `STRING[...]` operators use.

use mapping_core::value::Value;
use serde_json::Value as Json;

pub fn value_to_json(v: &Value) -> Json {
    match v {
        Value::Int(i) => Json::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
        Value::Bool(b) => Json::from(*b),
        Value::Text(s) => Json::from(s.clone()),
        Value::Date(d) => Json::from(d.format("%Y-%m-%d").to_string()),
        Value::DateTime(dt) => Json::from(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        Value::TextList(items) => Json::from(items.clone()),
        Value::Null => Json::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_becomes_json_null() {
        assert_eq!(value_to_json(&Value::Null), Json::Null);
    }

    #[test]
    fn float_nan_becomes_json_null() {
        assert_eq!(value_to_json(&Value::Float(f64::NAN)), Json::Null);
    }
}
