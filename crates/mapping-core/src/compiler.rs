//! Compiles a mapping document into a [`CompiledPlan`]: a filter phase
//! and a projection phase, classified apart *before* either is lowered
//! to an expression tree. Classifying first is what keeps a `FILTER[...]`
//! mapping from ever being mistaken for a projection mapping whose
//! target happens to be unused downstream.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::ast::{Expr, FilterAction, ParsedTransform};
use crate::error::{Error, Result};
use crate::expr_parser::{coerce_simple_transform, parse_transform_expression};
use crate::table::Table;
use crate::value::{Value, ValueType};

/// A column name to type mapping used to resolve missing-source and
/// date-lowering decisions at compile time, rather than deferring them
/// to the evaluator.
#[derive(Debug, Clone, Default)]
pub struct Schema(HashMap<String, ValueType>);

impl Schema {
    pub fn from_table(table: &Table) -> Self {
        let mut map = HashMap::with_capacity(table.width());
        for c in table.columns() {
            map.insert(c.name.clone(), c.value_type);
        }
        Schema(map)
    }

    pub fn has(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn type_of(&self, name: &str) -> Option<ValueType> {
        self.0.get(name).copied()
    }
}

/// A literal default value accepted from either JSON or YAML mapping
/// documents. `#[serde(untagged)]` lets serde pick the first variant
/// that matches the value actually present.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MappingDefault {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl MappingDefault {
    fn into_value(self) -> Value {
        match self {
            MappingDefault::Bool(b) => Value::Bool(b),
            MappingDefault::Int(i) => Value::Int(i),
            MappingDefault::Float(f) => Value::Float(f),
            MappingDefault::Text(s) => Value::Text(s),
        }
    }
}

/// One entry in a mapping document. Field names follow the current
/// vocabulary (`target`/`source`/`transform`); the `affected_target`/
/// `affected_source`/`trns` aliases exist for documents written against
/// the older vocabulary.
#[derive(Debug, Clone, Deserialize)]
pub struct MappingRecord {
    pub id: Option<String>,
    /// Required for a projection mapping; a pure filter mapping (one
    /// whose `transform` parses to a `FILTER`/`FILTERS` action) may
    /// omit it.
    #[serde(alias = "affected_target", default)]
    pub target: Option<String>,
    #[serde(alias = "affected_source", default)]
    pub source: Option<String>,
    #[serde(alias = "trns", default)]
    pub transform: Option<String>,
    #[serde(default)]
    pub default: Option<MappingDefault>,
    /// Column width for the fixed-width writer. A column without one
    /// falls back to the rendered content's own width at write time.
    #[serde(default)]
    pub length: Option<usize>,
}

/// The serialization format written by the executor's output phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[serde(alias = "csv")]
    Delimited,
    Ndjson,
    JsonArray,
    #[serde(alias = "xlsx")]
    Spreadsheet,
    #[serde(alias = "xml")]
    Markup,
    FixedWidth,
}

/// Delimited-writer specific knobs; `delimiter` defaults to `,`.
#[derive(Debug, Clone, Deserialize)]
pub struct DelimitedConfig {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_delimiter() -> char {
    ','
}

impl Default for DelimitedConfig {
    fn default() -> Self {
        DelimitedConfig { delimiter: default_delimiter() }
    }
}

/// Markup (XML) writer configuration: the wrapping root element and the
/// per-row element name.
#[derive(Debug, Clone, Deserialize)]
pub struct MarkupConfig {
    #[serde(default = "default_root_tag")]
    pub root_tag: String,
    #[serde(default = "default_row_tag")]
    pub row_tag: String,
}

fn default_root_tag() -> String {
    "rows".to_string()
}

fn default_row_tag() -> String {
    "row".to_string()
}

impl Default for MarkupConfig {
    fn default() -> Self {
        MarkupConfig { root_tag: default_root_tag(), row_tag: default_row_tag() }
    }
}

/// A whole mapping document: the ordered list of mappings plus the
/// output format and its format-specific configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MappingConfig {
    pub mappings: Vec<MappingRecord>,
    pub output_format: OutputFormat,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default)]
    pub delimited: DelimitedConfig,
    #[serde(default)]
    pub markup: MarkupConfig,
}

impl MappingConfig {
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| Error::mapping(format!("invalid JSON mapping document: {e}")))
    }

    pub fn from_yaml(s: &str) -> Result<Self> {
        serde_yaml::from_str(s).map_err(|e| Error::mapping(format!("invalid YAML mapping document: {e}")))
    }
}

/// A single lowered projection: the target column name and the
/// expression that produces its values.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledProjection {
    pub target: String,
    pub expr: Expr,
    /// Carried through from the mapping record for the fixed-width
    /// writer; unused by every other output format.
    pub length: Option<usize>,
}

/// The output of compilation: the filter phase (run first, in
/// declaration order) and the projection phase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledPlan {
    pub filters: Vec<FilterAction>,
    pub projections: Vec<CompiledProjection>,
}

/// Classifies and lowers a mapping document's records against a schema.
///
/// Classification happens on the raw transform text, before any
/// expression is built: a mapping whose `transform`/`trns` starts with
/// `FILTER[` or `FILTERS[` (after stripping an optional `trns:` prefix)
/// is a filter-phase mapping and never enters the projection list, no
/// matter what its `target` is set to.
#[instrument(skip_all, fields(mapping_count = mappings.len()))]
pub fn compile(mappings: &[MappingRecord], schema: &Schema) -> Result<CompiledPlan> {
    if mappings.is_empty() {
        return Err(Error::mapping("mappings list cannot be empty"));
    }

    let mut filters = Vec::new();
    let mut projections = Vec::new();

    for mp in mappings {
        if is_filter_transform(mp.transform.as_deref()) {
            let action = lower_filter(mp)?;
            debug!(mapping = %diagnostic_name(mp), "classified as filter mapping");
            filters.push(action);
            continue;
        }
        let projection = lower_projection(mp, schema)?;
        projections.push(projection);
    }

    Ok(CompiledPlan { filters, projections })
}

/// A name to attach to error/log messages for a mapping that may not
/// have a `target` yet (a filter mapping never needs one): falls back
/// to the diagnostic `id` field, then a placeholder.
fn diagnostic_name(mp: &MappingRecord) -> String {
    mp.target
        .clone()
        .or_else(|| mp.id.clone())
        .unwrap_or_else(|| "<mapping>".to_string())
}

fn is_filter_transform(transform: Option<&str>) -> bool {
    let Some(t) = transform else { return false };
    let t = t.trim();
    let body = if t.len() >= 5 && t[..5].eq_ignore_ascii_case("trns:") {
        t[5..].trim_start()
    } else {
        t
    };
    let upper = body.to_uppercase();
    upper.starts_with("FILTER[") || upper.starts_with("FILTERS[")
}

fn lower_filter(mp: &MappingRecord) -> Result<FilterAction> {
    let transform = mp.transform.as_deref().unwrap_or_default();
    match parse_transform_expression(transform).map_err(|e| e.with_target(diagnostic_name(mp)))? {
        ParsedTransform::Filter(action) => Ok(action),
        ParsedTransform::Value(_) => Err(Error::mapping_for(
            "classified as a filter mapping but did not lower to a filter action",
            diagnostic_name(mp),
        )),
    }
}

fn lower_projection(mp: &MappingRecord, schema: &Schema) -> Result<CompiledProjection> {
    let target = mp.target.clone().ok_or_else(|| {
        Error::mapping_for("target is required for a projection mapping", diagnostic_name(mp))
    })?;
    let resolved = resolve_source(mp, schema)?;

    let expr = match &mp.transform {
        Some(t) if looks_like_op_transform(t) => lower_op_transform(t, mp)?,
        Some(t) => {
            let src = match resolved {
                Resolved::Expr(e) => e,
                Resolved::Terminal(v) => Expr::Literal(v),
            };
            coerce_simple_transform(t, src).map_err(|e| e.with_target(target.clone()))?
        }
        None => match resolved {
            Resolved::Terminal(v) => Expr::Literal(v),
            Resolved::Expr(e) => e,
        },
    };

    Ok(CompiledProjection { target, expr, length: mp.length })
}

/// Either a fully-resolved literal (when `default` stands in for a
/// transform-less mapping with no source) or a source expression to
/// feed a transform.
enum Resolved {
    Expr(Expr),
    Terminal(Value),
}

fn resolve_source(mp: &MappingRecord, schema: &Schema) -> Result<Resolved> {
    if let Some(source) = &mp.source {
        let source_columns: Vec<&str> = source.split(',').map(str::trim).collect();
        let missing: Vec<&str> = source_columns.iter().copied().filter(|c| !schema.has(c)).collect();
        if !missing.is_empty() {
            return match &mp.default {
                Some(d) => Ok(Resolved::Expr(Expr::Literal(d.clone().into_value()))),
                None => Err(Error::mapping_for(
                    format!("source column(s) {missing:?} not found and no default provided"),
                    diagnostic_name(mp),
                )),
            };
        }
        return Ok(Resolved::Expr(Expr::Column(source_columns[0].to_string())));
    }

    if let Some(d) = &mp.default {
        if mp.transform.is_none() {
            return Ok(Resolved::Terminal(d.clone().into_value()));
        }
        return Ok(Resolved::Expr(Expr::Literal(d.clone().into_value())));
    }

    if mp.transform.is_none() {
        return Err(Error::mapping_for(
            "mapping requires at least one of source/transform/default",
            diagnostic_name(mp),
        ));
    }
    Ok(Resolved::Expr(Expr::Literal(Value::Null)))
}

fn looks_like_op_transform(t: &str) -> bool {
    let t = t.trim();
    let body = if t.len() >= 5 && t[..5].eq_ignore_ascii_case("trns:") {
        t[5..].trim_start()
    } else {
        t
    };
    for op in ["MATH[", "STRING[", "LOGICAL[", "BOOLEAN[", "DATE[", "ARRAY[", "AGGREGATION[", "DIRECT["] {
        if body.to_uppercase().starts_with(op) {
            return true;
        }
    }
    false
}

fn lower_op_transform(t: &str, mp: &MappingRecord) -> Result<Expr> {
    match parse_transform_expression(t).map_err(|e| e.with_target(diagnostic_name(mp)))? {
        ParsedTransform::Value(expr) => Ok(expr),
        ParsedTransform::Filter(_) => Err(Error::mapping_for(
            "FILTER/FILTERS transform used where a value expression was expected",
            diagnostic_name(mp),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn schema_with(columns: &[(&str, ValueType)]) -> Schema {
        let cols = columns
            .iter()
            .map(|(n, t)| Column::new(*n, *t, vec![]))
            .collect();
        Schema::from_table(&Table::from_columns(cols).unwrap())
    }

    #[test]
    fn classifies_filter_mapping_out_of_projections() {
        let mappings = vec![
            MappingRecord {
                id: None,
                target: None,
                source: None,
                transform: Some("FILTER[INCLUDE_IF(attr('age') >= 18)]".to_string()),
                default: None,
                length: None,
            },
            MappingRecord {
                id: None,
                target: Some("name".to_string()),
                source: Some("full_name".to_string()),
                transform: None,
                default: None,
                length: None,
            },
        ];
        let schema = schema_with(&[("age", ValueType::Int), ("full_name", ValueType::Text)]);
        let plan = compile(&mappings, &schema).unwrap();
        assert_eq!(plan.filters.len(), 1);
        assert_eq!(plan.projections.len(), 1);
        assert_eq!(plan.projections[0].target, "name");
    }

    #[test]
    fn missing_source_falls_back_to_default() {
        let mappings = vec![MappingRecord {
            id: None,
            target: Some("country".to_string()),
            source: Some("nonexistent".to_string()),
            transform: None,
            default: Some(MappingDefault::Text("US".to_string())),
            length: None,
        }];
        let schema = schema_with(&[("other", ValueType::Text)]);
        let plan = compile(&mappings, &schema).unwrap();
        assert_eq!(plan.projections[0].expr, Expr::Literal(Value::Text("US".to_string())));
    }

    #[test]
    fn missing_source_without_default_errors() {
        let mappings = vec![MappingRecord {
            id: None,
            target: Some("country".to_string()),
            source: Some("nonexistent".to_string()),
            transform: None,
            default: None,
            length: None,
        }];
        let schema = schema_with(&[("other", ValueType::Text)]);
        assert!(compile(&mappings, &schema).is_err());
    }

    #[test]
    fn simple_shorthand_transform_lowers_to_cast() {
        let mappings = vec![MappingRecord {
            id: None,
            target: Some("age_int".to_string()),
            source: Some("age".to_string()),
            transform: Some("to_int".to_string()),
            default: None,
            length: None,
        }];
        let schema = schema_with(&[("age", ValueType::Text)]);
        let plan = compile(&mappings, &schema).unwrap();
        assert_eq!(
            plan.projections[0].expr,
            Expr::Cast(Box::new(Expr::Column("age".to_string())), ValueType::Int)
        );
    }

    #[test]
    fn pure_filter_mapping_does_not_require_target() {
        let mappings = vec![MappingRecord {
            id: None,
            target: None,
            source: None,
            transform: Some("FILTERS[LIMIT(5)]".to_string()),
            default: None,
            length: None,
        }];
        let schema = schema_with(&[]);
        let plan = compile(&mappings, &schema).unwrap();
        assert_eq!(plan.filters, vec![FilterAction::Limit(5)]);
        assert!(plan.projections.is_empty());
    }

    #[test]
    fn projection_mapping_without_target_is_a_mapping_error() {
        let mappings = vec![MappingRecord {
            id: None,
            target: None,
            source: Some("age".to_string()),
            transform: None,
            default: None,
            length: None,
        }];
        let schema = schema_with(&[("age", ValueType::Int)]);
        let err = compile(&mappings, &schema).unwrap_err();
        assert!(err.to_string().contains("target is required"));
    }
}
