//! Lexer, parser, compiler, and row-wise executor for the `OP[METHOD(...)]`
//! mapping DSL used to project and filter columnar tables.
//!
//! The pipeline is: `lexer` splits DSL text into balanced pieces,
//! `value_parser`/`expr_parser` resolve those pieces into an [`ast::Expr`]
//! or [`ast::BoolExpr`], `compiler` classifies and lowers a whole mapping
//! document into a [`compiler::CompiledPlan`], and `executor` runs that
//! plan against a [`table::Table`] via `eval`.

pub mod ast;
pub mod compiler;
pub mod error;
pub mod eval;
pub mod executor;
pub mod expr_parser;
pub mod lexer;
pub mod table;
pub mod value;
pub mod value_parser;

pub use compiler::{CompiledPlan, MappingConfig, MappingRecord, Schema};
pub use error::{Error, Result};
pub use table::{Column, Table};
pub use value::{Value, ValueType};

/// Compiles a mapping document's records against a schema and runs the
/// resulting plan over the given table in one step.
pub fn run(mappings: &[MappingRecord], schema: &Schema, table: &Table) -> Result<Table> {
    let plan = compiler::compile(mappings, schema)?;
    executor::execute(&plan, table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    #[test]
    fn end_to_end_filter_and_project() {
        let table = Table::from_columns(vec![
            Column::new("age", ValueType::Int, vec![Value::Int(16), Value::Int(25)]),
            Column::new(
                "full_name",
                ValueType::Text,
                vec![Value::Text("Al Smith".to_string()), Value::Text("Bo Jones".to_string())],
            ),
        ])
        .unwrap();
        let schema = Schema::from_table(&table);

        let mappings: Vec<MappingRecord> = serde_json::from_str(
            r#"[
                {"target": "adult_only", "transform": "FILTER[INCLUDE_IF(attr('age') >= 18)]"},
                {"target": "name", "source": "full_name", "transform": "STRING[UPPER(attr('full_name'))]"}
            ]"#,
        )
        .unwrap();

        let out = run(&mappings, &schema, &table).unwrap();
        assert_eq!(out.height(), 1);
        assert_eq!(
            out.column("name").unwrap().values,
            vec![Value::Text("BO JONES".to_string())]
        );
    }
}
