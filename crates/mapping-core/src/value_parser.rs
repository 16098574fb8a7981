//! Resolves a single DSL token to an [`Expr`], in the original engine's
//! precedence order: nested `trns:`-prefixed or bare `OP[...]` expression,
//! then `attr(...)`/`ATTR(...)` column reference, then boolean literal,
//! then numeric literal, then quoted string literal, and finally a bare
//! column-name fallback.

use crate::ast::Expr;
use crate::error::{Error, Result};
use crate::expr_parser::parse_transform_expression_value;
use crate::value::Value;

pub fn parse_value(token: &str) -> Result<Expr> {
    let token = token.trim();

    if token.len() >= 5 && token[..5].eq_ignore_ascii_case("trns:") {
        return parse_transform_expression_value(token);
    }
    if is_recognized_op_bracket(token) {
        return parse_transform_expression_value(token);
    }

    if let Some(col) = parse_attr(token) {
        return Ok(Expr::Column(col));
    }

    if token.eq_ignore_ascii_case("true") {
        return Ok(Expr::Literal(Value::Bool(true)));
    }
    if token.eq_ignore_ascii_case("false") {
        return Ok(Expr::Literal(Value::Bool(false)));
    }

    if let Some(value) = try_parse_literal(token) {
        return Ok(Expr::Literal(value));
    }

    if token.is_empty() {
        return Err(Error::transform("empty argument where a value was expected"));
    }

    Ok(Expr::Column(token.to_string()))
}

/// Recognizes an un-prefixed `OP[...]` token (no `trns:` prefix) whose
/// leading identifier names one of the DSL's operation families, so that
/// e.g. `STRING[CONCAT(...)]` nested as a bare argument recurses into the
/// expression parser instead of falling through to the bare-column case.
fn is_recognized_op_bracket(token: &str) -> bool {
    let Some(bracket_pos) = token.find('[') else { return false };
    if !token.trim_end().ends_with(']') {
        return false;
    }
    let op = token[..bracket_pos].trim();
    if op.is_empty() || !op.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return false;
    }
    matches!(
        op.to_uppercase().as_str(),
        "MATH" | "STRING" | "LOGICAL" | "BOOLEAN" | "DATE" | "ARRAY" | "AGGREGATION" | "FILTER" | "FILTERS" | "DIRECT"
    )
}

/// Parses `attr('col')`/`attr("col")` or the bare-identifier `ATTR(col)`
/// form, returning the column name.
fn parse_attr(token: &str) -> Option<String> {
    let inner = strip_call(token, "attr")?;
    let inner = inner.trim();
    if inner.len() >= 2 {
        let bytes = inner.as_bytes();
        let first = bytes[0] as char;
        let last = inner.chars().last().unwrap();
        if (first == '\'' || first == '"') && first == last {
            return Some(inner[1..inner.len() - 1].to_string());
        }
    }
    None
}

/// Case-insensitive `NAME(...)` matcher returning the parenthesized
/// interior, used for the `attr(...)`/`ATTR(...)` alternation.
fn strip_call<'a>(token: &'a str, name: &str) -> Option<&'a str> {
    let token = token.trim();
    if token.len() <= name.len() || !token[..name.len()].eq_ignore_ascii_case(name) {
        return None;
    }
    let rest = token[name.len()..].trim_start();
    let rest = rest.strip_prefix('(')?;
    rest.strip_suffix(')')
}

/// Quoted-string / numeric literal parsing, shared between value
/// resolution and the simple shorthand-transform coercions.
pub fn try_parse_literal(token: &str) -> Option<Value> {
    let token = token.trim();
    if token.len() >= 2 {
        let bytes = token.as_bytes();
        let first = bytes[0] as char;
        let last = token.chars().last().unwrap();
        if (first == '\'' || first == '"') && first == last {
            return Some(Value::Text(token[1..token.len() - 1].to_string()));
        }
    }
    if let Ok(i) = token.parse::<i64>() {
        return Some(Value::Int(i));
    }
    if let Ok(f) = token.parse::<f64>() {
        return Some(Value::Float(f));
    }
    if token.eq_ignore_ascii_case("true") {
        return Some(Value::Bool(true));
    }
    if token.eq_ignore_ascii_case("false") {
        return Some(Value::Bool(false));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_attr_single_quoted() {
        assert_eq!(parse_value("attr('name')").unwrap(), Expr::Column("name".to_string()));
    }

    #[test]
    fn parses_attr_bare_form() {
        assert_eq!(parse_value("ATTR(name)").unwrap(), Expr::Column("name".to_string()));
    }

    #[test]
    fn parses_int_literal() {
        assert_eq!(parse_value("42").unwrap(), Expr::Literal(Value::Int(42)));
    }

    #[test]
    fn parses_float_literal() {
        assert_eq!(parse_value("3.5").unwrap(), Expr::Literal(Value::Float(3.5)));
    }

    #[test]
    fn parses_quoted_string_literal() {
        assert_eq!(
            parse_value("'hello'").unwrap(),
            Expr::Literal(Value::Text("hello".to_string()))
        );
    }

    #[test]
    fn parses_bool_literal() {
        assert_eq!(parse_value("true").unwrap(), Expr::Literal(Value::Bool(true)));
    }

    #[test]
    fn falls_back_to_bare_column_name() {
        assert_eq!(parse_value("country").unwrap(), Expr::Column("country".to_string()));
    }

    #[test]
    fn recurses_into_bare_op_bracket_without_trns_prefix() {
        use crate::ast::{MathOp, StringOp};

        let expr = parse_value("MATH[ADD(1, 2)]").unwrap();
        assert_eq!(expr, Expr::Math(MathOp::Add, vec![Expr::Literal(Value::Int(1)), Expr::Literal(Value::Int(2))]));

        let nested = parse_value("STRING[CONCAT('adult-', attr('age'))]").unwrap();
        assert_eq!(
            nested,
            Expr::Str(
                StringOp::Concat,
                vec![Expr::Literal(Value::Text("adult-".to_string())), Expr::Column("age".to_string())]
            )
        );
    }

    #[test]
    fn bracket_that_is_not_a_recognized_op_falls_back_to_bare_column() {
        assert_eq!(parse_value("values[0]").unwrap(), Expr::Column("values[0]".to_string()));
    }
}
