//! Parses a `trns`/`transform` string into a [`ParsedTransform`]: either a
//! value expression to project, or a row-selection action to apply
//! during the filter phase. One function per operator family, dispatched
//! on the `OP` in `OP[METHOD(args...)]`, mirroring the original engine's
//! `parse_transform_expression` dispatch table method for method.

use crate::ast::{AggOp, ArrayOp, BoolExpr, CompareOp, DateOp, DatePart, Expr, FilterAction, MathOp, ParsedTransform, StringOp};
use crate::error::{Error, Result};
use crate::lexer::{match_method_call, match_op_bracket, split_args};
use crate::value::{Value, ValueType};
use crate::value_parser::parse_value;

const DEFAULT_DATE_FORMAT: &str = "%m%d%Y";

/// Lowers a shorthand simple-transform token (`to_int`, `to_str`,
/// `date_format('...')`, ...) against an already-resolved source
/// expression. Unlike `OP[METHOD(...)]` transforms, these never produce
/// filter actions.
pub fn coerce_simple_transform(transform: &str, source: Expr) -> Result<Expr> {
    let t = transform.trim();

    if t.eq_ignore_ascii_case("to_int") {
        return Ok(Expr::Cast(Box::new(source), ValueType::Int));
    }
    if t.eq_ignore_ascii_case("to_float") {
        return Ok(Expr::Cast(Box::new(source), ValueType::Float));
    }
    if t.eq_ignore_ascii_case("to_str") {
        return Ok(Expr::Cast(Box::new(source), ValueType::Text));
    }
    if t.eq_ignore_ascii_case("to_bool") {
        return Ok(Expr::ToBool(Box::new(source)));
    }
    if t.eq_ignore_ascii_case("trim") {
        return Ok(Expr::Str(StringOp::Trim, vec![Expr::Cast(Box::new(source), ValueType::Text)]));
    }
    if t.eq_ignore_ascii_case("upper") {
        return Ok(Expr::Str(StringOp::Upper, vec![Expr::Cast(Box::new(source), ValueType::Text)]));
    }
    if t.eq_ignore_ascii_case("lower") {
        return Ok(Expr::Str(StringOp::Lower, vec![Expr::Cast(Box::new(source), ValueType::Text)]));
    }

    if let Some(fmt) = strip_call_arg(t, "date_format") {
        return Ok(Expr::DateOp(
            DateOp::Format,
            vec![source, Expr::Literal(Value::Text(fmt))],
        ));
    }
    if let Some(fmt) = strip_call_arg(t, "to_date") {
        let fmt = if fmt.is_empty() { DEFAULT_DATE_FORMAT.to_string() } else { fmt };
        return Ok(Expr::DateOp(
            DateOp::Parse,
            vec![Expr::Cast(Box::new(source), ValueType::Text), Expr::Literal(Value::Text(fmt))],
        ));
    }

    Err(Error::transform_at("unsupported simple transform", transform.to_string()))
}

/// Matches `name('quoted arg')` case-insensitively, returning the
/// unquoted argument text.
fn strip_call_arg(token: &str, name: &str) -> Option<String> {
    if token.len() <= name.len() || !token[..name.len()].eq_ignore_ascii_case(name) {
        return None;
    }
    let rest = token[name.len()..].trim_start().strip_prefix('(')?;
    let rest = rest.trim_end().strip_suffix(')')?;
    let rest = rest.trim();
    if rest.len() >= 2 {
        let bytes = rest.as_bytes();
        let first = bytes[0] as char;
        let last = rest.chars().last().unwrap();
        if (first == '\'' || first == '"') && first == last {
            return Some(rest[1..rest.len() - 1].to_string());
        }
    }
    Some(rest.to_string())
}

/// Parses a full `OP[METHOD(...)]` (optionally `trns:`-prefixed) string.
pub fn parse_transform_expression(expr: &str) -> Result<ParsedTransform> {
    let (op, inner) = match_op_bracket(expr)?;
    let (method, args_str) = match_method_call(&inner)?;
    let args = split_args(&args_str);

    match op.as_str() {
        "MATH" => parse_math(&method, &args, expr).map(ParsedTransform::Value),
        "STRING" => parse_string(&method, &args, expr).map(ParsedTransform::Value),
        "LOGICAL" => parse_logical(&method, &args, expr),
        "BOOLEAN" => {
            let cond = parse_boolean_method(&method, &args, expr)?;
            Ok(ParsedTransform::Value(Expr::Bool(Box::new(cond))))
        }
        "DATE" => parse_date(&method, &args, expr).map(ParsedTransform::Value),
        "ARRAY" => parse_array(&method, &args, expr).map(ParsedTransform::Value),
        "AGGREGATION" => parse_aggregation(&method, &args, expr).map(ParsedTransform::Value),
        "DIRECT" => parse_direct(&method, &args, expr).map(ParsedTransform::Value),
        "FILTERS" | "FILTER" => parse_filter_action(&method, &args, expr).map(ParsedTransform::Filter),
        other => Err(Error::transform_at(
            format!("unsupported operation: {other}"),
            expr.to_string(),
        )),
    }
}

/// Like [`parse_transform_expression`] but requires the result to be a
/// value expression; used when a `trns:` string is nested inside another
/// expression's argument list, where a filter action makes no sense.
pub fn parse_transform_expression_value(expr: &str) -> Result<Expr> {
    match parse_transform_expression(expr)? {
        ParsedTransform::Value(e) => Ok(e),
        ParsedTransform::Filter(_) => Err(Error::transform_at(
            "a FILTER/FILTERS expression cannot be used as a value",
            expr.to_string(),
        )),
    }
}

fn arity(args: &[String], n: usize, expr: &str) -> Result<()> {
    if args.len() != n {
        return Err(Error::transform_at(
            format!("expected {n} argument(s), got {}", args.len()),
            expr.to_string(),
        ));
    }
    Ok(())
}

fn arg_value(args: &[String], i: usize) -> Result<Expr> {
    parse_value(&args[i])
}

fn int_literal(args: &[String], i: usize, expr: &str) -> Result<i64> {
    let raw = args[i].trim().trim_matches(|c| c == '\'' || c == '"');
    raw.parse::<f64>()
        .map(|f| f as i64)
        .map_err(|_| Error::transform_at(format!("expected an integer argument, got '{raw}'"), expr.to_string()))
}

fn string_literal(args: &[String], i: usize) -> String {
    args[i].trim().trim_matches(|c| c == '\'' || c == '"').to_string()
}

/// True for a `MATH[DIV(...)]` divisor that is a literal zero, so the
/// compiler can reject it up front per spec §4.3's "`DIV` with literal
/// zero divisor fails at compile" rather than deferring to a runtime
/// `inf`/NaN result.
fn is_literal_zero(expr: &Expr) -> bool {
    match expr {
        Expr::Literal(Value::Int(0)) => true,
        Expr::Literal(Value::Float(f)) => *f == 0.0,
        _ => false,
    }
}

fn parse_math(method: &str, args: &[String], expr: &str) -> Result<Expr> {
    match method {
        "ADD" => {
            arity(args, 2, expr)?;
            Ok(Expr::Math(MathOp::Add, vec![arg_value(args, 0)?, arg_value(args, 1)?]))
        }
        "SUB" => {
            arity(args, 2, expr)?;
            Ok(Expr::Math(MathOp::Sub, vec![arg_value(args, 0)?, arg_value(args, 1)?]))
        }
        "MUL" => {
            arity(args, 2, expr)?;
            Ok(Expr::Math(MathOp::Mul, vec![arg_value(args, 0)?, arg_value(args, 1)?]))
        }
        "DIV" => {
            arity(args, 2, expr)?;
            let divisor = arg_value(args, 1)?;
            if is_literal_zero(&divisor) {
                return Err(Error::transform_at(
                    "DIV by a literal zero divisor is not allowed".to_string(),
                    expr.to_string(),
                ));
            }
            Ok(Expr::Math(MathOp::Div, vec![arg_value(args, 0)?, divisor]))
        }
        "MOD" => {
            arity(args, 2, expr)?;
            Ok(Expr::Math(MathOp::Mod, vec![arg_value(args, 0)?, arg_value(args, 1)?]))
        }
        "ROUND" => {
            arity(args, 2, expr)?;
            let prec = int_literal(args, 1, expr)?;
            Ok(Expr::Math(
                MathOp::Round,
                vec![arg_value(args, 0)?, Expr::Literal(Value::Int(prec))],
            ))
        }
        "ABS" => {
            arity(args, 1, expr)?;
            Ok(Expr::Math(MathOp::Abs, vec![arg_value(args, 0)?]))
        }
        other => Err(Error::transform_at(
            format!("unsupported MATH method: {other}"),
            expr.to_string(),
        )),
    }
}

fn parse_string(method: &str, args: &[String], expr: &str) -> Result<Expr> {
    match method {
        "CONCAT" => {
            let parts = args
                .iter()
                .map(|a| parse_value(a))
                .collect::<Result<Vec<_>>>()?;
            Ok(Expr::Str(StringOp::Concat, parts))
        }
        "SUBSTR" => {
            if args.len() != 2 && args.len() != 3 {
                return Err(Error::transform_at(
                    format!("expected 2 or 3 arguments, got {}", args.len()),
                    expr.to_string(),
                ));
            }
            let mut parts = vec![arg_value(args, 0)?, arg_value(args, 1)?];
            if args.len() == 3 {
                parts.push(arg_value(args, 2)?);
            }
            Ok(Expr::Str(StringOp::Substr, parts))
        }
        "REPLACE" => {
            arity(args, 3, expr)?;
            Ok(Expr::Str(
                StringOp::Replace,
                vec![arg_value(args, 0)?, arg_value(args, 1)?, arg_value(args, 2)?],
            ))
        }
        "UPPER" => {
            arity(args, 1, expr)?;
            Ok(Expr::Str(StringOp::Upper, vec![arg_value(args, 0)?]))
        }
        "LOWER" => {
            arity(args, 1, expr)?;
            Ok(Expr::Str(StringOp::Lower, vec![arg_value(args, 0)?]))
        }
        "TRIM" => {
            arity(args, 1, expr)?;
            Ok(Expr::Str(StringOp::Trim, vec![arg_value(args, 0)?]))
        }
        "LENGTH" => {
            arity(args, 1, expr)?;
            Ok(Expr::Str(StringOp::Length, vec![arg_value(args, 0)?]))
        }
        other => Err(Error::transform_at(
            format!("unsupported STRING method: {other}"),
            expr.to_string(),
        )),
    }
}

fn parse_logical(method: &str, args: &[String], expr: &str) -> Result<ParsedTransform> {
    match method {
        "IF" => {
            arity(args, 3, expr)?;
            let cond = parse_boolean_expr(&args[0])?;
            let then_value = arg_value(args, 1)?;
            let else_value = arg_value(args, 2)?;
            Ok(ParsedTransform::Value(Expr::If {
                cond: Box::new(cond),
                then_value: Box::new(then_value),
                else_value: Box::new(else_value),
            }))
        }
        "AND" => {
            let parts = args
                .iter()
                .map(|a| parse_boolean_expr(a))
                .collect::<Result<Vec<_>>>()?;
            Ok(ParsedTransform::Value(Expr::Bool(Box::new(BoolExpr::And(parts)))))
        }
        "OR" => {
            let parts = args
                .iter()
                .map(|a| parse_boolean_expr(a))
                .collect::<Result<Vec<_>>>()?;
            Ok(ParsedTransform::Value(Expr::Bool(Box::new(BoolExpr::Or(parts)))))
        }
        "NOT" => {
            arity(args, 1, expr)?;
            let inner = parse_boolean_expr(&args[0])?;
            Ok(ParsedTransform::Value(Expr::Bool(Box::new(BoolExpr::Not(Box::new(inner))))))
        }
        other => Err(Error::transform_at(
            format!("unsupported LOGICAL method: {other}"),
            expr.to_string(),
        )),
    }
}

fn compare_op_for(method: &str) -> Option<CompareOp> {
    match method {
        "EQUALS" | "EQ" => Some(CompareOp::Eq),
        "NOT_EQUALS" | "NE" => Some(CompareOp::NotEq),
        "GREATER_THAN" | "GT" => Some(CompareOp::Gt),
        "LESS_THAN" | "LT" => Some(CompareOp::Lt),
        "GREATER_OR_EQUAL" | "GTE" => Some(CompareOp::GtEq),
        "LESS_OR_EQUAL" | "LTE" => Some(CompareOp::LtEq),
        _ => None,
    }
}

fn parse_boolean_method(method: &str, args: &[String], expr: &str) -> Result<BoolExpr> {
    let op = compare_op_for(method).ok_or_else(|| {
        Error::transform_at(format!("unsupported BOOLEAN method: {method}"), expr.to_string())
    })?;
    arity(args, 2, expr)?;
    Ok(BoolExpr::Compare(op, Box::new(arg_value(args, 0)?), Box::new(arg_value(args, 1)?)))
}

/// Parses a boolean condition used as a filter predicate or `LOGICAL[IF]`
/// condition: `BOOLEAN[...]`, a bare comparison method call
/// (`EQ(...)`/`GT(...)`/etc.), or an infix `left OP right` form.
pub fn parse_boolean_expr(expr: &str) -> Result<BoolExpr> {
    let trimmed = expr.trim();

    if trimmed.len() > 8 && trimmed[..8].eq_ignore_ascii_case("BOOLEAN[") && trimmed.ends_with(']') {
        let inner = &trimmed[8..trimmed.len() - 1];
        let (method, args_str) = match_method_call(inner)?;
        let args = split_args(&args_str);
        return parse_boolean_method(&method, &args, expr);
    }

    for bare in ["EQ(", "GT(", "LT(", "GTE(", "LTE(", "NE("] {
        if trimmed.starts_with(bare) && trimmed.ends_with(')') {
            let (method, args_str) = match_method_call(trimmed)?;
            let args = split_args(&args_str);
            return parse_boolean_method(&method, &args, expr);
        }
    }

    for op_str in ["==", "!=", ">=", "<=", ">", "<"] {
        if let Some(idx) = trimmed.find(op_str) {
            let left = trimmed[..idx].trim();
            let right = trimmed[idx + op_str.len()..].trim();
            let op = match op_str {
                "==" => CompareOp::Eq,
                "!=" => CompareOp::NotEq,
                ">=" => CompareOp::GtEq,
                "<=" => CompareOp::LtEq,
                ">" => CompareOp::Gt,
                "<" => CompareOp::Lt,
                _ => unreachable!(),
            };
            return Ok(BoolExpr::Compare(op, Box::new(parse_value(left)?), Box::new(parse_value(right)?)));
        }
    }

    Err(Error::transform_at("unsupported boolean condition", expr.to_string()))
}

fn parse_date(method: &str, args: &[String], expr: &str) -> Result<Expr> {
    match method {
        "FORMAT" => {
            arity(args, 2, expr)?;
            let base = arg_value(args, 0)?;
            let fmt = string_literal(args, 1);
            Ok(Expr::DateOp(DateOp::Format, vec![base, Expr::Literal(Value::Text(fmt))]))
        }
        "PARSE" => {
            if args.is_empty() || args.len() > 2 {
                return Err(Error::transform_at(
                    format!("expected 1 or 2 arguments, got {}", args.len()),
                    expr.to_string(),
                ));
            }
            let base = arg_value(args, 0)?;
            let fmt = if args.len() > 1 {
                string_literal(args, 1)
            } else {
                "%m%d%Y".to_string()
            };
            Ok(Expr::DateOp(DateOp::Parse, vec![base, Expr::Literal(Value::Text(fmt))]))
        }
        "ADD_DAYS" => {
            arity(args, 2, expr)?;
            let base = arg_value(args, 0)?;
            let n = int_literal(args, 1, expr)?;
            Ok(Expr::DateOp(DateOp::AddDays, vec![base, Expr::Literal(Value::Int(n))]))
        }
        "SUB_DAYS" => {
            arity(args, 2, expr)?;
            let base = arg_value(args, 0)?;
            let n = int_literal(args, 1, expr)?;
            Ok(Expr::DateOp(DateOp::SubDays, vec![base, Expr::Literal(Value::Int(n))]))
        }
        "DIFF_DAYS" => {
            arity(args, 2, expr)?;
            Ok(Expr::DateOp(DateOp::DiffDays, vec![arg_value(args, 0)?, arg_value(args, 1)?]))
        }
        "DIFF" => {
            if args.len() != 2 && args.len() != 3 {
                return Err(Error::transform_at(
                    format!("expected 2 or 3 arguments, got {}", args.len()),
                    expr.to_string(),
                ));
            }
            if args.len() == 3 {
                let unit = string_literal(args, 2);
                if !unit.eq_ignore_ascii_case("days") {
                    return Err(Error::transform_at(
                        format!("unsupported DATE DIFF unit: {unit}"),
                        expr.to_string(),
                    ));
                }
            }
            Ok(Expr::DateOp(DateOp::DiffDays, vec![arg_value(args, 0)?, arg_value(args, 1)?]))
        }
        "CURRENT_DATE" => {
            arity(args, 0, expr)?;
            Ok(Expr::DateOp(DateOp::CurrentDate, vec![]))
        }
        "EXTRACT" => {
            arity(args, 2, expr)?;
            let base = arg_value(args, 0)?;
            let part_str = string_literal(args, 1).to_lowercase();
            let part = match part_str.as_str() {
                "year" => DatePart::Year,
                "month" => DatePart::Month,
                "day" => DatePart::Day,
                other => {
                    return Err(Error::transform_at(
                        format!("unsupported DATE EXTRACT part: {other}"),
                        expr.to_string(),
                    ))
                }
            };
            Ok(Expr::DateOp(
                DateOp::Extract,
                vec![base, Expr::Literal(Value::Int(part as i64))],
            ))
        }
        other => Err(Error::transform_at(
            format!("unsupported DATE method: {other}"),
            expr.to_string(),
        )),
    }
}

fn parse_array(method: &str, args: &[String], expr: &str) -> Result<Expr> {
    match method {
        "JOIN" => {
            arity(args, 2, expr)?;
            let base = arg_value(args, 0)?;
            let delim = string_literal(args, 1);
            Ok(Expr::ArrayOp(ArrayOp::Join, vec![base, Expr::Literal(Value::Text(delim))]))
        }
        "SPLIT" => {
            arity(args, 2, expr)?;
            let base = arg_value(args, 0)?;
            let delim = string_literal(args, 1);
            Ok(Expr::ArrayOp(ArrayOp::Split, vec![base, Expr::Literal(Value::Text(delim))]))
        }
        "LENGTH" => {
            arity(args, 1, expr)?;
            Ok(Expr::ArrayOp(ArrayOp::Length, vec![arg_value(args, 0)?]))
        }
        "GET" => {
            arity(args, 2, expr)?;
            Ok(Expr::ArrayOp(ArrayOp::Get, vec![arg_value(args, 0)?, arg_value(args, 1)?]))
        }
        other => Err(Error::transform_at(
            format!("unsupported ARRAY method: {other}"),
            expr.to_string(),
        )),
    }
}

fn parse_aggregation(method: &str, args: &[String], expr: &str) -> Result<Expr> {
    let op = match method {
        "SUM" => AggOp::Sum,
        "AVG" => AggOp::Avg,
        "MIN" => AggOp::Min,
        "MAX" => AggOp::Max,
        "COUNT" => AggOp::Count,
        other => {
            return Err(Error::transform_at(
                format!("unsupported AGGREGATION method: {other}"),
                expr.to_string(),
            ))
        }
    };
    arity(args, 1, expr)?;
    Ok(Expr::Aggregation(op, Box::new(arg_value(args, 0)?)))
}

fn parse_direct(method: &str, args: &[String], expr: &str) -> Result<Expr> {
    if method != "ATTR" {
        return Err(Error::transform_at(
            format!("unsupported DIRECT method: {method}"),
            expr.to_string(),
        ));
    }
    arity(args, 1, expr)?;
    Ok(Expr::Direct(Box::new(arg_value(args, 0)?)))
}

fn parse_filter_action(method: &str, args: &[String], expr: &str) -> Result<FilterAction> {
    match method {
        "INCLUDE_IF" | "INCLUDE" => {
            arity(args, 1, expr)?;
            Ok(FilterAction::IncludeIf(parse_boolean_expr(&args[0])?))
        }
        "EXCLUDE_IF" => {
            arity(args, 1, expr)?;
            Ok(FilterAction::ExcludeIf(parse_boolean_expr(&args[0])?))
        }
        "LIMIT" => {
            arity(args, 1, expr)?;
            let n = int_literal(args, 0, expr)?;
            Ok(FilterAction::Limit(n.max(0) as usize))
        }
        "OFFSET" => {
            arity(args, 1, expr)?;
            let n = int_literal(args, 0, expr)?;
            Ok(FilterAction::Offset(n.max(0) as usize))
        }
        other => Err(Error::transform_at(
            format!("unsupported FILTER/FILTERS method: {other}"),
            expr.to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_math_add() {
        let parsed = parse_transform_expression("MATH[ADD(attr('a'), 1)]").unwrap();
        assert_eq!(
            parsed,
            ParsedTransform::Value(Expr::Math(
                MathOp::Add,
                vec![Expr::Column("a".to_string()), Expr::Literal(Value::Int(1))]
            ))
        );
    }

    #[test]
    fn parses_string_concat_with_trns_prefix() {
        let parsed = parse_transform_expression("trns: STRING[CONCAT(attr('a'), ' ', attr('b'))]").unwrap();
        assert_eq!(
            parsed,
            ParsedTransform::Value(Expr::Str(
                StringOp::Concat,
                vec![
                    Expr::Column("a".to_string()),
                    Expr::Literal(Value::Text(" ".to_string())),
                    Expr::Column("b".to_string())
                ]
            ))
        );
    }

    #[test]
    fn parses_logical_if() {
        let parsed =
            parse_transform_expression("LOGICAL[IF(attr('age') > 18, 'Adult', 'Minor')]").unwrap();
        match parsed {
            ParsedTransform::Value(Expr::If { .. }) => {}
            other => panic!("expected If, got {other:?}"),
        }
    }

    #[test]
    fn parses_filter_include_if() {
        let parsed = parse_transform_expression("FILTER[INCLUDE_IF(attr('age') >= 18)]").unwrap();
        assert_eq!(
            parsed,
            ParsedTransform::Filter(FilterAction::IncludeIf(BoolExpr::Compare(
                CompareOp::GtEq,
                Box::new(Expr::Column("age".to_string())),
                Box::new(Expr::Literal(Value::Int(18)))
            )))
        );
    }

    #[test]
    fn parses_filters_limit() {
        let parsed = parse_transform_expression("FILTERS[LIMIT(10)]").unwrap();
        assert_eq!(parsed, ParsedTransform::Filter(FilterAction::Limit(10)));
    }

    #[test]
    fn rejects_unknown_operation() {
        assert!(parse_transform_expression("NOPE[FOO(1)]").is_err());
    }

    #[test]
    fn coerces_to_int_shorthand() {
        let expr = coerce_simple_transform("to_int", Expr::Column("a".to_string())).unwrap();
        assert_eq!(expr, Expr::Cast(Box::new(Expr::Column("a".to_string())), crate::value::ValueType::Int));
    }

    #[test]
    fn coerces_date_format_shorthand() {
        let expr = coerce_simple_transform("date_format('%Y-%m-%d')", Expr::Column("d".to_string())).unwrap();
        assert_eq!(
            expr,
            Expr::DateOp(
                DateOp::Format,
                vec![Expr::Column("d".to_string()), Expr::Literal(Value::Text("%Y-%m-%d".to_string()))]
            )
        );
    }

    #[test]
    fn rejects_wrong_arity() {
        let err = parse_transform_expression("MATH[ABS(1, 2)]").unwrap_err();
        assert!(err.to_string().contains("expected 1 argument"));
    }
}
