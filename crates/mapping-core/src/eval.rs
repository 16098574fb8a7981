//! Row-wise evaluation of a compiled [`Expr`]/[`BoolExpr`] against a
//! [`Table`]. The table and the output are columnar; evaluation itself
//! walks one row at a time, the way the original engine's vectorized
//! column ops reduce to per-cell semantics at the edges (`SUBSTR`,
//! `DATE[...]`, list ops) that don't have a clean columnar shortcut here.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::ast::{AggOp, ArrayOp, BoolExpr, CompareOp, DateOp, DatePart, Expr, MathOp, StringOp};
use crate::error::{Error, Result};
use crate::table::{Column, Table};
use crate::value::{Value, ValueType};

/// Evaluates `expr` for every row of `table`, producing a column named
/// `target`. The column's value type is taken from the first non-null
/// result, falling back to `Text` when every row is null.
pub fn eval_column(target: &str, expr: &Expr, table: &Table) -> Result<Column> {
    let mut values = Vec::with_capacity(table.height());
    for row in 0..table.height() {
        values.push(eval_expr(expr, table, row)?);
    }
    let value_type = values
        .iter()
        .find_map(Value::value_type)
        .unwrap_or(ValueType::Text);
    Ok(Column::new(target, value_type, values))
}

fn column_value<'a>(table: &'a Table, name: &str, row: usize) -> Result<&'a Value> {
    let col = table
        .column(name)
        .ok_or_else(|| Error::transform_for("unknown column", name.to_string(), name.to_string()))?;
    Ok(&col.values[row])
}

pub fn eval_expr(expr: &Expr, table: &Table, row: usize) -> Result<Value> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Column(name) => Ok(column_value(table, name, row)?.clone()),
        Expr::Cast(inner, ty) => cast_value(eval_expr(inner, table, row)?, *ty),
        Expr::Math(op, args) => eval_math(*op, args, table, row),
        Expr::Str(op, args) => eval_string(*op, args, table, row),
        Expr::If { cond, then_value, else_value } => {
            if eval_bool(cond, table, row)? {
                eval_expr(then_value, table, row)
            } else {
                eval_expr(else_value, table, row)
            }
        }
        Expr::DateOp(op, args) => eval_date(*op, args, table, row),
        Expr::ArrayOp(op, args) => eval_array(*op, args, table, row),
        Expr::Aggregation(op, arg) => eval_aggregation(*op, arg, table, row),
        Expr::Direct(inner) => eval_expr(inner, table, row),
        Expr::Bool(b) => Ok(match eval_bool_tri(b, table, row)? {
            Some(v) => Value::Bool(v),
            None => Value::Null,
        }),
        Expr::ToBool(inner) => {
            let text = eval_expr(inner, table, row)?.coerce_text().to_lowercase();
            Ok(Value::Bool(matches!(text.as_str(), "1" | "true" | "y" | "yes")))
        }
    }
}

/// Evaluates a boolean expression for row-filtering purposes: a null
/// (unknown) result is treated as not-true, per spec §4.5's three-valued
/// filter semantics (`INCLUDE_IF` excludes it, `EXCLUDE_IF` retains it).
pub fn eval_bool(expr: &BoolExpr, table: &Table, row: usize) -> Result<bool> {
    Ok(eval_bool_tri(expr, table, row)?.unwrap_or(false))
}

/// Three-valued evaluation: `None` means the result is unknown because a
/// comparison operand was null. Used directly by `Expr::Bool` so a
/// value-producing boolean column surfaces that unknown-ness as
/// `Value::Null` rather than silently collapsing it to `false`; filter
/// predicates go through [`eval_bool`], which applies its own not-true
/// policy on top of this.
fn eval_bool_tri(expr: &BoolExpr, table: &Table, row: usize) -> Result<Option<bool>> {
    match expr {
        BoolExpr::Compare(op, a, b) => {
            let a = eval_expr(a, table, row)?;
            let b = eval_expr(b, table, row)?;
            Ok(compare(*op, &a, &b))
        }
        BoolExpr::And(parts) => {
            let mut saw_unknown = false;
            for p in parts {
                match eval_bool_tri(p, table, row)? {
                    Some(false) => return Ok(Some(false)),
                    Some(true) => {}
                    None => saw_unknown = true,
                }
            }
            Ok(if saw_unknown { None } else { Some(true) })
        }
        BoolExpr::Or(parts) => {
            let mut saw_unknown = false;
            for p in parts {
                match eval_bool_tri(p, table, row)? {
                    Some(true) => return Ok(Some(true)),
                    Some(false) => {}
                    None => saw_unknown = true,
                }
            }
            Ok(if saw_unknown { None } else { Some(false) })
        }
        BoolExpr::Not(inner) => Ok(eval_bool_tri(inner, table, row)?.map(|b| !b)),
    }
}

/// Compares two values, returning `None` (unknown) whenever either
/// operand is null rather than falling through to a definite text
/// comparison on the coerced-to-empty-string null — `Null.coerce_text()`
/// would otherwise make `!=`/`</>` etc. spuriously resolve to `true`.
fn compare(op: CompareOp, a: &Value, b: &Value) -> Option<bool> {
    if a.is_null() || b.is_null() {
        return None;
    }
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return Some(match op {
            CompareOp::Eq => x == y,
            CompareOp::NotEq => x != y,
            CompareOp::Gt => x > y,
            CompareOp::Lt => x < y,
            CompareOp::GtEq => x >= y,
            CompareOp::LtEq => x <= y,
        });
    }
    let x = a.coerce_text();
    let y = b.coerce_text();
    Some(match op {
        CompareOp::Eq => x == y,
        CompareOp::NotEq => x != y,
        CompareOp::Gt => x > y,
        CompareOp::Lt => x < y,
        CompareOp::GtEq => x >= y,
        CompareOp::LtEq => x <= y,
    })
}

fn cast_value(v: Value, ty: ValueType) -> Result<Value> {
    if v.is_null() {
        return Ok(Value::Null);
    }
    Ok(match ty {
        ValueType::Int => match v.as_f64() {
            Some(f) => Value::Int(f as i64),
            None => v
                .coerce_text()
                .trim()
                .parse::<f64>()
                .map(|f| Value::Int(f as i64))
                .unwrap_or(Value::Null),
        },
        ValueType::Float => match v.as_f64() {
            Some(f) => Value::Float(f),
            None => v
                .coerce_text()
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .unwrap_or(Value::Null),
        },
        ValueType::Text => Value::Text(v.coerce_text()),
        ValueType::Bool => match v {
            Value::Bool(b) => Value::Bool(b),
            Value::Int(i) => Value::Bool(i != 0),
            other => {
                let t = other.coerce_text().to_lowercase();
                match t.as_str() {
                    "1" | "true" | "y" | "yes" => Value::Bool(true),
                    "0" | "false" | "n" | "no" => Value::Bool(false),
                    _ => Value::Null,
                }
            }
        },
        ValueType::Date | ValueType::DateTime | ValueType::TextList => {
            return Err(Error::transform(format!("unsupported cast target: {ty}")));
        }
    })
}

fn eval_math(op: MathOp, args: &[Expr], table: &Table, row: usize) -> Result<Value> {
    let a = eval_expr(&args[0], table, row)?;
    if matches!(op, MathOp::Abs) {
        return Ok(match a {
            Value::Int(i) => Value::Int(i.abs()),
            other => other
                .as_f64()
                .map(|f| Value::Float(f.abs()))
                .unwrap_or(Value::Null),
        });
    }

    let b = eval_expr(&args[1], table, row)?;
    if matches!(op, MathOp::Round) {
        let prec = match &b {
            Value::Int(i) => *i as i32,
            _ => 0,
        };
        let factor = 10f64.powi(prec);
        return Ok(match a.as_f64() {
            Some(f) => Value::Float((f * factor).round() / factor),
            None => Value::Null,
        });
    }

    let (x, y) = match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => (x, y),
        _ => return Ok(Value::Null),
    };
    let both_int = matches!(a, Value::Int(_)) && matches!(b, Value::Int(_));

    Ok(match op {
        MathOp::Add if both_int => Value::Int(x as i64 + y as i64),
        MathOp::Add => Value::Float(x + y),
        MathOp::Sub if both_int => Value::Int(x as i64 - y as i64),
        MathOp::Sub => Value::Float(x - y),
        MathOp::Mul if both_int => Value::Int(x as i64 * y as i64),
        MathOp::Mul => Value::Float(x * y),
        MathOp::Div => Value::Float(x / y),
        MathOp::Mod if both_int => Value::Int(x as i64 % y as i64),
        MathOp::Mod => Value::Float(x % y),
        MathOp::Round | MathOp::Abs => unreachable!("handled above"),
    })
}

fn eval_string(op: StringOp, args: &[Expr], table: &Table, row: usize) -> Result<Value> {
    Ok(match op {
        StringOp::Concat => {
            let mut out = String::new();
            for a in args {
                out.push_str(&eval_expr(a, table, row)?.coerce_text());
            }
            Value::Text(out)
        }
        StringOp::Substr => {
            let base = eval_expr(&args[0], table, row)?;
            if base.is_null() {
                return Ok(Value::Null);
            }
            let text = base.coerce_text();
            let chars: Vec<char> = text.chars().collect();
            let len = chars.len() as i64;
            let start_raw = eval_expr(&args[1], table, row)?.as_f64().unwrap_or(0.0) as i64;
            let start = if start_raw < 0 { (len + start_raw).max(0) } else { start_raw.min(len) };
            let end = if args.len() > 2 {
                let length = eval_expr(&args[2], table, row)?.as_f64().unwrap_or(0.0) as i64;
                (start + length).clamp(start, len)
            } else {
                len
            };
            Value::Text(chars[start as usize..end as usize].iter().collect())
        }
        StringOp::Replace => {
            let base = eval_expr(&args[0], table, row)?.coerce_text();
            let find = eval_expr(&args[1], table, row)?.coerce_text();
            let repl = eval_expr(&args[2], table, row)?.coerce_text();
            if find.is_empty() {
                Value::Text(base)
            } else {
                Value::Text(base.replace(&find, &repl))
            }
        }
        StringOp::Upper => Value::Text(eval_expr(&args[0], table, row)?.coerce_text().to_uppercase()),
        StringOp::Lower => Value::Text(eval_expr(&args[0], table, row)?.coerce_text().to_lowercase()),
        StringOp::Trim => Value::Text(eval_expr(&args[0], table, row)?.coerce_text().trim().to_string()),
        StringOp::Length => {
            Value::Int(eval_expr(&args[0], table, row)?.coerce_text().chars().count() as i64)
        }
    })
}

const DEFAULT_DATE_FMT: &str = "%Y-%m-%d";

fn parse_date_like(v: &Value, fmt: &str) -> Option<NaiveDate> {
    match v {
        Value::Date(d) => Some(*d),
        Value::DateTime(dt) => Some(dt.date()),
        other => {
            let text = other.coerce_text();
            NaiveDate::parse_from_str(&text, fmt)
                .or_else(|_| NaiveDate::parse_from_str(&text, DEFAULT_DATE_FMT))
                .ok()
        }
    }
}

fn eval_date(op: DateOp, args: &[Expr], table: &Table, row: usize) -> Result<Value> {
    Ok(match op {
        DateOp::Format => {
            let base = eval_expr(&args[0], table, row)?;
            let fmt = eval_expr(&args[1], table, row)?.coerce_text();
            match &base {
                Value::Date(d) => Value::Text(d.format(&fmt).to_string()),
                Value::DateTime(dt) => Value::Text(dt.format(&fmt).to_string()),
                other => {
                    let text = other.coerce_text();
                    match NaiveDateTime::parse_from_str(&text, &fmt)
                        .map(|dt| dt.format(&fmt).to_string())
                        .or_else(|_| NaiveDate::parse_from_str(&text, &fmt).map(|d| d.format(&fmt).to_string()))
                    {
                        Ok(formatted) => Value::Text(formatted),
                        Err(_) => Value::Text(text),
                    }
                }
            }
        }
        DateOp::Parse => {
            let base = eval_expr(&args[0], table, row)?.coerce_text();
            let fmt = eval_expr(&args[1], table, row)?.coerce_text();
            NaiveDate::parse_from_str(&base, &fmt)
                .map(Value::Date)
                .unwrap_or(Value::Null)
        }
        DateOp::AddDays => {
            let base = eval_expr(&args[0], table, row)?;
            let n = eval_expr(&args[1], table, row)?.as_f64().unwrap_or(0.0) as i64;
            match parse_date_like(&base, DEFAULT_DATE_FMT) {
                Some(d) => Value::Date(d + Duration::days(n)),
                None => Value::Null,
            }
        }
        DateOp::SubDays => {
            let base = eval_expr(&args[0], table, row)?;
            let n = eval_expr(&args[1], table, row)?.as_f64().unwrap_or(0.0) as i64;
            match parse_date_like(&base, DEFAULT_DATE_FMT) {
                Some(d) => Value::Date(d - Duration::days(n)),
                None => Value::Null,
            }
        }
        DateOp::DiffDays => {
            let a = eval_expr(&args[0], table, row)?;
            let b = eval_expr(&args[1], table, row)?;
            match (parse_date_like(&a, DEFAULT_DATE_FMT), parse_date_like(&b, DEFAULT_DATE_FMT)) {
                (Some(x), Some(y)) => Value::Int((x - y).num_days()),
                _ => Value::Null,
            }
        }
        DateOp::CurrentDate => Value::Date(chrono::Local::now().date_naive()),
        DateOp::Extract => {
            let base = eval_expr(&args[0], table, row)?;
            let part = match eval_expr(&args[1], table, row)?.as_f64().unwrap_or(0.0) as i64 {
                p if p == DatePart::Year as i64 => DatePart::Year,
                p if p == DatePart::Month as i64 => DatePart::Month,
                _ => DatePart::Day,
            };
            match parse_date_like(&base, DEFAULT_DATE_FMT) {
                Some(d) => Value::Int(match part {
                    DatePart::Year => d.year() as i64,
                    DatePart::Month => d.month() as i64,
                    DatePart::Day => d.day() as i64,
                }),
                None => Value::Null,
            }
        }
    })
}

fn eval_array(op: ArrayOp, args: &[Expr], table: &Table, row: usize) -> Result<Value> {
    Ok(match op {
        ArrayOp::Join => {
            let base = eval_expr(&args[0], table, row)?;
            match base {
                // ARRAY[JOIN] on a non-list column is a documented
                // passthrough limitation inherited from the original
                // engine, not a bug: comma-separated text columns are
                // not re-split before joining.
                Value::TextList(items) => {
                    let delim = eval_expr(&args[1], table, row)?.coerce_text();
                    Value::Text(items.join(&delim))
                }
                other => other,
            }
        }
        ArrayOp::Split => {
            let base = eval_expr(&args[0], table, row)?.coerce_text();
            let delim = eval_expr(&args[1], table, row)?.coerce_text();
            if base.is_empty() {
                Value::TextList(vec![])
            } else {
                Value::TextList(base.split(delim.as_str()).map(str::to_string).collect())
            }
        }
        ArrayOp::Length => match eval_expr(&args[0], table, row)? {
            Value::TextList(items) => Value::Int(items.len() as i64),
            Value::Null => Value::Null,
            _ => return Err(Error::transform("ARRAY[LENGTH] requires a list-typed argument")),
        },
        ArrayOp::Get => match eval_expr(&args[0], table, row)? {
            Value::TextList(items) => {
                let idx = eval_expr(&args[1], table, row)?.as_f64().unwrap_or(-1.0) as i64;
                if idx < 0 || idx as usize >= items.len() {
                    Value::Null
                } else {
                    Value::Text(items[idx as usize].clone())
                }
            }
            Value::Null => Value::Null,
            _ => return Err(Error::transform("ARRAY[GET] requires a list-typed argument")),
        },
    })
}

fn eval_aggregation(op: AggOp, arg: &Expr, table: &Table, row: usize) -> Result<Value> {
    let items = match eval_expr(arg, table, row)? {
        Value::TextList(items) => items,
        Value::Null => return Ok(Value::Null),
        _ => return Err(Error::transform("AGGREGATION requires a list-typed argument")),
    };
    if matches!(op, AggOp::Count) {
        return Ok(Value::Int(items.len() as i64));
    }
    let numbers: Vec<f64> = items.iter().filter_map(|s| s.trim().parse::<f64>().ok()).collect();
    if numbers.is_empty() {
        return Ok(Value::Null);
    }
    Ok(match op {
        AggOp::Sum => Value::Float(numbers.iter().sum()),
        AggOp::Avg => Value::Float(numbers.iter().sum::<f64>() / numbers.len() as f64),
        AggOp::Min => Value::Float(numbers.iter().cloned().fold(f64::INFINITY, f64::min)),
        AggOp::Max => Value::Float(numbers.iter().cloned().fold(f64::NEG_INFINITY, f64::max)),
        AggOp::Count => unreachable!("handled above"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn one_row_table() -> Table {
        Table::from_columns(vec![
            Column::new("age", ValueType::Int, vec![Value::Int(20)]),
            Column::new("name", ValueType::Text, vec![Value::Text("alice".to_string())]),
        ])
        .unwrap()
    }

    #[test]
    fn evaluates_math_add_preserves_int() {
        let table = one_row_table();
        let expr = Expr::Math(MathOp::Add, vec![Expr::Column("age".to_string()), Expr::Literal(Value::Int(5))]);
        assert_eq!(eval_expr(&expr, &table, 0).unwrap(), Value::Int(25));
    }

    #[test]
    fn evaluates_div_always_float() {
        let table = one_row_table();
        let expr = Expr::Math(MathOp::Div, vec![Expr::Literal(Value::Int(7)), Expr::Literal(Value::Int(2))]);
        assert_eq!(eval_expr(&expr, &table, 0).unwrap(), Value::Float(3.5));
    }

    #[test]
    fn evaluates_string_upper() {
        let table = one_row_table();
        let expr = Expr::Str(StringOp::Upper, vec![Expr::Column("name".to_string())]);
        assert_eq!(eval_expr(&expr, &table, 0).unwrap(), Value::Text("ALICE".to_string()));
    }

    #[test]
    fn evaluates_substr_zero_based() {
        let table = one_row_table();
        let expr = Expr::Str(
            StringOp::Substr,
            vec![Expr::Column("name".to_string()), Expr::Literal(Value::Int(1)), Expr::Literal(Value::Int(2))],
        );
        assert_eq!(eval_expr(&expr, &table, 0).unwrap(), Value::Text("li".to_string()));
    }

    #[test]
    fn evaluates_if_branches_on_condition() {
        let table = one_row_table();
        let cond = BoolExpr::Compare(CompareOp::GtEq, Box::new(Expr::Column("age".to_string())), Box::new(Expr::Literal(Value::Int(18))));
        let expr = Expr::If {
            cond: Box::new(cond),
            then_value: Box::new(Expr::Literal(Value::Text("Adult".to_string()))),
            else_value: Box::new(Expr::Literal(Value::Text("Minor".to_string()))),
        };
        assert_eq!(eval_expr(&expr, &table, 0).unwrap(), Value::Text("Adult".to_string()));
    }

    #[test]
    fn array_join_passes_through_non_list_values() {
        let table = one_row_table();
        let expr = Expr::ArrayOp(ArrayOp::Join, vec![Expr::Column("name".to_string()), Expr::Literal(Value::Text(",".to_string()))]);
        assert_eq!(eval_expr(&expr, &table, 0).unwrap(), Value::Text("alice".to_string()));
    }

    #[test]
    fn eval_column_infers_type_from_first_non_null() {
        let table = one_row_table();
        let expr = Expr::Column("age".to_string());
        let col = eval_column("age_copy", &expr, &table).unwrap();
        assert_eq!(col.value_type, ValueType::Int);
    }
}
