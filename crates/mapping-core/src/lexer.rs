//! The DSL's lexical layer: splitting `OP[METHOD(arg, arg, ...)]` strings
//! into their pieces without recursing into nested brackets or quoted
//! text. No regex: bracket/quote depth is tracked with a small cursor,
//! the way `oxide-sql-core`'s tokenizer walks source by `peek`/`advance`
//! rather than pattern matching.

use crate::error::{Error, Result};

/// A byte-position cursor over DSL source text.
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Cursor { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }
}

/// Splits a method-argument string on top-level commas, respecting
/// nested `(...)`/`[...]` and single/double-quoted spans (with `\`
/// escaping the closing quote). Each returned piece is trimmed.
pub fn split_args(arg_str: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut cur = String::new();
    let mut depth_paren: i32 = 0;
    let mut depth_brack: i32 = 0;
    let mut in_quote: Option<char> = None;
    let mut prev: Option<char> = None;
    let mut cursor = Cursor::new(arg_str);

    while let Some(ch) = cursor.advance() {
        if let Some(q) = in_quote {
            cur.push(ch);
            if ch == q && prev != Some('\\') {
                in_quote = None;
            }
        } else {
            match ch {
                '\'' | '"' => {
                    in_quote = Some(ch);
                    cur.push(ch);
                }
                '(' => {
                    depth_paren += 1;
                    cur.push(ch);
                }
                ')' => {
                    depth_paren -= 1;
                    cur.push(ch);
                }
                '[' => {
                    depth_brack += 1;
                    cur.push(ch);
                }
                ']' => {
                    depth_brack -= 1;
                    cur.push(ch);
                }
                ',' if depth_paren == 0 && depth_brack == 0 => {
                    args.push(cur.trim().to_string());
                    cur = String::new();
                }
                _ => cur.push(ch),
            }
        }
        prev = Some(ch);
    }
    if !cur.is_empty() {
        args.push(cur.trim().to_string());
    }
    args
}

/// Matches `OP[inner]`, optionally prefixed by `trns:` (case-insensitive,
/// with surrounding whitespace), returning the uppercased operator name
/// and the untrimmed bracket interior. Trailing whitespace after the
/// closing bracket is tolerated, anything else is a malformed expression.
pub fn match_op_bracket(expr: &str) -> Result<(String, String)> {
    let trimmed = expr.trim();
    let without_prefix = strip_trns_prefix(trimmed);
    let body = without_prefix.trim_start();

    let bracket_pos = body.find('[').ok_or_else(|| {
        Error::transform_at("malformed transform expression: missing '['", expr.to_string())
    })?;
    let op = body[..bracket_pos].trim();
    if op.is_empty() || !op.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(Error::transform_at(
            "malformed transform expression: invalid operator name",
            expr.to_string(),
        ));
    }
    let rest = body[bracket_pos + 1..].trim_end();
    let inner = rest.strip_suffix(']').ok_or_else(|| {
        Error::transform_at("malformed transform expression: missing ']'", expr.to_string())
    })?;
    Ok((op.to_uppercase(), inner.to_string()))
}

fn strip_trns_prefix(expr: &str) -> &str {
    if expr.len() >= 5 && expr[..5].eq_ignore_ascii_case("trns:") {
        &expr[5..]
    } else {
        expr
    }
}

/// Matches `METHOD(args)`, returning the uppercased method name and the
/// untrimmed parenthesized interior.
pub fn match_method_call(content: &str) -> Result<(String, String)> {
    let trimmed = content.trim();
    let paren_pos = trimmed.find('(').ok_or_else(|| {
        Error::transform_at(
            "malformed method call: missing '('",
            content.to_string(),
        )
    })?;
    let method = trimmed[..paren_pos].trim();
    if method.is_empty() || !method.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(Error::transform_at(
            "malformed method call: invalid method name",
            content.to_string(),
        ));
    }
    let rest = &trimmed[paren_pos + 1..];
    let inner = rest.strip_suffix(')').ok_or_else(|| {
        Error::transform_at("malformed method call: missing ')'", content.to_string())
    })?;
    Ok((method.to_uppercase(), inner.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_args_respects_nested_parens() {
        let args = split_args("attr('a'), ROUND(attr('b'), 2), 'x,y'");
        assert_eq!(args, vec!["attr('a')", "ROUND(attr('b'), 2)", "'x,y'"]);
    }

    #[test]
    fn split_args_respects_brackets() {
        let args = split_args("MATH[ADD(attr('a'), 1)], attr('b')");
        assert_eq!(args, vec!["MATH[ADD(attr('a'), 1)]", "attr('b')"]);
    }

    #[test]
    fn split_args_handles_escaped_quote() {
        let args = split_args(r#"'it\'s fine', 2"#);
        assert_eq!(args, vec![r#"'it\'s fine'"#, "2"]);
    }

    #[test]
    fn match_op_bracket_strips_trns_prefix() {
        let (op, inner) = match_op_bracket("trns: STRING[UPPER(attr('a'))]").unwrap();
        assert_eq!(op, "STRING");
        assert_eq!(inner, "UPPER(attr('a'))");
    }

    #[test]
    fn match_op_bracket_without_prefix() {
        let (op, inner) = match_op_bracket("MATH[ADD(1, 2)]").unwrap();
        assert_eq!(op, "MATH");
        assert_eq!(inner, "ADD(1, 2)");
    }

    #[test]
    fn match_method_call_splits_name_and_args() {
        let (method, args) = match_method_call("CONCAT(attr('a'), ' ', attr('b'))").unwrap();
        assert_eq!(method, "CONCAT");
        assert_eq!(args, "attr('a'), ' ', attr('b')");
    }
}
