//! The expression AST produced by the value and expression parsers.
//!
//! Mirrors the operator family layout of the DSL: each `OP[METHOD(args)]`
//! family gets a `Copy` method tag plus a variable-arity argument list,
//! the way `oxide-sql-core` tags its `BinaryOp`/`UnaryOp` rather than
//! inlining the operator into the tree shape.

use crate::value::{Value, ValueType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Round,
    Abs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringOp {
    Concat,
    Substr,
    Replace,
    Upper,
    Lower,
    Trim,
    Length,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    Year,
    Month,
    Day,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOp {
    Format,
    Parse,
    AddDays,
    SubDays,
    DiffDays,
    CurrentDate,
    Extract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayOp {
    Join,
    Split,
    Length,
    Get,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggOp {
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    Lt,
    GtEq,
    LtEq,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::GtEq => ">=",
            CompareOp::LtEq => "<=",
        }
    }
}

/// A value-producing expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Column(String),
    /// Inserted by the compiler, never by the value/expression parsers
    /// directly, to make otherwise-implicit text coercions explicit in
    /// the tree the evaluator walks.
    Cast(Box<Expr>, ValueType),
    Math(MathOp, Vec<Expr>),
    Str(StringOp, Vec<Expr>),
    If {
        cond: Box<BoolExpr>,
        then_value: Box<Expr>,
        else_value: Box<Expr>,
    },
    DateOp(DateOp, Vec<Expr>),
    ArrayOp(ArrayOp, Vec<Expr>),
    Aggregation(AggOp, Box<Expr>),
    /// `DIRECT[ATTR(col)]`: used only where the grammar forbids recursing
    /// into a nested DSL expression, so the argument is restricted to an
    /// attribute reference at parse time.
    Direct(Box<Expr>),
    /// `LOGICAL[AND|OR|NOT(...)]`/`BOOLEAN[...]` used as a value rather
    /// than a filter predicate: materializes a boolean column.
    Bool(Box<BoolExpr>),
    /// The `to_bool` simple-transform shorthand: lowercases the text
    /// coercion of its argument and tests membership in
    /// `{1, true, y, yes}`.
    ToBool(Box<Expr>),
}

/// A boolean-valued expression: comparisons and their conjunctions.
#[derive(Debug, Clone, PartialEq)]
pub enum BoolExpr {
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    And(Vec<BoolExpr>),
    Or(Vec<BoolExpr>),
    Not(Box<BoolExpr>),
}

/// A row-selection action produced by `FILTER[...]`/`FILTERS[...]`.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterAction {
    IncludeIf(BoolExpr),
    ExcludeIf(BoolExpr),
    Limit(usize),
    Offset(usize),
}

/// The outcome of parsing one mapping's `trns`/`transform` string: either
/// a value expression to project, or a row-selection action to run
/// before projection. Mirrors the original engine's convention of
/// returning a `("FILTER"|"FILTERS", method, args)` tuple instead of an
/// expression when the transform string is a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedTransform {
    Value(Expr),
    Filter(FilterAction),
}
