//! Defines the AST for SQL expressions.

use crate::query::ast::select::Select;
use model::core::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column or table identifier, e.g., `users` or `users.id`.
    Identifier(Ident),

    /// A value bound as a query parameter.
    Value(Value),

    /// Raw SQL emitted as-is, e.g. `TRUE` or `1`.
    Literal(String),

    /// A binary operation, e.g., `column = 'value'` or `a AND b`.
    BinaryOp(Box<BinaryOp>),

    /// `NOT (expr)`
    Not(Box<Expr>),

    /// `expr IS NULL` / `expr IS NOT NULL`
    IsNull { expr: Box<Expr>, negated: bool },

    /// `expr IN (...)` / `expr NOT IN (...)`
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },

    /// `EXISTS (SELECT ...)`
    Exists(Box<Select>),

    /// A function call, e.g., `COUNT(*)`.
    FunctionCall(FunctionCall),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub qualifier: Option<String>, // e.g., the 't0' in 't0.id'
    pub name: String,              // e.g., the 'id' in 't0.id'
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOp {
    pub left: Expr,
    pub op: BinaryOperator,
    pub right: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expr>,
    pub wildcard: bool, // represents the '*' in 'COUNT(*)'
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Comparison
    Eq,    // =
    NotEq, // <>
    Lt,    // <
    LtEq,  // <=
    Gt,    // >
    GtEq,  // >=

    // Logical
    And,
    Or,
}

impl Expr {
    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Self {
        Expr::BinaryOp(Box::new(BinaryOp { left, op, right }))
    }

    /// Left-folds `exprs` with `op`. Callers handle the empty case.
    pub fn fold(op: BinaryOperator, exprs: Vec<Expr>) -> Option<Expr> {
        exprs
            .into_iter()
            .reduce(|left, right| Expr::binary(left, op, right))
    }
}
