//! Backend-neutral predicate tree produced by the filter compiler.

use crate::{error::CompileError, predicate::scope::ScopeId};
use model::{
    core::value::Value,
    filter::node::{ScalarOp, ScalarOperand},
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub scope: ScopeId,
    pub column: String,
}

impl ColumnRef {
    pub fn new(scope: ScopeId, column: &str) -> Self {
        Self {
            scope,
            column: column.to_string(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.scope, self.column)
    }
}

/// A column compared with a bound operand.
///
/// Fields are private: `bind` is the only way to build one, so every
/// operator goes through the same operand checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnComparison {
    column: ColumnRef,
    op: ScalarOp,
    operand: ScalarOperand,
}

impl ColumnComparison {
    pub fn bind(
        column: ColumnRef,
        op: ScalarOp,
        operand: ScalarOperand,
    ) -> Result<Self, CompileError> {
        let invalid = |reason: &str| CompileError::InvalidOperand {
            column: column.to_string(),
            op: op.to_string(),
            reason: reason.to_string(),
        };

        match (&operand, op.takes_list()) {
            (ScalarOperand::Single(_), true) => return Err(invalid("expected a list operand")),
            (ScalarOperand::List(_), false) => return Err(invalid("expected a single operand")),
            (ScalarOperand::List(values), true) if values.iter().any(Value::is_null) => {
                return Err(invalid("list operands cannot contain NULL"));
            }
            (ScalarOperand::Single(Value::Null), false) if !op.accepts_null() => {
                return Err(invalid("NULL can only be tested for equality"));
            }
            (ScalarOperand::Single(Value::Float(f)), _) if !f.is_finite() => {
                return Err(invalid("non-finite float operand"));
            }
            _ => {}
        }

        // Operands are compared in the form the stores keep.
        let operand = match operand {
            ScalarOperand::Single(value) => ScalarOperand::Single(value.canonical()),
            ScalarOperand::List(values) => {
                ScalarOperand::List(values.into_iter().map(Value::canonical).collect())
            }
        };

        Ok(Self {
            column,
            op,
            operand,
        })
    }

    pub fn column(&self) -> &ColumnRef {
        &self.column
    }

    pub fn op(&self) -> ScalarOp {
        self.op
    }

    pub fn operand(&self) -> &ScalarOperand {
        &self.operand
    }
}

impl fmt::Display for ColumnComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match (self.op, &self.operand) {
            (ScalarOp::Eq, ScalarOperand::Single(Value::Null)) => {
                return write!(f, "{} IS NULL", self.column);
            }
            (ScalarOp::Neq, ScalarOperand::Single(Value::Null)) => {
                return write!(f, "{} IS NOT NULL", self.column);
            }
            (ScalarOp::Eq, _) => "=",
            (ScalarOp::Neq, _) => "<>",
            (ScalarOp::Lt, _) => "<",
            (ScalarOp::Lte, _) => "<=",
            (ScalarOp::Gt, _) => ">",
            (ScalarOp::Gte, _) => ">=",
            (ScalarOp::In, _) => "IN",
            (ScalarOp::NotIn, _) => "NOT IN",
        };

        match &self.operand {
            ScalarOperand::Single(value) => write!(f, "{} {op} {value}", self.column),
            ScalarOperand::List(values) => {
                let items = values.iter().map(|v| v.to_string()).collect::<Vec<_>>();
                write!(f, "{} {op} ({})", self.column, items.join(", "))
            }
        }
    }
}

/// One equality of a join: `inner_scope.inner = outer_scope.outer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinLink {
    pub outer: String,
    pub inner: String,
}

/// The rows of `target` related to the current row of `parent` through
/// `source.relation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinScope {
    pub id: ScopeId,
    pub parent: ScopeId,
    pub source: String,
    pub relation: String,
    pub target: String,
    pub links: Vec<JoinLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CompiledPredicate {
    /// Only produced for an empty AND (true) or an empty OR (false).
    Constant(bool),
    Compare(ColumnComparison),
    And(Vec<CompiledPredicate>),
    Or(Vec<CompiledPredicate>),
    Not(Box<CompiledPredicate>),
    /// True when at least one row of the scope satisfies `inner`.
    Exists {
        scope: JoinScope,
        inner: Box<CompiledPredicate>,
    },
}

impl CompiledPredicate {
    pub fn compare_count(&self) -> usize {
        match self {
            CompiledPredicate::Constant(_) => 0,
            CompiledPredicate::Compare(_) => 1,
            CompiledPredicate::And(children) | CompiledPredicate::Or(children) => {
                children.iter().map(CompiledPredicate::compare_count).sum()
            }
            CompiledPredicate::Not(inner) => inner.compare_count(),
            CompiledPredicate::Exists { inner, .. } => inner.compare_count(),
        }
    }

    pub fn exists_count(&self) -> usize {
        match self {
            CompiledPredicate::Constant(_) | CompiledPredicate::Compare(_) => 0,
            CompiledPredicate::And(children) | CompiledPredicate::Or(children) => {
                children.iter().map(CompiledPredicate::exists_count).sum()
            }
            CompiledPredicate::Not(inner) => inner.exists_count(),
            CompiledPredicate::Exists { inner, .. } => 1 + inner.exists_count(),
        }
    }
}

impl fmt::Display for CompiledPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompiledPredicate::Constant(true) => f.write_str("TRUE"),
            CompiledPredicate::Constant(false) => f.write_str("FALSE"),
            CompiledPredicate::Compare(cmp) => write!(f, "{cmp}"),
            CompiledPredicate::And(children) => write_joined(f, children, " AND "),
            CompiledPredicate::Or(children) => write_joined(f, children, " OR "),
            CompiledPredicate::Not(inner) => write!(f, "NOT {inner}"),
            CompiledPredicate::Exists { scope, inner } => {
                let on = scope
                    .links
                    .iter()
                    .map(|l| format!("{}.{} = {}.{}", scope.id, l.inner, scope.parent, l.outer))
                    .collect::<Vec<_>>()
                    .join(" AND ");
                write!(
                    f,
                    "EXISTS({} {} ON {on} WHERE {inner})",
                    scope.target, scope.id
                )
            }
        }
    }
}

fn write_joined(
    f: &mut fmt::Formatter<'_>,
    children: &[CompiledPredicate],
    sep: &str,
) -> fmt::Result {
    f.write_str("(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{child}")?;
    }
    f.write_str(")")
}
