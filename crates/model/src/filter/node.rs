//! Typed, in-memory representation of a `where` clause.

use crate::{
    core::{field_type::FieldType, value::Value},
    error::FilterError,
    schema::entity::{Entity, Field},
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    NotIn,
}

impl ScalarOp {
    pub const ALL: [ScalarOp; 8] = [
        ScalarOp::Eq,
        ScalarOp::Neq,
        ScalarOp::Lt,
        ScalarOp::Lte,
        ScalarOp::Gt,
        ScalarOp::Gte,
        ScalarOp::In,
        ScalarOp::NotIn,
    ];

    /// `IN` and `NOT IN` take a list operand, every other operator a single value.
    pub fn takes_list(&self) -> bool {
        matches!(self, ScalarOp::In | ScalarOp::NotIn)
    }

    /// Only equality operators may be used with a NULL operand.
    pub fn accepts_null(&self) -> bool {
        matches!(self, ScalarOp::Eq | ScalarOp::Neq)
    }
}

impl fmt::Display for ScalarOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScalarOp::Eq => "EQ",
            ScalarOp::Neq => "NEQ",
            ScalarOp::Lt => "LT",
            ScalarOp::Lte => "LTE",
            ScalarOp::Gt => "GT",
            ScalarOp::Gte => "GTE",
            ScalarOp::In => "IN",
            ScalarOp::NotIn => "NOT_IN",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantifier {
    /// At least one related row satisfies the inner filter.
    Some,
    /// Every related row satisfies the inner filter (vacuously true with none).
    Every,
    /// No related row satisfies the inner filter.
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldRef(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationRef(pub String);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarOperand {
    Single(Value),
    List(Vec<Value>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarCompare {
    pub field: FieldRef,
    pub op: ScalarOp,
    pub value: ScalarOperand,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationFilter {
    pub relation: RelationRef,
    pub quantifier: Quantifier,
    pub inner: Box<FilterNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterNode {
    Logical {
        op: LogicalOp,
        children: Vec<FilterNode>,
    },
    ScalarCompare(ScalarCompare),
    RelationFilter(RelationFilter),
}

impl FilterNode {
    pub fn and(children: Vec<FilterNode>) -> Self {
        FilterNode::Logical {
            op: LogicalOp::And,
            children,
        }
    }

    pub fn or(children: Vec<FilterNode>) -> Self {
        FilterNode::Logical {
            op: LogicalOp::Or,
            children,
        }
    }

    /// `NOT(children)` negates the conjunction of its children.
    pub fn not(children: Vec<FilterNode>) -> Self {
        FilterNode::Logical {
            op: LogicalOp::Not,
            children,
        }
    }

    /// Number of `ScalarCompare` leaves anywhere in the tree.
    pub fn scalar_leaf_count(&self) -> usize {
        match self {
            FilterNode::Logical { children, .. } => {
                children.iter().map(FilterNode::scalar_leaf_count).sum()
            }
            FilterNode::ScalarCompare(_) => 1,
            FilterNode::RelationFilter(rf) => rf.inner.scalar_leaf_count(),
        }
    }

    /// Number of `RelationFilter` nodes anywhere in the tree.
    pub fn relation_leaf_count(&self) -> usize {
        match self {
            FilterNode::Logical { children, .. } => {
                children.iter().map(FilterNode::relation_leaf_count).sum()
            }
            FilterNode::ScalarCompare(_) => 0,
            FilterNode::RelationFilter(rf) => 1 + rf.inner.relation_leaf_count(),
        }
    }
}

impl ScalarCompare {
    /// Checks that the operand fits the operator and that every value is of
    /// the field's type. Returns the resolved field.
    pub fn validate<'e>(&self, entity: &'e Entity) -> Result<&'e Field, FilterError> {
        let field = entity.resolve_field(&self.field.0)?;

        match (&self.value, self.op.takes_list()) {
            (ScalarOperand::List(values), true) => {
                for value in values {
                    if value.is_null() {
                        return Err(FilterError::invalid_literal(
                            &field.name,
                            "NULL",
                            format!("NULL is not allowed in the list operand of {}", self.op),
                        ));
                    }
                    check_value(entity, field, value)?;
                }
            }
            (ScalarOperand::Single(value), false) => {
                if value.is_null() && !self.op.accepts_null() {
                    return Err(FilterError::invalid_literal(
                        &field.name,
                        "NULL",
                        format!("NULL cannot be compared with {}", self.op),
                    ));
                }
                check_value(entity, field, value)?;
            }
            (ScalarOperand::List(_), false) => {
                return Err(FilterError::invalid_literal(
                    &field.name,
                    "list",
                    format!("{} expects a single value", self.op),
                ));
            }
            (ScalarOperand::Single(value), true) => {
                return Err(FilterError::invalid_literal(
                    &field.name,
                    value.to_string(),
                    format!("{} expects a list", self.op),
                ));
            }
        }

        Ok(field)
    }
}

fn check_value(entity: &Entity, field: &Field, value: &Value) -> Result<(), FilterError> {
    match value.field_type() {
        None if field.nullable => Ok(()),
        None => Err(FilterError::type_mismatch(
            &entity.name,
            &field.name,
            field.field_type,
            "Null",
        )),
        Some(FieldType::Float) if field.field_type == FieldType::Float => match value {
            Value::Float(f) if !f.is_finite() => Err(FilterError::invalid_literal(
                &field.name,
                f.to_string(),
                "non-finite floats cannot be compared",
            )),
            _ => Ok(()),
        },
        Some(actual) if actual == field.field_type => Ok(()),
        Some(actual) => Err(FilterError::type_mismatch(
            &entity.name,
            &field.name,
            field.field_type,
            actual.to_string(),
        )),
    }
}
