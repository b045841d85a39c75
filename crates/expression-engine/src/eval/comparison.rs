use crate::{
    error::{EvalError, Result},
    truth::Truth,
};
use model::{
    core::value::Value,
    filter::node::{ScalarOp, ScalarOperand},
    records::row::RowData,
};
use planner::predicate::ast::ColumnComparison;
use std::cmp::Ordering;
use tracing::warn;

/// Evaluates one column comparison against `row` with SQL semantics.
pub fn compare(cmp: &ColumnComparison, row: &RowData) -> Result<Truth> {
    let column = &cmp.column().column;
    let actual = row
        .get(column)
        .map(|fv| &fv.value)
        .ok_or_else(|| EvalError::FieldNotFound {
            entity: row.entity.clone(),
            field: column.clone(),
        })?;

    match (cmp.op(), cmp.operand()) {
        // IS NULL / IS NOT NULL are always decided.
        (ScalarOp::Eq, ScalarOperand::Single(Value::Null)) => Ok(actual.is_null().into()),
        (ScalarOp::Neq, ScalarOperand::Single(Value::Null)) => Ok((!actual.is_null()).into()),

        // An empty list decides the test even for a NULL probe.
        (ScalarOp::In, ScalarOperand::List(list)) if list.is_empty() => Ok(Truth::False),
        (ScalarOp::NotIn, ScalarOperand::List(list)) if list.is_empty() => Ok(Truth::True),

        _ if actual.is_null() => Ok(Truth::Unknown),

        (op, ScalarOperand::List(list)) => {
            let mut found = false;
            for expected in list {
                if ordering(column, actual, expected)? == Ordering::Equal {
                    found = true;
                    break;
                }
            }
            let matched = if op == ScalarOp::NotIn { !found } else { found };
            Ok(matched.into())
        }

        (op, ScalarOperand::Single(expected)) => {
            let ord = ordering(column, actual, expected)?;
            let result = match op {
                ScalarOp::Eq | ScalarOp::In => ord == Ordering::Equal,
                ScalarOp::Neq | ScalarOp::NotIn => ord != Ordering::Equal,
                ScalarOp::Lt => ord == Ordering::Less,
                ScalarOp::Lte => ord != Ordering::Greater,
                ScalarOp::Gt => ord == Ordering::Greater,
                ScalarOp::Gte => ord != Ordering::Less,
            };
            Ok(result.into())
        }
    }
}

fn ordering(column: &str, actual: &Value, expected: &Value) -> Result<Ordering> {
    actual.compare(expected).ok_or_else(|| {
        warn!("Cannot compare {} value {} with {}", column, actual, expected);
        EvalError::TypeMismatch {
            field: column.to_string(),
            expected: type_name(expected),
            actual: type_name(actual),
        }
    })
}

fn type_name(value: &Value) -> String {
    value
        .field_type()
        .map(|t| t.to_string())
        .unwrap_or_else(|| "Null".to_string())
}
