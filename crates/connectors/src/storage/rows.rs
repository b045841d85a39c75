//! Row shaping shared by every store: field validation, ordering and paging.

use crate::{
    error::StorageError,
    storage::request::{OrderBy, SortOrder},
};
use model::{
    core::value::Value,
    records::row::{FieldValue, RowData},
    schema::{
        Schema,
        entity::{Entity, Field},
    },
};
use std::cmp::Ordering;

pub fn resolve_entity<'s>(schema: &'s Schema, name: &str) -> Result<&'s Entity, StorageError> {
    schema
        .entity(name)
        .ok_or_else(|| StorageError::UnknownEntity(name.to_string()))
}

pub fn resolve_field<'e>(entity: &'e Entity, name: &str) -> Result<&'e Field, StorageError> {
    entity
        .field(name)
        .ok_or_else(|| StorageError::UnknownField {
            entity: entity.name.clone(),
            field: name.to_string(),
        })
}

/// Checks that `value` can be stored in `field`, returning its canonical form.
pub fn check_value(entity: &Entity, field: &Field, value: &Value) -> Result<Value, StorageError> {
    let encoding = |reason: String| StorageError::Encoding {
        entity: entity.name.clone(),
        field: field.name.clone(),
        reason,
    };

    match value {
        Value::Null if !field.nullable => Err(StorageError::NullViolation {
            entity: entity.name.clone(),
            field: field.name.clone(),
        }),
        Value::Null => Ok(Value::Null),
        Value::Float(f) if !f.is_finite() => Err(encoding(format!("non-finite float {f}"))),
        Value::DateTime(instant) => Ok(Value::datetime(*instant)),
        other if other.field_type() == Some(field.field_type) => Ok(other.clone()),
        other => Err(encoding(format!(
            "expected {}, got {other}",
            field.field_type
        ))),
    }
}

/// Returns `row` with exactly the fields of `entity`, in declaration order.
/// Absent fields are NULL.
pub fn normalize(entity: &Entity, row: &RowData) -> Result<RowData, StorageError> {
    if let Some(unknown) = row.field_values.iter().find(|fv| entity.field(&fv.name).is_none()) {
        return Err(StorageError::UnknownField {
            entity: entity.name.clone(),
            field: unknown.name.clone(),
        });
    }

    let field_values = entity
        .fields
        .iter()
        .map(|field| {
            let value = check_value(entity, field, &row.get_value(&field.name))?;
            Ok(FieldValue {
                name: field.name.clone(),
                value,
            })
        })
        .collect::<Result<Vec<_>, StorageError>>()?;

    Ok(RowData::new(&entity.name, field_values))
}

/// Validates `assignments` against `entity` and returns their canonical form.
pub fn check_assignments(
    entity: &Entity,
    assignments: &[FieldValue],
) -> Result<Vec<FieldValue>, StorageError> {
    assignments
        .iter()
        .map(|fv| {
            let field = resolve_field(entity, &fv.name)?;
            Ok(FieldValue {
                name: field.name.clone(),
                value: check_value(entity, field, &fv.value)?,
            })
        })
        .collect()
}

/// Sorts by `order_by`, then by primary key ascending. NULL sorts first in
/// ascending order and last in descending order.
pub fn sort_rows(
    entity: &Entity,
    rows: &mut [RowData],
    order_by: &[OrderBy],
) -> Result<(), StorageError> {
    for key in order_by {
        resolve_field(entity, &key.field)?;
    }

    rows.sort_by(|a, b| {
        order_by
            .iter()
            .map(|key| {
                let ord = a.get_value(&key.field).sort_cmp(&b.get_value(&key.field));
                match key.order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            })
            .find(|o| o.is_ne())
            .unwrap_or_else(|| a.id(entity).cmp(&b.id(entity)))
    });

    Ok(())
}

pub fn page(rows: Vec<RowData>, skip: usize, take: Option<usize>) -> Vec<RowData> {
    let rows = rows.into_iter().skip(skip);
    match take {
        Some(take) => rows.take(take).collect(),
        None => rows.collect(),
    }
}

/// SQL equality on a list of key values: a NULL never equals anything.
pub fn keys_match(left: &[Value], right: &[Value]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .all(|(l, r)| l.compare(r) == Some(Ordering::Equal))
}
