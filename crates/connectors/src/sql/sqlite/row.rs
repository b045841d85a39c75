use crate::error::StorageError;
use chrono::DateTime;
use model::{
    core::{field_type::FieldType, value::Value},
    records::row::{FieldValue, RowData},
    schema::entity::{Entity, Field},
};
use rusqlite::{Row, types::ValueRef};
use uuid::Uuid;

/// Reads a row selected with the entity's fields in declaration order.
pub fn decode_row(entity: &Entity, row: &Row<'_>) -> Result<RowData, StorageError> {
    let field_values = entity
        .fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let raw = row.get_ref(i)?;
            Ok(FieldValue {
                name: field.name.clone(),
                value: decode_value(entity, field, raw)?,
            })
        })
        .collect::<Result<Vec<_>, StorageError>>()?;

    Ok(RowData::new(&entity.name, field_values))
}

pub fn decode_value(entity: &Entity, field: &Field, raw: ValueRef<'_>) -> Result<Value, StorageError> {
    let decoding = |reason: String| StorageError::Decoding {
        entity: entity.name.clone(),
        field: field.name.clone(),
        reason,
    };
    let text = |bytes: &[u8]| {
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|e| decoding(e.to_string()))
    };

    match (field.field_type, raw) {
        (_, ValueRef::Null) => Ok(Value::Null),
        (FieldType::Int, ValueRef::Integer(v)) => Ok(Value::Int(v)),
        (FieldType::Float, ValueRef::Real(v)) => Ok(Value::Float(v)),
        (FieldType::Float, ValueRef::Integer(v)) => Ok(Value::Float(v as f64)),
        (FieldType::String, ValueRef::Text(bytes)) => text(bytes).map(Value::String),
        (FieldType::Boolean, ValueRef::Integer(0)) => Ok(Value::Boolean(false)),
        (FieldType::Boolean, ValueRef::Integer(1)) => Ok(Value::Boolean(true)),
        (FieldType::DateTime, ValueRef::Integer(micros)) => DateTime::from_timestamp_micros(micros)
            .map(Value::datetime)
            .ok_or_else(|| decoding(format!("timestamp {micros} out of range"))),
        (FieldType::Uuid, ValueRef::Text(bytes)) => {
            let text = text(bytes)?;
            Uuid::parse_str(&text)
                .map(Value::Uuid)
                .map_err(|e| decoding(e.to_string()))
        }
        (field_type, other) => Err(decoding(format!(
            "cannot read {:?} as {field_type}",
            other.data_type()
        ))),
    }
}
