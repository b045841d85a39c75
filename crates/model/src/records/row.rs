use crate::{core::value::Value, schema::entity::Entity};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldValue {
    pub name: String,
    pub value: Value,
}

impl FieldValue {
    pub fn new(name: &str, value: impl Into<Value>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RowData {
    pub entity: String,
    pub field_values: Vec<FieldValue>,
}

impl RowData {
    pub fn new(entity: &str, field_values: Vec<FieldValue>) -> Self {
        RowData {
            entity: entity.to_string(),
            field_values,
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.field_values.iter().find(|f| f.name == field)
    }

    /// Value of `field`, NULL when the row does not carry it.
    pub fn get_value(&self, field: &str) -> Value {
        self.get(field)
            .map(|f| f.value.clone())
            .unwrap_or(Value::Null)
    }

    pub fn set(&mut self, field: &str, value: Value) {
        match self.field_values.iter_mut().find(|f| f.name == field) {
            Some(existing) => existing.value = value,
            None => self.field_values.push(FieldValue {
                name: field.to_string(),
                value,
            }),
        }
    }

    pub fn id(&self, entity: &Entity) -> RowId {
        RowId(
            entity
                .primary_key
                .iter()
                .map(|pk| self.get_value(pk))
                .collect(),
        )
    }

    /// Values of `fields` in order, used for unique-key comparisons.
    pub fn key(&self, fields: &[String]) -> Vec<Value> {
        fields.iter().map(|f| self.get_value(f)).collect()
    }
}

/// Primary-key values of a row, in primary-key field order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RowId(pub Vec<Value>);

impl RowId {
    pub fn values(&self) -> &[Value] {
        &self.0
    }
}

impl PartialOrd for RowId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RowId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| a.sort_cmp(b))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| self.0.len().cmp(&other.0.len()))
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = self.0.iter().map(|v| v.to_string()).collect::<Vec<_>>();
        write!(f, "({})", parts.join(", "))
    }
}
