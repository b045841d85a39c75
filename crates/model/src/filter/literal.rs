use crate::{
    core::{field_type::FieldType, value::Value},
    error::FilterError,
    filter::node::{ScalarOp, ScalarOperand},
    schema::entity::{Entity, Field},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An untyped value supplied by a caller, before it is checked against the
/// declared type of the field it is compared with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Literal>),
    /// Written as an RFC 3339 string; read back as `String` and coerced.
    #[serde(skip_deserializing)]
    DateTime(DateTime<Utc>),
    /// Written as a hyphenated string; read back as `String` and coerced.
    #[serde(skip_deserializing)]
    Uuid(Uuid),
}

impl Literal {
    /// Short kind name used in type-mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Literal::Null => "Null",
            Literal::Boolean(_) => "Boolean",
            Literal::Int(_) => "Int",
            Literal::Float(_) => "Float",
            Literal::String(_) => "String",
            Literal::List(_) => "List",
            Literal::DateTime(_) => "DateTime",
            Literal::Uuid(_) => "Uuid",
        }
    }

    fn render(&self) -> String {
        match self {
            Literal::Null => "null".to_string(),
            Literal::Boolean(b) => b.to_string(),
            Literal::Int(i) => i.to_string(),
            Literal::Float(f) => f.to_string(),
            Literal::String(s) => s.clone(),
            Literal::List(items) => format!(
                "[{}]",
                items.iter().map(Literal::render).collect::<Vec<_>>().join(", ")
            ),
            Literal::DateTime(dt) => dt.to_rfc3339(),
            Literal::Uuid(u) => u.to_string(),
        }
    }

    /// Converts the literal into a value of `field`'s type.
    ///
    /// Ints widen to floats; strings parse into instants (RFC 3339 or a bare
    /// `YYYY-MM-DD`, taken as midnight UTC) and UUIDs. NULL is accepted only
    /// for nullable fields.
    pub fn coerce(&self, entity: &Entity, field: &Field) -> Result<Value, FilterError> {
        let mismatch =
            || FilterError::type_mismatch(&entity.name, &field.name, field.field_type, self.kind());

        match (field.field_type, self) {
            (_, Literal::Null) if field.nullable => Ok(Value::Null),
            (_, Literal::Null) | (_, Literal::List(_)) => Err(mismatch()),

            (FieldType::Int, Literal::Int(i)) => Ok(Value::Int(*i)),

            (FieldType::Float, Literal::Int(i)) => Ok(Value::Float(*i as f64)),
            (FieldType::Float, Literal::Float(f)) if f.is_finite() => Ok(Value::Float(*f)),
            (FieldType::Float, Literal::Float(f)) => Err(FilterError::invalid_literal(
                &field.name,
                f.to_string(),
                "non-finite floats cannot be compared",
            )),

            (FieldType::String, Literal::String(s)) => Ok(Value::String(s.clone())),
            (FieldType::Boolean, Literal::Boolean(b)) => Ok(Value::Boolean(*b)),

            (FieldType::DateTime, Literal::DateTime(dt)) => Ok(Value::datetime(*dt)),
            (FieldType::DateTime, Literal::String(s)) => parse_instant(s)
                .map(Value::datetime)
                .ok_or_else(|| {
                    FilterError::invalid_literal(
                        &field.name,
                        s.clone(),
                        "expected an RFC 3339 timestamp or a YYYY-MM-DD date",
                    )
                }),

            (FieldType::Uuid, Literal::Uuid(u)) => Ok(Value::Uuid(*u)),
            (FieldType::Uuid, Literal::String(s)) => Uuid::parse_str(s)
                .map(Value::Uuid)
                .map_err(|e| FilterError::invalid_literal(&field.name, s.clone(), e.to_string())),

            _ => Err(mismatch()),
        }
    }

    /// Converts the literal into the operand of `op` on `field`.
    pub fn coerce_operand(
        &self,
        entity: &Entity,
        field: &Field,
        op: ScalarOp,
    ) -> Result<ScalarOperand, FilterError> {
        match (self, op.takes_list()) {
            (Literal::List(items), true) => items
                .iter()
                .map(|item| match item {
                    Literal::Null => Err(FilterError::invalid_literal(
                        &field.name,
                        self.render(),
                        format!("NULL is not allowed in the list operand of {op}"),
                    )),
                    Literal::List(_) => Err(FilterError::invalid_literal(
                        &field.name,
                        self.render(),
                        "nested lists are not allowed",
                    )),
                    other => other.coerce(entity, field),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(ScalarOperand::List),
            (_, true) => Err(FilterError::invalid_literal(
                &field.name,
                self.render(),
                format!("{op} expects a list"),
            )),
            (Literal::List(_), false) => Err(FilterError::invalid_literal(
                &field.name,
                self.render(),
                format!("{op} expects a single value"),
            )),
            (Literal::Null, false) if !op.accepts_null() => Err(FilterError::invalid_literal(
                &field.name,
                "null",
                format!("NULL cannot be compared with {op}"),
            )),
            (single, false) => single.coerce(entity, field).map(ScalarOperand::Single),
        }
    }
}

/// Parses an RFC 3339 timestamp, or a `YYYY-MM-DD` date at midnight UTC.
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Literal::Int(v)
    }
}

impl From<i32> for Literal {
    fn from(v: i32) -> Self {
        Literal::Int(i64::from(v))
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Literal::Float(v)
    }
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Literal::Boolean(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Literal::String(v.to_string())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Literal::String(v)
    }
}

impl From<DateTime<Utc>> for Literal {
    fn from(v: DateTime<Utc>) -> Self {
        Literal::DateTime(v)
    }
}

impl From<Uuid> for Literal {
    fn from(v: Uuid) -> Self {
        Literal::Uuid(v)
    }
}

impl<T: Into<Literal>> From<Vec<T>> for Literal {
    fn from(v: Vec<T>) -> Self {
        Literal::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<Value> for Literal {
    fn from(v: Value) -> Self {
        match v {
            Value::Int(i) => Literal::Int(i),
            Value::Float(f) => Literal::Float(f),
            Value::String(s) => Literal::String(s),
            Value::Boolean(b) => Literal::Boolean(b),
            Value::DateTime(dt) => Literal::DateTime(dt),
            Value::Uuid(u) => Literal::Uuid(u),
            Value::Null => Literal::Null,
        }
    }
}
