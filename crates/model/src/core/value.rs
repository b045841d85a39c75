use crate::core::field_type::FieldType;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt, hash::Hash};
use uuid::Uuid;

/// Number of fractional-second digits kept for a canonical instant.
///
/// Stores persist instants as integer microseconds, so every `DateTime`
/// value is truncated to this precision on construction.
pub const INSTANT_PRECISION: u16 = 6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Uuid(Uuid),
    Null,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Int(a), Int(b)) => a == b,
            // Bitwise so that `Value` can be `Eq` and `Hash`.
            (Float(a), Float(b)) => a.to_bits() == b.to_bits(),
            (String(a), String(b)) => a == b,
            (Boolean(a), Boolean(b)) => a == b,
            (DateTime(a), DateTime(b)) => a == b,
            (Uuid(a), Uuid(b)) => a == b,
            (Null, Null) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        use Value::*;
        std::mem::discriminant(self).hash(state);
        match self {
            Int(v) => v.hash(state),
            Float(v) => v.to_bits().hash(state),
            String(v) => v.hash(state),
            Boolean(v) => v.hash(state),
            DateTime(v) => v.hash(state),
            Uuid(v) => v.hash(state),
            Null => {}
        }
    }
}

impl Value {
    /// Builds a `DateTime` value holding the canonical instant for `instant`.
    pub fn datetime(instant: DateTime<Utc>) -> Self {
        Value::DateTime(canonical_instant(instant))
    }

    /// The value in the form both stores hold it: instants truncated to
    /// microseconds, everything else unchanged.
    pub fn canonical(self) -> Self {
        match self {
            Value::DateTime(instant) => Value::datetime(instant),
            other => other,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The scalar kind of this value, `None` for NULL.
    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            Value::Int(_) => Some(FieldType::Int),
            Value::Float(_) => Some(FieldType::Float),
            Value::String(_) => Some(FieldType::String),
            Value::Boolean(_) => Some(FieldType::Boolean),
            Value::DateTime(_) => Some(FieldType::DateTime),
            Value::Uuid(_) => Some(FieldType::Uuid),
            Value::Null => None,
        }
    }

    /// Orders two values of the same scalar kind.
    ///
    /// Returns `None` when either side is NULL or the kinds differ; callers
    /// treat that as an unknown comparison rather than as equality.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        use Value::*;
        match (self, other) {
            (Int(a), Int(b)) => Some(a.cmp(b)),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (String(a), String(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
            (Boolean(a), Boolean(b)) => Some(a.cmp(b)),
            (DateTime(a), DateTime(b)) => Some(a.cmp(b)),
            (Uuid(a), Uuid(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Total order used for sorting result sets: NULL sorts before every
    /// other value, mirroring SQLite's default ordering.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.compare(other).unwrap_or(Ordering::Equal),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }
}

/// Truncates an instant to the precision every store can represent exactly.
pub fn canonical_instant(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.trunc_subsecs(INSTANT_PRECISION)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "'{}'", v.replace('\'', "''")),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::DateTime(v) => write!(f, "'{}'", v.to_rfc3339()),
            Value::Uuid(v) => write!(f, "'{v}'"),
            Value::Null => write!(f, "NULL"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::datetime(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}
