use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Scalar kind of an entity field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FieldType {
    Int,
    Float,
    String,
    Boolean,
    DateTime,
    Uuid,
}

impl FieldType {
    /// Column type used when the field is materialized in a SQL store.
    ///
    /// DateTime is stored as integer microseconds since the epoch and
    /// Boolean as 0/1, so both compare as integers.
    pub fn sql_type(&self) -> &'static str {
        match self {
            FieldType::Int | FieldType::Boolean | FieldType::DateTime => "INTEGER",
            FieldType::Float => "REAL",
            FieldType::String | FieldType::Uuid => "TEXT",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Int => "Int",
            FieldType::Float => "Float",
            FieldType::String => "String",
            FieldType::Boolean => "Boolean",
            FieldType::DateTime => "DateTime",
            FieldType::Uuid => "Uuid",
        }
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" | "bigint" => Ok(FieldType::Int),
            "float" | "double" | "real" => Ok(FieldType::Float),
            "string" | "text" | "varchar" => Ok(FieldType::String),
            "boolean" | "bool" => Ok(FieldType::Boolean),
            "datetime" | "timestamp" => Ok(FieldType::DateTime),
            "uuid" => Ok(FieldType::Uuid),
            other => Err(format!("Unknown field type: {other}")),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_aliases() {
        assert_eq!("DateTime".parse::<FieldType>(), Ok(FieldType::DateTime));
        assert_eq!("timestamp".parse::<FieldType>(), Ok(FieldType::DateTime));
        assert_eq!("BIGINT".parse::<FieldType>(), Ok(FieldType::Int));
        assert!("geometry".parse::<FieldType>().is_err());
    }

    #[test]
    fn temporal_and_boolean_fields_are_stored_as_integers() {
        assert_eq!(FieldType::DateTime.sql_type(), "INTEGER");
        assert_eq!(FieldType::Boolean.sql_type(), "INTEGER");
        assert_eq!(FieldType::Uuid.sql_type(), "TEXT");
    }
}
