use crate::core::field_type::FieldType;
use thiserror::Error;

/// Errors raised while building or resolving a filter tree.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FilterError {
    #[error("Type mismatch on {entity}.{field}: expected {expected}, got {actual}")]
    TypeMismatch {
        entity: String,
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid literal `{literal}` for field '{field}': {reason}")]
    InvalidLiteral {
        field: String,
        literal: String,
        reason: String,
    },

    #[error("Unknown field '{field}' on entity '{entity}'")]
    UnknownField { entity: String, field: String },

    #[error("Unknown relation '{relation}' on entity '{entity}'")]
    UnknownRelation { entity: String, relation: String },

    #[error("Unknown entity '{0}'")]
    UnknownEntity(String),
}

impl FilterError {
    pub fn type_mismatch(
        entity: &str,
        field: &str,
        expected: FieldType,
        actual: impl Into<String>,
    ) -> Self {
        FilterError::TypeMismatch {
            entity: entity.to_string(),
            field: field.to_string(),
            expected: expected.to_string(),
            actual: actual.into(),
        }
    }

    pub fn invalid_literal(
        field: &str,
        literal: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        FilterError::InvalidLiteral {
            field: field.to_string(),
            literal: literal.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while assembling a schema.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaError {
    #[error("Entity '{0}' is defined more than once")]
    DuplicateEntity(String),

    #[error("Field '{field}' is defined more than once on entity '{entity}'")]
    DuplicateField { entity: String, field: String },

    #[error("Entity '{0}' has no primary key")]
    MissingPrimaryKey(String),

    #[error("Primary key field '{field}' on entity '{entity}' cannot be nullable")]
    NullablePrimaryKey { entity: String, field: String },

    #[error("Constraint '{constraint}' on entity '{entity}' has no fields")]
    EmptyConstraint { entity: String, constraint: String },

    #[error("Constraint '{constraint}' on entity '{entity}' references unknown field '{field}'")]
    UnknownConstraintField {
        entity: String,
        constraint: String,
        field: String,
    },

    #[error("Relation '{relation}' on entity '{entity}' targets unknown entity '{target}'")]
    UnknownRelationTarget {
        entity: String,
        relation: String,
        target: String,
    },

    #[error("Relation '{relation}' on entity '{entity}' is invalid: {reason}")]
    InvalidRelation {
        entity: String,
        relation: String,
        reason: String,
    },
}
