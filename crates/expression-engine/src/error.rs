use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvalError {
    #[error("No row is bound to scope {0}")]
    UnboundScope(String),

    #[error("Field not found: {entity}.{field}")]
    FieldNotFound { entity: String, field: String },

    #[error("Type mismatch on {field}: cannot compare {actual} with {expected}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Failed to resolve relation '{relation}' from '{entity}': {message}")]
    Resolver {
        entity: String,
        relation: String,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, EvalError>;
