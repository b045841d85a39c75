use connectors::error::StorageError;
use model::error::FilterError;
use planner::error::CompileError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The filter or the data payload does not fit the schema.
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    /// A write would break a unique constraint. Nothing was applied.
    #[error("Unique constraint `{constraint}` on {entity}({}) violated", fields.join(", "))]
    ConstraintViolation {
        entity: String,
        constraint: String,
        fields: Vec<String>,
    },

    #[error("Storage error: {0}")]
    Storage(#[source] StorageError),

    #[error("Storage still failing after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: usize,
        #[source]
        source: StorageError,
    },

    #[error("Missing value for required field {entity}.{field}")]
    MissingField { entity: String, field: String },

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
