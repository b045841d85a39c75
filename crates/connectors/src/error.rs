use expression_engine::EvalError;
use thiserror::Error;

/// All errors coming from the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The store is locked by another writer; the operation can be retried.
    #[error("Storage busy: {0}")]
    Busy(String),

    /// A write would give two rows the same values for a unique constraint.
    #[error("Unique constraint `{constraint}` violated on `{entity}`")]
    UniqueViolation { entity: String, constraint: String },

    /// A write left a non-nullable field empty.
    #[error("Field `{entity}.{field}` cannot be NULL")]
    NullViolation { entity: String, field: String },

    /// Any other SQLite driver error.
    #[error("SQL error: {0}")]
    Sql(#[source] rusqlite::Error),

    /// A value could not be converted into its stored representation.
    #[error("Encoding error on `{entity}.{field}`: {reason}")]
    Encoding {
        entity: String,
        field: String,
        reason: String,
    },

    /// A stored value could not be read back as its field type.
    #[error("Decoding error on `{entity}.{field}`: {reason}")]
    Decoding {
        entity: String,
        field: String,
        reason: String,
    },

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Unknown field `{field}` on `{entity}`")]
    UnknownField { entity: String, field: String },

    /// The in-memory evaluation of a predicate failed.
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvalError),

    /// The request could not be turned into a query.
    #[error("Query error: {0}")]
    Query(String),

    #[error("No `{entity}` row with id {id}")]
    RowNotFound { entity: String, id: String },

    /// The transaction was already committed or rolled back.
    #[error("Transaction already finished")]
    TransactionFinished,
}

impl StorageError {
    /// Whether running the same operation again may succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(self, StorageError::Busy(_))
    }
}
