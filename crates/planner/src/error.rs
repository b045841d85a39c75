use model::error::FilterError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CompileError {
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Invalid operand for {op} on column {column}: {reason}")]
    InvalidOperand {
        column: String,
        op: String,
        reason: String,
    },

    #[error(
        "Compiled predicate for '{entity}' lost leaves: expected {expected_compares} comparison(s) and {expected_scopes} join scope(s), found {found_compares} and {found_scopes}"
    )]
    LeafCountMismatch {
        entity: String,
        expected_compares: usize,
        found_compares: usize,
        expected_scopes: usize,
        found_scopes: usize,
    },
}
