use crate::error::StorageError;
use async_trait::async_trait;
use model::records::row::{FieldValue, RowData, RowId};
use planner::predicate::ast::CompiledPredicate;

pub mod request;
pub mod rows;

pub use request::{FindRowsRequest, FindRowsRequestBuilder, OrderBy, SortOrder};

/// A backing store that can evaluate compiled predicates over its rows.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Inserts `row`, returning it with every field of its entity present.
    async fn insert(&self, row: RowData) -> Result<RowData, StorageError>;

    async fn find_rows(&self, request: &FindRowsRequest) -> Result<Vec<RowData>, StorageError>;

    async fn count_rows(
        &self,
        entity: &str,
        predicate: &CompiledPredicate,
    ) -> Result<u64, StorageError>;

    /// Starts a transaction that sees a consistent view of the store and
    /// excludes every other writer until it finishes.
    async fn begin(&self) -> Result<Box<dyn StorageTransaction>, StorageError>;

    fn name(&self) -> &'static str;
}

/// Reads and writes inside one transaction.
///
/// Dropping a transaction that was neither committed nor rolled back
/// discards its writes.
#[async_trait]
pub trait StorageTransaction: Send {
    async fn find_rows(&mut self, request: &FindRowsRequest)
    -> Result<Vec<RowData>, StorageError>;

    /// Applies `assignments` to the row identified by `id`.
    async fn update_row(
        &mut self,
        entity: &str,
        id: &RowId,
        assignments: &[FieldValue],
    ) -> Result<(), StorageError>;

    async fn commit(&mut self) -> Result<(), StorageError>;

    async fn rollback(&mut self) -> Result<(), StorageError>;
}
