use crate::{
    error::StorageError,
    memory::table::MemoryTables,
    storage::{StorageTransaction, request::FindRowsRequest, rows},
};
use async_trait::async_trait;
use model::{
    records::row::{FieldValue, RowData, RowId},
    schema::Schema,
};
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tracing::debug;

/// Holds the store lock for its whole lifetime and writes to a staged copy
/// of the tables, published on commit.
pub struct MemoryTransaction {
    schema: Arc<Schema>,
    guard: OwnedMutexGuard<MemoryTables>,
    staged: Option<MemoryTables>,
}

impl MemoryTransaction {
    pub(crate) fn new(schema: Arc<Schema>, guard: OwnedMutexGuard<MemoryTables>) -> Self {
        let staged = Some(guard.clone());
        Self {
            schema,
            guard,
            staged,
        }
    }

    fn staged(&mut self) -> Result<&mut MemoryTables, StorageError> {
        self.staged.as_mut().ok_or(StorageError::TransactionFinished)
    }
}

#[async_trait]
impl StorageTransaction for MemoryTransaction {
    async fn find_rows(
        &mut self,
        request: &FindRowsRequest,
    ) -> Result<Vec<RowData>, StorageError> {
        let schema = Arc::clone(&self.schema);
        self.staged()?.find(&schema, request)
    }

    async fn update_row(
        &mut self,
        entity: &str,
        id: &RowId,
        assignments: &[FieldValue],
    ) -> Result<(), StorageError> {
        let schema = Arc::clone(&self.schema);
        let entity = rows::resolve_entity(&schema, entity)?;
        self.staged()?.update(entity, id, assignments)
    }

    async fn commit(&mut self) -> Result<(), StorageError> {
        let staged = self.staged.take().ok_or(StorageError::TransactionFinished)?;
        *self.guard = staged;
        debug!("Committed in-memory transaction");
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StorageError> {
        self.staged.take().ok_or(StorageError::TransactionFinished)?;
        debug!("Rolled back in-memory transaction");
        Ok(())
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if self.staged.is_some() {
            debug!("Discarding uncommitted in-memory transaction");
        }
    }
}
