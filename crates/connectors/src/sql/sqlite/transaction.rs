use crate::{
    error::StorageError,
    sql::sqlite::queries,
    storage::{StorageTransaction, request::FindRowsRequest, rows},
};
use async_trait::async_trait;
use model::{
    records::row::{FieldValue, RowData, RowId},
    schema::Schema,
};
use rusqlite::Connection;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, warn};

/// A `BEGIN IMMEDIATE` transaction holding the store's connection until it
/// finishes, so the write lock is taken before the first read.
pub struct SqliteTransaction {
    schema: Arc<Schema>,
    conn: OwnedMutexGuard<Connection>,
    finished: bool,
}

impl SqliteTransaction {
    pub(crate) fn begin(
        schema: Arc<Schema>,
        conn: OwnedMutexGuard<Connection>,
    ) -> Result<Self, StorageError> {
        conn.execute_batch("BEGIN IMMEDIATE")?;
        debug!("Began SQLite transaction");
        Ok(Self {
            schema,
            conn,
            finished: false,
        })
    }

    fn ensure_open(&self) -> Result<(), StorageError> {
        if self.finished {
            return Err(StorageError::TransactionFinished);
        }
        Ok(())
    }

    fn finish(&mut self, statement: &str) -> Result<(), StorageError> {
        self.ensure_open()?;
        self.conn.execute_batch(statement)?;
        self.finished = true;
        debug!(statement, "Finished SQLite transaction");
        Ok(())
    }
}

#[async_trait]
impl StorageTransaction for SqliteTransaction {
    async fn find_rows(
        &mut self,
        request: &FindRowsRequest,
    ) -> Result<Vec<RowData>, StorageError> {
        self.ensure_open()?;
        queries::select_rows(&self.conn, &self.schema, request)
    }

    async fn update_row(
        &mut self,
        entity: &str,
        id: &RowId,
        assignments: &[FieldValue],
    ) -> Result<(), StorageError> {
        self.ensure_open()?;
        let entity = rows::resolve_entity(&self.schema, entity)?;
        queries::update_row(&self.conn, entity, id, assignments)
    }

    async fn commit(&mut self) -> Result<(), StorageError> {
        self.finish("COMMIT")
    }

    async fn rollback(&mut self) -> Result<(), StorageError> {
        self.finish("ROLLBACK")
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        match self.conn.execute_batch("ROLLBACK") {
            Ok(()) => debug!("Rolled back abandoned SQLite transaction"),
            Err(err) => warn!(error = %err, "Failed to roll back abandoned SQLite transaction"),
        }
    }
}
