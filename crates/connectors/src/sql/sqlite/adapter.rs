use crate::{
    error::StorageError,
    sql::sqlite::{ddl, queries, transaction::SqliteTransaction},
    storage::{Storage, StorageTransaction, request::FindRowsRequest, rows},
};
use async_trait::async_trait;
use model::{records::row::RowData, schema::Schema};
use planner::{predicate::ast::CompiledPredicate, query::dialect::Sqlite};
use rusqlite::Connection;
use serde::Deserialize;
use std::{path::Path, sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SqliteOptions {
    /// How long a statement waits on a locked database before failing
    /// with `Busy`.
    pub busy_timeout_ms: u64,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
        }
    }
}

/// Store backed by a single SQLite connection. Predicates are pushed down
/// as SQL.
#[derive(Clone)]
pub struct SqliteStore {
    schema: Arc<Schema>,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(
        path: impl AsRef<Path>,
        schema: Arc<Schema>,
        options: &SqliteOptions,
    ) -> Result<Self, StorageError> {
        let path = path.as_ref();
        info!(path = %path.display(), "Opening SQLite store");
        Self::init(Connection::open(path)?, schema, options)
    }

    pub fn open_in_memory(schema: Arc<Schema>) -> Result<Self, StorageError> {
        Self::init(
            Connection::open_in_memory()?,
            schema,
            &SqliteOptions::default(),
        )
    }

    fn init(
        conn: Connection,
        schema: Arc<Schema>,
        options: &SqliteOptions,
    ) -> Result<Self, StorageError> {
        conn.busy_timeout(Duration::from_millis(options.busy_timeout_ms))?;

        for entity in schema.entities() {
            for statement in ddl::create_statements(entity, &Sqlite) {
                debug!(sql = %statement, "Applying schema");
                conn.execute_batch(&statement)?;
            }
        }

        Ok(Self {
            schema,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

#[async_trait]
impl Storage for SqliteStore {
    async fn insert(&self, row: RowData) -> Result<RowData, StorageError> {
        let entity = rows::resolve_entity(&self.schema, &row.entity)?;
        let conn = self.conn.lock().await;
        queries::insert_row(&conn, entity, &row)
    }

    async fn find_rows(&self, request: &FindRowsRequest) -> Result<Vec<RowData>, StorageError> {
        let conn = self.conn.lock().await;
        queries::select_rows(&conn, &self.schema, request)
    }

    async fn count_rows(
        &self,
        entity: &str,
        predicate: &CompiledPredicate,
    ) -> Result<u64, StorageError> {
        let conn = self.conn.lock().await;
        queries::count_rows(&conn, &self.schema, entity, predicate)
    }

    async fn begin(&self) -> Result<Box<dyn StorageTransaction>, StorageError> {
        let conn = Arc::clone(&self.conn).lock_owned().await;
        let tx = SqliteTransaction::begin(Arc::clone(&self.schema), conn)?;
        Ok(Box::new(tx))
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
