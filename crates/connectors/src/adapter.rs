use crate::{
    error::StorageError,
    memory::MemoryStore,
    sql::sqlite::{SqliteOptions, SqliteStore},
    storage::Storage,
};
use model::schema::Schema;
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path, str::FromStr, sync::Arc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Memory,
    Sqlite,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "sqlite" => Ok(BackendKind::Sqlite),
            other => Err(format!("Unsupported backend: {other}")),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Memory => f.write_str("memory"),
            BackendKind::Sqlite => f.write_str("sqlite"),
        }
    }
}

#[derive(Clone)]
pub enum Adapter {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl Adapter {
    /// Opens a store of `kind`. A SQLite store lives at `path` when one is
    /// given and in memory otherwise.
    pub fn open(
        kind: BackendKind,
        schema: Arc<Schema>,
        path: Option<&Path>,
        options: &SqliteOptions,
    ) -> Result<Self, StorageError> {
        match (kind, path) {
            (BackendKind::Memory, _) => Ok(Adapter::Memory(MemoryStore::new(schema))),
            (BackendKind::Sqlite, Some(path)) => {
                Ok(Adapter::Sqlite(SqliteStore::open(path, schema, options)?))
            }
            (BackendKind::Sqlite, None) => Ok(Adapter::Sqlite(SqliteStore::open_in_memory(schema)?)),
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Adapter::Memory(_) => BackendKind::Memory,
            Adapter::Sqlite(_) => BackendKind::Sqlite,
        }
    }

    pub fn storage(&self) -> Arc<dyn Storage> {
        match self {
            Adapter::Memory(store) => Arc::new(store.clone()),
            Adapter::Sqlite(store) => Arc::new(store.clone()),
        }
    }
}
