pub mod adapter;
pub mod error;
pub mod memory;
pub mod sql;
pub mod storage;

pub use adapter::{Adapter, BackendKind};
pub use error::StorageError;
pub use memory::MemoryStore;
pub use sql::sqlite::{SqliteOptions, SqliteStore};
pub use storage::{FindRowsRequest, OrderBy, SortOrder, Storage, StorageTransaction};
