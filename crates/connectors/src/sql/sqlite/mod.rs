pub mod adapter;
pub mod ddl;
pub mod error;
pub mod params;
pub mod queries;
pub mod row;
pub mod transaction;

pub use adapter::{SqliteOptions, SqliteStore};
