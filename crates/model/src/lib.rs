pub mod core;
pub mod error;
pub mod filter;
pub mod records;
pub mod schema;
