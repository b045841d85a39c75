pub mod error;
pub mod filter;
pub mod predicate;
pub mod query;
