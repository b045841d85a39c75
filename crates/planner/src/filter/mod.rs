pub mod compiler;
pub mod sql;
