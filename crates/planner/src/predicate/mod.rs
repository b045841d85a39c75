pub mod ast;
pub mod compiler;
pub mod scope;
pub mod shape;

pub use compiler::{compile, compile_filter};
