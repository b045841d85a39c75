pub mod builder;
pub mod document;
pub mod literal;
pub mod node;
