//! Defines the AST for a CREATE INDEX statement.

use crate::query::ast::common::TableRef;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateIndex {
    pub name: String,
    pub table: TableRef,
    pub columns: Vec<String>,
    pub unique: bool,
    pub if_not_exists: bool,
}
