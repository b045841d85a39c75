//! Defines the AST for a CREATE TABLE statement.

use crate::query::ast::common::TableRef;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateTable {
    pub table: TableRef,
    pub columns: Vec<ColumnDef>,
    pub constraints: Vec<TableConstraint>,
    pub if_not_exists: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    /// Dialect-ready type name, e.g. `INTEGER`.
    pub data_type: String,
    pub is_nullable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableConstraint {
    PrimaryKey {
        name: Option<String>,
        columns: Vec<String>,
    },
    ForeignKey {
        columns: Vec<String>,
        references: TableRef,
        referenced_columns: Vec<String>,
    },
}
