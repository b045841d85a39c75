//! Nodes shared by several statement kinds.

/// An unqualified table name; every entity lives in one namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRef {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDir {
    Asc,
    Desc,
}
