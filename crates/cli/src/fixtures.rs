//! JSON inputs of the CLI: schema, filter documents, seed rows and data payloads.

use crate::error::CliError;
use model::{
    filter::{
        document::{FilterDocument, bind_assignments},
        literal::Literal,
        node::FilterNode,
    },
    records::row::FieldValue,
    schema::{Schema, entity::Entity},
};
use serde::de::DeserializeOwned;
use std::{collections::BTreeMap, path::Path};

/// One object per row, field name to literal.
pub type RowLiterals = BTreeMap<String, Literal>;

/// Seed rows keyed by entity name.
pub type DataSet = BTreeMap<String, Vec<RowLiterals>>;

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CliError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CliError::JsonParse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_filter(
    path: Option<&Path>,
    schema: &Schema,
    entity: &str,
) -> Result<FilterNode, CliError> {
    match path {
        Some(path) => {
            let document: FilterDocument = load_json(path)?;
            Ok(document.bind(schema, entity)?)
        }
        None => Ok(FilterNode::and(vec![])),
    }
}

pub fn load_assignments(path: &Path, entity: &Entity) -> Result<Vec<FieldValue>, CliError> {
    let data: RowLiterals = load_json(path)?;
    Ok(bind_assignments(entity, &data)?)
}
