use crate::{
    error::FilterError,
    filter::{
        builder::FilterBuilder,
        literal::Literal,
        node::{FilterNode, Quantifier, ScalarOp},
    },
    records::row::FieldValue,
    schema::{Schema, entity::Entity},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// JSON shape of a filter as it arrives from a caller.
///
/// ```json
/// {"and": [
///   {"compare": {"field": "fk", "op": "in", "value": [1, 2]}},
///   {"relation": {"name": "a", "quantifier": "some",
///                 "filter": {"compare": {"field": "id", "op": "eq", "value": 1}}}}
/// ]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterDocument {
    And(Vec<FilterDocument>),
    Or(Vec<FilterDocument>),
    Not(Vec<FilterDocument>),
    Compare {
        field: String,
        op: ScalarOp,
        value: Literal,
    },
    Relation {
        name: String,
        quantifier: Quantifier,
        filter: Box<FilterDocument>,
    },
}

impl FilterDocument {
    /// Resolves the document against `entity`, producing a typed tree.
    pub fn bind(&self, schema: &Schema, entity: &str) -> Result<FilterNode, FilterError> {
        self.bind_with(FilterBuilder::new(schema, entity)?)
    }

    fn bind_with(&self, builder: FilterBuilder<'_>) -> Result<FilterNode, FilterError> {
        let bind_all = |children: &[FilterDocument]| {
            children
                .iter()
                .map(|c| c.bind_with(builder))
                .collect::<Result<Vec<_>, _>>()
        };

        match self {
            FilterDocument::And(children) => Ok(FilterNode::and(bind_all(children)?)),
            FilterDocument::Or(children) => Ok(FilterNode::or(bind_all(children)?)),
            FilterDocument::Not(children) => Ok(FilterNode::not(bind_all(children)?)),
            FilterDocument::Compare { field, op, value } => {
                builder.compare(field, *op, value.clone())
            }
            FilterDocument::Relation {
                name,
                quantifier,
                filter,
            } => builder.relation(name, *quantifier, |nested| filter.bind_with(nested)),
        }
    }
}

/// Coerces a `field -> literal` map into typed assignments for `entity`.
pub fn bind_assignments(
    entity: &Entity,
    data: &BTreeMap<String, Literal>,
) -> Result<Vec<FieldValue>, FilterError> {
    data.iter()
        .map(|(name, literal)| {
            let field = entity.resolve_field(name)?;
            Ok(FieldValue {
                name: name.clone(),
                value: literal.coerce(entity, field)?,
            })
        })
        .collect()
}
