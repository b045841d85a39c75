use crate::error::{EvalError, Result};
use model::records::row::RowData;
use planner::predicate::scope::ScopeId;

/// Supplies the rows related to `row` through one of its entity's relations.
pub trait RelatedRows {
    fn related_rows(&self, row: &RowData, relation: &str) -> Result<Vec<RowData>>;
}

impl<F> RelatedRows for F
where
    F: Fn(&RowData, &str) -> Result<Vec<RowData>>,
{
    fn related_rows(&self, row: &RowData, relation: &str) -> Result<Vec<RowData>> {
        self(row, relation)
    }
}

/// Resolver for predicates that never leave the root entity.
pub struct NoRelations;

impl RelatedRows for NoRelations {
    fn related_rows(&self, row: &RowData, relation: &str) -> Result<Vec<RowData>> {
        Err(EvalError::Resolver {
            entity: row.entity.clone(),
            relation: relation.to_string(),
            message: "no relation resolver configured".to_string(),
        })
    }
}

/// The row currently bound to each open scope, innermost first.
#[derive(Debug, Clone, Copy)]
pub struct Bindings<'a> {
    scope: ScopeId,
    row: &'a RowData,
    outer: Option<&'a Bindings<'a>>,
}

impl<'a> Bindings<'a> {
    pub fn root(row: &'a RowData) -> Self {
        Self {
            scope: ScopeId::ROOT,
            row,
            outer: None,
        }
    }

    pub fn bind(&'a self, scope: ScopeId, row: &'a RowData) -> Bindings<'a> {
        Bindings {
            scope,
            row,
            outer: Some(self),
        }
    }

    pub fn row(&self, scope: ScopeId) -> Result<&'a RowData> {
        let mut current = Some(self);
        while let Some(b) = current {
            if b.scope == scope {
                return Ok(b.row);
            }
            current = b.outer;
        }
        Err(EvalError::UnboundScope(scope.to_string()))
    }
}
