use crate::predicate::ast::{JoinLink, JoinScope};
use model::{
    error::FilterError,
    schema::{Schema, entity::Entity},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the row variable a column reference is evaluated against.
///
/// Scope 0 is the entity being filtered; every relation filter opens a new
/// scope for the related rows it quantifies over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeId(pub usize);

impl ScopeId {
    pub const ROOT: ScopeId = ScopeId(0);

    /// Table alias used when the scope is rendered as SQL.
    pub fn alias(&self) -> String {
        format!("t{}", self.0)
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Compilation state shared across one filter tree: the schema used to
/// resolve relations and the allocator for join scopes.
///
/// Scopes are numbered in depth-first order of the relation filters, so
/// compiling the same tree with a fresh context always yields the same
/// aliases.
#[derive(Debug)]
pub struct JoinContext<'s> {
    schema: &'s Schema,
    next_scope: usize,
}

impl<'s> JoinContext<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            next_scope: ScopeId::ROOT.0 + 1,
        }
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// Number of scopes allocated so far, the root included.
    pub fn scope_count(&self) -> usize {
        self.next_scope
    }

    /// Opens a scope over the rows related to `parent` through `relation`,
    /// returning the scope and the related entity.
    pub fn open(
        &mut self,
        parent: ScopeId,
        entity: &Entity,
        relation: &str,
    ) -> Result<(JoinScope, &'s Entity), FilterError> {
        let schema = self.schema;
        let resolved = entity.resolve_relation(relation)?;
        let target = schema.resolve_entity(&resolved.target)?;

        let id = ScopeId(self.next_scope);
        self.next_scope += 1;

        let scope = JoinScope {
            id,
            parent,
            source: entity.name.clone(),
            relation: resolved.name.clone(),
            target: target.name.clone(),
            links: resolved
                .links
                .iter()
                .map(|link| JoinLink {
                    outer: link.local.clone(),
                    inner: link.remote.clone(),
                })
                .collect(),
        };

        Ok((scope, target))
    }
}
