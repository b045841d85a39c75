use crate::{
    error::StorageError,
    memory::resolver::TableResolver,
    storage::{
        request::FindRowsRequest,
        rows::{self, keys_match},
    },
};
use expression_engine::evaluate;
use model::{
    records::row::{FieldValue, RowData, RowId},
    schema::{Schema, entity::Entity},
};
use planner::predicate::ast::CompiledPredicate;
use std::collections::BTreeMap;

/// Rows of one entity keyed by primary key, so iteration is in key order.
#[derive(Debug, Clone, Default)]
pub struct Table {
    rows: BTreeMap<RowId, RowData>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryTables {
    tables: BTreeMap<String, Table>,
}

impl MemoryTables {
    pub fn for_schema(schema: &Schema) -> Self {
        let tables = schema
            .entities()
            .map(|entity| (entity.name.clone(), Table::default()))
            .collect();
        Self { tables }
    }

    pub fn rows<'a>(&'a self, entity: &str) -> impl Iterator<Item = &'a RowData> + 'a {
        self.tables
            .get(entity)
            .into_iter()
            .flat_map(|table| table.rows.values())
    }

    pub fn insert(&mut self, entity: &Entity, row: &RowData) -> Result<RowData, StorageError> {
        let row = rows::normalize(entity, row)?;
        self.check_unique(entity, &row, None)?;

        self.tables
            .entry(entity.name.clone())
            .or_default()
            .rows
            .insert(row.id(entity), row.clone());
        Ok(row)
    }

    pub fn find(
        &self,
        schema: &Schema,
        request: &FindRowsRequest,
    ) -> Result<Vec<RowData>, StorageError> {
        let entity = rows::resolve_entity(schema, &request.entity)?;
        let mut matched = self.matching(schema, entity, &request.predicate)?;
        rows::sort_rows(entity, &mut matched, &request.order_by)?;
        Ok(rows::page(matched, request.skip, request.take))
    }

    pub fn count(
        &self,
        schema: &Schema,
        entity: &str,
        predicate: &CompiledPredicate,
    ) -> Result<u64, StorageError> {
        let entity = rows::resolve_entity(schema, entity)?;
        Ok(self.matching(schema, entity, predicate)?.len() as u64)
    }

    pub fn update(
        &mut self,
        entity: &Entity,
        id: &RowId,
        assignments: &[FieldValue],
    ) -> Result<(), StorageError> {
        let assignments = rows::check_assignments(entity, assignments)?;
        let current = self
            .tables
            .get(&entity.name)
            .and_then(|table| table.rows.get(id))
            .cloned()
            .ok_or_else(|| StorageError::RowNotFound {
                entity: entity.name.clone(),
                id: id.to_string(),
            })?;

        let mut updated = current;
        for fv in assignments {
            updated.set(&fv.name, fv.value);
        }
        self.check_unique(entity, &updated, Some(id))?;

        let table = self.tables.entry(entity.name.clone()).or_default();
        table.rows.remove(id);
        table.rows.insert(updated.id(entity), updated);
        Ok(())
    }

    fn matching(
        &self,
        schema: &Schema,
        entity: &Entity,
        predicate: &CompiledPredicate,
    ) -> Result<Vec<RowData>, StorageError> {
        let resolver = TableResolver::new(schema, self);
        let mut matched = Vec::new();
        for row in self.rows(&entity.name) {
            if evaluate(predicate, row, &resolver)? {
                matched.push(row.clone());
            }
        }
        Ok(matched)
    }

    /// Rows whose key contains a NULL never collide with anything.
    fn check_unique(
        &self,
        entity: &Entity,
        candidate: &RowData,
        replacing: Option<&RowId>,
    ) -> Result<(), StorageError> {
        for constraint in entity.all_unique_constraints() {
            let key = candidate.key(&constraint.fields);
            if key.iter().any(|v| v.is_null()) {
                continue;
            }

            let collides = self
                .rows(&entity.name)
                .filter(|row| replacing.is_none_or(|id| &row.id(entity) != id))
                .any(|row| keys_match(&row.key(&constraint.fields), &key));

            if collides {
                return Err(StorageError::UniqueViolation {
                    entity: entity.name.clone(),
                    constraint: constraint.name,
                });
            }
        }
        Ok(())
    }
}
