use crate::{memory::table::MemoryTables, storage::rows::keys_match};
use expression_engine::{EvalError, RelatedRows, Result};
use model::{records::row::RowData, schema::Schema};

/// Follows relation links between in-memory tables.
pub struct TableResolver<'a> {
    schema: &'a Schema,
    tables: &'a MemoryTables,
}

impl<'a> TableResolver<'a> {
    pub fn new(schema: &'a Schema, tables: &'a MemoryTables) -> Self {
        Self { schema, tables }
    }
}

impl RelatedRows for TableResolver<'_> {
    fn related_rows(&self, row: &RowData, relation: &str) -> Result<Vec<RowData>> {
        let failed = |message: &str| EvalError::Resolver {
            entity: row.entity.clone(),
            relation: relation.to_string(),
            message: message.to_string(),
        };

        let entity = self
            .schema
            .entity(&row.entity)
            .ok_or_else(|| failed("unknown entity"))?;
        let relation = entity
            .relation(relation)
            .ok_or_else(|| failed("unknown relation"))?;

        let local = relation
            .links
            .iter()
            .map(|link| row.get_value(&link.local))
            .collect::<Vec<_>>();
        let remote = relation
            .remote_fields()
            .map(str::to_string)
            .collect::<Vec<_>>();

        Ok(self
            .tables
            .rows(&relation.target)
            .filter(|candidate| keys_match(&candidate.key(&remote), &local))
            .cloned()
            .collect())
    }
}
