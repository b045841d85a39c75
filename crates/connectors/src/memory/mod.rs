//! In-memory store that evaluates predicates row by row. Serves as the
//! reference oracle for the SQL-backed stores.

use crate::{
    error::StorageError,
    storage::{Storage, StorageTransaction, request::FindRowsRequest, rows},
};
use async_trait::async_trait;
use model::{records::row::RowData, schema::Schema};
use planner::predicate::ast::CompiledPredicate;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

pub mod resolver;
pub mod table;
pub mod transaction;

use table::MemoryTables;
use transaction::MemoryTransaction;

#[derive(Clone)]
pub struct MemoryStore {
    schema: Arc<Schema>,
    tables: Arc<Mutex<MemoryTables>>,
}

impl MemoryStore {
    pub fn new(schema: Arc<Schema>) -> Self {
        let tables = MemoryTables::for_schema(&schema);
        Self {
            schema,
            tables: Arc::new(Mutex::new(tables)),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn insert(&self, row: RowData) -> Result<RowData, StorageError> {
        let entity = rows::resolve_entity(&self.schema, &row.entity)?;
        let mut tables = self.tables.lock().await;
        tables.insert(entity, &row)
    }

    async fn find_rows(&self, request: &FindRowsRequest) -> Result<Vec<RowData>, StorageError> {
        let tables = self.tables.lock().await;
        let found = tables.find(&self.schema, request)?;
        debug!(entity = %request.entity, rows = found.len(), "Evaluated predicate in memory");
        Ok(found)
    }

    async fn count_rows(
        &self,
        entity: &str,
        predicate: &CompiledPredicate,
    ) -> Result<u64, StorageError> {
        let tables = self.tables.lock().await;
        tables.count(&self.schema, entity, predicate)
    }

    async fn begin(&self) -> Result<Box<dyn StorageTransaction>, StorageError> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        Ok(Box::new(MemoryTransaction::new(
            Arc::clone(&self.schema),
            guard,
        )))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::request::OrderBy;
    use model::{
        core::{field_type::FieldType, value::Value},
        filter::{builder::FilterBuilder, node::FilterNode},
        records::row::{FieldValue, RowId},
        schema::entity::{Entity, Field},
    };
    use planner::predicate::compile_filter;

    fn schema() -> Arc<Schema> {
        let schema = Schema::builder()
            .entity(
                Entity::new("A")
                    .with_field(Field::required("id", FieldType::Int))
                    .with_primary_key(&["id"]),
            )
            .entity(
                Entity::new("B")
                    .with_field(Field::required("id", FieldType::Int))
                    .with_field(Field::optional("fk", FieldType::Int))
                    .with_field(Field::optional("code", FieldType::String))
                    .with_primary_key(&["id"])
                    .with_unique(&["code"]),
            )
            .one_to_many("A", "bs", "B", Some("a"), &["fk"], &["id"])
            .build()
            .unwrap();
        Arc::new(schema)
    }

    fn b(id: i64, fk: Option<i64>, code: Option<&str>) -> RowData {
        RowData::new(
            "B",
            vec![
                FieldValue::new("id", id),
                FieldValue::new("fk", fk.map(Value::Int).unwrap_or(Value::Null)),
                FieldValue::new("code", code.map(Value::from).unwrap_or(Value::Null)),
            ],
        )
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new(schema());
        for id in 1..=3 {
            store
                .insert(RowData::new("A", vec![FieldValue::new("id", id)]))
                .await
                .unwrap();
        }
        store.insert(b(1, Some(1), Some("x"))).await.unwrap();
        store.insert(b(2, Some(1), None)).await.unwrap();
        store.insert(b(3, Some(2), None)).await.unwrap();
        store
    }

    fn ids(rows: &[RowData]) -> Vec<Value> {
        rows.iter().map(|r| r.get_value("id")).collect()
    }

    #[tokio::test]
    async fn test_unique_constraints_ignore_nulls() {
        let store = seeded().await;

        store.insert(b(4, None, None)).await.unwrap();
        let err = store.insert(b(5, None, Some("x"))).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::UniqueViolation { ref constraint, .. } if constraint == "B_code_key"
        ));

        let err = store.insert(b(1, None, None)).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::UniqueViolation { ref constraint, .. } if constraint == "B_pkey"
        ));
    }

    #[tokio::test]
    async fn test_find_rows_follows_relations() {
        let store = seeded().await;
        let schema = store.schema().clone();
        let a = FilterBuilder::new(&schema, "A").unwrap();

        let none = a.none("bs", |_| Ok(FilterNode::and(vec![]))).unwrap();
        let predicate = compile_filter(&schema, "A", &none).unwrap();
        let request = FindRowsRequest::builder("A", predicate).build();
        assert_eq!(ids(&store.find_rows(&request).await.unwrap()), vec![Value::Int(3)]);

        let predicate = compile_filter(&schema, "B", &FilterNode::and(vec![])).unwrap();
        let request = FindRowsRequest::builder("B", predicate)
            .order_by(vec![OrderBy::desc("fk")])
            .skip(1)
            .take(Some(1))
            .build();
        assert_eq!(ids(&store.find_rows(&request).await.unwrap()), vec![Value::Int(1)]);
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let store = seeded().await;
        let all = compile_filter(store.schema(), "B", &FilterNode::and(vec![])).unwrap();
        let id = RowId(vec![Value::Int(2)]);

        {
            let mut tx = store.begin().await.unwrap();
            tx.update_row("B", &id, &[FieldValue::new("code", "y")])
                .await
                .unwrap();
        }
        let request = FindRowsRequest::builder("B", all.clone()).build();
        let rows = store.find_rows(&request).await.unwrap();
        assert_eq!(rows[1].get_value("code"), Value::Null);

        let mut tx = store.begin().await.unwrap();
        tx.update_row("B", &id, &[FieldValue::new("code", "y")])
            .await
            .unwrap();
        tx.commit().await.unwrap();
        drop(tx);

        let rows = store.find_rows(&request).await.unwrap();
        assert_eq!(rows[1].get_value("code"), Value::from("y"));
        assert_eq!(store.count_rows("B", &all).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_update_reports_unique_violations() {
        let store = seeded().await;
        let mut tx = store.begin().await.unwrap();

        let err = tx
            .update_row("B", &RowId(vec![Value::Int(3)]), &[FieldValue::new("code", "x")])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UniqueViolation { .. }));

        let err = tx
            .update_row("B", &RowId(vec![Value::Int(9)]), &[FieldValue::new("code", "z")])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::RowNotFound { .. }));
        tx.rollback().await.unwrap();
    }
}
