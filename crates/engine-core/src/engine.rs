use crate::{
    config::EngineConfig,
    error::{EngineError, Result},
    operation::{FindManyArgs, UpdateManyOperation},
    retry::{RetryDisposition, RetryError, RetryPolicy},
};
use connectors::{FindRowsRequest, Storage, StorageError, StorageTransaction};
use model::{
    filter::{builder::FilterBuilder, literal::Literal, node::FilterNode},
    records::row::{FieldValue, RowData},
    schema::{Schema, entity::Entity},
};
use planner::predicate::{ast::CompiledPredicate, compile_filter};
use std::{future::Future, sync::Arc};
use tracing::{debug, info, warn};

/// Compiles filters against a schema and runs them on a store.
pub struct QueryEngine {
    schema: Arc<Schema>,
    storage: Arc<dyn Storage>,
    config: EngineConfig,
    retry: RetryPolicy,
}

impl QueryEngine {
    pub fn new(schema: Arc<Schema>, storage: Arc<dyn Storage>, config: EngineConfig) -> Self {
        let retry = RetryPolicy::from(&config.retry);
        Self {
            schema,
            storage,
            config,
            retry,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// A builder for filters rooted at `entity`.
    pub fn filter(&self, entity: &str) -> Result<FilterBuilder<'_>> {
        Ok(FilterBuilder::new(&self.schema, entity)?)
    }

    pub fn compile(&self, entity: &str, filter: &FilterNode) -> Result<CompiledPredicate> {
        let predicate = compile_filter(&self.schema, entity, filter)?;
        if self.config.log_predicates {
            debug!(entity, predicate = %predicate, "Compiled predicate");
        }
        Ok(predicate)
    }

    pub async fn find_many(&self, entity: &str, args: FindManyArgs) -> Result<Vec<RowData>> {
        self.entity(entity)?;
        let filter = args.filter.unwrap_or_else(|| FilterNode::and(vec![]));
        let predicate = self.compile(entity, &filter)?;
        let request = FindRowsRequest::builder(entity, predicate)
            .order_by(args.order_by)
            .skip(args.skip)
            .take(args.take)
            .build();

        let rows = self
            .with_retry(|| self.storage.find_rows(&request))
            .await?;
        info!(entity, rows = rows.len(), backend = self.storage.name(), "find_many");
        Ok(rows)
    }

    pub async fn find_first(&self, entity: &str, args: FindManyArgs) -> Result<Option<RowData>> {
        let args = FindManyArgs {
            take: Some(1),
            ..args
        };
        Ok(self.find_many(entity, args).await?.into_iter().next())
    }

    pub async fn count(&self, entity: &str, filter: &FilterNode) -> Result<u64> {
        self.entity(entity)?;
        let predicate = self.compile(entity, filter)?;
        let count = self
            .with_retry(|| self.storage.count_rows(entity, &predicate))
            .await?;
        info!(entity, count, "count");
        Ok(count)
    }

    /// Inserts a row. Every non-nullable field must be present.
    pub async fn create(&self, entity: &str, data: Vec<FieldValue>) -> Result<RowData> {
        let entity = self.entity(entity)?;
        let data = validate_data(entity, &data)?;

        if let Some(missing) = entity
            .fields
            .iter()
            .find(|f| !f.nullable && !data.iter().any(|fv| fv.name == f.name))
        {
            return Err(EngineError::MissingField {
                entity: entity.name.clone(),
                field: missing.name.clone(),
            });
        }

        let row = RowData::new(&entity.name, data);
        self.with_retry(|| self.storage.insert(row.clone())).await
    }

    /// Applies `op.data` to every row matching `op.filter` and returns how
    /// many rows matched.
    ///
    /// Selection and writes share one storage transaction; on a unique
    /// violation the whole operation is rolled back.
    pub async fn update_many(&self, op: UpdateManyOperation) -> Result<u64> {
        let entity = self.entity(&op.target)?;
        let data = validate_data(entity, &op.data)?;
        let predicate = self.compile(&op.target, &op.filter)?;
        let request = FindRowsRequest::builder(&op.target, predicate).build();

        let affected = self
            .with_retry(|| self.apply_update(entity, &request, &data))
            .await?;
        info!(entity = %op.target, affected, "update_many");
        Ok(affected)
    }

    async fn apply_update(
        &self,
        entity: &Entity,
        request: &FindRowsRequest,
        data: &[FieldValue],
    ) -> std::result::Result<u64, StorageError> {
        let mut tx = self.storage.begin().await?;

        let rows = match tx.find_rows(request).await {
            Ok(rows) => rows,
            Err(err) => return Err(abort(tx, err).await),
        };

        if !data.is_empty() {
            for row in &rows {
                if let Err(err) = tx.update_row(&entity.name, &row.id(entity), data).await {
                    return Err(abort(tx, err).await);
                }
            }
        }

        tx.commit().await?;
        Ok(rows.len() as u64)
    }

    async fn with_retry<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, StorageError>>,
    {
        let classify = |err: &StorageError| {
            if err.is_retriable() {
                RetryDisposition::Retry
            } else {
                RetryDisposition::Stop
            }
        };

        self.retry
            .run(op, classify)
            .await
            .map_err(|err| match err {
                RetryError::Fatal(err) => self.storage_error(err),
                RetryError::AttemptsExceeded { attempts, last } => EngineError::RetriesExhausted {
                    attempts,
                    source: last,
                },
            })
    }

    fn entity(&self, name: &str) -> Result<&Entity> {
        self.schema
            .entity(name)
            .ok_or_else(|| EngineError::UnknownEntity(name.to_string()))
    }

    /// Names the fields of a violated unique constraint.
    fn storage_error(&self, err: StorageError) -> EngineError {
        match err {
            StorageError::UniqueViolation { entity, constraint } => {
                let fields = self
                    .schema
                    .entity(&entity)
                    .and_then(|e| {
                        e.all_unique_constraints()
                            .into_iter()
                            .find(|c| c.name == constraint)
                    })
                    .map(|c| c.fields)
                    .unwrap_or_default();
                EngineError::ConstraintViolation {
                    entity,
                    constraint,
                    fields,
                }
            }
            other => EngineError::Storage(other),
        }
    }
}

async fn abort(mut tx: Box<dyn StorageTransaction>, err: StorageError) -> StorageError {
    if let Err(rollback) = tx.rollback().await {
        warn!(error = %rollback, "Rollback failed");
    }
    err
}

/// Checks a data payload against the field types of `entity`, with the same
/// coercions as filter literals.
fn validate_data(entity: &Entity, data: &[FieldValue]) -> Result<Vec<FieldValue>> {
    data.iter()
        .map(|fv| {
            let field = entity.resolve_field(&fv.name)?;
            let value = Literal::from(fv.value.clone()).coerce(entity, field)?;
            Ok(FieldValue {
                name: field.name.clone(),
                value,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use connectors::MemoryStore;
    use model::{
        core::{field_type::FieldType, value::Value},
        error::FilterError,
        schema::entity::Field,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_test::traced_test;

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
                    .with_field(Field::required("date", FieldType::DateTime))
                    .with_field(Field::optional("fk", FieldType::Int))
                    .with_field(Field::required("marker", FieldType::Boolean))
                    .with_primary_key(&["id"])
                    .with_unique(&["fk", "date"]),
            )
            .one_to_many("A", "bs", "B", Some("a"), &["fk"], &["id"])
            .build()
            .unwrap();
        Arc::new(schema)
    }

    fn fast_config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.retry.base_delay_ms = 0;
        config.retry.max_delay_ms = 0;
        config
    }

    async fn seeded(storage: Arc<dyn Storage>) -> QueryEngine {
        let engine = QueryEngine::new(schema(), storage, fast_config());
        for id in 1..=3 {
            engine
                .create("A", vec![FieldValue::new("id", id)])
                .await
                .unwrap();
        }
        for (id, fk, month, day) in [(1, 1, 9, 1), (2, 1, 11, 9), (3, 2, 11, 9)] {
            let date = Utc.with_ymd_and_hms(2020, month, day, 0, 0, 0).unwrap();
            engine
                .create(
                    "B",
                    vec![
                        FieldValue::new("id", id),
                        FieldValue::new("date", date),
                        FieldValue::new("fk", fk),
                        FieldValue::new("marker", false),
                    ],
                )
                .await
                .unwrap();
        }
        engine
    }

    async fn markers(engine: &QueryEngine) -> Vec<Value> {
        engine
            .find_many("B", FindManyArgs::default())
            .await
            .unwrap()
            .iter()
            .map(|row| row.get_value("marker"))
            .collect()
    }

    fn memory() -> Arc<dyn Storage> {
        Arc::new(MemoryStore::new(schema()))
    }

    #[traced_test]
    #[tokio::test]
    async fn test_update_many_touches_only_the_matching_row() {
        let engine = seeded(memory()).await;
        let b = engine.filter("B").unwrap();
        let filter = FilterNode::and(vec![
            b.is_in("fk", vec![1, 2]).unwrap(),
            b.eq("date", "2020-09-01").unwrap(),
        ]);

        let affected = engine
            .update_many(UpdateManyOperation::new(
                "B",
                filter,
                vec![FieldValue::new("marker", true)],
            ))
            .await
            .unwrap();

        assert_eq!(affected, 1);
        assert_eq!(
            markers(&engine).await,
            vec![Value::Boolean(true), Value::Boolean(false), Value::Boolean(false)]
        );
        assert!(logs_contain("update_many"));
    }

    #[tokio::test]
    async fn test_constraint_violation_rolls_back_every_write() {
        let engine = seeded(memory()).await;
        let b = engine.filter("B").unwrap();

        // B2 and B3 both move to (fk=1, 2020-09-01); B2 collides with B1.
        let err = engine
            .update_many(UpdateManyOperation::new(
                "B",
                b.gt("id", 1).unwrap(),
                vec![
                    FieldValue::new("marker", true),
                    FieldValue::new("date", Utc.with_ymd_and_hms(2020, 9, 1, 0, 0, 0).unwrap()),
                    FieldValue::new("fk", 1),
                ],
            ))
            .await
            .unwrap_err();

        match err {
            EngineError::ConstraintViolation {
                entity,
                constraint,
                fields,
            } => {
                assert_eq!(entity, "B");
                assert_eq!(constraint, "B_fk_date_key");
                assert_eq!(fields, vec!["fk".to_string(), "date".to_string()]);
            }
            other => panic!("expected a constraint violation, got {other}"),
        }
        assert_eq!(
            markers(&engine).await,
            vec![Value::Boolean(false); 3]
        );
    }

    #[tokio::test]
    async fn test_data_is_validated_before_storage() {
        let engine = seeded(memory()).await;
        let all = FilterNode::and(vec![]);

        let err = engine
            .update_many(UpdateManyOperation::new(
                "B",
                all.clone(),
                vec![FieldValue::new("marker", "yes")],
            ))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Filter(FilterError::TypeMismatch { .. })
        ));

        let err = engine
            .update_many(UpdateManyOperation::new(
                "B",
                all,
                vec![FieldValue::new("nope", 1)],
            ))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Filter(FilterError::UnknownField { .. })
        ));

        let err = engine
            .create("B", vec![FieldValue::new("id", 9)])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingField { .. }));
    }

    #[tokio::test]
    async fn test_find_many_orders_and_pages() {
        let engine = seeded(memory()).await;
        let args = FindManyArgs::default()
            .order_by(connectors::OrderBy::desc("date"))
            .skip(1);
        let ids = engine
            .find_many("B", args)
            .await
            .unwrap()
            .iter()
            .map(|row| row.get_value("id"))
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![Value::Int(3), Value::Int(1)]);

        let b = engine.filter("B").unwrap();
        let first = engine
            .find_first("B", FindManyArgs::filtered(b.eq("fk", 2).unwrap()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.get_value("id"), Value::Int(3));
        assert_eq!(engine.count("B", &b.eq("fk", 1).unwrap()).await.unwrap(), 2);
    }

    /// Reports `Busy` for the first `failures` transactions.
    struct FlakyStore {
        inner: MemoryStore,
        failures: AtomicUsize,
    }

    #[async_trait]
    impl Storage for FlakyStore {
        async fn insert(&self, row: RowData) -> std::result::Result<RowData, StorageError> {
            self.inner.insert(row).await
        }

        async fn find_rows(
            &self,
            request: &FindRowsRequest,
        ) -> std::result::Result<Vec<RowData>, StorageError> {
            self.inner.find_rows(request).await
        }

        async fn count_rows(
            &self,
            entity: &str,
            predicate: &CompiledPredicate,
        ) -> std::result::Result<u64, StorageError> {
            self.inner.count_rows(entity, predicate).await
        }

        async fn begin(&self) -> std::result::Result<Box<dyn StorageTransaction>, StorageError> {
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(StorageError::Busy("database is locked".into()));
            }
            self.inner.begin().await
        }

        fn name(&self) -> &'static str {
            "flaky"
        }
    }

    #[traced_test]
    #[tokio::test]
    async fn test_busy_storage_is_retried() {
        let flaky = Arc::new(FlakyStore {
            inner: MemoryStore::new(schema()),
            failures: AtomicUsize::new(0),
        });
        let engine = seeded(flaky.clone()).await;
        let all = FilterNode::and(vec![]);
        let op = UpdateManyOperation::new("B", all, vec![FieldValue::new("marker", true)]);

        flaky.failures.store(2, Ordering::SeqCst);
        assert_eq!(engine.update_many(op.clone()).await.unwrap(), 3);
        assert!(logs_contain("Retrying"));

        flaky.failures.store(3, Ordering::SeqCst);
        assert!(matches!(
            engine.update_many(op).await,
            Err(EngineError::RetriesExhausted { attempts: 3, .. })
        ));
    }
}
