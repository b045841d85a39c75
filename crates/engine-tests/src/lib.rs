#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use connectors::{MemoryStore, SqliteStore, Storage};
use engine_core::{EngineConfig, QueryEngine};
use model::{
    core::{field_type::FieldType, value::Value},
    filter::{document::bind_assignments, literal::Literal},
    records::row::FieldValue,
    schema::{
        Schema,
        entity::{Entity, Field},
    },
};
use std::{collections::BTreeMap, sync::Arc};

pub mod integration;
pub mod properties;
pub mod utils;

/// The stores every scenario is run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Sqlite,
}

impl Backend {
    pub const ALL: [Backend; 2] = [Backend::Memory, Backend::Sqlite];

    pub fn open(self, schema: Arc<Schema>) -> Arc<dyn Storage> {
        match self {
            Backend::Memory => Arc::new(MemoryStore::new(schema)),
            Backend::Sqlite => Arc::new(SqliteStore::open_in_memory(schema).expect("open sqlite")),
        }
    }
}

/// Nullable columns of `C`, one per scalar type.
pub const C_FIELDS: [(&str, FieldType); 6] = [
    ("n", FieldType::Int),
    ("name", FieldType::String),
    ("score", FieldType::Float),
    ("at", FieldType::DateTime),
    ("flag", FieldType::Boolean),
    ("token", FieldType::Uuid),
];

/// `A(id)` and `B(id, date, fk -> A.id, marker)` with `UNIQUE(fk, date)`.
/// `A.bs` and `B.a` are the two sides of the foreign key. `C(id, ...)`
/// carries one nullable column of every scalar type.
pub fn fixture_schema() -> Arc<Schema> {
    let c = C_FIELDS.iter().fold(
        Entity::new("C").with_field(Field::required("id", FieldType::Int)),
        |entity, (name, field_type)| entity.with_field(Field::optional(name, *field_type)),
    );

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
        .entity(c.with_primary_key(&["id"]))
        .one_to_many("A", "bs", "B", Some("a"), &["fk"], &["id"])
        .build()
        .expect("valid schema");
    Arc::new(schema)
}

/// Engine config with retries that never sleep.
pub fn test_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.retry.base_delay_ms = 0;
    config.retry.max_delay_ms = 0;
    config.log_predicates = true;
    config
}

pub fn day(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, month, day, 0, 0, 0).unwrap()
}

/// One `B` row as `(id, fk, date, marker)`.
pub type BRow = (i64, Option<i64>, DateTime<Utc>, bool);

pub fn b_row(row: &BRow) -> Vec<FieldValue> {
    let (id, fk, date, marker) = *row;
    vec![
        FieldValue::new("id", id),
        FieldValue::new("date", date),
        FieldValue::new("fk", fk.map(Value::Int).unwrap_or(Value::Null)),
        FieldValue::new("marker", marker),
    ]
}

/// An engine over `backend` holding the given `A` ids and `B` rows.
pub async fn engine_with(backend: Backend, a_ids: &[i64], b_rows: &[BRow]) -> QueryEngine {
    let schema = fixture_schema();
    let engine = QueryEngine::new(schema.clone(), backend.open(schema), test_config());

    for id in a_ids {
        engine
            .create("A", vec![FieldValue::new("id", *id)])
            .await
            .expect("insert A");
    }
    for row in b_rows {
        engine.create("B", b_row(row)).await.expect("insert B");
    }
    engine
}

/// A1..A3 and the three `B` rows of the marker scenario:
/// B1(fk=1, 2020-09-01), B2(fk=1, 2020-11-09), B3(fk=2, 2020-11-09).
pub async fn regression_engine(backend: Backend) -> QueryEngine {
    engine_with(
        backend,
        &[1, 2, 3],
        &[
            (1, Some(1), day(9, 1), false),
            (2, Some(1), day(11, 9), false),
            (3, Some(2), day(11, 9), false),
        ],
    )
    .await
}

/// An engine over `backend` holding one `C` row per entry of `rows`, with
/// ids from 1. Each row lists literals in `C_FIELDS` order.
pub async fn engine_with_c(backend: Backend, rows: &[Vec<Literal>]) -> QueryEngine {
    let schema = fixture_schema();
    let engine = QueryEngine::new(schema.clone(), backend.open(schema.clone()), test_config());
    let entity = schema.entity("C").expect("C is defined");

    for (id, row) in (1i64..).zip(rows) {
        let mut data = C_FIELDS
            .iter()
            .zip(row)
            .map(|((name, _), literal)| (name.to_string(), literal.clone()))
            .collect::<BTreeMap<_, _>>();
        data.insert("id".to_string(), Literal::Int(id));

        let values = bind_assignments(entity, &data).expect("typed C row");
        engine.create("C", values).await.expect("insert C");
    }
    engine
}
