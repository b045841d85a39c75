use engine_core::{FindManyArgs, QueryEngine};
use model::{core::value::Value, filter::node::FilterNode, records::row::RowData};

/// Rows of `entity` in primary-key order.
pub async fn all_rows(engine: &QueryEngine, entity: &str) -> Vec<RowData> {
    engine
        .find_many(entity, FindManyArgs::default())
        .await
        .expect("find all rows")
}

/// Primary keys of the rows of `entity` matching `filter`, in key order.
pub async fn matching_ids(engine: &QueryEngine, entity: &str, filter: &FilterNode) -> Vec<i64> {
    engine
        .find_many(entity, FindManyArgs::filtered(filter.clone()))
        .await
        .expect("find matching rows")
        .iter()
        .map(|row| int(&row.get_value("id")))
        .collect()
}

pub async fn markers(engine: &QueryEngine) -> Vec<bool> {
    all_rows(engine, "B")
        .await
        .iter()
        .map(|row| match row.get_value("marker") {
            Value::Boolean(b) => b,
            other => panic!("marker is not a boolean: {other}"),
        })
        .collect()
}

pub fn int(value: &Value) -> i64 {
    match value {
        Value::Int(i) => *i,
        other => panic!("expected an int, got {other}"),
    }
}
