//! Statements shared by the store and its transactions, run against a
//! borrowed connection.

use crate::{
    error::StorageError,
    sql::sqlite::{error::map_write_error, params::SqliteParamStore, row::decode_row},
    storage::{
        request::{FindRowsRequest, SortOrder},
        rows,
    },
};
use model::{
    core::value::Value,
    records::row::{FieldValue, RowData, RowId},
    schema::{Schema, entity::Entity},
};
use planner::{
    filter::{compiler::FilterCompiler, sql::SqlFilterCompiler},
    predicate::{ast::CompiledPredicate, scope::ScopeId},
    query::{
        ast::{
            common::OrderDir,
            expr::{BinaryOperator, Expr, FunctionCall},
        },
        builder::{insert::InsertBuilder, select::SelectBuilder, update::UpdateBuilder},
        dialect::Sqlite,
        ident, qualified,
        renderer::render,
        value,
    },
    table_ref,
};
use rusqlite::Connection;
use tracing::debug;

pub fn select_rows(
    conn: &Connection,
    schema: &Schema,
    request: &FindRowsRequest,
) -> Result<Vec<RowData>, StorageError> {
    let entity = rows::resolve_entity(schema, &request.entity)?;
    for key in &request.order_by {
        rows::resolve_field(entity, &key.field)?;
    }

    let alias = ScopeId::ROOT.alias();
    let columns = entity
        .fields
        .iter()
        .map(|field| qualified(&alias, &field.name))
        .collect();

    let mut builder = SelectBuilder::new()
        .select(columns)
        .from(table_ref!(entity.name), Some(alias.as_str()))
        .where_clause(SqlFilterCompiler::compile(&request.predicate));

    for key in &request.order_by {
        let dir = match key.order {
            SortOrder::Asc => OrderDir::Asc,
            SortOrder::Desc => OrderDir::Desc,
        };
        builder = builder.order_by(qualified(&alias, &key.field), Some(dir));
    }
    for pk in &entity.primary_key {
        builder = builder.order_by(qualified(&alias, pk), Some(OrderDir::Asc));
    }

    // SQLite only accepts OFFSET after a LIMIT; -1 means no limit.
    match request.take {
        Some(take) => builder = builder.limit(value(Value::Int(to_i64(take)))),
        None if request.skip > 0 => builder = builder.limit(Expr::Literal("-1".to_string())),
        None => {}
    }
    if request.skip > 0 {
        builder = builder.offset(value(Value::Int(to_i64(request.skip))));
    }

    let (sql, params) = render(&builder.build(), &Sqlite);
    debug!(sql = %sql, "Selecting rows");

    let params = SqliteParamStore::from_values(params);
    let mut stmt = conn.prepare(&sql)?;
    let mut cursor = stmt.query(params.as_params())?;

    let mut found = Vec::new();
    while let Some(row) = cursor.next()? {
        found.push(decode_row(entity, row)?);
    }
    Ok(found)
}

pub fn count_rows(
    conn: &Connection,
    schema: &Schema,
    entity: &str,
    predicate: &CompiledPredicate,
) -> Result<u64, StorageError> {
    let entity = rows::resolve_entity(schema, entity)?;
    let alias = ScopeId::ROOT.alias();

    let select = SelectBuilder::new()
        .select(vec![Expr::FunctionCall(FunctionCall {
            name: "COUNT".to_string(),
            args: Vec::new(),
            wildcard: true,
        })])
        .from(table_ref!(entity.name), Some(alias.as_str()))
        .where_clause(SqlFilterCompiler::compile(predicate))
        .build();

    let (sql, params) = render(&select, &Sqlite);
    debug!(sql = %sql, "Counting rows");

    let params = SqliteParamStore::from_values(params);
    let count: i64 = conn.query_row(&sql, params.as_params(), |row| row.get(0))?;
    Ok(count.max(0) as u64)
}

pub fn insert_row(
    conn: &Connection,
    entity: &Entity,
    row: &RowData,
) -> Result<RowData, StorageError> {
    let row = rows::normalize(entity, row)?;

    let insert = InsertBuilder::new(table_ref!(entity.name))
        .columns(&entity.field_names())
        .values(
            row.field_values
                .iter()
                .map(|fv| value(fv.value.clone()))
                .collect(),
        )
        .build();

    let (sql, params) = render(&insert, &Sqlite);
    debug!(sql = %sql, "Inserting row");

    let params = SqliteParamStore::from_values(params);
    conn.execute(&sql, params.as_params())
        .map_err(|err| map_write_error(entity, err))?;
    Ok(row)
}

pub fn update_row(
    conn: &Connection,
    entity: &Entity,
    id: &RowId,
    assignments: &[FieldValue],
) -> Result<(), StorageError> {
    let assignments = rows::check_assignments(entity, assignments)?;
    let condition = key_condition(entity, id)?;
    let not_found = || StorageError::RowNotFound {
        entity: entity.name.clone(),
        id: id.to_string(),
    };

    if assignments.is_empty() {
        let select = SelectBuilder::new()
            .select(vec![Expr::Literal("1".to_string())])
            .from(table_ref!(entity.name), None)
            .where_clause(condition)
            .build();
        let (sql, params) = render(&select, &Sqlite);
        let params = SqliteParamStore::from_values(params);
        let mut stmt = conn.prepare(&sql)?;
        if !stmt.exists(params.as_params())? {
            return Err(not_found());
        }
        return Ok(());
    }

    let update = assignments
        .into_iter()
        .fold(UpdateBuilder::new(table_ref!(entity.name)), |builder, fv| {
            builder.set(&fv.name, value(fv.value))
        })
        .where_clause(condition)
        .build();

    let (sql, params) = render(&update, &Sqlite);
    debug!(sql = %sql, "Updating row");

    let params = SqliteParamStore::from_values(params);
    let changed = conn
        .execute(&sql, params.as_params())
        .map_err(|err| map_write_error(entity, err))?;

    match changed {
        0 => Err(not_found()),
        _ => Ok(()),
    }
}

/// `pk1 = ? AND pk2 = ? ...` for the primary key of `entity`.
fn key_condition(entity: &Entity, id: &RowId) -> Result<Expr, StorageError> {
    if id.values().len() != entity.primary_key.len() {
        return Err(StorageError::Query(format!(
            "id {id} does not match the primary key of `{}`",
            entity.name
        )));
    }

    let terms = entity
        .primary_key
        .iter()
        .zip(id.values())
        .map(|(pk, v)| Expr::binary(ident(pk), BinaryOperator::Eq, value(v.clone())))
        .collect();

    Expr::fold(BinaryOperator::And, terms).ok_or_else(|| {
        StorageError::Query(format!("`{}` has no primary key", entity.name))
    })
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
