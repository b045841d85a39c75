use super::compiler::FilterCompiler;
use crate::{
    predicate::ast::{ColumnComparison, CompiledPredicate, JoinScope},
    query::{
        ast::expr::{BinaryOperator, Expr},
        builder::select::SelectBuilder,
        qualified, value,
    },
    table_ref,
};
use model::{
    core::value::Value,
    filter::node::{ScalarOp, ScalarOperand},
};

/// Lowers a `CompiledPredicate` to a SQL boolean expression whose column
/// references are qualified with scope aliases (`t0` for the filtered table).
pub struct SqlFilterCompiler;

impl FilterCompiler for SqlFilterCompiler {
    type Filter = Expr;

    fn compile(predicate: &CompiledPredicate) -> Self::Filter {
        lower(predicate)
    }
}

fn constant(b: bool) -> Expr {
    Expr::Literal(if b { "TRUE" } else { "FALSE" }.to_string())
}

fn lower(predicate: &CompiledPredicate) -> Expr {
    match predicate {
        CompiledPredicate::Constant(b) => constant(*b),
        CompiledPredicate::Compare(cmp) => lower_comparison(cmp),
        CompiledPredicate::And(children) => {
            Expr::fold(BinaryOperator::And, children.iter().map(lower).collect())
                .unwrap_or_else(|| constant(true))
        }
        CompiledPredicate::Or(children) => {
            Expr::fold(BinaryOperator::Or, children.iter().map(lower).collect())
                .unwrap_or_else(|| constant(false))
        }
        CompiledPredicate::Not(inner) => Expr::Not(Box::new(lower(inner))),
        CompiledPredicate::Exists { scope, inner } => lower_exists(scope, inner),
    }
}

fn lower_comparison(cmp: &ColumnComparison) -> Expr {
    let column = qualified(&cmp.column().scope.alias(), &cmp.column().column);

    match (cmp.op(), cmp.operand()) {
        (ScalarOp::Eq, ScalarOperand::Single(Value::Null)) => Expr::IsNull {
            expr: Box::new(column),
            negated: false,
        },
        (ScalarOp::Neq, ScalarOperand::Single(Value::Null)) => Expr::IsNull {
            expr: Box::new(column),
            negated: true,
        },
        // `x IN ()` is not portable; an empty list matches nothing and an
        // empty exclusion list matches everything, NULL included.
        (op, ScalarOperand::List(values)) if values.is_empty() => {
            constant(op == ScalarOp::NotIn)
        }
        (op, ScalarOperand::List(values)) => Expr::InList {
            expr: Box::new(column),
            list: values.iter().cloned().map(value).collect(),
            negated: op == ScalarOp::NotIn,
        },
        (op, ScalarOperand::Single(v)) => {
            let op = match op {
                ScalarOp::Eq | ScalarOp::In => BinaryOperator::Eq,
                ScalarOp::Neq | ScalarOp::NotIn => BinaryOperator::NotEq,
                ScalarOp::Lt => BinaryOperator::Lt,
                ScalarOp::Lte => BinaryOperator::LtEq,
                ScalarOp::Gt => BinaryOperator::Gt,
                ScalarOp::Gte => BinaryOperator::GtEq,
            };
            Expr::binary(column, op, value(v.clone()))
        }
    }
}

/// `EXISTS (SELECT 1 FROM target AS tN WHERE <join> AND <inner>)`
fn lower_exists(scope: &JoinScope, inner: &CompiledPredicate) -> Expr {
    let alias = scope.id.alias();
    let parent = scope.parent.alias();

    let mut conditions = scope
        .links
        .iter()
        .map(|link| {
            Expr::binary(
                qualified(&alias, &link.inner),
                BinaryOperator::Eq,
                qualified(&parent, &link.outer),
            )
        })
        .collect::<Vec<_>>();
    conditions.push(lower(inner));

    let select = SelectBuilder::new()
        .select(vec![Expr::Literal("1".to_string())])
        .from(table_ref!(scope.target), Some(alias.as_str()))
        .where_clause(Expr::fold(BinaryOperator::And, conditions).unwrap_or_else(|| constant(true)))
        .build();

    Expr::Exists(Box::new(select))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        predicate::compile_filter,
        query::{dialect::Sqlite, renderer::render},
    };
    use chrono::{TimeZone, Utc};
    use model::{
        core::field_type::FieldType,
        filter::{builder::FilterBuilder, node::FilterNode},
        schema::{
            Schema,
            entity::{Entity, Field},
        },
    };

    fn schema() -> Schema {
        Schema::builder()
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
                    .with_primary_key(&["id"]),
            )
            .one_to_many("A", "bs", "B", Some("a"), &["fk"], &["id"])
            .build()
            .unwrap()
    }

    fn sql_for(schema: &Schema, entity: &str, filter: &FilterNode) -> (String, Vec<Value>) {
        let predicate = compile_filter(schema, entity, filter).unwrap();
        render(&SqlFilterCompiler::compile(&predicate), &Sqlite)
    }

    #[test]
    fn datetime_equality_binds_its_value() {
        let schema = schema();
        let b = FilterBuilder::new(&schema, "B").unwrap();
        let filter = FilterNode::and(vec![
            b.is_in("fk", vec![1, 2]).unwrap(),
            b.eq("date", "2020-09-01").unwrap(),
        ]);

        let (sql, params) = sql_for(&schema, "B", &filter);
        assert_eq!(
            sql,
            r#"("t0"."fk" IN (?1, ?2) AND ("t0"."date" = ?3))"#
        );
        assert_eq!(
            params,
            vec![
                Value::Int(1),
                Value::Int(2),
                Value::DateTime(Utc.with_ymd_and_hms(2020, 9, 1, 0, 0, 0).unwrap()),
            ]
        );
    }

    #[test]
    fn null_equality_becomes_is_null() {
        let schema = schema();
        let b = FilterBuilder::new(&schema, "B").unwrap();

        let (sql, params) = sql_for(&schema, "B", &b.eq("fk", Value::Null).unwrap());
        assert_eq!(sql, r#""t0"."fk" IS NULL"#);
        assert!(params.is_empty());
    }

    #[test]
    fn empty_lists_lower_to_constants() {
        let schema = schema();
        let b = FilterBuilder::new(&schema, "B").unwrap();

        let (sql, _) = sql_for(&schema, "B", &b.is_in("id", Vec::<i64>::new()).unwrap());
        assert_eq!(sql, "FALSE");
        let (sql, _) = sql_for(&schema, "B", &b.not_in("id", Vec::<i64>::new()).unwrap());
        assert_eq!(sql, "TRUE");
    }

    #[test]
    fn every_lowers_to_correlated_not_exists() {
        let schema = schema();
        let a = FilterBuilder::new(&schema, "A").unwrap();
        let filter = a.every("bs", |b| b.eq("marker", true)).unwrap();

        let (sql, params) = sql_for(&schema, "A", &filter);
        assert_eq!(
            sql,
            concat!(
                r#"NOT (EXISTS (SELECT 1 FROM "B" AS "t1" "#,
                r#"WHERE (("t1"."fk" = "t0"."id") AND NOT (("t1"."marker" = ?1)))))"#
            )
        );
        assert_eq!(params, vec![Value::Boolean(true)]);
    }
}
