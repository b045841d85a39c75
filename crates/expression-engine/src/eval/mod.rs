use crate::{
    context::{Bindings, RelatedRows},
    error::Result,
    truth::Truth,
};
use model::records::row::RowData;
use planner::predicate::ast::{CompiledPredicate, JoinScope};

pub mod comparison;

/// Trait for evaluating compiled predicates against in-memory rows.
pub trait Evaluator {
    /// Three-valued result for `row` bound to the root scope.
    fn truth(&self, row: &RowData, resolver: &dyn RelatedRows) -> Result<Truth>;

    /// A row matches only when the predicate is TRUE; UNKNOWN filters it out.
    fn evaluate(&self, row: &RowData, resolver: &dyn RelatedRows) -> Result<bool> {
        Ok(self.truth(row, resolver)?.is_true())
    }
}

impl Evaluator for CompiledPredicate {
    fn truth(&self, row: &RowData, resolver: &dyn RelatedRows) -> Result<Truth> {
        eval(self, &Bindings::root(row), resolver)
    }
}

pub fn evaluate(
    predicate: &CompiledPredicate,
    row: &RowData,
    resolver: &dyn RelatedRows,
) -> Result<bool> {
    predicate.evaluate(row, resolver)
}

fn eval(
    predicate: &CompiledPredicate,
    bindings: &Bindings<'_>,
    resolver: &dyn RelatedRows,
) -> Result<Truth> {
    match predicate {
        CompiledPredicate::Constant(b) => Ok(Truth::from(*b)),
        CompiledPredicate::Compare(cmp) => {
            let row = bindings.row(cmp.column().scope)?;
            comparison::compare(cmp, row)
        }
        CompiledPredicate::And(children) => {
            let mut acc = Truth::True;
            for child in children {
                acc = acc.and(eval(child, bindings, resolver)?);
                if acc == Truth::False {
                    break;
                }
            }
            Ok(acc)
        }
        CompiledPredicate::Or(children) => {
            let mut acc = Truth::False;
            for child in children {
                acc = acc.or(eval(child, bindings, resolver)?);
                if acc == Truth::True {
                    break;
                }
            }
            Ok(acc)
        }
        CompiledPredicate::Not(inner) => Ok(eval(inner, bindings, resolver)?.not()),
        CompiledPredicate::Exists { scope, inner } => exists(scope, inner, bindings, resolver),
    }
}

/// EXISTS is two-valued: TRUE when some related row makes `inner` TRUE,
/// FALSE otherwise. An UNKNOWN inner result does not count as a match.
fn exists(
    scope: &JoinScope,
    inner: &CompiledPredicate,
    bindings: &Bindings<'_>,
    resolver: &dyn RelatedRows,
) -> Result<Truth> {
    let parent = bindings.row(scope.parent)?;
    let related = resolver.related_rows(parent, &scope.relation)?;

    // Vacuous case: no related rows, nothing can satisfy `inner`.
    if related.is_empty() {
        return Ok(Truth::False);
    }

    for row in &related {
        let nested = bindings.bind(scope.id, row);
        if eval(inner, &nested, resolver)?.is_true() {
            return Ok(Truth::True);
        }
    }
    Ok(Truth::False)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{context::NoRelations, error::EvalError};
    use model::{
        core::{field_type::FieldType, value::Value},
        filter::{builder::FilterBuilder, node::FilterNode},
        records::row::FieldValue,
        schema::{
            Schema,
            entity::{Entity, Field},
        },
    };
    use planner::predicate::compile_filter;

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

    fn a(id: i64) -> RowData {
        RowData::new("A", vec![FieldValue::new("id", id)])
    }

    fn b(id: i64, date: &str, fk: Option<i64>, marker: bool) -> RowData {
        let instant = model::filter::literal::parse_instant(date).unwrap();
        RowData::new(
            "B",
            vec![
                FieldValue::new("id", id),
                FieldValue::new("date", instant),
                FieldValue::new("fk", fk.map(Value::Int).unwrap_or(Value::Null)),
                FieldValue::new("marker", marker),
            ],
        )
    }

    fn bs() -> Vec<RowData> {
        vec![
            b(1, "2020-09-01", Some(1), false),
            b(2, "2020-11-09", Some(1), false),
            b(3, "2020-11-09", Some(2), true),
        ]
    }

    /// Children of an A row, by `fk = id`.
    fn resolver(row: &RowData, relation: &str) -> Result<Vec<RowData>> {
        assert_eq!(relation, "bs");
        let id = row.get_value("id");
        Ok(bs()
            .into_iter()
            .filter(|b| b.get_value("fk").compare(&id) == Some(std::cmp::Ordering::Equal))
            .collect())
    }

    fn matching(schema: &Schema, entity: &str, filter: &FilterNode, rows: &[RowData]) -> Vec<i64> {
        let predicate = compile_filter(schema, entity, filter).unwrap();
        rows.iter()
            .filter(|row| predicate.evaluate(row, &resolver).unwrap())
            .filter_map(|row| row.get_value("id").as_i64())
            .collect()
    }

    #[test]
    fn datetime_equality_is_selective() {
        let schema = schema();
        let builder = FilterBuilder::new(&schema, "B").unwrap();
        let filter = FilterNode::and(vec![
            builder.is_in("fk", vec![1, 2]).unwrap(),
            builder.eq("date", "2020-09-01").unwrap(),
        ]);

        assert_eq!(matching(&schema, "B", &filter, &bs()), vec![1]);
    }

    #[test]
    fn null_comparisons_are_unknown() {
        let schema = schema();
        let builder = FilterBuilder::new(&schema, "B").unwrap();
        let orphan = b(4, "2020-09-01", None, false);

        let eq = compile_filter(&schema, "B", &builder.eq("fk", 1).unwrap()).unwrap();
        assert_eq!(eq.truth(&orphan, &NoRelations).unwrap(), Truth::Unknown);

        // NOT(UNKNOWN) is still UNKNOWN, so the row is excluded both ways.
        let not_eq = compile_filter(
            &schema,
            "B",
            &FilterNode::not(vec![builder.eq("fk", 1).unwrap()]),
        )
        .unwrap();
        assert!(!not_eq.evaluate(&orphan, &NoRelations).unwrap());

        let is_null = compile_filter(&schema, "B", &builder.eq("fk", Value::Null).unwrap()).unwrap();
        assert!(is_null.evaluate(&orphan, &NoRelations).unwrap());

        let in_list = compile_filter(&schema, "B", &builder.is_in("fk", vec![1]).unwrap()).unwrap();
        assert_eq!(in_list.truth(&orphan, &NoRelations).unwrap(), Truth::Unknown);

        let not_in_empty =
            compile_filter(&schema, "B", &builder.not_in("fk", Vec::<i64>::new()).unwrap())
                .unwrap();
        assert!(not_in_empty.evaluate(&orphan, &NoRelations).unwrap());
    }

    #[test]
    fn quantifiers_over_zero_related_rows() {
        let schema = schema();
        let builder = FilterBuilder::new(&schema, "A").unwrap();
        let parents = vec![a(1), a(2), a(3)];

        let every = builder.every("bs", |b| b.eq("marker", true)).unwrap();
        assert_eq!(matching(&schema, "A", &every, &parents), vec![2, 3]);

        let some = builder.some("bs", |b| b.eq("marker", true)).unwrap();
        assert_eq!(matching(&schema, "A", &some, &parents), vec![2]);

        let none = builder.none("bs", |b| b.eq("marker", true)).unwrap();
        assert_eq!(matching(&schema, "A", &none, &parents), vec![1, 3]);

        let any = builder.some("bs", |_| Ok(FilterNode::and(vec![]))).unwrap();
        assert_eq!(matching(&schema, "A", &any, &parents), vec![1, 2]);
    }

    #[test]
    fn empty_combinators() {
        let schema = schema();
        assert_eq!(
            matching(&schema, "B", &FilterNode::and(vec![]), &bs()),
            vec![1, 2, 3]
        );
        assert!(matching(&schema, "B", &FilterNode::or(vec![]), &bs()).is_empty());
    }

    #[test]
    fn missing_columns_are_errors() {
        let schema = schema();
        let builder = FilterBuilder::new(&schema, "B").unwrap();
        let predicate = compile_filter(&schema, "B", &builder.eq("id", 1).unwrap()).unwrap();
        let row = RowData::new("B", vec![]);

        assert!(matches!(
            predicate.evaluate(&row, &NoRelations),
            Err(EvalError::FieldNotFound { .. })
        ));
    }
}
