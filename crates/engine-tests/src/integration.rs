#[cfg(test)]
mod tests {
    use crate::{
        Backend, day, engine_with, regression_engine,
        utils::{all_rows, markers, matching_ids},
    };
    use chrono::{TimeZone, Utc};
    use engine_core::{EngineError, UpdateManyOperation};
    use model::{
        core::value::Value,
        filter::node::{FieldRef, FilterNode, ScalarCompare, ScalarOp, ScalarOperand},
        records::row::FieldValue,
    };
    use tracing_test::traced_test;

    // Scenario: B rows (fk=1, 2020-09-01), (fk=1, 2020-11-09), (fk=2, 2020-11-09);
    // update marker where fk IN (1, 2) AND date = 2020-09-01.
    // Expected Outcome: exactly B1 is updated, on every backend.
    #[traced_test]
    #[tokio::test]
    async fn tc01_update_many_touches_only_matching_rows() {
        for backend in Backend::ALL {
            let engine = regression_engine(backend).await;
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

            assert_eq!(affected, 1, "{backend:?}");
            assert_eq!(markers(&engine).await, vec![true, false, false], "{backend:?}");
        }
    }

    // Scenario: A3 has no related B rows.
    // Expected Outcome: EVERY and NONE hold for A3, SOME does not.
    #[tokio::test]
    async fn tc02_quantifiers_over_no_related_rows() {
        for backend in Backend::ALL {
            let engine = regression_engine(backend).await;
            let a = engine.filter("A").unwrap();

            let every = a.every("bs", |b| b.eq("marker", true)).unwrap();
            let some = a.some("bs", |b| b.eq("marker", false)).unwrap();
            let none = a.none("bs", |b| b.eq("marker", false)).unwrap();

            assert_eq!(matching_ids(&engine, "A", &every).await, vec![3], "{backend:?}");
            assert_eq!(matching_ids(&engine, "A", &some).await, vec![1, 2], "{backend:?}");
            assert_eq!(matching_ids(&engine, "A", &none).await, vec![3], "{backend:?}");
        }
    }

    // Scenario: EVERY over rows where only some satisfy the inner filter.
    // Expected Outcome: only parents whose related rows all match are kept.
    #[tokio::test]
    async fn tc03_every_requires_all_related_rows() {
        for backend in Backend::ALL {
            let engine = regression_engine(backend).await;
            let a = engine.filter("A").unwrap();

            let filter = a.every("bs", |b| b.gte("date", "2020-11-01")).unwrap();
            assert_eq!(matching_ids(&engine, "A", &filter).await, vec![2, 3], "{backend:?}");

            let filter = a
                .every("bs", |b| {
                    Ok(FilterNode::or(vec![
                        b.lt("date", "2020-10-01")?,
                        b.eq("fk", 1)?,
                    ]))
                })
                .unwrap();
            assert_eq!(matching_ids(&engine, "A", &filter).await, vec![1, 3], "{backend:?}");
        }
    }

    // Scenario: a B row with a NULL foreign key.
    // Expected Outcome: it has no related A, and NULL is matched only by IS NULL.
    #[tokio::test]
    async fn tc04_null_foreign_keys() {
        for backend in Backend::ALL {
            let engine = engine_with(
                backend,
                &[1],
                &[
                    (1, Some(1), day(9, 1), false),
                    (2, None, day(9, 1), false),
                    (3, None, day(9, 1), true),
                ],
            )
            .await;
            let b = engine.filter("B").unwrap();

            let is_null = b.eq("fk", Value::Null).unwrap();
            let is_not_null = b.neq("fk", Value::Null).unwrap();
            let not_one = b.neq("fk", 1).unwrap();
            let not_in_empty = b.not_in("fk", Vec::<i64>::new()).unwrap();
            let in_empty = b.is_in("fk", Vec::<i64>::new()).unwrap();
            let some_a = b.some("a", |a| a.eq("id", 1)).unwrap();
            let every_a = b.every("a", |a| a.eq("id", 99)).unwrap();

            assert_eq!(matching_ids(&engine, "B", &is_null).await, vec![2, 3], "{backend:?}");
            assert_eq!(matching_ids(&engine, "B", &is_not_null).await, vec![1], "{backend:?}");
            assert!(matching_ids(&engine, "B", &not_one).await.is_empty(), "{backend:?}");
            assert_eq!(
                matching_ids(&engine, "B", &not_in_empty).await,
                vec![1, 2, 3],
                "{backend:?}"
            );
            assert!(matching_ids(&engine, "B", &in_empty).await.is_empty(), "{backend:?}");
            assert_eq!(matching_ids(&engine, "B", &some_a).await, vec![1], "{backend:?}");
            assert_eq!(matching_ids(&engine, "B", &every_a).await, vec![2, 3], "{backend:?}");
        }
    }

    // Scenario: logical nodes without children.
    // Expected Outcome: AND[] matches everything, OR[] and NOT[] match nothing.
    #[tokio::test]
    async fn tc05_empty_logical_nodes() {
        for backend in Backend::ALL {
            let engine = regression_engine(backend).await;

            let and = FilterNode::and(vec![]);
            let or = FilterNode::or(vec![]);
            let not = FilterNode::not(vec![]);

            assert_eq!(matching_ids(&engine, "B", &and).await, vec![1, 2, 3], "{backend:?}");
            assert!(matching_ids(&engine, "B", &or).await.is_empty(), "{backend:?}");
            assert!(matching_ids(&engine, "B", &not).await.is_empty(), "{backend:?}");
            assert_eq!(engine.count("B", &and).await.unwrap(), 3, "{backend:?}");
        }
    }

    // Scenario: an update that moves two rows onto the key of an existing row.
    // Expected Outcome: a constraint violation naming the key, and no row changed.
    #[tokio::test]
    async fn tc06_constraint_violation_rolls_back() {
        for backend in Backend::ALL {
            let engine = regression_engine(backend).await;
            let b = engine.filter("B").unwrap();
            let before = all_rows(&engine, "B").await;

            let err = engine
                .update_many(UpdateManyOperation::new(
                    "B",
                    b.gt("id", 1).unwrap(),
                    vec![
                        FieldValue::new("marker", true),
                        FieldValue::new("date", day(9, 1)),
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
                other => panic!("{backend:?}: expected a constraint violation, got {other}"),
            }
            assert_eq!(all_rows(&engine, "B").await, before, "{backend:?}");
        }
    }

    // Scenario: the same filter tree compiled twice, and nested relation filters.
    // Expected Outcome: identical predicates with depth-first scope aliases.
    #[tokio::test]
    async fn tc07_compilation_is_stable() {
        let engine = regression_engine(Backend::Memory).await;
        let a = engine.filter("A").unwrap();
        let filter = FilterNode::or(vec![
            a.some("bs", |b| b.some("a", |a| a.eq("id", 1))).unwrap(),
            a.every("bs", |b| b.eq("marker", false)).unwrap(),
        ]);

        let first = engine.compile("A", &filter).unwrap();
        let second = engine.compile("A", &filter).unwrap();
        assert_eq!(first, second);

        let rendered = first.to_string();
        assert!(rendered.contains("EXISTS(B t1"), "{rendered}");
        assert!(rendered.contains("EXISTS(A t2"), "{rendered}");
        assert!(rendered.contains("EXISTS(B t3"), "{rendered}");
    }

    // Scenario: nested relation filters through both sides of the foreign key.
    // Expected Outcome: A rows sharing a B with A1 are found on every backend.
    #[tokio::test]
    async fn tc08_nested_relations() {
        for backend in Backend::ALL {
            let engine = regression_engine(backend).await;
            let a = engine.filter("A").unwrap();

            let filter = a
                .some("bs", |b| b.some("a", |a| a.eq("id", 1)))
                .unwrap();
            assert_eq!(matching_ids(&engine, "A", &filter).await, vec![1], "{backend:?}");

            let filter = a
                .none("bs", |b| b.every("a", |a| a.lt("id", 2)))
                .unwrap();
            assert_eq!(matching_ids(&engine, "A", &filter).await, vec![2, 3], "{backend:?}");
        }
    }

    // Scenario: update_many with an empty payload.
    // Expected Outcome: the matching rows are counted and nothing is written.
    #[tokio::test]
    async fn tc09_update_with_no_assignments() {
        for backend in Backend::ALL {
            let engine = regression_engine(backend).await;
            let b = engine.filter("B").unwrap();
            let before = all_rows(&engine, "B").await;

            let affected = engine
                .update_many(UpdateManyOperation::new("B", b.eq("fk", 1).unwrap(), vec![]))
                .await
                .unwrap();

            assert_eq!(affected, 2, "{backend:?}");
            assert_eq!(all_rows(&engine, "B").await, before, "{backend:?}");
        }
    }

    // Scenario: a hand-built tree compares B.date with 2020-09-01 plus 500ns,
    // alone and inside an IN list.
    // Expected Outcome: the operand is truncated to 2020-09-01, so B1 matches
    // on every backend.
    #[tokio::test]
    async fn tc10_sub_microsecond_operands_are_truncated() {
        let instant = Utc.timestamp_opt(day(9, 1).timestamp(), 500).unwrap();
        let on_date = |op, value| {
            FilterNode::ScalarCompare(ScalarCompare {
                field: FieldRef("date".to_string()),
                op,
                value,
            })
        };

        for backend in Backend::ALL {
            let engine = regression_engine(backend).await;

            let filter = on_date(ScalarOp::Eq, ScalarOperand::Single(Value::DateTime(instant)));
            assert_eq!(matching_ids(&engine, "B", &filter).await, vec![1], "{backend:?}");

            let filter = on_date(
                ScalarOp::In,
                ScalarOperand::List(vec![Value::DateTime(instant)]),
            );
            assert_eq!(matching_ids(&engine, "B", &filter).await, vec![1], "{backend:?}");

            let filter = on_date(ScalarOp::Gt, ScalarOperand::Single(Value::DateTime(instant)));
            assert_eq!(matching_ids(&engine, "B", &filter).await, vec![2, 3], "{backend:?}");
        }
    }
}
