//! Randomized checks that the in-memory evaluator and the SQL pushdown agree.

use crate::{BRow, C_FIELDS, day};
use chrono::{DateTime, TimeZone, Utc};
use model::{
    core::value::Value,
    error::FilterError,
    filter::{
        builder::FilterBuilder,
        literal::Literal,
        node::{
            FieldRef, FilterNode, Quantifier, RelationFilter, RelationRef, ScalarCompare,
            ScalarOp, ScalarOperand,
        },
    },
};
use proptest::prelude::*;
use uuid::Uuid;

const ORDERING_OPS: [ScalarOp; 6] = [
    ScalarOp::Eq,
    ScalarOp::Neq,
    ScalarOp::Lt,
    ScalarOp::Lte,
    ScalarOp::Gt,
    ScalarOp::Gte,
];

fn days() -> [DateTime<Utc>; 3] {
    [day(9, 1), day(10, 15), day(11, 9)]
}

fn scalar(field: &str, op: ScalarOp, value: ScalarOperand) -> FilterNode {
    FilterNode::ScalarCompare(ScalarCompare {
        field: FieldRef(field.to_string()),
        op,
        value,
    })
}

fn relation(name: &str, quantifier: Quantifier, inner: FilterNode) -> FilterNode {
    FilterNode::RelationFilter(RelationFilter {
        relation: RelationRef(name.to_string()),
        quantifier,
        inner: Box::new(inner),
    })
}

fn arb_ordering_op() -> impl Strategy<Value = ScalarOp> {
    prop::sample::select(ORDERING_OPS.to_vec())
}

fn arb_equality_op() -> impl Strategy<Value = ScalarOp> {
    prop_oneof![Just(ScalarOp::Eq), Just(ScalarOp::Neq)]
}

fn arb_list_op() -> impl Strategy<Value = ScalarOp> {
    prop_oneof![Just(ScalarOp::In), Just(ScalarOp::NotIn)]
}

fn arb_quantifier() -> impl Strategy<Value = Quantifier> {
    prop_oneof![
        Just(Quantifier::Some),
        Just(Quantifier::Every),
        Just(Quantifier::None),
    ]
}

fn single(value: Value) -> ScalarOperand {
    ScalarOperand::Single(value)
}

fn arb_a_leaf() -> impl Strategy<Value = FilterNode> {
    prop_oneof![
        (arb_ordering_op(), 0i64..5).prop_map(|(op, id)| scalar("id", op, single(Value::Int(id)))),
        (arb_list_op(), prop::collection::vec(0i64..5, 0..3)).prop_map(|(op, ids)| {
            scalar(
                "id",
                op,
                ScalarOperand::List(ids.into_iter().map(Value::Int).collect()),
            )
        }),
    ]
}

fn arb_b_leaf() -> impl Strategy<Value = FilterNode> {
    prop_oneof![
        (arb_ordering_op(), 0i64..8).prop_map(|(op, id)| scalar("id", op, single(Value::Int(id)))),
        (
            arb_equality_op(),
            prop_oneof![Just(Value::Null), (0i64..4).prop_map(Value::Int)]
        )
            .prop_map(|(op, fk)| scalar("fk", op, single(fk))),
        (arb_ordering_op(), 0i64..4).prop_map(|(op, fk)| scalar("fk", op, single(Value::Int(fk)))),
        (arb_list_op(), prop::collection::vec(0i64..4, 0..3)).prop_map(|(op, fks)| {
            scalar(
                "fk",
                op,
                ScalarOperand::List(fks.into_iter().map(Value::Int).collect()),
            )
        }),
        (arb_ordering_op(), 0usize..3)
            .prop_map(|(op, d)| scalar("date", op, single(Value::DateTime(days()[d])))),
        (arb_equality_op(), any::<bool>())
            .prop_map(|(op, b)| scalar("marker", op, single(Value::Boolean(b)))),
    ]
}

fn arb_b_filter() -> impl Strategy<Value = FilterNode> {
    arb_b_leaf().prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..3).prop_map(FilterNode::and),
            prop::collection::vec(inner.clone(), 0..3).prop_map(FilterNode::or),
            prop::collection::vec(inner, 0..2).prop_map(FilterNode::not),
            (arb_quantifier(), arb_a_leaf()).prop_map(|(q, leaf)| relation("a", q, leaf)),
        ]
    })
}

fn arb_a_filter() -> impl Strategy<Value = FilterNode> {
    arb_a_leaf().prop_recursive(2, 8, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..3).prop_map(FilterNode::and),
            prop::collection::vec(inner.clone(), 0..3).prop_map(FilterNode::or),
            prop::collection::vec(inner, 0..2).prop_map(FilterNode::not),
            (arb_quantifier(), arb_b_filter()).prop_map(|(q, b)| relation("bs", q, b)),
        ]
    })
}

/// `B` rows with distinct `(fk, date)` keys; fk 0 stands for NULL.
fn arb_b_rows() -> impl Strategy<Value = Vec<BRow>> {
    prop::collection::btree_map((0i64..4, 0usize..3), any::<bool>(), 0..8).prop_map(|keys| {
        keys.into_iter()
            .zip(1i64..)
            .map(|(((fk, d), marker), id)| (id, (fk > 0).then_some(fk), days()[d], marker))
            .collect()
    })
}

/// Distinct literals per `C` column. Some are written in a form that needs
/// coercion: ints for the float column, strings for instants and UUIDs.
pub fn c_pool(field: &str) -> Vec<Literal> {
    match field {
        "n" => vec![
            Literal::Int(-2),
            Literal::Int(0),
            Literal::Int(1),
            Literal::Int(i64::MAX),
        ],
        "name" => ["", "a", "B", "ab", "a b", "\u{e9}t\u{e9}", "Z"]
            .into_iter()
            .map(Literal::from)
            .collect(),
        "score" => vec![
            Literal::Float(-1.5),
            Literal::Int(-1),
            Literal::Float(0.0),
            Literal::Float(0.5),
            Literal::Int(3),
            Literal::Float(2.25),
            Literal::Float(1e10),
        ],
        "at" => vec![
            Literal::from("2020-09-01"),
            Literal::DateTime(Utc.timestamp_opt(1_598_918_400, 1_000).unwrap()),
            Literal::from("2020-09-01T00:00:01Z"),
            Literal::from("1969-12-31T23:59:59Z"),
            Literal::DateTime(day(11, 9)),
        ],
        "flag" => vec![Literal::Boolean(false), Literal::Boolean(true)],
        "token" => vec![
            Literal::Uuid(Uuid::from_u128(0)),
            Literal::from("0000000a-0000-0000-0000-000000000000"),
            Literal::Uuid(Uuid::from_u128(0x9f << 120)),
            Literal::from("a0000000-0000-0000-0000-000000000001"),
            Literal::Uuid(Uuid::from_u128(u128::MAX)),
        ],
        other => panic!("C has no column {other}"),
    }
}

fn arb_c_field() -> impl Strategy<Value = &'static str> {
    prop::sample::select(C_FIELDS.iter().map(|(name, _)| *name).collect::<Vec<_>>())
}

fn arb_c_literal(field: &'static str) -> impl Strategy<Value = Literal> {
    prop::sample::select(c_pool(field))
}

/// One `C` row, `NULL` or a pool literal per column.
fn arb_c_row() -> impl Strategy<Value = Vec<Literal>> {
    C_FIELDS
        .iter()
        .map(|(name, _)| prop_oneof![Just(Literal::Null), arb_c_literal(name)].boxed())
        .collect::<Vec<_>>()
}

/// Untyped `C` filters; bound through `FilterBuilder` so literals are coerced
/// the way callers' literals are.
#[derive(Debug, Clone)]
pub enum CFilter {
    Compare(&'static str, ScalarOp, Literal),
    And(Vec<CFilter>),
    Or(Vec<CFilter>),
    Not(Vec<CFilter>),
}

impl CFilter {
    pub fn bind(&self, builder: &FilterBuilder<'_>) -> Result<FilterNode, FilterError> {
        let bind_all = |children: &[CFilter]| {
            children
                .iter()
                .map(|child| child.bind(builder))
                .collect::<Result<Vec<_>, _>>()
        };
        match self {
            CFilter::Compare(field, op, literal) => builder.compare(field, *op, literal.clone()),
            CFilter::And(children) => Ok(FilterNode::and(bind_all(children)?)),
            CFilter::Or(children) => Ok(FilterNode::or(bind_all(children)?)),
            CFilter::Not(children) => Ok(FilterNode::not(bind_all(children)?)),
        }
    }
}

fn arb_c_leaf() -> impl Strategy<Value = CFilter> {
    arb_c_field().prop_flat_map(|field| {
        prop_oneof![
            (arb_ordering_op(), arb_c_literal(field))
                .prop_map(move |(op, lit)| CFilter::Compare(field, op, lit)),
            (arb_equality_op(), Just(Literal::Null))
                .prop_map(move |(op, lit)| CFilter::Compare(field, op, lit)),
            (
                arb_list_op(),
                prop::collection::vec(arb_c_literal(field), 0..3)
            )
                .prop_map(move |(op, items)| CFilter::Compare(field, op, Literal::List(items))),
        ]
    })
}

fn arb_c_filter() -> impl Strategy<Value = CFilter> {
    arb_c_leaf().prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..3).prop_map(CFilter::And),
            prop::collection::vec(inner.clone(), 0..3).prop_map(CFilter::Or),
            prop::collection::vec(inner, 0..2).prop_map(CFilter::Not),
        ]
    })
}

/// A column and two different literals for it.
fn arb_c_distinct_pair() -> impl Strategy<Value = (&'static str, Literal, Literal)> {
    arb_c_field().prop_flat_map(|field| {
        let pool = c_pool(field);
        let len = pool.len();
        (0..len, 1..len).prop_map(move |(a, offset)| {
            (field, pool[a].clone(), pool[(a + offset) % len].clone())
        })
    })
}
