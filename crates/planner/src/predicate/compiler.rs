use crate::{
    error::CompileError,
    predicate::{
        ast::{ColumnComparison, ColumnRef, CompiledPredicate},
        scope::{JoinContext, ScopeId},
        shape,
    },
};
use model::{
    filter::node::{FilterNode, LogicalOp, Quantifier, RelationFilter, ScalarCompare},
    schema::{Schema, entity::Entity},
};
use tracing::debug;

/// Compiles `filter`, rooted at `entity`, into a predicate over the root
/// scope of `ctx`.
///
/// Every scalar leaf becomes exactly one column comparison and every
/// relation leaf exactly one `Exists`; the result is checked for that
/// before it is returned.
pub fn compile(
    entity: &Entity,
    filter: &FilterNode,
    ctx: &mut JoinContext<'_>,
) -> Result<CompiledPredicate, CompileError> {
    let predicate = compile_node(entity, ScopeId::ROOT, filter, ctx)?;
    shape::verify(entity, filter, &predicate)?;
    debug!(entity = %entity.name, predicate = %predicate, "Compiled filter");
    Ok(predicate)
}

/// Compiles against a fresh join context.
pub fn compile_filter(
    schema: &Schema,
    entity: &str,
    filter: &FilterNode,
) -> Result<CompiledPredicate, CompileError> {
    let entity = schema.resolve_entity(entity)?;
    compile(entity, filter, &mut JoinContext::new(schema))
}

fn compile_node(
    entity: &Entity,
    scope: ScopeId,
    node: &FilterNode,
    ctx: &mut JoinContext<'_>,
) -> Result<CompiledPredicate, CompileError> {
    match node {
        FilterNode::Logical { op, children } => {
            let compiled = children
                .iter()
                .map(|child| compile_node(entity, scope, child, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(combine(*op, compiled))
        }
        FilterNode::ScalarCompare(cmp) => compile_scalar(entity, scope, cmp),
        FilterNode::RelationFilter(rf) => compile_relation(entity, scope, rf, ctx),
    }
}

fn combine(op: LogicalOp, children: Vec<CompiledPredicate>) -> CompiledPredicate {
    match op {
        // Identity elements of the two combinators.
        LogicalOp::And if children.is_empty() => CompiledPredicate::Constant(true),
        LogicalOp::Or if children.is_empty() => CompiledPredicate::Constant(false),
        LogicalOp::And => CompiledPredicate::And(children),
        LogicalOp::Or => CompiledPredicate::Or(children),
        LogicalOp::Not => CompiledPredicate::Not(Box::new(combine(LogicalOp::And, children))),
    }
}

fn compile_scalar(
    entity: &Entity,
    scope: ScopeId,
    cmp: &ScalarCompare,
) -> Result<CompiledPredicate, CompileError> {
    let field = cmp.validate(entity)?;
    let column = ColumnRef::new(scope, &field.name);
    ColumnComparison::bind(column, cmp.op, cmp.value.clone()).map(CompiledPredicate::Compare)
}

fn compile_relation(
    entity: &Entity,
    scope: ScopeId,
    rf: &RelationFilter,
    ctx: &mut JoinContext<'_>,
) -> Result<CompiledPredicate, CompileError> {
    let (join, target) = ctx.open(scope, entity, &rf.relation.0)?;
    let inner = compile_node(target, join.id, &rf.inner, ctx)?;

    let predicate = match rf.quantifier {
        Quantifier::Some => CompiledPredicate::Exists {
            scope: join,
            inner: Box::new(inner),
        },
        Quantifier::None => CompiledPredicate::Not(Box::new(CompiledPredicate::Exists {
            scope: join,
            inner: Box::new(inner),
        })),
        // No related row fails the filter. With zero related rows the
        // EXISTS is false and the negation makes EVERY true.
        Quantifier::Every => CompiledPredicate::Not(Box::new(CompiledPredicate::Exists {
            scope: join,
            inner: Box::new(CompiledPredicate::Not(Box::new(inner))),
        })),
    };

    Ok(predicate)
}
