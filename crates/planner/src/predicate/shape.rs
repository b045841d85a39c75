//! Leaf accounting between a filter tree and its compiled predicate.

use crate::{error::CompileError, predicate::ast::CompiledPredicate};
use model::{filter::node::FilterNode, schema::entity::Entity};

/// Fails unless every scalar leaf of `filter` survived as a comparison and
/// every relation leaf as an `Exists`. A dropped or constant-folded leaf
/// shows up as a count mismatch.
pub fn verify(
    entity: &Entity,
    filter: &FilterNode,
    predicate: &CompiledPredicate,
) -> Result<(), CompileError> {
    let expected_compares = filter.scalar_leaf_count();
    let expected_scopes = filter.relation_leaf_count();
    let found_compares = predicate.compare_count();
    let found_scopes = predicate.exists_count();

    if expected_compares != found_compares || expected_scopes != found_scopes {
        return Err(CompileError::LeafCountMismatch {
            entity: entity.name.clone(),
            expected_compares,
            found_compares,
            expected_scopes,
            found_scopes,
        });
    }

    Ok(())
}
