use crate::predicate::ast::CompiledPredicate;

/// Lowers a compiled predicate into the filter representation of a backend.
pub trait FilterCompiler {
    type Filter;

    fn compile(predicate: &CompiledPredicate) -> Self::Filter;
}
