/// `table_ref!("users")` builds a `TableRef` from anything string-like.
#[macro_export]
macro_rules! table_ref {
    ($name:expr) => {
        $crate::query::ast::common::TableRef {
            name: $name.to_string(),
        }
    };
}
