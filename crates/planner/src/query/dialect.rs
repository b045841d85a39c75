//! Defines the `Dialect` trait for database-specific SQL syntax.

use model::core::field_type::FieldType;

pub trait Dialect: Send + Sync {
    /// Wraps an identifier (like a table or column name) in the correct
    /// quotation marks for the dialect.
    fn quote_identifier(&self, ident: &str) -> String;

    /// Returns the placeholder for the parameter at `index` (zero-based).
    ///
    /// - SQLite uses `?1`, `?2`, etc.
    /// - PostgreSQL uses `$1`, `$2`, etc.
    fn get_placeholder(&self, index: usize) -> String;

    /// Renders a field type into the column type used by the dialect.
    fn render_data_type(&self, field_type: FieldType) -> String;

    /// Returns the name of the dialect (e.g., "SQLite", "PostgreSQL").
    fn name(&self) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn quote_identifier(&self, ident: &str) -> String {
        format!(r#""{}""#, ident.replace('"', "\"\""))
    }

    fn get_placeholder(&self, index: usize) -> String {
        format!("?{}", index + 1)
    }

    fn render_data_type(&self, field_type: FieldType) -> String {
        field_type.sql_type().to_string()
    }

    fn name(&self) -> String {
        "SQLite".into()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn quote_identifier(&self, ident: &str) -> String {
        format!(r#""{}""#, ident.replace('"', "\"\""))
    }

    fn get_placeholder(&self, index: usize) -> String {
        format!("${}", index + 1)
    }

    fn render_data_type(&self, field_type: FieldType) -> String {
        match field_type {
            FieldType::Int => "BIGINT",
            FieldType::Float => "DOUBLE PRECISION",
            FieldType::String => "TEXT",
            FieldType::Boolean => "BOOLEAN",
            FieldType::DateTime => "TIMESTAMPTZ",
            FieldType::Uuid => "UUID",
        }
        .to_string()
    }

    fn name(&self) -> String {
        "PostgreSQL".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_one_based() {
        assert_eq!(Sqlite.get_placeholder(0), "?1");
        assert_eq!(Postgres.get_placeholder(2), "$3");
    }

    #[test]
    fn quotes_are_escaped() {
        assert_eq!(Sqlite.quote_identifier(r#"we"ird"#), r#""we""ird""#);
    }
}
