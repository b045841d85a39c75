use crate::error::StorageError;
use model::schema::entity::Entity;
use rusqlite::{ErrorCode, ffi};

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
                StorageError::Busy(err.to_string())
            }
            _ => StorageError::Sql(err),
        }
    }
}

/// Maps a failed write on `entity` to the constraint it violated, if any.
pub fn map_write_error(entity: &Entity, err: rusqlite::Error) -> StorageError {
    if let rusqlite::Error::SqliteFailure(failure, Some(message)) = &err {
        match failure.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                if let Some(constraint) = violated_constraint(entity, message) {
                    return StorageError::UniqueViolation {
                        entity: entity.name.clone(),
                        constraint,
                    };
                }
            }
            ffi::SQLITE_CONSTRAINT_NOTNULL => {
                if let Some(field) = failed_columns(message, "NOT NULL constraint failed: ")
                    .and_then(|columns| columns.into_iter().next())
                {
                    return StorageError::NullViolation {
                        entity: entity.name.clone(),
                        field,
                    };
                }
            }
            _ => {}
        }
    }
    err.into()
}

/// SQLite reports `UNIQUE constraint failed: B.fk, B.date`; find the
/// constraint declared over exactly those columns.
fn violated_constraint(entity: &Entity, message: &str) -> Option<String> {
    let mut columns = failed_columns(message, "UNIQUE constraint failed: ")?;
    columns.sort();

    entity
        .all_unique_constraints()
        .into_iter()
        .find(|constraint| {
            let mut fields = constraint.fields.clone();
            fields.sort();
            fields == columns
        })
        .map(|constraint| constraint.name)
}

fn failed_columns(message: &str, prefix: &str) -> Option<Vec<String>> {
    let list = message.strip_prefix(prefix)?;
    Some(
        list.split(", ")
            .map(|column| {
                column
                    .rsplit_once('.')
                    .map_or(column, |(_, name)| name)
                    .to_string()
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{core::field_type::FieldType, schema::entity::Field};

    #[test]
    fn test_unique_messages_name_the_constraint() {
        let entity = Entity::new("B")
            .with_field(Field::required("id", FieldType::Int))
            .with_field(Field::optional("fk", FieldType::Int))
            .with_field(Field::required("date", FieldType::DateTime))
            .with_primary_key(&["id"])
            .with_unique(&["fk", "date"]);

        assert_eq!(
            violated_constraint(&entity, "UNIQUE constraint failed: B.fk, B.date").as_deref(),
            Some("B_fk_date_key")
        );
        assert_eq!(
            violated_constraint(&entity, "UNIQUE constraint failed: B.id").as_deref(),
            Some("B_pkey")
        );
        assert_eq!(violated_constraint(&entity, "disk I/O error"), None);
    }
}
