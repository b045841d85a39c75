use model::schema::entity::Entity;
use planner::{
    query::{
        ast::{
            create_index::CreateIndex,
            create_table::{ColumnDef, CreateTable, TableConstraint},
        },
        dialect::Dialect,
        renderer::render,
    },
    table_ref,
};

/// `CREATE TABLE` for `entity` followed by one unique index per declared
/// unique constraint, each named after its constraint.
pub fn create_statements(entity: &Entity, dialect: &dyn Dialect) -> Vec<String> {
    let table = CreateTable {
        table: table_ref!(entity.name),
        columns: entity
            .fields
            .iter()
            .map(|field| ColumnDef {
                name: field.name.clone(),
                data_type: dialect.render_data_type(field.field_type),
                is_nullable: field.nullable,
            })
            .collect(),
        constraints: vec![TableConstraint::PrimaryKey {
            name: Some(entity.primary_key_constraint_name()),
            columns: entity.primary_key.clone(),
        }],
        if_not_exists: true,
    };

    let indexes = entity.unique_constraints.iter().map(|constraint| CreateIndex {
        name: constraint.name.clone(),
        table: table_ref!(entity.name),
        columns: constraint.fields.clone(),
        unique: true,
        if_not_exists: true,
    });

    std::iter::once(render(&table, dialect).0)
        .chain(indexes.map(|index| render(&index, dialect).0))
        .collect()
}
