use crate::{
    error::SchemaError,
    schema::{
        Schema,
        entity::Entity,
        relation::{Cardinality, Relation, RelationDefinition, RelationLink},
    },
};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    entities: Vec<Entity>,
    relations: Vec<RelationDefinition>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn relation(mut self, relation: RelationDefinition) -> Self {
        self.relations.push(relation);
        self
    }

    /// Declares `parent.relation` as the one-to-many side of a foreign key
    /// from `child.fields` to `parent.references`; `back_relation` names the
    /// many-to-one side on the child.
    pub fn one_to_many(
        self,
        parent: &str,
        relation: &str,
        child: &str,
        back_relation: Option<&str>,
        fields: &[&str],
        references: &[&str],
    ) -> Self {
        self.relation(RelationDefinition {
            parent: parent.to_string(),
            name: relation.to_string(),
            child: child.to_string(),
            back_relation: back_relation.map(str::to_string),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            references: references.iter().map(|f| f.to_string()).collect(),
        })
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut entities = BTreeMap::new();
        for entity in self.entities {
            validate_entity(&entity)?;
            if entities.contains_key(&entity.name) {
                return Err(SchemaError::DuplicateEntity(entity.name));
            }
            entities.insert(entity.name.clone(), entity);
        }

        for def in self.relations {
            attach_relation(&mut entities, def)?;
        }

        Ok(Schema::from_entities(entities))
    }
}

fn validate_entity(entity: &Entity) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for field in &entity.fields {
        if !seen.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateField {
                entity: entity.name.clone(),
                field: field.name.clone(),
            });
        }
    }

    if entity.primary_key.is_empty() {
        return Err(SchemaError::MissingPrimaryKey(entity.name.clone()));
    }

    for constraint in entity.all_unique_constraints() {
        if constraint.fields.is_empty() {
            return Err(SchemaError::EmptyConstraint {
                entity: entity.name.clone(),
                constraint: constraint.name,
            });
        }
        if let Some(missing) = constraint
            .fields
            .iter()
            .find(|f| entity.field(f).is_none())
        {
            return Err(SchemaError::UnknownConstraintField {
                entity: entity.name.clone(),
                constraint: constraint.name.clone(),
                field: missing.clone(),
            });
        }
    }

    if let Some(field) = entity
        .fields
        .iter()
        .find(|f| f.nullable && entity.primary_key.contains(&f.name))
    {
        return Err(SchemaError::NullablePrimaryKey {
            entity: entity.name.clone(),
            field: field.name.clone(),
        });
    }

    Ok(())
}

fn attach_relation(
    entities: &mut BTreeMap<String, Entity>,
    def: RelationDefinition,
) -> Result<(), SchemaError> {
    let invalid = |reason: String| SchemaError::InvalidRelation {
        entity: def.parent.clone(),
        relation: def.name.clone(),
        reason,
    };

    let parent = entities
        .get(&def.parent)
        .ok_or_else(|| SchemaError::UnknownRelationTarget {
            entity: def.child.clone(),
            relation: def.back_relation.clone().unwrap_or_default(),
            target: def.parent.clone(),
        })?;
    let child = entities
        .get(&def.child)
        .ok_or_else(|| SchemaError::UnknownRelationTarget {
            entity: def.parent.clone(),
            relation: def.name.clone(),
            target: def.child.clone(),
        })?;

    if def.fields.is_empty() || def.fields.len() != def.references.len() {
        return Err(invalid(format!(
            "{} foreign key field(s) for {} referenced field(s)",
            def.fields.len(),
            def.references.len()
        )));
    }

    for (fk, reference) in def.fields.iter().zip(&def.references) {
        let fk_field = child
            .field(fk)
            .ok_or_else(|| invalid(format!("unknown foreign key field '{}.{fk}'", child.name)))?;
        let ref_field = parent.field(reference).ok_or_else(|| {
            invalid(format!(
                "unknown referenced field '{}.{reference}'",
                parent.name
            ))
        })?;
        if fk_field.field_type != ref_field.field_type {
            return Err(invalid(format!(
                "'{}.{fk}' is {} but '{}.{reference}' is {}",
                child.name, fk_field.field_type, parent.name, ref_field.field_type
            )));
        }
    }

    let forward = Relation {
        name: def.name.clone(),
        target: def.child.clone(),
        cardinality: Cardinality::OneToMany,
        links: def
            .references
            .iter()
            .zip(&def.fields)
            .map(|(local, remote)| RelationLink {
                local: local.clone(),
                remote: remote.clone(),
            })
            .collect(),
    };
    push_relation(entities, &def.parent, forward)?;

    if let Some(back) = &def.back_relation {
        let backward = Relation {
            name: back.clone(),
            target: def.parent.clone(),
            cardinality: Cardinality::ManyToOne,
            links: def
                .fields
                .iter()
                .zip(&def.references)
                .map(|(local, remote)| RelationLink {
                    local: local.clone(),
                    remote: remote.clone(),
                })
                .collect(),
        };
        push_relation(entities, &def.child, backward)?;
    }

    Ok(())
}

fn push_relation(
    entities: &mut BTreeMap<String, Entity>,
    owner: &str,
    relation: Relation,
) -> Result<(), SchemaError> {
    let Some(entity) = entities.get_mut(owner) else {
        return Err(SchemaError::UnknownRelationTarget {
            entity: owner.to_string(),
            relation: relation.name,
            target: owner.to_string(),
        });
    };

    if entity.relation(&relation.name).is_some() || entity.field(&relation.name).is_some() {
        return Err(SchemaError::InvalidRelation {
            entity: owner.to_string(),
            relation: relation.name,
            reason: "name is already used by a field or relation".to_string(),
        });
    }

    entity.relations.push(relation);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::field_type::FieldType, schema::entity::Field};

    fn parent() -> Entity {
        Entity::new("A")
            .with_field(Field::required("id", FieldType::Int))
            .with_primary_key(&["id"])
    }

    fn child() -> Entity {
        Entity::new("B")
            .with_field(Field::required("id", FieldType::Int))
            .with_field(Field::optional("fk", FieldType::Int))
            .with_primary_key(&["id"])
    }

    #[test]
    fn registers_both_sides_of_a_relation() {
        let schema = Schema::builder()
            .entity(parent())
            .entity(child())
            .one_to_many("A", "bs", "B", Some("a"), &["fk"], &["id"])
            .build()
            .unwrap();

        let a = schema.entity("A").unwrap();
        let forward = a.relation("bs").unwrap();
        assert_eq!(forward.cardinality, Cardinality::OneToMany);
        assert_eq!(forward.links[0].local, "id");
        assert_eq!(forward.links[0].remote, "fk");

        let b = schema.entity("B").unwrap();
        let backward = b.relation("a").unwrap();
        assert_eq!(backward.cardinality, Cardinality::ManyToOne);
        assert_eq!(backward.links[0].local, "fk");
        assert_eq!(backward.links[0].remote, "id");
    }

    #[test]
    fn rejects_relation_with_mismatched_key_types() {
        let child = Entity::new("B")
            .with_field(Field::required("id", FieldType::Int))
            .with_field(Field::required("fk", FieldType::String))
            .with_primary_key(&["id"]);

        let err = Schema::builder()
            .entity(parent())
            .entity(child)
            .one_to_many("A", "bs", "B", None, &["fk"], &["id"])
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidRelation { .. }));
    }

    #[test]
    fn rejects_unknown_constraint_fields_and_missing_primary_key() {
        let err = Schema::builder()
            .entity(parent().with_unique(&["missing"]))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownConstraintField { .. }));

        let err = Schema::builder()
            .entity(Entity::new("C").with_field(Field::required("id", FieldType::Int)))
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::MissingPrimaryKey("C".to_string()));
    }

    #[test]
    fn rejects_nullable_primary_key_fields() {
        let err = Schema::builder()
            .entity(
                Entity::new("C")
                    .with_field(Field::optional("id", FieldType::Int))
                    .with_primary_key(&["id"]),
            )
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::NullablePrimaryKey {
                entity: "C".to_string(),
                field: "id".to_string(),
            }
        );
    }

    #[test]
    fn rejects_duplicate_entities() {
        let err = Schema::builder()
            .entity(parent())
            .entity(parent())
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateEntity("A".to_string()));
    }

    #[test]
    fn deserializes_from_definition() {
        let json = r#"{
            "entities": [
                {"name": "A", "fields": [{"name": "id", "field_type": "Int"}], "primary_key": ["id"]},
                {"name": "B", "fields": [
                    {"name": "id", "field_type": "Int"},
                    {"name": "fk", "field_type": "Int", "nullable": true}
                ], "primary_key": ["id"]}
            ],
            "relations": [
                {"parent": "A", "name": "bs", "child": "B", "back_relation": "a",
                 "fields": ["fk"], "references": ["id"]}
            ]
        }"#;

        let schema: Schema = serde_json::from_str(json).unwrap();
        assert!(schema.entity("A").unwrap().relation("bs").is_some());
        assert!(schema.entity("B").unwrap().relation("a").is_some());
    }
}
