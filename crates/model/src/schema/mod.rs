use crate::{
    error::{FilterError, SchemaError},
    schema::{builder::SchemaBuilder, entity::Entity, relation::RelationDefinition},
};
use serde::Deserialize;
use std::collections::BTreeMap;

pub mod builder;
pub mod entity;
pub mod relation;

/// Read-only registry of entity definitions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "SchemaDefinition")]
pub struct Schema {
    entities: BTreeMap<String, Entity>,
}

/// Serialized shape of a schema: entities plus relation declarations.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaDefinition {
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relations: Vec<RelationDefinition>,
}

impl TryFrom<SchemaDefinition> for Schema {
    type Error = SchemaError;

    fn try_from(def: SchemaDefinition) -> Result<Self, Self::Error> {
        let builder = def
            .entities
            .into_iter()
            .fold(SchemaBuilder::new(), |b, entity| b.entity(entity));
        def.relations
            .into_iter()
            .fold(builder, |b, rel| b.relation(rel))
            .build()
    }
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    pub(crate) fn from_entities(entities: BTreeMap<String, Entity>) -> Self {
        Self { entities }
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    pub fn resolve_entity(&self, name: &str) -> Result<&Entity, FilterError> {
        self.entity(name)
            .ok_or_else(|| FilterError::UnknownEntity(name.to_string()))
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Resolves `relation` on `entity` and returns the related entity.
    pub fn related_entity(&self, entity: &Entity, relation: &str) -> Result<&Entity, FilterError> {
        let relation = entity.resolve_relation(relation)?;
        self.resolve_entity(&relation.target)
    }
}
