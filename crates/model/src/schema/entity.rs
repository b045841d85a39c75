use crate::{core::field_type::FieldType, error::FilterError, schema::relation::Relation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub nullable: bool,
}

impl Field {
    pub fn required(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            nullable: false,
        }
    }

    pub fn optional(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            nullable: true,
        }
    }
}

/// A set of fields whose combined values must be unique per row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UniqueConstraint {
    pub name: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub name: String,
    pub fields: Vec<Field>,
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub unique_constraints: Vec<UniqueConstraint>,
    /// Populated by the schema builder from relation definitions.
    #[serde(default, skip_deserializing)]
    pub relations: Vec<Relation>,
}

impl Entity {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: Vec::new(),
            primary_key: Vec::new(),
            unique_constraints: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_primary_key(mut self, fields: &[&str]) -> Self {
        self.primary_key = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Adds a composite unique constraint named `<Entity>_<f1>_<f2>_key`.
    pub fn with_unique(mut self, fields: &[&str]) -> Self {
        let name = format!("{}_{}_key", self.name, fields.join("_"));
        self.unique_constraints.push(UniqueConstraint {
            name,
            fields: fields.iter().map(|f| f.to_string()).collect(),
        });
        self
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn resolve_field(&self, name: &str) -> Result<&Field, FilterError> {
        self.field(name).ok_or_else(|| FilterError::UnknownField {
            entity: self.name.clone(),
            field: name.to_string(),
        })
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.name == name)
    }

    pub fn resolve_relation(&self, name: &str) -> Result<&Relation, FilterError> {
        self.relation(name).ok_or_else(|| FilterError::UnknownRelation {
            entity: self.name.clone(),
            relation: name.to_string(),
        })
    }

    pub fn primary_key_constraint_name(&self) -> String {
        format!("{}_pkey", self.name)
    }

    /// Every uniqueness rule of the entity, primary key first.
    pub fn all_unique_constraints(&self) -> Vec<UniqueConstraint> {
        let mut constraints = Vec::with_capacity(self.unique_constraints.len() + 1);
        constraints.push(UniqueConstraint {
            name: self.primary_key_constraint_name(),
            fields: self.primary_key.clone(),
        });
        constraints.extend(self.unique_constraints.iter().cloned());
        constraints
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }
}
