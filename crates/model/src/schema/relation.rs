use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Cardinality {
    /// Parent side: the foreign key lives on the related (child) rows.
    OneToMany,
    /// Child side: the foreign key lives on this entity.
    ManyToOne,
}

/// One column pair of a relation join: `remote = local`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelationLink {
    pub local: String,
    pub remote: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Relation {
    pub name: String,
    pub target: String,
    pub cardinality: Cardinality,
    pub links: Vec<RelationLink>,
}

impl Relation {
    pub fn local_fields(&self) -> impl Iterator<Item = &str> {
        self.links.iter().map(|l| l.local.as_str())
    }

    pub fn remote_fields(&self) -> impl Iterator<Item = &str> {
        self.links.iter().map(|l| l.remote.as_str())
    }
}

/// A foreign-key backed one-to-many relation as declared by a schema author.
///
/// `fields` live on the child and reference `references` on the parent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelationDefinition {
    pub parent: String,
    pub name: String,
    pub child: String,
    #[serde(default)]
    pub back_relation: Option<String>,
    pub fields: Vec<String>,
    pub references: Vec<String>,
}
