use crate::{
    error::FilterError,
    filter::{
        literal::Literal,
        node::{FieldRef, FilterNode, Quantifier, RelationFilter, RelationRef, ScalarCompare, ScalarOp},
    },
    schema::{Schema, entity::Entity},
};

/// Builds typed filter trees for one entity, checking every field, relation
/// and literal against the schema as it goes.
///
/// ```ignore
/// let b = FilterBuilder::new(&schema, "B")?;
/// let filter = FilterNode::and(vec![
///     b.is_in("fk", vec![1, 2])?,
///     b.eq("date", "2020-09-01")?,
/// ]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FilterBuilder<'a> {
    schema: &'a Schema,
    entity: &'a Entity,
}

impl<'a> FilterBuilder<'a> {
    pub fn new(schema: &'a Schema, entity: &str) -> Result<Self, FilterError> {
        Ok(Self {
            schema,
            entity: schema.resolve_entity(entity)?,
        })
    }

    pub fn entity(&self) -> &'a Entity {
        self.entity
    }

    pub fn compare(
        &self,
        field: &str,
        op: ScalarOp,
        value: impl Into<Literal>,
    ) -> Result<FilterNode, FilterError> {
        let resolved = self.entity.resolve_field(field)?;
        let value = value.into().coerce_operand(self.entity, resolved, op)?;
        Ok(FilterNode::ScalarCompare(ScalarCompare {
            field: FieldRef(field.to_string()),
            op,
            value,
        }))
    }

    pub fn eq(&self, field: &str, value: impl Into<Literal>) -> Result<FilterNode, FilterError> {
        self.compare(field, ScalarOp::Eq, value)
    }

    pub fn neq(&self, field: &str, value: impl Into<Literal>) -> Result<FilterNode, FilterError> {
        self.compare(field, ScalarOp::Neq, value)
    }

    pub fn lt(&self, field: &str, value: impl Into<Literal>) -> Result<FilterNode, FilterError> {
        self.compare(field, ScalarOp::Lt, value)
    }

    pub fn lte(&self, field: &str, value: impl Into<Literal>) -> Result<FilterNode, FilterError> {
        self.compare(field, ScalarOp::Lte, value)
    }

    pub fn gt(&self, field: &str, value: impl Into<Literal>) -> Result<FilterNode, FilterError> {
        self.compare(field, ScalarOp::Gt, value)
    }

    pub fn gte(&self, field: &str, value: impl Into<Literal>) -> Result<FilterNode, FilterError> {
        self.compare(field, ScalarOp::Gte, value)
    }

    pub fn is_in(&self, field: &str, values: impl Into<Literal>) -> Result<FilterNode, FilterError> {
        self.compare(field, ScalarOp::In, values)
    }

    pub fn not_in(
        &self,
        field: &str,
        values: impl Into<Literal>,
    ) -> Result<FilterNode, FilterError> {
        self.compare(field, ScalarOp::NotIn, values)
    }

    /// Filters through `relation`; `inner` receives a builder bound to the
    /// related entity.
    pub fn relation<F>(
        &self,
        relation: &str,
        quantifier: Quantifier,
        inner: F,
    ) -> Result<FilterNode, FilterError>
    where
        F: FnOnce(FilterBuilder<'a>) -> Result<FilterNode, FilterError>,
    {
        let target = self.schema.related_entity(self.entity, relation)?;
        let nested = FilterBuilder {
            schema: self.schema,
            entity: target,
        };
        Ok(FilterNode::RelationFilter(RelationFilter {
            relation: RelationRef(relation.to_string()),
            quantifier,
            inner: Box::new(inner(nested)?),
        }))
    }

    pub fn some<F>(&self, relation: &str, inner: F) -> Result<FilterNode, FilterError>
    where
        F: FnOnce(FilterBuilder<'a>) -> Result<FilterNode, FilterError>,
    {
        self.relation(relation, Quantifier::Some, inner)
    }

    pub fn every<F>(&self, relation: &str, inner: F) -> Result<FilterNode, FilterError>
    where
        F: FnOnce(FilterBuilder<'a>) -> Result<FilterNode, FilterError>,
    {
        self.relation(relation, Quantifier::Every, inner)
    }

    pub fn none<F>(&self, relation: &str, inner: F) -> Result<FilterNode, FilterError>
    where
        F: FnOnce(FilterBuilder<'a>) -> Result<FilterNode, FilterError>,
    {
        self.relation(relation, Quantifier::None, inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{field_type::FieldType, value::Value},
        filter::node::ScalarOperand,
        schema::entity::Field,
    };

    fn schema() -> Schema {
        Schema::builder()
            .entity(
                Entity::new("A")
                    .with_field(Field::required("id", FieldType::Int))
                    .with_primary_key(&["id"]),
            )
            .entity(
                Entity::new("B")
                    .with_field(Field::required("id", FieldType::Int))
                    .with_field(Field::required("date", FieldType::DateTime))
                    .with_field(Field::optional("fk", FieldType::Int))
                    .with_primary_key(&["id"]),
            )
            .one_to_many("A", "bs", "B", Some("a"), &["fk"], &["id"])
            .build()
            .unwrap()
    }

    #[test]
    fn builds_typed_leaves() {
        let schema = schema();
        let b = FilterBuilder::new(&schema, "B").unwrap();

        let node = b.is_in("fk", vec![1, 2]).unwrap();
        assert_eq!(
            node,
            FilterNode::ScalarCompare(ScalarCompare {
                field: FieldRef("fk".into()),
                op: ScalarOp::In,
                value: ScalarOperand::List(vec![Value::Int(1), Value::Int(2)]),
            })
        );
    }

    #[test]
    fn nested_builders_resolve_against_the_related_entity() {
        let schema = schema();
        let a = FilterBuilder::new(&schema, "A").unwrap();

        let node = a.some("bs", |b| b.eq("date", "2020-09-01")).unwrap();
        assert_eq!(node.relation_leaf_count(), 1);

        // `date` lives on B, not A.
        assert!(matches!(
            a.eq("date", "2020-09-01"),
            Err(FilterError::UnknownField { .. })
        ));
        assert!(matches!(
            a.every("cs", |c| c.eq("id", 1)),
            Err(FilterError::UnknownRelation { .. })
        ));
    }

    #[test]
    fn unknown_entity_is_rejected() {
        let schema = schema();
        assert_eq!(
            FilterBuilder::new(&schema, "Z").unwrap_err(),
            FilterError::UnknownEntity("Z".into())
        );
    }
}
