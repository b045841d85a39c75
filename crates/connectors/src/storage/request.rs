use planner::predicate::ast::CompiledPredicate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// One sort key. Ties are always broken by primary key ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    #[serde(default)]
    pub order: SortOrder,
}

impl OrderBy {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            order: SortOrder::Desc,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FindRowsRequest {
    pub entity: String,
    pub predicate: CompiledPredicate,
    pub order_by: Vec<OrderBy>,
    pub skip: usize,
    pub take: Option<usize>,
}

impl FindRowsRequest {
    pub fn builder(entity: &str, predicate: CompiledPredicate) -> FindRowsRequestBuilder {
        FindRowsRequestBuilder::new(entity, predicate)
    }
}

pub struct FindRowsRequestBuilder {
    entity: String,
    predicate: CompiledPredicate,
    order_by: Vec<OrderBy>,
    skip: usize,
    take: Option<usize>,
}

impl FindRowsRequestBuilder {
    pub fn new(entity: &str, predicate: CompiledPredicate) -> Self {
        FindRowsRequestBuilder {
            entity: entity.to_string(),
            predicate,
            order_by: Vec::new(),
            skip: 0,
            take: None,
        }
    }

    pub fn order_by(mut self, order_by: Vec<OrderBy>) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn take(mut self, take: Option<usize>) -> Self {
        self.take = take;
        self
    }

    pub fn build(self) -> FindRowsRequest {
        FindRowsRequest {
            entity: self.entity,
            predicate: self.predicate,
            order_by: self.order_by,
            skip: self.skip,
            take: self.take,
        }
    }
}
