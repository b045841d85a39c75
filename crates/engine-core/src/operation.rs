use connectors::OrderBy;
use model::{filter::node::FilterNode, records::row::FieldValue};

/// Arguments of a read. Without a filter every row matches.
#[derive(Debug, Clone, Default)]
pub struct FindManyArgs {
    pub filter: Option<FilterNode>,
    pub order_by: Vec<OrderBy>,
    pub skip: usize,
    pub take: Option<usize>,
}

impl FindManyArgs {
    pub fn filtered(filter: FilterNode) -> Self {
        Self {
            filter: Some(filter),
            ..Default::default()
        }
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by.push(order_by);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn take(mut self, take: usize) -> Self {
        self.take = Some(take);
        self
    }
}

/// Sets `data` on every `target` row matching `filter`.
#[derive(Debug, Clone)]
pub struct UpdateManyOperation {
    pub target: String,
    pub filter: FilterNode,
    pub data: Vec<FieldValue>,
}

impl UpdateManyOperation {
    pub fn new(target: &str, filter: FilterNode, data: Vec<FieldValue>) -> Self {
        Self {
            target: target.to_string(),
            filter,
            data,
        }
    }
}
