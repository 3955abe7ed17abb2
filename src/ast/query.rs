use serde::{Deserialize, Serialize};

use super::nodes::QueryNode;
use super::operators::OrderDirection;

/// One `$orderby` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub expression: QueryNode,
    pub direction: OrderDirection,
}

impl OrderBy {
    pub fn asc(expression: QueryNode) -> Self {
        Self {
            expression,
            direction: OrderDirection::Ascending,
        }
    }

    pub fn desc(expression: QueryNode) -> Self {
        Self {
            expression,
            direction: OrderDirection::Descending,
        }
    }
}

/// The parsed query options of one request.
///
/// Every part is optional; an absent part yields an empty clause.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// `$filter`
    pub filter: Option<QueryNode>,
    /// `$orderby`, in the order written
    pub order_by: Vec<OrderBy>,
    /// `$select`, raw comma-separated field list
    pub select: Option<String>,
    /// `$top`
    pub top: Option<u64>,
    /// `$search`
    pub search: Option<QueryNode>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, node: QueryNode) -> Self {
        self.filter = Some(node);
        self
    }

    pub fn order_by(mut self, key: OrderBy) -> Self {
        self.order_by.push(key);
        self
    }

    pub fn select(mut self, fields: impl Into<String>) -> Self {
        self.select = Some(fields.into());
        self
    }

    pub fn top(mut self, n: u64) -> Self {
        self.top = Some(n);
        self
    }

    pub fn search(mut self, node: QueryNode) -> Self {
        self.search = Some(node);
        self
    }

    /// The trimmed, non-empty `$select` fields. `*` selects everything.
    pub fn select_fields(&self) -> Vec<&str> {
        self.select
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty() && *f != "*")
                    .collect()
            })
            .unwrap_or_default()
    }
}
