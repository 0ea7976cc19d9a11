//! AND-composition of query conditions.

use sea_orm::sea_query::ConditionExpression;
use sea_orm::{Condition, QueryFilter};

/// Zero or more conditions that must all hold.
///
/// An empty set matches every row. There is no OR composition: callers that
/// need alternatives build one `Condition::any()` and add it as a single
/// predicate.
#[derive(Debug, Clone)]
pub struct Predicates {
    condition: Condition,
    len: usize,
}

impl Default for Predicates {
    fn default() -> Self {
        Self {
            condition: Condition::all(),
            len: 0,
        }
    }
}

impl Predicates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and<C>(mut self, condition: C) -> Self
    where
        C: Into<ConditionExpression>,
    {
        self.condition = self.condition.add(condition);
        self.len += 1;
        self
    }

    /// Add the condition built from `value` when it is present.
    pub fn and_then<T, C, F>(self, value: Option<T>, build: F) -> Self
    where
        C: Into<ConditionExpression>,
        F: FnOnce(T) -> C,
    {
        match value {
            Some(value) => self.and(build(value)),
            None => self,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Filter `query`; a no-op when empty.
    pub fn apply<Q: QueryFilter>(self, query: Q) -> Q {
        if self.is_empty() {
            query
        } else {
            query.filter(self.condition)
        }
    }

    pub fn into_condition(self) -> Condition {
        self.condition
    }
}
