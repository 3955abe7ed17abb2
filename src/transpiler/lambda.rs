//! Collection predicate rewriting.
//!
//! `tags/any(t: t eq 'x')` only tests membership and becomes
//! `ARRAY_CONTAINS(c.tags,'x')`. Any other `any` body needs the elements
//! themselves: the collection is unnested with `JOIN t IN c.tags` and the
//! body is emitted inline against the alias. Where a JOIN cannot be used
//! (under `not`, inside `all`) the lambda becomes an `EXISTS` subquery.

use crate::ast::{BinaryOperator, Constant, QueryNode};

use super::JoinClause;
use super::context::Walk;
use super::formatter::QueryFormatter;
use super::nodes::NodeTranslator;

/// The value side of a `var eq value` membership test.
pub fn membership_value<'n>(variable: &str, body: &'n QueryNode) -> Option<&'n QueryNode> {
    let QueryNode::Binary {
        op: BinaryOperator::Equal,
        left,
        right,
    } = body.unwrap_convert()
    else {
        return None;
    };
    if left.is_variable(variable) && !right.references_variable(variable) {
        Some(&**right)
    } else if right.is_variable(variable) && !left.references_variable(variable) {
        Some(&**left)
    } else {
        None
    }
}

fn is_tautology(body: &QueryNode) -> bool {
    matches!(body.unwrap_convert(), QueryNode::Constant(Constant::Boolean(true)))
}

/// True when `source/any(variable: body)` unnests into a JOIN.
pub fn rewrites_to_join(variable: &str, body: &QueryNode) -> bool {
    !is_tautology(body) && membership_value(variable, body).is_none()
}

impl<F: QueryFormatter + ?Sized> NodeTranslator<'_, F> {
    pub(super) fn translate_any(
        &mut self,
        source: &QueryNode,
        variable: Option<&str>,
        body: Option<&QueryNode>,
        walk: Walk,
    ) -> String {
        let collection = self.translate(source, walk);
        let (variable, body) = match (variable, body) {
            (Some(variable), Some(body)) if !is_tautology(body) => (variable, body),
            _ => {
                tracing::trace!(%collection, "any() rewritten to length test");
                return self.formatter.array_not_empty(&collection);
            }
        };

        if let Some(value) = membership_value(variable, body) {
            let value = self.translate(value, walk);
            tracing::trace!(%collection, %value, "any() rewritten to membership test");
            return self.formatter.array_contains(&collection, &value);
        }

        let alias = self.ctx.allocate_alias(variable);
        self.ctx.bind(variable, &alias);
        let text = if walk.subquery {
            tracing::trace!(%collection, %alias, "any() rewritten to EXISTS subquery");
            let predicate = self.translate(body, walk);
            self.formatter.exists(&alias, &collection, &predicate)
        } else {
            tracing::trace!(%collection, %alias, "any() rewritten to JOIN");
            // Outer joins are recorded before the body adds nested ones.
            self.ctx.push_join(JoinClause::new(alias.clone(), collection));
            self.translate(body, walk)
        };
        self.ctx.unbind();
        text
    }

    pub(super) fn translate_all(
        &mut self,
        source: &QueryNode,
        variable: &str,
        body: &QueryNode,
        walk: Walk,
    ) -> String {
        let collection = self.translate(source, walk);
        let alias = self.ctx.allocate_alias(variable);
        self.ctx.bind(variable, &alias);
        let predicate = self.translate(body, walk.in_subquery());
        self.ctx.unbind();
        tracing::trace!(%collection, %alias, "all() rewritten to NOT EXISTS subquery");
        self.formatter.for_all(&alias, &collection, &predicate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_either_side() {
        let body = QueryNode::eq(QueryNode::variable("t"), QueryNode::string("tag1"));
        assert_eq!(membership_value("t", &body), Some(&QueryNode::string("tag1")));

        let body = QueryNode::eq(QueryNode::number(1), QueryNode::variable("t"));
        assert_eq!(membership_value("t", &body), Some(&QueryNode::number(1)));
    }

    #[test]
    fn test_property_body_is_not_membership() {
        let body = QueryNode::eq(
            QueryNode::path_from(QueryNode::variable("p"), "name"),
            QueryNode::string("test"),
        );
        assert_eq!(membership_value("p", &body), None);
        assert!(rewrites_to_join("p", &body));
    }

    #[test]
    fn test_self_comparison_is_not_membership() {
        let body = QueryNode::eq(QueryNode::variable("t"), QueryNode::variable("t"));
        assert_eq!(membership_value("t", &body), None);
    }

    #[test]
    fn test_not_equal_is_not_membership() {
        let body = QueryNode::binary(
            BinaryOperator::NotEqual,
            QueryNode::variable("t"),
            QueryNode::string("a"),
        );
        assert!(rewrites_to_join("t", &body));
    }
}
