//! Case-insensitive string predicate detection.
//!
//! `startswith(toupper(name),'MICROSOFT')` folds the field only to compare
//! it ignoring case. The dialect has a direct overload for that,
//! `STARTSWITH(c.name,'MICROSOFT', true)`, which also keeps the field
//! usable by the index.

use crate::ast::{Constant, QueryNode};

use super::formatter::QueryFormatter;

/// The unfolded field and the literal of a case-insensitive call.
#[derive(Debug, PartialEq)]
pub struct FoldedCall<'n> {
    pub field: &'n QueryNode,
    pub literal: &'n QueryNode,
}

/// Match `outer(fold(field), 'literal')` where the formatter has an
/// overload for the pair.
pub fn match_folded_call<'n, F: QueryFormatter + ?Sized>(
    formatter: &F,
    name: &str,
    arguments: &'n [QueryNode],
) -> Option<FoldedCall<'n>> {
    let [first, literal] = arguments else {
        return None;
    };
    let QueryNode::FunctionCall {
        name: fold,
        source: None,
        arguments: inner,
    } = first.unwrap_convert()
    else {
        return None;
    };
    let [field] = inner.as_slice() else {
        return None;
    };
    if !matches!(literal.unwrap_convert(), QueryNode::Constant(Constant::String(_))) {
        return None;
    }
    formatter
        .folds_case(name, fold)
        .then_some(FoldedCall { field, literal })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transpiler::formatter::CosmosFormatter;

    fn call(name: &str, args: Vec<QueryNode>) -> QueryNode {
        QueryNode::function(name, args)
    }

    #[test]
    fn test_matches_folded_predicate() {
        let f = CosmosFormatter::default();
        let args = vec![
            call("toupper", vec![QueryNode::field("englishName")]),
            QueryNode::string("MICROSOFT"),
        ];
        let folded = match_folded_call(&f, "startswith", &args).unwrap();
        assert_eq!(folded.field, &QueryNode::field("englishName"));
    }

    #[test]
    fn test_plain_call_not_matched() {
        let f = CosmosFormatter::default();
        let args = vec![QueryNode::field("englishName"), QueryNode::string("randoM")];
        assert!(match_folded_call(&f, "startswith", &args).is_none());
    }

    #[test]
    fn test_unrelated_outer_not_matched() {
        let f = CosmosFormatter::default();
        let args = vec![
            call("tolower", vec![QueryNode::field("englishName")]),
            QueryNode::string("x"),
        ];
        assert!(match_folded_call(&f, "concat", &args).is_none());
    }

    #[test]
    fn test_non_literal_second_argument_not_matched() {
        let f = CosmosFormatter::default();
        let args = vec![
            call("tolower", vec![QueryNode::field("a")]),
            QueryNode::field("b"),
        ];
        assert!(match_folded_call(&f, "contains", &args).is_none());
    }
}
