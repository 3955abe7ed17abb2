//! Transpiler test modules.
//!
//! Tests are organized by category:
//! - `core`: operators, literals, precedence, search
//! - `lambdas`: any/all rewriting into ARRAY_CONTAINS, JOIN and EXISTS
//! - `functions`: function names and case-insensitive overloads
//! - `keywords`: reserved-keyword escaping
//! - `clauses`: clause flags, extra predicates and the result parts

mod clauses;
mod lambdas;

use crate::parser::{parse_filter, parse_query};
use crate::transpiler::{TranslateOptions, Translator};

/// Translate a query string with every clause enabled.
fn sql(query: &str) -> String {
    let options = parse_query(query).unwrap();
    Translator::new().translate(&options, TranslateOptions::ALL, None)
}

/// Translate a query string with an extra predicate.
fn sql_with(query: &str, extra: &str) -> String {
    let options = parse_query(query).unwrap();
    Translator::new().translate(&options, TranslateOptions::ALL, Some(extra))
}

/// Translate a bare `$filter` expression.
fn filter(expr: &str) -> String {
    Translator::new().translate_filter(&parse_filter(expr).unwrap()).0
}
