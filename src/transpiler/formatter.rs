//! Dialect formatting.
//!
//! The node translator decides *what* to emit; a `QueryFormatter` decides
//! how names, literals and functions are spelled. Formatters are stateless:
//! the join-alias counter lives in the per-call translation context.

use crate::ast::BinaryOperator;
use crate::config::{DialectConfig, FunctionMapping};

use super::JoinClause;
use super::keywords::KeywordEscaper;

/// Trait for dialect-specific query text generation.
pub trait QueryFormatter {
    /// Alias of the root document (`c`).
    fn root_alias(&self) -> &str;

    /// One member access appended to a path: `.name` or `['name']`.
    fn member(&self, name: &str) -> String;

    /// Quote a string literal.
    fn quote_string(&self, value: &str) -> String;

    /// Property names that need escaping; never handed out as aliases.
    fn reserved_words(&self) -> &[String] {
        &[]
    }

    /// The dialect spelling of an OData function.
    fn function_mapping(&self, name: &str) -> FunctionMapping {
        FunctionMapping::Name(name.to_uppercase())
    }

    /// True when `outer(fold(x), 'lit')` has a case-insensitive overload.
    fn folds_case(&self, outer: &str, fold: &str) -> bool {
        matches!(outer, "contains" | "startswith" | "endswith")
            && matches!(fold, "toupper" | "tolower")
    }

    /// `name` => `c.name`
    fn translate_field_name(&self, name: &str) -> String {
        format!("{}{}", self.root_alias(), self.member(name.trim()))
    }

    /// Compose a parent path and a child property: `c.parent` + `child`.
    fn translate_source(&self, parent: &str, child: &str) -> String {
        format!("{}{}", parent.trim(), self.member(child.trim()))
    }

    /// Enum literal without its namespace: `Ns.Color'Red'` => `'Red'`
    fn translate_enum_value(&self, _type_name: &str, member: &str) -> String {
        self.quote_string(member.trim())
    }

    /// Render a call with already-translated arguments.
    fn translate_function_call(&self, name: &str, arguments: &[String]) -> String {
        let args = arguments.join(",");
        match self.function_mapping(name) {
            FunctionMapping::Name(function) => format!("{}({})", function, args),
            FunctionMapping::Nested(chain) => chain
                .iter()
                .rev()
                .fold(args, |inner, function| format!("{}({})", function, inner)),
        }
    }

    /// `STARTSWITH(c.name,'lit', true)`
    fn translate_case_insensitive_call(&self, name: &str, field: &str, literal: &str) -> String {
        let arguments = [field.to_string(), format!("{}, true", literal)];
        self.translate_function_call(name, &arguments)
    }

    fn binary_operator(&self, op: BinaryOperator) -> &'static str {
        match op {
            BinaryOperator::Or => "OR",
            BinaryOperator::And => "AND",
            BinaryOperator::Equal | BinaryOperator::Has => "=",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
        }
    }

    /// Array membership test.
    fn array_contains(&self, collection: &str, value: &str) -> String {
        format!("ARRAY_CONTAINS({},{})", collection, value)
    }

    /// Non-empty array test.
    fn array_not_empty(&self, collection: &str) -> String {
        format!("ARRAY_LENGTH({}) > 0", collection)
    }

    /// Correlated existence subquery over one collection.
    fn exists(&self, alias: &str, collection: &str, predicate: &str) -> String {
        format!(
            "EXISTS(SELECT VALUE {0} FROM {0} IN {1} WHERE {2})",
            alias, collection, predicate
        )
    }

    /// Universal quantifier over one collection.
    fn for_all(&self, alias: &str, collection: &str, predicate: &str) -> String {
        format!(
            "NOT EXISTS(SELECT VALUE {0} FROM {0} IN {1} WHERE NOT ({2}))",
            alias, collection, predicate
        )
    }

    fn join_clause(&self, join: &JoinClause) -> String {
        format!("JOIN {} IN {}", join.alias, join.source)
    }
}

/// Cosmos-DB-style SQL formatter driven by a `DialectConfig`.
#[derive(Debug, Clone)]
pub struct CosmosFormatter {
    config: DialectConfig,
    escaper: KeywordEscaper,
}

impl CosmosFormatter {
    pub fn new(config: DialectConfig) -> Self {
        let escaper = KeywordEscaper::from_config(&config);
        Self { config, escaper }
    }

    pub fn config(&self) -> &DialectConfig {
        &self.config
    }

    pub fn escaper(&self) -> &KeywordEscaper {
        &self.escaper
    }
}

impl Default for CosmosFormatter {
    fn default() -> Self {
        Self::new(DialectConfig::default())
    }
}

impl QueryFormatter for CosmosFormatter {
    fn root_alias(&self) -> &str {
        &self.config.root_alias
    }

    fn member(&self, name: &str) -> String {
        self.escaper.segment(name)
    }

    fn reserved_words(&self) -> &[String] {
        self.escaper.words()
    }

    fn quote_string(&self, value: &str) -> String {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
    }

    fn function_mapping(&self, name: &str) -> FunctionMapping {
        self.config
            .functions
            .get(name)
            .cloned()
            .unwrap_or_else(|| FunctionMapping::Name(name.to_uppercase()))
    }

    fn folds_case(&self, outer: &str, fold: &str) -> bool {
        self.config.case_insensitive_functions.iter().any(|f| f == outer)
            && self.config.case_fold_functions.iter().any(|f| f == fold)
    }
}
