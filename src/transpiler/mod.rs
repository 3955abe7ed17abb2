//! OData to document-store SQL transpiler.
//!
//! [`Translator`] assembles the clauses; [`nodes::NodeTranslator`] walks one
//! expression tree; the [`formatter::QueryFormatter`] decides how names,
//! literals and functions are spelled in the target dialect.

pub mod casefold;
pub mod context;
pub mod formatter;
pub mod geo;
pub mod keywords;
pub mod lambda;
pub mod nodes;

#[cfg(test)]
mod tests;

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ast::{OrderBy, OrderDirection, QueryNode, QueryOptions};
use crate::config::DialectConfig;
use crate::error::{Error, Result};

use context::Walk;
pub use formatter::{CosmosFormatter, QueryFormatter};
pub use keywords::KeywordEscaper;
use nodes::NodeTranslator;

/// Which clauses to emit. Combine with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TranslateOptions(u8);

impl TranslateOptions {
    pub const NONE: Self = Self(0);
    pub const SELECT: Self = Self(1);
    pub const WHERE: Self = Self(1 << 1);
    pub const ORDERBY: Self = Self(1 << 2);
    pub const TOP: Self = Self(1 << 3);
    /// Joins are emitted whenever WHERE produces them; the bit is accepted
    /// so callers can spell it.
    pub const JOIN: Self = Self(1 << 4);
    pub const ALL: Self = Self(Self::SELECT.0 | Self::WHERE.0 | Self::ORDERBY.0 | Self::TOP.0);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for TranslateOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for TranslateOptions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for TranslateOptions {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

/// Parses a comma-separated clause list: `select,where,orderby,top`.
impl FromStr for TranslateOptions {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut options = Self::NONE;
        for name in s.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            options |= match name.to_ascii_lowercase().as_str() {
                "select" => Self::SELECT,
                "where" | "filter" => Self::WHERE,
                "orderby" | "order_by" => Self::ORDERBY,
                "top" => Self::TOP,
                "join" => Self::JOIN,
                "all" => Self::ALL,
                _ => return Err(Error::invalid("clauses", name)),
            };
        }
        Ok(options)
    }
}

/// One collection unnesting: `JOIN alias IN source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinClause {
    pub alias: String,
    pub source: String,
}

impl JoinClause {
    pub fn new(alias: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            source: source.into(),
        }
    }
}

/// Clause-by-clause result of one translation.
///
/// Clause texts carry no trailing space; `Display` joins the non-empty
/// ones, each followed by a single space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub select: String,
    pub joins: Vec<JoinClause>,
    /// Rendered `JOIN ... IN ...` clauses.
    pub join: String,
    pub where_clause: String,
    pub order_by: String,
    /// Positive `$top`, for the caller's page size.
    pub item_limit: Option<u64>,
}

impl fmt::Display for Translation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for clause in [&self.select, &self.join, &self.where_clause, &self.order_by] {
            if !clause.is_empty() {
                write!(f, "{} ", clause)?;
            }
        }
        Ok(())
    }
}

/// Translates parsed query options into dialect SQL.
///
/// Holds no per-call state, so one translator can serve many threads.
#[derive(Debug, Clone, Default)]
pub struct Translator<F: QueryFormatter = CosmosFormatter> {
    formatter: F,
}

impl Translator<CosmosFormatter> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DialectConfig) -> Self {
        Self::with_formatter(CosmosFormatter::new(config))
    }
}

impl<F: QueryFormatter> Translator<F> {
    pub fn with_formatter(formatter: F) -> Self {
        Self { formatter }
    }

    pub fn formatter(&self) -> &F {
        &self.formatter
    }

    /// Translate to query text.
    pub fn translate(
        &self,
        options: &QueryOptions,
        clauses: TranslateOptions,
        extra_where: Option<&str>,
    ) -> String {
        self.translate_parts(options, clauses, extra_where).to_string()
    }

    /// Translate to query text plus the item-count limit taken from `$top`.
    pub fn translate_with_limit(
        &self,
        options: &QueryOptions,
        clauses: TranslateOptions,
        extra_where: Option<&str>,
    ) -> (String, Option<u64>) {
        let parts = self.translate_parts(options, clauses, extra_where);
        (parts.to_string(), parts.item_limit)
    }

    /// Translate clause by clause.
    ///
    /// Covers `$select`, `$filter`, `$orderby` and `$top`. The dialect has
    /// no full-text clause, so `$search` is left out of the text; render it
    /// with [`Translator::translate_search`].
    pub fn translate_parts(
        &self,
        options: &QueryOptions,
        clauses: TranslateOptions,
        extra_where: Option<&str>,
    ) -> Translation {
        tracing::debug!(
            clauses = clauses.bits(),
            has_filter = options.filter.is_some(),
            order_keys = options.order_by.len(),
            "translating query options"
        );
        let root = self.formatter.root_alias();
        let mut out = Translation {
            item_limit: options.top.filter(|n| *n > 0),
            ..Translation::default()
        };

        let fields = options.select_fields();
        let mut projection = if fields.is_empty() {
            None
        } else {
            let columns: Vec<String> = fields
                .iter()
                .map(|field| self.project(field))
                .collect();
            Some(columns.join(", "))
        };

        if clauses.contains(TranslateOptions::WHERE) {
            let (filter, joins) = match &options.filter {
                Some(node) => self.translate_filter(node),
                None => (String::new(), Vec::new()),
            };
            let extra = extra_where.map(str::trim).filter(|e| !e.is_empty());
            let predicate = match (extra, filter.is_empty()) {
                (Some(extra), false) => format!("({}) AND ({})", extra, filter),
                (Some(extra), true) => extra.to_string(),
                (None, _) => filter,
            };
            if !predicate.is_empty() {
                out.where_clause = format!("WHERE {}", predicate);
            }
            if !joins.is_empty() && projection.is_none() {
                projection = Some(format!("VALUE {}", root));
            }
            out.join = joins
                .iter()
                .map(|join| self.formatter.join_clause(join))
                .collect::<Vec<_>>()
                .join(" ");
            out.joins = joins;
        }

        if clauses.contains(TranslateOptions::SELECT) {
            let top = match options.top {
                Some(n) if n > 0 && clauses.contains(TranslateOptions::TOP) => format!("TOP {} ", n),
                _ => String::new(),
            };
            let projection = projection.unwrap_or_else(|| "*".to_string());
            out.select = format!("SELECT {}{} FROM {}", top, projection, root);
        }

        if clauses.contains(TranslateOptions::ORDERBY) && !options.order_by.is_empty() {
            out.order_by = format!("ORDER BY {}", self.translate_order_by(&options.order_by));
        }

        tracing::debug!(
            joins = out.joins.len(),
            item_limit = ?out.item_limit,
            "translation finished"
        );
        out
    }

    /// Translate a `$filter` tree into a predicate and the joins it needs.
    pub fn translate_filter(&self, node: &QueryNode) -> (String, Vec<JoinClause>) {
        let mut translator = NodeTranslator::new(&self.formatter);
        let text = translator.translate(node, Walk::default());
        (text, translator.into_joins())
    }

    /// Translate a `$search` tree.
    pub fn translate_search(&self, node: &QueryNode) -> String {
        NodeTranslator::new(&self.formatter).translate(node, Walk::search())
    }

    /// Translate `$orderby` keys: `c.a DESC, c.b ASC`.
    pub fn translate_order_by(&self, keys: &[OrderBy]) -> String {
        let mut translator = NodeTranslator::new(&self.formatter);
        keys.iter()
            .map(|key| {
                let direction = match key.direction {
                    OrderDirection::Ascending => "ASC",
                    OrderDirection::Descending => "DESC",
                };
                format!("{} {}", translator.translate(&key.expression, Walk::default()), direction)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// One `$select` field: `a/b` or `a.b` => `c.a.b`, reserved words escaped.
    fn project(&self, field: &str) -> String {
        field
            .split(['/', '.'])
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .fold(self.formatter.root_alias().to_string(), |path, segment| {
                self.formatter.translate_source(&path, segment)
            })
    }
}
