//! # odata-sql
//!
//! > **Stop hand-writing document queries. Translate the OData you already have.**
//!
//! odata-sql compiles OData `$filter`, `$select`, `$orderby` and `$top`
//! trees into the SQL dialect of a schemaless document store.
//!
//! ## Quick Example
//!
//! ```rust
//! use odata_sql::prelude::*;
//!
//! let options = parse_query("$filter=products/any(p: p/name eq 'test')").unwrap();
//! let sql = Translator::new().translate(&options, TranslateOptions::ALL, None);
//! assert_eq!(sql, "SELECT VALUE c FROM c JOIN p IN c.products WHERE p.name = 'test' ");
//! ```
//!
//! ## Rewrites
//!
//! | OData                              | SQL                                   |
//! |------------------------------------|---------------------------------------|
//! | `tags/any(t: t eq 'a')`            | `ARRAY_CONTAINS(c.tags,'a')`          |
//! | `items/any(i: i/qty gt 1)`         | `JOIN i IN c.items WHERE i.qty > 1`   |
//! | `items/any()`                      | `ARRAY_LENGTH(c.items) > 0`           |
//! | `items/all(i: i/qty gt 1)`         | `NOT EXISTS(SELECT VALUE i ...)`      |
//! | `startswith(toupper(n),'A')`       | `STARTSWITH(c.n,'A', true)`           |
//! | `group/id eq 'x'`                  | `c['group'].id = 'x'`                 |

pub mod ast;
pub mod config;
pub mod error;
pub mod parser;
pub mod transpiler;

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::config::{DialectConfig, FunctionMapping};
    pub use crate::error::*;
    pub use crate::parser::{parse_filter, parse_orderby, parse_query, parse_search};
    pub use crate::transpiler::{
        CosmosFormatter, JoinClause, QueryFormatter, TranslateOptions, Translation, Translator,
    };
}

/// Parse a query string and translate every clause with the default dialect.
///
/// # Example
///
/// ```
/// let sql = odata_sql::translate("$select=englishName, id").unwrap();
/// assert_eq!(sql, "SELECT c.englishName, c.id FROM c ");
/// ```
pub fn translate(query: &str) -> error::Result<String> {
    let options = parser::parse_query(query)?;
    Ok(transpiler::Translator::new().translate(&options, transpiler::TranslateOptions::ALL, None))
}
