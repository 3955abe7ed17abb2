//! OData expression tree.

pub mod nodes;
pub mod operators;
pub mod query;
pub mod values;

pub use nodes::*;
pub use operators::*;
pub use query::*;
pub use values::*;
