use serde::{Deserialize, Serialize};

use super::operators::{BinaryOperator, UnaryOperator};
use super::values::Constant;

/// A range variable a path can start from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeVariable {
    /// The implicit `$it` variable bound to the whole document.
    Implicit,
    /// A variable introduced by an `any`/`all` lambda.
    Named(String),
}

/// A node of a parsed OData expression.
///
/// The set of variants is closed; translators match on it exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryNode {
    Binary {
        op: BinaryOperator,
        left: Box<QueryNode>,
        right: Box<QueryNode>,
    },
    Unary {
        op: UnaryOperator,
        operand: Box<QueryNode>,
    },
    Constant(Constant),
    /// Implicit type widening inserted by the parser (`Edm.Int32` to `Edm.Int64`, ...)
    Convert {
        source: Box<QueryNode>,
        target_type: String,
    },
    /// Single-valued or collection-valued property access: `source/name`
    Property {
        source: Box<QueryNode>,
        name: String,
    },
    /// Navigation to a related collection: `source/name`
    CollectionNavigation {
        source: Box<QueryNode>,
        name: String,
    },
    /// `source/any()` or `source/any(var: body)`
    Any {
        source: Box<QueryNode>,
        variable: Option<String>,
        body: Option<Box<QueryNode>>,
    },
    /// `source/all(var: body)`
    All {
        source: Box<QueryNode>,
        variable: String,
        body: Box<QueryNode>,
    },
    FunctionCall {
        name: String,
        /// Bound functions are invoked on a source path.
        source: Option<Box<QueryNode>>,
        arguments: Vec<QueryNode>,
    },
    RangeVariable(RangeVariable),
    /// A free-text `$search` term.
    SearchTerm(String),
}

impl QueryNode {
    pub fn binary(op: BinaryOperator, left: QueryNode, right: QueryNode) -> Self {
        QueryNode::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOperator, operand: QueryNode) -> Self {
        QueryNode::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn not(operand: QueryNode) -> Self {
        Self::unary(UnaryOperator::Not, operand)
    }

    pub fn eq(left: QueryNode, right: QueryNode) -> Self {
        Self::binary(BinaryOperator::Equal, left, right)
    }

    pub fn and(left: QueryNode, right: QueryNode) -> Self {
        Self::binary(BinaryOperator::And, left, right)
    }

    pub fn or(left: QueryNode, right: QueryNode) -> Self {
        Self::binary(BinaryOperator::Or, left, right)
    }

    pub fn constant(value: Constant) -> Self {
        QueryNode::Constant(value)
    }

    pub fn string(value: impl Into<String>) -> Self {
        QueryNode::Constant(Constant::string(value))
    }

    pub fn number(value: impl ToString) -> Self {
        QueryNode::Constant(Constant::number(value))
    }

    pub fn null() -> Self {
        QueryNode::Constant(Constant::Null)
    }

    pub fn convert(source: QueryNode, target_type: impl Into<String>) -> Self {
        QueryNode::Convert {
            source: Box::new(source),
            target_type: target_type.into(),
        }
    }

    /// The implicit root variable.
    pub fn root() -> Self {
        QueryNode::RangeVariable(RangeVariable::Implicit)
    }

    /// A lambda variable reference.
    pub fn variable(name: impl Into<String>) -> Self {
        QueryNode::RangeVariable(RangeVariable::Named(name.into()))
    }

    pub fn property(source: QueryNode, name: impl Into<String>) -> Self {
        QueryNode::Property {
            source: Box::new(source),
            name: name.into(),
        }
    }

    /// Build a property path from the implicit root: `field("a/b/c")`.
    pub fn field(path: &str) -> Self {
        Self::path_from(Self::root(), path)
    }

    /// Build a property path starting at `source`, one segment per `/`.
    pub fn path_from(source: QueryNode, path: &str) -> Self {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(source, |node, segment| Self::property(node, segment.trim()))
    }

    pub fn collection(source: QueryNode, name: impl Into<String>) -> Self {
        QueryNode::CollectionNavigation {
            source: Box::new(source),
            name: name.into(),
        }
    }

    pub fn any(source: QueryNode, variable: impl Into<String>, body: QueryNode) -> Self {
        QueryNode::Any {
            source: Box::new(source),
            variable: Some(variable.into()),
            body: Some(Box::new(body)),
        }
    }

    /// `source/any()`: the collection is not empty.
    pub fn any_element(source: QueryNode) -> Self {
        QueryNode::Any {
            source: Box::new(source),
            variable: None,
            body: None,
        }
    }

    pub fn all(source: QueryNode, variable: impl Into<String>, body: QueryNode) -> Self {
        QueryNode::All {
            source: Box::new(source),
            variable: variable.into(),
            body: Box::new(body),
        }
    }

    pub fn function(name: impl Into<String>, arguments: Vec<QueryNode>) -> Self {
        QueryNode::FunctionCall {
            name: name.into(),
            source: None,
            arguments,
        }
    }

    /// Strip any number of conversion wrappers.
    pub fn unwrap_convert(&self) -> &QueryNode {
        let mut node = self;
        while let QueryNode::Convert { source, .. } = node {
            node = source;
        }
        node
    }

    /// True when this node is a reference to the named lambda variable.
    pub fn is_variable(&self, name: &str) -> bool {
        matches!(
            self.unwrap_convert(),
            QueryNode::RangeVariable(RangeVariable::Named(n)) if n == name
        )
    }

    /// True when the named lambda variable occurs anywhere in this subtree.
    pub fn references_variable(&self, name: &str) -> bool {
        match self {
            QueryNode::Binary { left, right, .. } => {
                left.references_variable(name) || right.references_variable(name)
            }
            QueryNode::Unary { operand, .. } => operand.references_variable(name),
            QueryNode::Constant(_) | QueryNode::SearchTerm(_) => false,
            QueryNode::Convert { source, .. }
            | QueryNode::Property { source, .. }
            | QueryNode::CollectionNavigation { source, .. } => source.references_variable(name),
            QueryNode::Any {
                source,
                variable,
                body,
            } => {
                source.references_variable(name)
                    || (variable.as_deref() != Some(name)
                        && body.as_ref().is_some_and(|b| b.references_variable(name)))
            }
            QueryNode::All {
                source,
                variable,
                body,
            } => source.references_variable(name) || (variable != name && body.references_variable(name)),
            QueryNode::FunctionCall {
                source, arguments, ..
            } => {
                source.as_ref().is_some_and(|s| s.references_variable(name))
                    || arguments.iter().any(|a| a.references_variable(name))
            }
            QueryNode::RangeVariable(RangeVariable::Named(n)) => n == name,
            QueryNode::RangeVariable(RangeVariable::Implicit) => false,
        }
    }
}
