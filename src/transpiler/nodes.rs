//! Node-by-node translation of filter, search and ordering expressions.

use chrono::SecondsFormat;

use crate::ast::{BinaryOperator, Constant, QueryNode, RangeVariable, UnaryOperator};

use super::JoinClause;
use super::casefold;
use super::context::{TranslationContext, Walk};
use super::formatter::QueryFormatter;
use super::geo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Recursive translator over one expression tree.
///
/// Holds the per-call context; create one per translation.
pub struct NodeTranslator<'f, F: QueryFormatter + ?Sized> {
    pub(super) formatter: &'f F,
    pub(super) ctx: TranslationContext,
}

impl<'f, F: QueryFormatter + ?Sized> NodeTranslator<'f, F> {
    pub fn new(formatter: &'f F) -> Self {
        Self {
            formatter,
            ctx: TranslationContext::new(formatter.root_alias())
                .with_reserved(formatter.reserved_words()),
        }
    }

    /// The joins collected so far, in the order they were produced.
    pub fn into_joins(self) -> Vec<JoinClause> {
        self.ctx.into_joins()
    }

    pub fn translate(&mut self, node: &QueryNode, walk: Walk) -> String {
        match node {
            QueryNode::Binary { op, left, right } => self.translate_binary(*op, left, right, walk),
            QueryNode::Unary { op, operand } => self.translate_unary(*op, operand, walk),
            QueryNode::Constant(value) => self.translate_constant(value),
            QueryNode::Convert { source, .. } => self.translate(source, walk),
            QueryNode::Property { source, name }
            | QueryNode::CollectionNavigation { source, name } => {
                self.translate_property(source, name, walk)
            }
            QueryNode::Any {
                source,
                variable,
                body,
            } => self.translate_any(source, variable.as_deref(), body.as_deref(), walk),
            QueryNode::All {
                source,
                variable,
                body,
            } => self.translate_all(source, variable, body, walk),
            QueryNode::FunctionCall {
                name,
                source,
                arguments,
            } => self.translate_function(name, source.as_deref(), arguments, walk),
            QueryNode::RangeVariable(RangeVariable::Implicit) => String::new(),
            QueryNode::RangeVariable(RangeVariable::Named(name)) => {
                self.ctx.lookup(name).unwrap_or(name.as_str()).to_string()
            }
            QueryNode::SearchTerm(text) => text.clone(),
        }
    }

    /// The operator a node renders as, if it renders as one.
    ///
    /// A lambda that becomes a JOIN is replaced by its body inline, so it
    /// takes the body's operator.
    fn rendered_operator(&self, node: &QueryNode, walk: Walk) -> Option<BinaryOperator> {
        match node.unwrap_convert() {
            QueryNode::Binary { op, .. } => Some(*op),
            QueryNode::Any {
                variable: Some(variable),
                body: Some(body),
                ..
            } if !walk.subquery && super::lambda::rewrites_to_join(variable, body) => {
                self.rendered_operator(body, walk)
            }
            _ => None,
        }
    }

    /// Translate one side of a binary operator, parenthesized when the text
    /// would otherwise regroup. Output is read left-associatively, so a right
    /// operand of equal precedence keeps its parentheses unless both
    /// operators are the same associative one.
    fn operand(&mut self, parent: BinaryOperator, node: &QueryNode, side: Side, walk: Walk) -> String {
        let child = self.rendered_operator(node, walk);
        let text = self.translate(node, walk);
        let grouped = child.is_some_and(|child| {
            child.precedence() < parent.precedence()
                || (side == Side::Right
                    && child.precedence() == parent.precedence()
                    && !(child == parent && parent.is_associative()))
        });
        if grouped { format!("({})", text) } else { text }
    }

    fn translate_binary(
        &mut self,
        op: BinaryOperator,
        left: &QueryNode,
        right: &QueryNode,
        walk: Walk,
    ) -> String {
        let left = self.operand(op, left, Side::Left, walk);
        let right = self.operand(op, right, Side::Right, walk);
        format!("{} {} {}", left, self.formatter.binary_operator(op), right)
    }

    fn translate_unary(&mut self, op: UnaryOperator, operand: &QueryNode, walk: Walk) -> String {
        let (keyword, inner) = match op {
            UnaryOperator::Negate => ("-", walk),
            UnaryOperator::Not if walk.search => ("not", walk),
            // A JOIN cannot be negated; lambdas under NOT stay subqueries.
            UnaryOperator::Not => ("NOT", walk.in_subquery()),
        };
        let text = self.translate(operand, inner);
        match operand.unwrap_convert() {
            QueryNode::Constant(_) | QueryNode::SearchTerm(_) => format!("{} {}", keyword, text),
            _ => format!("{}({})", keyword, text),
        }
    }

    fn translate_constant(&self, value: &Constant) -> String {
        match value {
            Constant::Null => "null".to_string(),
            Constant::Boolean(b) => b.to_string(),
            Constant::Number(n) => n.clone(),
            Constant::String(s) => self.formatter.quote_string(s),
            Constant::Enum { type_name, member } => {
                self.formatter.translate_enum_value(type_name, member)
            }
            Constant::Date(date) => self
                .formatter
                .quote_string(&date.format("%Y-%m-%d").to_string()),
            Constant::DateTime(dt) => self
                .formatter
                .quote_string(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Constant::Guid(guid) => self.formatter.quote_string(&guid.to_string()),
            Constant::GeographyPoint(_)
            | Constant::GeographyLineString(_)
            | Constant::GeographyPolygon(_) => {
                // A shape with no positions has no GeoJSON form.
                geo::geojson(value).unwrap_or_else(|| "null".to_string())
            }
        }
    }

    fn translate_property(&mut self, source: &QueryNode, name: &str, walk: Walk) -> String {
        let parent = self.translate(source, walk);
        if parent.is_empty() {
            return self.formatter.translate_field_name(name);
        }
        if self.is_rooted(source) {
            self.formatter.translate_source(&parent, name)
        } else {
            let rooted = self.formatter.translate_field_name(&parent);
            self.formatter.translate_source(&rooted, name)
        }
    }

    /// False only for a lambda variable with no binding in scope.
    fn is_rooted(&self, source: &QueryNode) -> bool {
        match source.unwrap_convert() {
            QueryNode::RangeVariable(RangeVariable::Named(name)) => self.ctx.lookup(name).is_some(),
            _ => true,
        }
    }

    fn translate_function(
        &mut self,
        name: &str,
        source: Option<&QueryNode>,
        arguments: &[QueryNode],
        walk: Walk,
    ) -> String {
        let call = match casefold::match_folded_call(self.formatter, name, arguments) {
            Some(folded) if source.is_none() => {
                let field = self.translate(folded.field, walk);
                let literal = self.translate(folded.literal, walk);
                tracing::trace!(function = name, "case-folding call rewritten to case-insensitive overload");
                self.formatter
                    .translate_case_insensitive_call(name, &field, &literal)
            }
            _ => {
                let args: Vec<String> = arguments
                    .iter()
                    .map(|argument| self.translate(argument, walk))
                    .collect();
                self.formatter.translate_function_call(name, &args)
            }
        };
        match source {
            Some(source) => {
                let path = self.translate(source, walk);
                if path.is_empty() {
                    call
                } else {
                    format!("{}.{}", path, call)
                }
            }
            None => call,
        }
    }
}
