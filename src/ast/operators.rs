use serde::{Deserialize, Serialize};

/// Binary operators of the filter grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    Or,
    And,
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    /// Enum flag test (`has`)
    Has,
}

impl BinaryOperator {
    /// Binding strength, lowest first: or, and, comparisons, additive,
    /// multiplicative, has.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Or => 1,
            BinaryOperator::And => 2,
            BinaryOperator::Equal
            | BinaryOperator::NotEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::GreaterThanOrEqual
            | BinaryOperator::LessThan
            | BinaryOperator::LessThanOrEqual => 3,
            BinaryOperator::Add | BinaryOperator::Subtract => 4,
            BinaryOperator::Multiply | BinaryOperator::Divide | BinaryOperator::Modulo => 5,
            BinaryOperator::Has => 6,
        }
    }

    /// True when `a op (b op c)` equals `(a op b) op c`, so a right
    /// operand using the same operator needs no parentheses.
    pub fn is_associative(self) -> bool {
        matches!(
            self,
            BinaryOperator::Or | BinaryOperator::And | BinaryOperator::Add | BinaryOperator::Multiply
        )
    }

    /// The OData keyword for this operator.
    pub fn keyword(self) -> &'static str {
        match self {
            BinaryOperator::Or => "or",
            BinaryOperator::And => "and",
            BinaryOperator::Equal => "eq",
            BinaryOperator::NotEqual => "ne",
            BinaryOperator::GreaterThan => "gt",
            BinaryOperator::GreaterThanOrEqual => "ge",
            BinaryOperator::LessThan => "lt",
            BinaryOperator::LessThanOrEqual => "le",
            BinaryOperator::Add => "add",
            BinaryOperator::Subtract => "sub",
            BinaryOperator::Multiply => "mul",
            BinaryOperator::Divide => "div",
            BinaryOperator::Modulo => "mod",
            BinaryOperator::Has => "has",
        }
    }

    /// Look up an operator by its OData keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let op = match keyword {
            "or" => BinaryOperator::Or,
            "and" => BinaryOperator::And,
            "eq" => BinaryOperator::Equal,
            "ne" => BinaryOperator::NotEqual,
            "gt" => BinaryOperator::GreaterThan,
            "ge" => BinaryOperator::GreaterThanOrEqual,
            "lt" => BinaryOperator::LessThan,
            "le" => BinaryOperator::LessThanOrEqual,
            "add" => BinaryOperator::Add,
            "sub" => BinaryOperator::Subtract,
            "mul" => BinaryOperator::Multiply,
            "div" => BinaryOperator::Divide,
            "mod" => BinaryOperator::Modulo,
            "has" => BinaryOperator::Has,
            _ => return None,
        };
        Some(op)
    }

    pub fn is_comparison(self) -> bool {
        self.precedence() == 3
    }
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Unary operators of the filter grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    /// Arithmetic negation (`-x`)
    Negate,
    /// Logical negation (`not x`)
    Not,
}

impl std::fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOperator::Negate => write!(f, "-"),
            UnaryOperator::Not => write!(f, "not"),
        }
    }
}

/// Sort direction of an `$orderby` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderDirection {
    #[default]
    Ascending,
    Descending,
}

impl std::fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderDirection::Ascending => write!(f, "asc"),
            OrderDirection::Descending => write!(f, "desc"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_order() {
        assert!(BinaryOperator::Or.precedence() < BinaryOperator::And.precedence());
        assert!(BinaryOperator::And.precedence() < BinaryOperator::Equal.precedence());
        assert!(BinaryOperator::Equal.precedence() < BinaryOperator::Add.precedence());
        assert!(BinaryOperator::Add.precedence() < BinaryOperator::Multiply.precedence());
        assert!(BinaryOperator::Modulo.precedence() < BinaryOperator::Has.precedence());
    }

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(BinaryOperator::from_keyword("ge"), Some(BinaryOperator::GreaterThanOrEqual));
        assert_eq!(BinaryOperator::from_keyword("xor"), None);
        assert_eq!(BinaryOperator::Modulo.to_string(), "mod");
    }
}
