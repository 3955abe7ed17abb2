//! Error types for odata-sql.
//!
//! Translation itself never fails: every well-formed tree has a rendering.
//! These errors come from the reference parser and from configuration loading.

use thiserror::Error;

/// The main error type for odata-sql operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to parse an OData expression.
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    /// A query option the parser does not understand (`$expand`, `$apply`, ...).
    #[error("Unsupported query option: '{0}'")]
    UnsupportedOption(String),

    /// A query option with an unusable value (for example `$top=-1`).
    #[error("Invalid value for {option}: '{value}'")]
    InvalidValue { option: &'static str, value: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed TOML configuration.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a parse error at the given position.
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// Create an invalid value error.
    pub fn invalid(option: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            option,
            value: value.into(),
        }
    }
}

/// Result type alias for odata-sql operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::parse(5, "unexpected character");
        assert_eq!(
            err.to_string(),
            "Parse error at position 5: unexpected character"
        );
    }

    #[test]
    fn test_invalid_value_display() {
        let err = Error::invalid("$top", "-3");
        assert_eq!(err.to_string(), "Invalid value for $top: '-3'");
    }
}
