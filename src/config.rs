//! Dialect configuration.
//!
//! Everything that differs between document-store dialects lives here:
//! the root alias, the reserved words that need bracket quoting, and the
//! function-name table. A config can be built in code or read from TOML:
//!
//! ```toml
//! root_alias = "c"
//! reserved_keywords = ["group", "value"]
//! keywords_case_insensitive = true
//!
//! [functions]
//! toupper = "UPPER"
//! trim = ["LTRIM", "RTRIM"]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "odata-sql.toml";

/// How an OData function name is spelled in the dialect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FunctionMapping {
    /// A plain rename: `toupper` -> `UPPER(x)`
    Name(String),
    /// Nested single-argument calls, outermost first: `trim` -> `LTRIM(RTRIM(x))`
    Nested(Vec<String>),
}

impl FunctionMapping {
    pub fn name(name: impl Into<String>) -> Self {
        FunctionMapping::Name(name.into())
    }

    pub fn nested<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FunctionMapping::Nested(names.into_iter().map(Into::into).collect())
    }
}

/// Dialect settings for one translator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialectConfig {
    /// Alias bound to the root document (`SELECT * FROM c`).
    pub root_alias: String,
    /// Property names that collide with dialect keywords.
    pub reserved_keywords: Vec<String>,
    /// Match reserved keywords ignoring ASCII case.
    pub keywords_case_insensitive: bool,
    /// OData function name -> dialect spelling. Unlisted names are upper-cased.
    pub functions: BTreeMap<String, FunctionMapping>,
    /// String predicates with a case-insensitive overload.
    pub case_insensitive_functions: Vec<String>,
    /// Case-folding functions folded into that overload.
    pub case_fold_functions: Vec<String>,
}

impl Default for DialectConfig {
    fn default() -> Self {
        let functions = [
            ("toupper", FunctionMapping::name("UPPER")),
            ("tolower", FunctionMapping::name("LOWER")),
            ("indexof", FunctionMapping::name("INDEX_OF")),
            ("trim", FunctionMapping::nested(["LTRIM", "RTRIM"])),
            ("geo.distance", FunctionMapping::name("ST_DISTANCE")),
            ("geo.intersects", FunctionMapping::name("ST_INTERSECTS")),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            root_alias: "c".to_string(),
            reserved_keywords: vec!["group".to_string()],
            keywords_case_insensitive: false,
            functions,
            case_insensitive_functions: ["contains", "startswith", "endswith"]
                .map(String::from)
                .to_vec(),
            case_fold_functions: ["toupper", "tolower"].map(String::from).to_vec(),
        }
    }
}

impl DialectConfig {
    /// Create a new configuration builder starting from the defaults.
    pub fn builder() -> DialectConfigBuilder {
        DialectConfigBuilder::default()
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DialectConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(
            "Loaded dialect config from {} ({} reserved keywords, {} function mappings)",
            path.display(),
            config.reserved_keywords.len(),
            config.functions.len()
        );
        Ok(config)
    }

    /// Locate a config file: `./odata-sql.toml`, then
    /// `<config dir>/odata-sql/dialect.toml`.
    pub fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("odata-sql").join("dialect.toml"))
            .filter(|path| path.is_file())
    }

    /// Load the discovered config file, or fall back to the defaults.
    pub fn load_or_default() -> Result<Self> {
        match Self::discover() {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Check invariants a TOML file could violate.
    pub fn validate(&self) -> Result<()> {
        let alias_ok = !self.root_alias.is_empty()
            && self
                .root_alias
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !self.root_alias.starts_with(|c: char| c.is_ascii_digit());
        if !alias_ok {
            return Err(Error::Config(format!(
                "root_alias must be an identifier, got '{}'",
                self.root_alias
            )));
        }
        if let Some(word) = self
            .reserved_keywords
            .iter()
            .find(|w| w.is_empty() || w.contains(['.', '\'', '[', ']']))
        {
            return Err(Error::Config(format!(
                "reserved keyword '{}' is not a single path segment",
                word
            )));
        }
        for (name, mapping) in &self.functions {
            if let FunctionMapping::Nested(chain) = mapping
                && chain.is_empty()
            {
                return Err(Error::Config(format!(
                    "function '{}' maps to an empty call chain",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Builder for DialectConfig
#[derive(Debug, Default)]
pub struct DialectConfigBuilder {
    config: DialectConfig,
}

impl DialectConfigBuilder {
    /// Set the root document alias
    pub fn root_alias(mut self, alias: impl Into<String>) -> Self {
        self.config.root_alias = alias.into();
        self
    }

    /// Add a reserved keyword
    pub fn reserved_keyword(mut self, word: impl Into<String>) -> Self {
        self.config.reserved_keywords.push(word.into());
        self
    }

    /// Replace the reserved keyword list
    pub fn reserved_keywords<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.reserved_keywords = words.into_iter().map(Into::into).collect();
        self
    }

    /// Match reserved keywords ignoring case
    pub fn keywords_case_insensitive(mut self, enabled: bool) -> Self {
        self.config.keywords_case_insensitive = enabled;
        self
    }

    /// Map an OData function to its dialect spelling
    pub fn function(mut self, name: impl Into<String>, mapping: FunctionMapping) -> Self {
        self.config.functions.insert(name.into(), mapping);
        self
    }

    /// Build the configuration
    pub fn build(self) -> DialectConfig {
        self.config
    }
}
