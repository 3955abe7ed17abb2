//! Reserved-keyword escaping for document paths.
//!
//! A property whose name is a dialect keyword cannot be reached with dot
//! syntax; `c.group.id` must be written `c['group'].id`.

use crate::config::DialectConfig;

/// Query-language keywords that can never stand as a bare identifier,
/// such as a JOIN alias. Matched ignoring ASCII case.
pub const DIALECT_KEYWORDS: &[&str] = &[
    "select",
    "value",
    "top",
    "distinct",
    "from",
    "where",
    "join",
    "in",
    "as",
    "and",
    "or",
    "not",
    "between",
    "like",
    "escape",
    "is",
    "exists",
    "array",
    "order",
    "group",
    "by",
    "asc",
    "desc",
    "offset",
    "limit",
    "null",
    "undefined",
    "true",
    "false",
    "udf",
];

/// True when `name` is a dialect keyword.
pub fn is_dialect_keyword(name: &str) -> bool {
    DIALECT_KEYWORDS
        .iter()
        .any(|keyword| keyword.eq_ignore_ascii_case(name))
}

/// Escapes path segments that collide with reserved words.
#[derive(Debug, Clone, Default)]
pub struct KeywordEscaper {
    words: Vec<String>,
    case_insensitive: bool,
}

impl KeywordEscaper {
    pub fn new<I, S>(words: I, case_insensitive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
            case_insensitive,
        }
    }

    pub fn from_config(config: &DialectConfig) -> Self {
        Self::new(
            config.reserved_keywords.iter().cloned(),
            config.keywords_case_insensitive,
        )
    }

    /// True when the whole segment is a reserved word.
    pub fn is_reserved(&self, segment: &str) -> bool {
        self.words.iter().any(|word| {
            if self.case_insensitive {
                word.eq_ignore_ascii_case(segment)
            } else {
                word == segment
            }
        })
    }

    /// Render one member access: `.name`, or `['name']` for reserved words.
    pub fn segment(&self, name: &str) -> String {
        if self.is_reserved(name) {
            format!("['{}']", name)
        } else {
            format!(".{}", name)
        }
    }

    /// Escape every reserved segment of a dotted path.
    ///
    /// The first segment is the alias the path starts from and is kept as
    /// written. Already-escaped text passes through unchanged.
    pub fn escape_path(&self, path: &str) -> String {
        let mut segments = path.split('.');
        let mut out = segments.next().unwrap_or_default().to_string();
        for segment in segments {
            out.push_str(&self.segment(segment));
        }
        out
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }
}
