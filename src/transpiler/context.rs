//! Per-call translation state.

use std::collections::HashSet;

use super::JoinClause;
use super::keywords::is_dialect_keyword;

/// Walk flags passed down explicitly, never stored.
#[derive(Debug, Clone, Copy, Default)]
pub struct Walk {
    /// Inside a `$search` expression.
    pub search: bool,
    /// Lambdas must stay self-contained (inside `all` or `not`): no JOINs.
    pub subquery: bool,
}

impl Walk {
    pub fn search() -> Self {
        Self {
            search: true,
            subquery: false,
        }
    }

    pub fn in_subquery(self) -> Self {
        Self {
            subquery: true,
            ..self
        }
    }
}

/// Mutable state of one translation: the pending joins, the aliases
/// already handed out and the lambda variables currently in scope.
#[derive(Debug)]
pub struct TranslationContext {
    root_alias: String,
    joins: Vec<JoinClause>,
    used: HashSet<String>,
    /// Extra words never used as an alias, lower-cased.
    reserved: HashSet<String>,
    scope: Vec<(String, String)>,
}

impl TranslationContext {
    pub fn new(root_alias: &str) -> Self {
        let mut used = HashSet::new();
        used.insert(root_alias.to_string());
        Self {
            root_alias: root_alias.to_string(),
            joins: Vec::new(),
            used,
            reserved: HashSet::new(),
            scope: Vec::new(),
        }
    }

    /// Also refuse `words` as aliases (the dialect's reserved property names).
    pub fn with_reserved<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.reserved
            .extend(words.into_iter().map(|w| w.as_ref().to_ascii_lowercase()));
        self
    }

    /// Reserve an alias for a lambda variable.
    ///
    /// The variable's own name is kept when it is a free identifier that is
    /// not a keyword and, for a nested lambda, sorts after the enclosing
    /// alias. Otherwise a generated alias is taken: the next unused letter
    /// after the root alias at the top level, or one sorting after the
    /// enclosing alias when nested.
    pub fn allocate_alias(&mut self, variable: &str) -> String {
        let outer = self.scope.last().map(|(_, alias)| alias.clone());
        let ordered = outer.as_deref().is_none_or(|outer| variable > outer);
        let alias = if ordered && self.is_free(variable) {
            variable.to_string()
        } else {
            match outer.as_deref() {
                Some(outer) => self.next_after(outer),
                None => self.next_letter(),
            }
        };
        self.used.insert(alias.clone());
        alias
    }

    fn is_reserved(&self, name: &str) -> bool {
        is_dialect_keyword(name) || self.reserved.contains(&name.to_ascii_lowercase())
    }

    fn is_available(&self, name: &str) -> bool {
        !self.used.contains(name) && !self.is_reserved(name)
    }

    fn is_free(&self, name: &str) -> bool {
        let identifier = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        identifier && self.is_available(name)
    }

    fn next_letter(&self) -> String {
        let start = match self.root_alias.as_bytes() {
            [b] if b.is_ascii_lowercase() => b + 1,
            _ => b'a',
        };
        let letters = (start..=b'z').chain(b'a'..start);
        for letter in letters {
            let candidate = (letter as char).to_string();
            if self.is_available(&candidate) {
                return candidate;
            }
        }
        self.numbered("a")
    }

    /// First available alias sorting after `outer`.
    fn next_after(&self, outer: &str) -> String {
        if let [b] = outer.as_bytes()
            && b.is_ascii_lowercase()
        {
            for letter in (b + 1)..=b'z' {
                let candidate = (letter as char).to_string();
                if self.is_available(&candidate) {
                    return candidate;
                }
            }
        }
        self.numbered(outer)
    }

    /// `prefix1`, `prefix2`, ...: every one sorts after `prefix`.
    fn numbered(&self, prefix: &str) -> String {
        (1..)
            .map(|n| format!("{}{}", prefix, n))
            .find(|candidate| self.is_available(candidate))
            .unwrap_or_default()
    }

    pub fn push_join(&mut self, join: JoinClause) {
        self.joins.push(join);
    }

    pub fn into_joins(self) -> Vec<JoinClause> {
        self.joins
    }

    /// Bind a lambda variable to the alias it renders as.
    pub fn bind(&mut self, variable: &str, alias: &str) {
        self.scope.push((variable.to_string(), alias.to_string()));
    }

    pub fn unbind(&mut self) {
        self.scope.pop();
    }

    /// The alias bound to a lambda variable, innermost binding first.
    pub fn lookup(&self, variable: &str) -> Option<&str> {
        self.scope
            .iter()
            .rev()
            .find(|(name, _)| name == variable)
            .map(|(_, alias)| alias.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_name_kept_when_free() {
        let mut ctx = TranslationContext::new("c");
        assert_eq!(ctx.allocate_alias("p"), "p");
        assert_eq!(ctx.allocate_alias("l"), "l");
    }

    #[test]
    fn test_sequential_letters_on_collision() {
        let mut ctx = TranslationContext::new("c");
        assert_eq!(ctx.allocate_alias("x"), "x");
        assert_eq!(ctx.allocate_alias("x"), "d");
        assert_eq!(ctx.allocate_alias("c"), "e");
        assert_eq!(ctx.allocate_alias("d"), "f");
    }

    #[test]
    fn test_letters_wrap_then_number() {
        let mut ctx = TranslationContext::new("c");
        // d..=z then a, b
        for _ in 0..25 {
            ctx.allocate_alias("c");
        }
        assert_eq!(ctx.allocate_alias("c"), "a1");
    }

    #[test]
    fn test_keywords_never_become_aliases() {
        let mut ctx = TranslationContext::new("c");
        assert_eq!(ctx.allocate_alias("value"), "d");
        assert_eq!(ctx.allocate_alias("Select"), "e");
        assert_eq!(ctx.allocate_alias("in"), "f");
    }

    #[test]
    fn test_configured_reserved_words_never_become_aliases() {
        let mut ctx = TranslationContext::new("c").with_reserved(["group", "d"]);
        assert_eq!(ctx.allocate_alias("group"), "e");
        assert_eq!(ctx.allocate_alias("Group"), "f");
    }

    #[test]
    fn test_nested_aliases_sort_after_outer() {
        let mut ctx = TranslationContext::new("c");
        let outer = ctx.allocate_alias("l");
        ctx.bind("l", &outer);
        assert_eq!(ctx.allocate_alias("o"), "o");
        assert_eq!(ctx.allocate_alias("a"), "m");
        ctx.unbind();
    }

    #[test]
    fn test_nested_alias_after_z_is_numbered() {
        let mut ctx = TranslationContext::new("c");
        let outer = ctx.allocate_alias("z");
        ctx.bind("z", &outer);
        assert_eq!(ctx.allocate_alias("y"), "z1");
    }

    #[test]
    fn test_scope_shadowing() {
        let mut ctx = TranslationContext::new("c");
        ctx.bind("x", "x");
        ctx.bind("x", "d");
        assert_eq!(ctx.lookup("x"), Some("d"));
        ctx.unbind();
        assert_eq!(ctx.lookup("x"), Some("x"));
        ctx.unbind();
        assert_eq!(ctx.lookup("x"), None);
    }
}
