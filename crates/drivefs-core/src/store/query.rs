//! Query expressions understood by the remote store.
//!
//! The core only ever needs a conjunction of three predicates:
//!
//! ```text
//! name = '<literal>' and '<parent id>' in parents and trashed = false
//! ```
//!
//! String literals are single-quoted; backslash and single quote inside a
//! literal are escaped as `\\` and `\'`.

use std::fmt;

use thiserror::Error;

/// Escape a string for embedding in a single-quoted query literal.
///
/// Backslashes are doubled before quotes are escaped, so the backslash
/// introduced for a quote is never itself doubled.
///
/// ```
/// use drivefs_core::store::escape_literal;
///
/// assert_eq!(escape_literal("O'Brien"), r"O\'Brien");
/// assert_eq!(escape_literal(r"a\b"), r"a\\b");
/// ```
pub fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    NameEquals(String),
    InParents(String),
    Trashed(bool),
}

impl Predicate {
    /// Evaluate against the raw attributes of one file.
    pub fn matches(&self, name: &str, parents: &[String], trashed: bool) -> bool {
        match self {
            Predicate::NameEquals(expected) => name == expected,
            Predicate::InParents(parent) => parents.iter().any(|p| p == parent),
            Predicate::Trashed(expected) => trashed == *expected,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::NameEquals(name) => write!(f, "name = '{}'", escape_literal(name)),
            Predicate::InParents(parent) => write!(f, "'{}' in parents", escape_literal(parent)),
            Predicate::Trashed(trashed) => write!(f, "trashed = {trashed}"),
        }
    }
}

/// A conjunctive query.
///
/// ```
/// use drivefs_core::store::Query;
///
/// let q = Query::new().name_eq("O'Brien").in_parents("folder-1").not_trashed();
/// assert_eq!(
///     q.to_string(),
///     r"name = 'O\'Brien' and 'folder-1' in parents and trashed = false"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    predicates: Vec<Predicate>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-trashed direct children of `parent_id`.
    pub fn children_of(parent_id: &str) -> Self {
        Query::new().in_parents(parent_id).not_trashed()
    }

    /// Non-trashed direct children of `parent_id` named exactly `name`.
    pub fn children_named(parent_id: &str, name: &str) -> Self {
        Query::new().name_eq(name).in_parents(parent_id).not_trashed()
    }

    #[must_use]
    pub fn name_eq(mut self, name: impl Into<String>) -> Self {
        self.predicates.push(Predicate::NameEquals(name.into()));
        self
    }

    #[must_use]
    pub fn in_parents(mut self, parent_id: impl Into<String>) -> Self {
        self.predicates.push(Predicate::InParents(parent_id.into()));
        self
    }

    #[must_use]
    pub fn not_trashed(mut self) -> Self {
        self.predicates.push(Predicate::Trashed(false));
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn matches(&self, name: &str, parents: &[String], trashed: bool) -> bool {
        self.predicates.iter().all(|p| p.matches(name, parents, trashed))
    }

    /// Parse an expression produced by [`Query`]'s `Display`.
    pub fn parse(expression: &str) -> Result<Self, QueryParseError> {
        Parser::new(expression).parse()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, predicate) in self.predicates.iter().enumerate() {
            if i > 0 {
                f.write_str(" and ")?;
            }
            write!(f, "{predicate}")?;
        }
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid query at offset {offset}: {reason}")]
pub struct QueryParseError {
    pub offset: usize,
    pub reason: &'static str,
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn parse(mut self) -> Result<Query, QueryParseError> {
        let mut query = Query::new();
        self.skip_ws();
        if self.at_end() {
            return Ok(query);
        }
        loop {
            query.predicates.push(self.predicate()?);
            self.skip_ws();
            if self.at_end() {
                return Ok(query);
            }
            self.keyword("and")?;
        }
    }

    fn predicate(&mut self) -> Result<Predicate, QueryParseError> {
        self.skip_ws();
        if self.peek() == Some('\'') {
            let parent = self.literal()?;
            self.keyword("in")?;
            self.keyword("parents")?;
            return Ok(Predicate::InParents(parent));
        }
        if self.rest().starts_with("name") {
            self.keyword("name")?;
            self.symbol('=')?;
            self.skip_ws();
            return Ok(Predicate::NameEquals(self.literal()?));
        }
        if self.rest().starts_with("trashed") {
            self.keyword("trashed")?;
            self.symbol('=')?;
            self.skip_ws();
            if self.rest().starts_with("false") {
                self.keyword("false")?;
                return Ok(Predicate::Trashed(false));
            }
            self.keyword("true")?;
            return Ok(Predicate::Trashed(true));
        }
        Err(self.error("expected a name, parents or trashed clause"))
    }

    fn literal(&mut self) -> Result<String, QueryParseError> {
        if self.bump() != Some('\'') {
            return Err(self.error("expected opening quote"));
        }
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(c) => value.push(c),
                    None => return Err(self.error("dangling escape")),
                },
                Some('\'') => return Ok(value),
                Some(c) => value.push(c),
                None => return Err(self.error("unterminated literal")),
            }
        }
    }

    fn keyword(&mut self, word: &'static str) -> Result<(), QueryParseError> {
        self.skip_ws();
        if !self.rest().starts_with(word) {
            return Err(self.error("unexpected token"));
        }
        self.pos += word.len();
        Ok(())
    }

    fn symbol(&mut self, c: char) -> Result<(), QueryParseError> {
        self.skip_ws();
        if self.bump() != Some(c) {
            return Err(self.error("unexpected symbol"));
        }
        Ok(())
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn error(&self, reason: &'static str) -> QueryParseError {
        QueryParseError {
            offset: self.pos,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_literal() {
        assert_eq!(escape_literal("simple"), "simple");
        assert_eq!(escape_literal("O'Brien"), "O\\'Brien");
        assert_eq!(escape_literal("a\\b"), "a\\\\b");
        assert_eq!(escape_literal("mixed'and\\special"), "mixed\\'and\\\\special");
        // A trailing backslash before a quote must not swallow the quote escape.
        assert_eq!(escape_literal("x\\'"), "x\\\\\\'");
    }

    #[test]
    fn test_children_named_expression() {
        let q = Query::children_named("abc", "report.txt");
        assert_eq!(q.to_string(), "name = 'report.txt' and 'abc' in parents and trashed = false");
    }

    #[test]
    fn test_children_of_expression() {
        assert_eq!(Query::children_of("root").to_string(), "'root' in parents and trashed = false");
    }

    #[test]
    fn test_parse_roundtrip_with_escapes() {
        let q = Query::children_named("p'1", "a\\b ' and 'x' in parents");
        let parsed = Query::parse(&q.to_string()).unwrap();
        assert_eq!(parsed, q);
    }

    #[test]
    fn test_parse_trashed_true() {
        let parsed = Query::parse("trashed = true").unwrap();
        assert_eq!(parsed.predicates(), &[Predicate::Trashed(true)]);
    }

    #[test]
    fn test_parse_empty_matches_everything() {
        let parsed = Query::parse("   ").unwrap();
        assert!(parsed.predicates().is_empty());
        assert!(parsed.matches("anything", &[], true));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Query::parse("name = 'open").is_err());
        assert!(Query::parse("size > 3").is_err());
        assert!(Query::parse("name = 'a' or name = 'b'").is_err());
        assert!(Query::parse("'p' in").is_err());
    }

    #[test]
    fn test_matches() {
        let q = Query::children_named("p", "a");
        let parents = vec!["q".to_string(), "p".to_string()];
        assert!(q.matches("a", &parents, false));
        assert!(!q.matches("a", &parents, true));
        assert!(!q.matches("A", &parents, false));
        assert!(!q.matches("a", &["q".to_string()], false));
    }
}
