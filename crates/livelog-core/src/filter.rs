//! Level/namespace filter predicates.
//!
//! A rule is written as `[!] [comparator] [level] ["[" glob "]"]`, for example
//! `>=warn[service/*]` or `!error[noisy-endpoint]`:
//!
//! - `!` marks the predicate as negative (an exclusion)
//! - the comparator is one of `<`, `<=`, `=`, `>=`, `>`, `!=` and defaults to `>=`
//! - the level defaults to `debug`, so an omitted level matches everything
//! - the glob is matched anywhere in the event key; `*` matches any run of
//!   characters, including `/`
//!
//! `!=` is always read as the comparator: `!=warn` means "any level but warn",
//! while `!!=warn` is the negated form.
//!
//! A list of predicates is evaluated left to right as a toggle chain, see
//! [`evaluate`].

use std::fmt;

use regex::Regex;

use crate::error::{LogError, LogResult};
use crate::level::Level;

/// Comparison between an event level and the predicate level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    LessThan,
    LessThanEqual,
    Equal,
    GreaterThanEqual,
    GreaterThan,
    Different,
}

impl Comparison {
    /// Tokens in scan order: two-character tokens before their prefixes.
    const TOKENS: [(&'static str, Comparison); 6] = [
        ("<=", Comparison::LessThanEqual),
        (">=", Comparison::GreaterThanEqual),
        ("!=", Comparison::Different),
        ("<", Comparison::LessThan),
        (">", Comparison::GreaterThan),
        ("=", Comparison::Equal),
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Comparison::LessThan => "<",
            Comparison::LessThanEqual => "<=",
            Comparison::Equal => "=",
            Comparison::GreaterThanEqual => ">=",
            Comparison::GreaterThan => ">",
            Comparison::Different => "!=",
        }
    }

    /// Apply the comparison to two positions in the severity order.
    pub fn holds(self, event: usize, target: usize) -> bool {
        match self {
            Comparison::LessThan => event < target,
            Comparison::LessThanEqual => event <= target,
            Comparison::Equal => event == target,
            Comparison::GreaterThanEqual => event >= target,
            Comparison::GreaterThan => event > target,
            Comparison::Different => event != target,
        }
    }
}

/// A compiled namespace glob.
///
/// Equality compares the glob text, not the compiled regex.
#[derive(Debug, Clone)]
pub struct NamespacePattern {
    glob: String,
    regex: Regex,
}

impl NamespacePattern {
    /// Compile a glob into an unanchored regex, `*` becoming `.*`.
    pub fn new(glob: &str) -> LogResult<Self> {
        let translated = glob
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        Ok(Self {
            glob: glob.to_string(),
            regex: Regex::new(&translated)?,
        })
    }

    pub fn glob(&self) -> &str {
        &self.glob
    }

    pub fn is_match(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }
}

impl PartialEq for NamespacePattern {
    fn eq(&self, other: &Self) -> bool {
        self.glob == other.glob
    }
}

impl Eq for NamespacePattern {}

/// A single filter rule over `(level, key)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    comparison: Comparison,
    level: Level,
    namespace: Option<NamespacePattern>,
    negative: bool,
}

impl Predicate {
    pub fn new(
        comparison: Comparison,
        level: Level,
        namespace: Option<NamespacePattern>,
        negative: bool,
    ) -> Self {
        Self {
            comparison,
            level,
            namespace,
            negative,
        }
    }

    /// Parse a rule, failing with [`LogError::PredicateSyntax`] on malformed text.
    pub fn parse(text: &str) -> LogResult<Self> {
        let input = text.trim();
        if input.is_empty() {
            return Err(LogError::PredicateSyntax("rule is empty".to_string()));
        }

        let mut rest = input;

        let negative = rest.starts_with('!') && !rest.starts_with("!=");
        if negative {
            rest = &rest[1..];
        }

        let mut comparison = Comparison::GreaterThanEqual;
        if let Some((token, cmp)) = Comparison::TOKENS
            .iter()
            .find(|(token, _)| rest.starts_with(token))
        {
            comparison = *cmp;
            rest = &rest[token.len()..];
        }

        let mut level = Level::Debug;
        if let Some(found) = Level::ALL
            .into_iter()
            .find(|level| rest.starts_with(level.as_str()))
        {
            level = found;
            rest = &rest[found.as_str().len()..];
        }

        rest = rest.trim_start();

        let mut namespace = None;
        if let Some(inner) = rest.strip_prefix('[') {
            let end = inner.find(']').ok_or_else(|| {
                LogError::PredicateSyntax(format!("unterminated namespace in '{}'", input))
            })?;
            let glob = &inner[..end];
            if let Some(bad) = glob.chars().find(|c| !is_glob_char(*c)) {
                return Err(LogError::PredicateSyntax(format!(
                    "invalid character '{}' in namespace of '{}'",
                    bad, input
                )));
            }
            namespace = Some(NamespacePattern::new(glob)?);
            rest = &inner[end + 1..];
        }

        if !rest.is_empty() {
            return Err(LogError::PredicateSyntax(format!(
                "unexpected '{}' in '{}'",
                rest, input
            )));
        }

        Ok(Self::new(comparison, level, namespace, negative))
    }

    /// Like [`Predicate::parse`], but malformed text yields `Ok(None)`.
    ///
    /// Errors other than [`LogError::PredicateSyntax`] still propagate.
    pub fn try_parse(text: &str) -> LogResult<Option<Self>> {
        match Self::parse(text) {
            Ok(predicate) => Ok(Some(predicate)),
            Err(e) if e.is_syntax() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn comparison(&self) -> Comparison {
        self.comparison
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn namespace(&self) -> Option<&NamespacePattern> {
        self.namespace.as_ref()
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn test_level(&self, level: Level) -> bool {
        self.comparison.holds(level.ordinal(), self.level.ordinal())
    }

    /// Whether the event passes both the level comparison and the namespace.
    ///
    /// A predicate with a namespace never matches an event without a key.
    pub fn test(&self, key: Option<&str>, level: Level) -> bool {
        if !self.test_level(level) {
            return false;
        }

        match (&self.namespace, key) {
            (None, _) => true,
            (Some(ns), Some(key)) => ns.is_match(key),
            (Some(_), None) => false,
        }
    }
}

fn is_glob_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '*' | '.' | '/')
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("!")?;
        }
        write!(f, "{}{}", self.comparison.as_str(), self.level)?;
        if let Some(ns) = &self.namespace {
            write!(f, "[{}]", ns.glob())?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Predicate {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Predicate::parse(s)
    }
}

/// Evaluate an ordered predicate list against an event.
///
/// The result starts as the negation flag of the first predicate: a list that
/// opens with an exclusion starts out allowing, a list that opens with an
/// inclusion starts out denying. Each predicate can only flip the state it is
/// meant to flip, and only when it matches: a matching negative predicate
/// turns an allowed event into a denied one, a matching positive predicate
/// turns a denied event into an allowed one.
pub fn evaluate(
    predicates: &[Predicate],
    key: Option<&str>,
    level: Level,
    allow_empty: bool,
) -> bool {
    let Some(first) = predicates.first() else {
        return allow_empty;
    };

    let mut allowed = first.negative;

    for predicate in predicates {
        if predicate.negative && allowed && predicate.test(key, level) {
            allowed = false;
        } else if !predicate.negative && !allowed && predicate.test(key, level) {
            allowed = true;
        }
    }

    allowed
}
