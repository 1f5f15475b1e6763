//! Queries and the matchers that evaluate them

mod matcher;
mod search;

pub use matcher::{ExactMatcher, GlobMatcher, Match, Matcher, PredicateMatcher, RegexMatcher};

use crate::result::PatternError;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// What an `expect` call waits for.
///
/// A pattern is immutable and never empty: every constructor rejects an
/// empty query with [`PatternError::EmptyPattern`].
///
/// # Pattern Types
///
/// - **Exact**: literal substring, Boyer-Moore-Horspool search
/// - **Regex**: full regular expression with capture groups
/// - **Glob**: shell-style wildcards (`*`, `?`, `[...]`)
/// - **Predicate**: arbitrary caller-supplied test over the whole buffer
///
/// # Examples
///
/// ```
/// use expectloop::Pattern;
///
/// let p1 = Pattern::exact("password: ").unwrap();
/// let p2 = Pattern::regex(r"\d+").unwrap();
/// let p3 = Pattern::glob("*.txt").unwrap();
/// let p4 = Pattern::predicate(|text| text.ends_with("> "));
///
/// assert!(Pattern::exact("").is_err());
/// ```
#[derive(Clone)]
pub enum Pattern {
    /// Literal substring match.
    Exact(String),

    /// Regular expression match.
    Regex(Regex),

    /// Glob pattern match.
    ///
    /// **Performance Note**: glob matching scans every substring of the
    /// buffer. Prefer `Pattern::exact()` or `Pattern::regex()` for large
    /// output.
    Glob(String),

    /// Custom predicate over the accumulated output.
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl Pattern {
    /// Create an exact string pattern.
    pub fn exact(s: impl Into<String>) -> Result<Self, PatternError> {
        let s = s.into();
        if s.is_empty() {
            return Err(PatternError::EmptyPattern);
        }
        Ok(Pattern::Exact(s))
    }

    /// Create a regex pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is empty or not a valid regex.
    ///
    /// # Examples
    ///
    /// ```
    /// use expectloop::Pattern;
    ///
    /// let pattern = Pattern::regex(r"(?i)hello").unwrap();
    /// assert!(Pattern::regex("(").is_err());
    /// ```
    pub fn regex(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::EmptyPattern);
        }
        Ok(Pattern::Regex(Regex::new(pattern)?))
    }

    /// Create a glob pattern.
    pub fn glob(pattern: &str) -> Result<Self, PatternError> {
        // Validate eagerly so a bad glob fails at construction
        GlobMatcher::new(pattern)?;
        Ok(Pattern::Glob(pattern.to_string()))
    }

    /// Create a predicate pattern.
    pub fn predicate(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Pattern::Predicate(Arc::new(f))
    }

    /// Convert pattern to a matcher implementation
    pub fn to_matcher(&self) -> Result<Box<dyn Matcher>, PatternError> {
        match self {
            Pattern::Exact(s) => Ok(Box::new(ExactMatcher::new(s)?)),
            Pattern::Regex(r) => Ok(Box::new(RegexMatcher::from_regex(r.clone())?)),
            Pattern::Glob(g) => Ok(Box::new(GlobMatcher::new(g)?)),
            Pattern::Predicate(f) => Ok(Box::new(PredicateMatcher::from_arc(f.clone()))),
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Exact(s) => f.debug_tuple("Exact").field(s).finish(),
            Pattern::Regex(r) => f.debug_tuple("Regex").field(&r.as_str()).finish(),
            Pattern::Glob(g) => f.debug_tuple("Glob").field(g).finish(),
            Pattern::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Exact(s) => write!(f, "{s:?}"),
            Pattern::Regex(r) => write!(f, "/{}/", r.as_str()),
            Pattern::Glob(g) => write!(f, "glob {g:?}"),
            Pattern::Predicate(_) => f.write_str("<predicate>"),
        }
    }
}

/// Plain strings are treated as regular expressions.
impl TryFrom<&str> for Pattern {
    type Error = PatternError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Pattern::regex(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_queries_rejected() {
        assert!(matches!(Pattern::exact(""), Err(PatternError::EmptyPattern)));
        assert!(matches!(Pattern::regex(""), Err(PatternError::EmptyPattern)));
        assert!(matches!(Pattern::glob(""), Err(PatternError::EmptyPattern)));
    }

    #[test]
    fn test_invalid_glob_rejected() {
        assert!(matches!(
            Pattern::glob("[unclosed"),
            Err(PatternError::InvalidGlob(_))
        ));
    }

    #[test]
    fn test_to_matcher_exact() {
        let matcher = Pattern::exact("expected string").unwrap().to_matcher().unwrap();
        let m = matcher.evaluate("test expected string test").unwrap();
        assert_eq!((m.start, m.end), (5, 20));
    }

    #[test]
    fn test_str_is_regex() {
        let pattern = Pattern::try_from(r"v\d+").unwrap();
        let m = pattern.to_matcher().unwrap().evaluate("release v42").unwrap();
        assert_eq!(m.captures[0], "v42");
    }

    #[test]
    fn test_display() {
        assert_eq!(Pattern::exact("$ ").unwrap().to_string(), "\"$ \"");
        assert_eq!(Pattern::regex(r"\d").unwrap().to_string(), r"/\d/");
        assert_eq!(Pattern::predicate(|_| true).to_string(), "<predicate>");
    }
}
