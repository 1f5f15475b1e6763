//! Pattern matcher implementations

use super::search::Horspool;
use crate::result::PatternError;
use globset::{Glob, GlobMatcher as GlobsetMatcher};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Result of evaluating a matcher against accumulated output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Start position of the match (byte offset)
    pub start: usize,
    /// End position of the match (byte offset)
    pub end: usize,
    /// Number of occurrences in the text, if the matcher counts them
    pub count: Option<usize>,
    /// Captured groups (for regex)
    pub captures: Vec<String>,
}

/// Pluggable match policy.
///
/// A matcher is asked, after every chunk, whether the whole output
/// accumulated by the current `expect` call satisfies it. Implementations
/// must be pure: the same text always yields the same answer.
///
/// # Examples
///
/// ```
/// use expectloop::{Match, Matcher};
///
/// struct EndsWithPrompt;
///
/// impl Matcher for EndsWithPrompt {
///     fn evaluate(&self, text: &str) -> Option<Match> {
///         text.ends_with("$ ").then(|| Match {
///             start: text.len() - 2,
///             end: text.len(),
///             count: None,
///             captures: vec![],
///         })
///     }
/// }
///
/// assert!(EndsWithPrompt.evaluate("user@host:~$ ").is_some());
/// ```
pub trait Matcher: Send + Sync {
    /// Evaluate the accumulated text
    fn evaluate(&self, text: &str) -> Option<Match>;
}

/// Literal substring matcher using Boyer-Moore-Horspool
pub struct ExactMatcher {
    search: Horspool,
}

impl ExactMatcher {
    /// Create a new exact matcher
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::EmptyPattern);
        }

        Ok(Self {
            search: Horspool::new(pattern.as_bytes().to_vec()),
        })
    }
}

impl Matcher for ExactMatcher {
    fn evaluate(&self, text: &str) -> Option<Match> {
        let haystack = text.as_bytes();
        // A valid UTF-8 needle can only match on char boundaries.
        let start = self.search.find_from(haystack, 0)?;

        Some(Match {
            start,
            end: start + self.search.len(),
            count: Some(self.search.count(haystack)),
            captures: vec![],
        })
    }
}

/// Regex matcher
pub struct RegexMatcher {
    regex: Regex,
}

impl RegexMatcher {
    /// Create a new regex matcher
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::EmptyPattern);
        }
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    /// Wrap an already compiled regex
    pub fn from_regex(regex: Regex) -> Result<Self, PatternError> {
        if regex.as_str().is_empty() {
            return Err(PatternError::EmptyPattern);
        }
        Ok(Self { regex })
    }
}

impl Matcher for RegexMatcher {
    fn evaluate(&self, text: &str) -> Option<Match> {
        let captures = self.regex.captures(text)?;
        let full_match = captures.get(0)?;

        let capture_strings = captures
            .iter()
            .flatten()
            .map(|cap| cap.as_str().to_string())
            .collect();

        Some(Match {
            start: full_match.start(),
            end: full_match.end(),
            count: Some(self.regex.find_iter(text).count()),
            captures: capture_strings,
        })
    }
}

/// Glob pattern matcher.
///
/// # Performance Characteristics
///
/// Checks every substring of the buffer, O(n²). Fine for prompts and short
/// interactive output; prefer exact or regex matchers for large output.
pub struct GlobMatcher {
    matcher: GlobsetMatcher,
}

impl GlobMatcher {
    /// Create a new glob matcher
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::EmptyPattern);
        }
        let glob = Glob::new(pattern).map_err(|e| PatternError::InvalidGlob(e.to_string()))?;

        Ok(Self {
            matcher: glob.compile_matcher(),
        })
    }
}

impl Matcher for GlobMatcher {
    fn evaluate(&self, text: &str) -> Option<Match> {
        for (start, _) in text.char_indices() {
            let ends = text[start..]
                .char_indices()
                .skip(1)
                .map(|(i, _)| start + i)
                .chain(std::iter::once(text.len()));
            for end in ends {
                if self.matcher.is_match(&text[start..end]) {
                    return Some(Match {
                        start,
                        end,
                        count: None,
                        captures: vec![],
                    });
                }
            }
        }

        None
    }
}

/// Matcher backed by a caller-supplied predicate.
///
/// When the predicate accepts the text, the whole buffer counts as the match.
#[derive(Clone)]
pub struct PredicateMatcher {
    predicate: Arc<dyn Fn(&str) -> bool + Send + Sync>,
}

impl PredicateMatcher {
    /// Create a predicate matcher
    pub fn new(predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    pub(crate) fn from_arc(predicate: Arc<dyn Fn(&str) -> bool + Send + Sync>) -> Self {
        Self { predicate }
    }
}

impl fmt::Debug for PredicateMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateMatcher").finish_non_exhaustive()
    }
}

impl Matcher for PredicateMatcher {
    fn evaluate(&self, text: &str) -> Option<Match> {
        (self.predicate)(text).then(|| Match {
            start: 0,
            end: text.len(),
            count: None,
            captures: vec![],
        })
    }
}
