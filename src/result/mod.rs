//! Result types for expect operations

mod error;

pub use error::{ExpectError, PatternError};

/// Result of a successful `expect` call.
///
/// `output` is everything the backend delivered during the call, up to the
/// chunk that completed the match. It is the same text the handler received.
///
/// # Regex Captures
///
/// ```no_run
/// use expectloop::{Session, Pattern};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let mut session = Session::spawn("echo user@example.com")?;
/// let pattern = Pattern::regex(r"(\w+)@(\w+)\.(\w+)")?;
/// let result = session.expect(pattern, |_| {}).await?;
///
/// // captures[0] is the full match
/// println!("User: {}", result.captures[1]);
/// println!("Domain: {}", result.captures[2]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Accumulated output of this call, including the match.
    pub output: String,

    /// The exact substring that satisfied the query.
    pub matched: String,

    /// Start position of the match in `output` (byte offset).
    pub start: usize,

    /// End position of the match in `output` (byte offset).
    pub end: usize,

    /// Number of occurrences of the query in `output`, when the matcher counts.
    pub count: Option<usize>,

    /// Captured groups (regex only). Index 0 is the full match.
    pub captures: Vec<String>,

    /// Number of backend reads this call performed.
    pub reads: usize,
}

impl MatchResult {
    /// Text that appeared before the match.
    pub fn before(&self) -> &str {
        &self.output[..self.start]
    }

    /// Text that appeared after the match in the final chunk.
    pub fn after(&self) -> &str {
        &self.output[self.end..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_before_after() {
        let result = MatchResult {
            output: "test expected string test".to_string(),
            matched: "expected string".to_string(),
            start: 5,
            end: 20,
            count: Some(1),
            captures: vec![],
            reads: 2,
        };
        assert_eq!(result.before(), "test ");
        assert_eq!(result.after(), " test");
    }
}
