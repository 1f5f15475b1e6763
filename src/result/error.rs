//! Error types for expectloop

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while driving a session.
///
/// Every failure surfaces to the immediate caller of `send` or `expect`;
/// the session never retries on its own.
///
/// # Examples
///
/// ```no_run
/// use expectloop::{ExpectError, Pattern, Session};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut session = Session::builder()
///     .timeout(Duration::from_secs(5))
///     .spawn("some-command")?;
///
/// match session.expect(Pattern::exact("done")?, |out| println!("{out}")).await {
///     Ok(_) => {}
///     Err(ExpectError::Timeout { duration }) => {
///         eprintln!("Timed out after {:?}", duration);
///     }
///     Err(ExpectError::Eof) => {
///         eprintln!("Process exited unexpectedly");
///     }
///     Err(e) => return Err(e.into()),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Error, Debug)]
pub enum ExpectError {
    /// Timeout waiting for pattern.
    ///
    /// The clock starts when `expect` is called and is not reset by
    /// incoming chunks. The handler was not invoked.
    #[error("Timeout waiting for pattern (after {duration:?})")]
    Timeout {
        /// Duration that was waited before timeout
        duration: Duration,
    },

    /// EOF reached before pattern matched.
    ///
    /// The backend closed its output. The session cannot be used again.
    #[error("EOF reached before pattern matched")]
    Eof,

    /// The caller cancelled an in-flight `expect`.
    #[error("Expect cancelled")]
    Cancelled,

    /// Rejected configuration value.
    ///
    /// The previous value is left in place.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Buffer full before pattern matched.
    ///
    /// The output accumulated by a single `expect` call grew past
    /// `max_buffer_size` without satisfying the query.
    #[error("Buffer full ({size} bytes)")]
    FullBuffer {
        /// Size of the buffer when it became full
        size: usize,
    },

    /// Invalid pattern.
    #[error("Invalid pattern: {0}")]
    PatternError(#[from] PatternError),

    /// I/O error from the backend, propagated as-is.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// PTY error.
    #[error("PTY error: {0}")]
    PtyError(String),

    /// Process spawning error.
    #[error("Failed to spawn process: {0}")]
    SpawnError(String),

    /// Process already exited.
    ///
    /// Returned when asking about a child that has already been waited on.
    #[error("Process has already exited")]
    ProcessExited,
}

impl ExpectError {
    /// Whether the session can still be used after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ExpectError::Eof | ExpectError::ProcessExited)
    }
}

/// Errors related to building a query.
#[derive(Error, Debug)]
pub enum PatternError {
    /// Invalid regex pattern.
    #[error("Invalid regex: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// Invalid glob pattern.
    #[error("Invalid glob: {0}")]
    InvalidGlob(String),

    /// Empty pattern.
    ///
    /// Queries must be non-empty.
    #[error("Pattern cannot be empty")]
    EmptyPattern,
}
