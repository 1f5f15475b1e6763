//! expectloop: drive interactive programs from Rust
//!
//! expectloop sends text to an interactive program and waits until an
//! expected pattern shows up in its output, within a bounded time, then
//! hands the output to your handler. It is the loop behind scripting shells,
//! REPLs and network clients without a human at the keyboard.
//!
//! # Features
//!
//! - **Async/await**: built on tokio; a blocking wrapper is included
//! - **Pluggable matching**: exact strings, regex, glob, or your own [`Matcher`]
//! - **Chunk-boundary safe**: every query is evaluated against all output
//!   read by the current call, so matches split across reads are found
//! - **Wall-clock timeouts**: measured from the start of each call
//! - **Cancellation**: abandon a wait with any future
//! - **Any channel**: implement [`Backend`], or use the PTY backend
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use expectloop::{Session, Pattern};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = Session::builder()
//!         .timeout(Duration::from_secs(30))
//!         .spawn("python3 -i")?;
//!
//!     session.expect(Pattern::exact(">>> ")?, |_| {}).await?;
//!     session.send_line("print('Hello, World!')").await?;
//!
//!     session
//!         .expect(Pattern::exact("Hello, World!")?, |output| {
//!             println!("Output: {output}");
//!         })
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Each call starts clean
//!
//! The buffer is scoped to a single `expect` call. Output consumed by one
//! call is never seen by the next:
//!
//! ```rust
//! use expectloop::{Pattern, ScriptedBackend, Session};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = ScriptedBackend::new()
//!     .chunk("login: ")
//!     .chunk("Password: ");
//! let mut session = Session::new(backend);
//!
//! session.expect(Pattern::exact("login:")?, |_| {}).await?;
//! let result = session.expect(Pattern::exact("Password:")?, |_| {}).await?;
//! assert_eq!(result.output, "Password: ");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod backend;
mod buffer;
mod pattern;
mod result;
mod session;

// Public API exports
pub use backend::{Backend, PtyBackend, ScriptHandle, ScriptedBackend};
pub use pattern::{ExactMatcher, GlobMatcher, Match, Matcher, Pattern, PredicateMatcher, RegexMatcher};
pub use result::{ExpectError, MatchResult, PatternError};
pub use session::{BlockingSession, Reply, Session, SessionBuilder};

// Re-export commonly used types
pub use portable_pty::{CommandBuilder, ExitStatus};
