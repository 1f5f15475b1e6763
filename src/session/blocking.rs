//! Blocking wrapper for callers without an async runtime

use super::{Reply, Session};
use crate::backend::{Backend, PtyBackend};
use crate::pattern::{Matcher, Pattern};
use crate::result::{ExpectError, MatchResult};
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

/// A [`Session`] whose calls block the current thread.
///
/// Owns a private current-thread runtime. Must not be used from inside
/// another tokio runtime; blocking there panics.
///
/// # Examples
///
/// ```
/// use expectloop::{BlockingSession, Pattern, ScriptedBackend, Session};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = ScriptedBackend::new().chunk("C:\\> ");
/// let mut session = BlockingSession::new(Session::new(backend))?;
///
/// session.expect(Pattern::exact(">")?, |_| {})?;
/// session.send("dir\r\n")?;
/// # Ok(())
/// # }
/// ```
pub struct BlockingSession<B = PtyBackend> {
    session: Session<B>,
    runtime: Runtime,
}

impl BlockingSession<PtyBackend> {
    /// Spawn a command on a PTY with the default configuration.
    pub fn spawn(command: &str) -> Result<Self, ExpectError> {
        Self::new(Session::spawn(command)?)
    }
}

impl<B: Backend> BlockingSession<B> {
    /// Wrap an async session.
    pub fn new(session: Session<B>) -> Result<Self, ExpectError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self { session, runtime })
    }

    /// See [`Session::send`].
    pub fn send(&mut self, text: &str) -> Result<(), ExpectError> {
        self.runtime.block_on(self.session.send(text))
    }

    /// See [`Session::send_line`].
    pub fn send_line(&mut self, line: &str) -> Result<(), ExpectError> {
        self.runtime.block_on(self.session.send_line(line))
    }

    /// See [`Session::expect`].
    pub fn expect<F>(&mut self, pattern: Pattern, handler: F) -> Result<MatchResult, ExpectError>
    where
        F: FnOnce(&str),
    {
        self.runtime.block_on(self.session.expect(pattern, handler))
    }

    /// See [`Session::expect_reply`].
    pub fn expect_reply<F>(&mut self, pattern: Pattern, handler: F) -> Result<MatchResult, ExpectError>
    where
        F: FnOnce(&str, &mut Reply),
    {
        self.runtime.block_on(self.session.expect_reply(pattern, handler))
    }

    /// See [`Session::expect_with`].
    pub fn expect_with<M, F>(&mut self, matcher: &M, handler: F) -> Result<MatchResult, ExpectError>
    where
        M: Matcher + ?Sized,
        F: FnOnce(&str),
    {
        self.runtime.block_on(self.session.expect_with(matcher, handler))
    }

    /// See [`Session::timeout`].
    pub fn timeout(&self) -> Option<Duration> {
        self.session.timeout()
    }

    /// See [`Session::set_timeout`].
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<(), ExpectError> {
        self.session.set_timeout(timeout)
    }

    /// See [`Session::set_timeout_millis`].
    pub fn set_timeout_millis(&mut self, millis: i64) -> Result<(), ExpectError> {
        self.session.set_timeout_millis(millis)
    }

    /// Borrow the wrapped session.
    pub fn session(&self) -> &Session<B> {
        &self.session
    }

    /// Unwrap into the async session.
    pub fn into_inner(self) -> Session<B> {
        self.session
    }
}
