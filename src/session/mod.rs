//! The send / expect driver

mod blocking;
mod builder;
mod reply;

pub use blocking::BlockingSession;
pub use builder::SessionBuilder;
pub use reply::Reply;

use crate::backend::{Backend, PtyBackend};
use crate::buffer::{AnsiStripper, OutputBuffer};
use crate::pattern::{Matcher, Pattern};
use crate::result::{ExpectError, MatchResult};
use std::future::{self, Future};
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, trace, warn};

/// Drives one interactive program: send text, wait for output.
///
/// Each `expect` call starts from an empty buffer, reads chunks from the
/// backend and re-evaluates the query against everything read so far,
/// until it matches, the timeout elapses or the backend ends. The timeout
/// is measured from the start of the call.
///
/// `send` and `expect` take `&mut self`, so a session never has two calls
/// in flight. Share a session between tasks with
/// `Arc<tokio::sync::Mutex<Session<_>>>` to serialize whole calls.
///
/// # Examples
///
/// ```no_run
/// use expectloop::{Session, Pattern};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut session = Session::builder()
///     .timeout(Duration::from_secs(30))
///     .spawn("python3 -i")?;
///
/// session.expect(Pattern::exact(">>> ")?, |_| {}).await?;
/// session.send_line("print('Hello')").await?;
/// session
///     .expect(Pattern::exact("Hello")?, |output| println!("{output}"))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct Session<B = PtyBackend> {
    backend: B,
    timeout: Option<Duration>,
    max_buffer_size: usize,
    ansi: Option<AnsiStripper>,
    line_terminator: String,
    eof_reached: bool,
}

impl Session<PtyBackend> {
    /// Create a new session builder.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Spawn a command on a PTY with the default configuration.
    ///
    /// This is a shorthand for `Session::builder().spawn(command)`.
    pub fn spawn(command: &str) -> Result<Self, ExpectError> {
        SessionBuilder::new().spawn(command)
    }

    /// Check if the spawned process is still alive.
    pub fn is_alive(&mut self) -> Result<bool, ExpectError> {
        self.backend.is_alive()
    }

    /// Wait for the spawned process to exit.
    pub async fn wait(&mut self) -> Result<portable_pty::ExitStatus, ExpectError> {
        self.backend.wait().await
    }
}

impl<B: Backend> Session<B> {
    /// Wrap a backend with the default configuration.
    pub fn new(backend: B) -> Self {
        SessionBuilder::new().into_session(backend)
    }

    /// Current timeout for `expect`; `None` when waiting indefinitely.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Set the timeout for subsequent `expect` calls.
    ///
    /// # Errors
    ///
    /// A zero duration is rejected with `InvalidConfiguration` and the
    /// previous timeout is kept. A duration too large to form a deadline,
    /// such as `Duration::MAX`, waits indefinitely.
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<(), ExpectError> {
        if timeout.is_zero() {
            return Err(ExpectError::InvalidConfiguration(
                "timeout must be larger than zero".to_string(),
            ));
        }
        self.timeout = Some(timeout);
        Ok(())
    }

    /// Set the timeout in milliseconds.
    ///
    /// # Errors
    ///
    /// Zero and negative values are rejected with `InvalidConfiguration`
    /// and the previous timeout is kept.
    pub fn set_timeout_millis(&mut self, millis: i64) -> Result<(), ExpectError> {
        let millis = u64::try_from(millis).map_err(|_| {
            ExpectError::InvalidConfiguration(format!(
                "timeout must be larger than zero, got {millis}ms"
            ))
        })?;
        self.set_timeout(Duration::from_millis(millis))
    }

    /// Line terminator appended by [`send_line`](Self::send_line).
    pub fn line_terminator(&self) -> &str {
        &self.line_terminator
    }

    /// Borrow the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutably borrow the backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Take the backend back out of the session.
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Send text verbatim. No line terminator is added.
    ///
    /// # Errors
    ///
    /// Backend write failures are returned as `IoError`. After the backend
    /// reached end-of-stream this fails with `Eof`.
    pub async fn send(&mut self, text: &str) -> Result<(), ExpectError> {
        if self.eof_reached {
            return Err(ExpectError::Eof);
        }
        debug!(len = text.len(), "send");
        self.backend.write(text).await?;
        Ok(())
    }

    /// Send text followed by the configured line terminator.
    pub async fn send_line(&mut self, line: &str) -> Result<(), ExpectError> {
        let mut text = String::with_capacity(line.len() + self.line_terminator.len());
        text.push_str(line);
        text.push_str(&self.line_terminator);
        self.send(&text).await
    }

    /// Wait for `pattern` and hand the accumulated output to `handler`.
    ///
    /// The handler runs exactly once, inside this call, before it returns
    /// successfully. It receives all output read by this call, which
    /// includes the match. Callers that don't need the text ignore it.
    ///
    /// # Errors
    ///
    /// - `Timeout` if the pattern did not appear before the timeout
    /// - `Eof` if the backend ended first
    /// - `FullBuffer` if the output grew past `max_buffer_size`
    /// - `IoError` if a backend read failed
    ///
    /// The handler is never invoked on error.
    ///
    /// # Examples
    ///
    /// ```
    /// use expectloop::{Pattern, ScriptedBackend, Session};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let backend = ScriptedBackend::new()
    ///     .chunk("test expected ")
    ///     .chunk("string test");
    /// let mut session = Session::new(backend);
    ///
    /// let mut seen = String::new();
    /// let result = session
    ///     .expect(Pattern::exact("expected string")?, |out| seen = out.to_string())
    ///     .await?;
    ///
    /// assert_eq!(seen, "test expected string test");
    /// assert_eq!(result.reads, 2);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn expect<F>(&mut self, pattern: Pattern, handler: F) -> Result<MatchResult, ExpectError>
    where
        F: FnOnce(&str),
    {
        let matcher = pattern.to_matcher()?;
        debug!(%pattern, "expect");
        self.run(matcher.as_ref(), future::pending(), handler).await
    }

    /// Like [`expect`](Self::expect), with a handler that can write back.
    ///
    /// The handler queues text on the [`Reply`]; it is sent in order after
    /// the match and before this call returns, so the next `expect` only
    /// sees output produced after the reply.
    ///
    /// # Errors
    ///
    /// As for [`expect`](Self::expect), plus `IoError` if sending a queued
    /// reply fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use expectloop::{Pattern, ScriptedBackend, Session};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let backend = ScriptedBackend::new().chunk("Continue? [y/n] ");
    /// let handle = backend.handle();
    /// let mut session = Session::new(backend);
    ///
    /// session
    ///     .expect_reply(Pattern::exact("[y/n]")?, |_, reply| reply.send_line("y"))
    ///     .await?;
    ///
    /// assert_eq!(handle.writes(), vec!["y\n".to_string()]);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn expect_reply<F>(&mut self, pattern: Pattern, handler: F) -> Result<MatchResult, ExpectError>
    where
        F: FnOnce(&str, &mut Reply),
    {
        let matcher = pattern.to_matcher()?;
        debug!(%pattern, "expect with reply");
        let mut reply = Reply::new(&self.line_terminator);
        let result = self
            .run(matcher.as_ref(), future::pending(), |output| handler(output, &mut reply))
            .await?;

        for text in reply.into_queued() {
            self.send(&text).await?;
        }
        Ok(result)
    }

    /// Like [`expect`](Self::expect) with a caller-supplied matcher.
    pub async fn expect_with<M, F>(&mut self, matcher: &M, handler: F) -> Result<MatchResult, ExpectError>
    where
        M: Matcher + ?Sized,
        F: FnOnce(&str),
    {
        debug!("expect with custom matcher");
        self.run(matcher, future::pending(), handler).await
    }

    /// Like [`expect`](Self::expect), abandoned when `cancel` resolves.
    ///
    /// Returns `Cancelled` if `cancel` completes before a match. The pending
    /// read is dropped; whatever it would have returned stays with the
    /// backend for the next call.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use expectloop::{ExpectError, Pattern, Session};
    /// use tokio::sync::oneshot;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let mut session = Session::spawn("cat")?;
    /// let (stop, stopped) = oneshot::channel::<()>();
    /// # drop(stop);
    /// let cancel = async move {
    ///     let _ = stopped.await;
    /// };
    ///
    /// match session.expect_until(Pattern::exact("ready")?, cancel, |_| {}).await {
    ///     Err(ExpectError::Cancelled) => println!("gave up"),
    ///     other => { other?; }
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn expect_until<C, F>(
        &mut self,
        pattern: Pattern,
        cancel: C,
        handler: F,
    ) -> Result<MatchResult, ExpectError>
    where
        C: Future<Output = ()>,
        F: FnOnce(&str),
    {
        let matcher = pattern.to_matcher()?;
        debug!(%pattern, "expect until cancelled");
        self.run(matcher.as_ref(), cancel, handler).await
    }

    async fn run<M, C, F>(&mut self, matcher: &M, cancel: C, handler: F) -> Result<MatchResult, ExpectError>
    where
        M: Matcher + ?Sized,
        C: Future<Output = ()>,
        F: FnOnce(&str),
    {
        if self.eof_reached {
            return Err(ExpectError::Eof);
        }

        let timeout = self.timeout;
        // Too far out to represent: no deadline
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let timer = async move {
            match deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => future::pending().await,
            }
        };
        tokio::pin!(timer);
        tokio::pin!(cancel);

        let mut buffer = OutputBuffer::new(self.max_buffer_size, self.ansi.as_mut());
        let mut reads = 0;

        loop {
            // A backend that is always ready must not starve the timer
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(timed_out(timeout, &buffer));
            }

            // Read first: a chunk that is ready together with the deadline
            // still gets matched.
            let chunk = tokio::select! {
                biased;
                read = self.backend.read() => read?,
                () = &mut cancel => {
                    debug!(buffered = buffer.len(), "expect cancelled");
                    return Err(ExpectError::Cancelled);
                }
                () = &mut timer => return Err(timed_out(timeout, &buffer)),
            };

            let Some(chunk) = chunk else {
                warn!(buffered = buffer.len(), "end of stream before match");
                self.eof_reached = true;
                return Err(ExpectError::Eof);
            };

            reads += 1;
            trace!(len = chunk.len(), reads, "chunk");
            buffer.append(&chunk);

            if let Some(m) = matcher.evaluate(buffer.as_str()) {
                debug!(reads, start = m.start, end = m.end, "matched");
                handler(buffer.as_str());

                let output = buffer.into_string();
                return Ok(MatchResult {
                    matched: output[m.start..m.end].to_string(),
                    output,
                    start: m.start,
                    end: m.end,
                    count: m.count,
                    captures: m.captures,
                    reads,
                });
            }

            if buffer.is_over_limit() {
                warn!(size = buffer.len(), "buffer full before match");
                return Err(ExpectError::FullBuffer { size: buffer.len() });
            }
        }
    }
}

fn timed_out(timeout: Option<Duration>, buffer: &OutputBuffer<'_>) -> ExpectError {
    let duration = timeout.unwrap_or_default();
    warn!(?duration, buffered = buffer.len(), "timed out waiting for pattern");
    ExpectError::Timeout { duration }
}
