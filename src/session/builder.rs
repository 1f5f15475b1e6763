//! Session builder for configuration

use crate::backend::{Backend, PtyBackend};
use crate::buffer::AnsiStripper;
use crate::result::ExpectError;
use crate::session::Session;
use portable_pty::{CommandBuilder, PtySize};
use std::time::Duration;

/// Default timeout for expect operations (in milliseconds)
const DEFAULT_TIMEOUT_MILLIS: u64 = 2500;

/// Default limit on output accumulated by one expect call (in bytes)
const DEFAULT_MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// Default line terminator for `send_line`
const DEFAULT_LINE_TERMINATOR: &str = "\n";

/// Default PTY rows
const DEFAULT_PTY_ROWS: u16 = 24;

/// Default PTY columns
const DEFAULT_PTY_COLS: u16 = 80;

/// Builder for configuring sessions.
///
/// # Defaults
///
/// - Timeout: 2500 milliseconds
/// - Max buffer size: 1 MiB per expect call
/// - ANSI stripping: disabled
/// - Line terminator: `"\n"`
/// - PTY size: 24 rows × 80 columns
///
/// # Examples
///
/// ```no_run
/// use expectloop::Session;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let session = Session::builder()
///     .timeout(Duration::from_secs(60))
///     .strip_ansi(true)
///     .line_terminator("\r\n")
///     .pty_size(40, 120)
///     .spawn("python3 -i")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    timeout: Option<Duration>,
    max_buffer_size: usize,
    strip_ansi: bool,
    line_terminator: String,
    pty_size: PtySize,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    /// Create a new session builder with default configuration.
    pub fn new() -> Self {
        Self {
            timeout: Some(Duration::from_millis(DEFAULT_TIMEOUT_MILLIS)),
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            strip_ansi: false,
            line_terminator: DEFAULT_LINE_TERMINATOR.to_string(),
            pty_size: PtySize {
                rows: DEFAULT_PTY_ROWS,
                cols: DEFAULT_PTY_COLS,
                pixel_width: 0,
                pixel_height: 0,
            },
        }
    }

    /// Set the timeout for expect operations.
    ///
    /// Must be larger than zero; `build` and `spawn` reject a zero timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disable timeout (wait indefinitely).
    ///
    /// This is the only way to get a session without a timeout:
    /// `Session::set_timeout` only accepts positive durations.
    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Limit on the output one expect call may accumulate before failing
    /// with `FullBuffer`.
    pub fn max_buffer_size(mut self, size: usize) -> Self {
        self.max_buffer_size = size;
        self
    }

    /// Enable or disable ANSI escape sequence stripping.
    ///
    /// When enabled, escape sequences are removed before output is appended
    /// to the buffer and matched. A sequence split across reads is held
    /// back until it is complete.
    pub fn strip_ansi(mut self, strip: bool) -> Self {
        self.strip_ansi = strip;
        self
    }

    /// Terminator appended by `send_line`, e.g. `"\r\n"` for Windows consoles.
    pub fn line_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.line_terminator = terminator.into();
        self
    }

    /// Set PTY (terminal) size for `spawn`.
    pub fn pty_size(mut self, rows: u16, cols: u16) -> Self {
        self.pty_size = PtySize {
            rows,
            cols,
            pixel_width: 0,
            pixel_height: 0,
        };
        self
    }

    /// Build a session around an existing backend.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` for a zero timeout or a zero buffer size.
    pub fn build<B: Backend>(self, backend: B) -> Result<Session<B>, ExpectError> {
        self.validate()?;
        Ok(self.into_session(backend))
    }

    /// Spawn a command on a PTY and return a configured session.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid
    /// - The command string is empty
    /// - The PTY cannot be created
    /// - The process cannot be spawned
    pub fn spawn(self, command: &str) -> Result<Session<PtyBackend>, ExpectError> {
        self.validate()?;
        let backend = PtyBackend::spawn(command, self.pty_size)?;
        Ok(self.into_session(backend))
    }

    /// Spawn a prepared [`CommandBuilder`], for arguments containing spaces.
    pub fn spawn_command(self, cmd: CommandBuilder) -> Result<Session<PtyBackend>, ExpectError> {
        self.validate()?;
        let backend = PtyBackend::spawn_command(cmd, self.pty_size)?;
        Ok(self.into_session(backend))
    }

    fn validate(&self) -> Result<(), ExpectError> {
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(ExpectError::InvalidConfiguration(
                "timeout must be larger than zero".to_string(),
            ));
        }
        if self.max_buffer_size == 0 {
            return Err(ExpectError::InvalidConfiguration(
                "max_buffer_size must be larger than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn into_session<B: Backend>(self, backend: B) -> Session<B> {
        Session {
            backend,
            timeout: self.timeout,
            max_buffer_size: self.max_buffer_size,
            ansi: self.strip_ansi.then(AnsiStripper::new),
            line_terminator: self.line_terminator,
            eof_reached: false,
        }
    }
}
