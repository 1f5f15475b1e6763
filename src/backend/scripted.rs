//! Scripted in-memory backend for tests and dry runs

use super::Backend;
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

#[derive(Debug)]
enum Step {
    Chunk { text: String, delay: Duration },
    Eof,
    Error { kind: io::ErrorKind, message: String },
}

#[derive(Debug, Default)]
struct Record {
    writes: Vec<String>,
    reads: usize,
}

/// A backend that replays a fixed script of output.
///
/// Each chunk becomes readable `delay` after the read that waits for it
/// starts. Dropping a pending read does not lose the chunk: the next read
/// resumes waiting for the same arrival time. Once the script is exhausted,
/// reads pend forever, like a program that stays silent.
///
/// # Examples
///
/// ```
/// use expectloop::{Pattern, ScriptedBackend, Session};
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = ScriptedBackend::new()
///     .chunk_after("login: ", Duration::from_millis(10));
/// let handle = backend.handle();
///
/// let mut session = Session::new(backend);
/// session.expect(Pattern::exact("login:")?, |_| {}).await?;
/// session.send("admin\n").await?;
///
/// assert_eq!(handle.writes(), vec!["admin\n".to_string()]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    steps: VecDeque<Step>,
    arrival: Option<Instant>,
    record: Arc<Mutex<Record>>,
    fail_writes: Option<io::ErrorKind>,
}

/// Inspection handle for a [`ScriptedBackend`] that has been moved into a session.
#[derive(Debug, Clone)]
pub struct ScriptHandle {
    record: Arc<Mutex<Record>>,
}

impl ScriptedBackend {
    /// Create an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk that is available immediately
    pub fn chunk(self, text: impl Into<String>) -> Self {
        self.chunk_after(text, Duration::ZERO)
    }

    /// Append a chunk that arrives `delay` after it is first waited for
    pub fn chunk_after(mut self, text: impl Into<String>, delay: Duration) -> Self {
        self.steps.push_back(Step::Chunk {
            text: text.into(),
            delay,
        });
        self
    }

    /// Append end-of-stream
    pub fn eof(mut self) -> Self {
        self.steps.push_back(Step::Eof);
        self
    }

    /// Append a read failure
    pub fn error(mut self, kind: io::ErrorKind, message: impl Into<String>) -> Self {
        self.steps.push_back(Step::Error {
            kind,
            message: message.into(),
        });
        self
    }

    /// Make every write fail with `kind`
    pub fn fail_writes(mut self, kind: io::ErrorKind) -> Self {
        self.fail_writes = Some(kind);
        self
    }

    /// Handle for inspecting writes and reads after the backend is moved
    pub fn handle(&self) -> ScriptHandle {
        ScriptHandle {
            record: self.record.clone(),
        }
    }

    fn record(&self) -> std::sync::MutexGuard<'_, Record> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Backend for ScriptedBackend {
    async fn write(&mut self, text: &str) -> io::Result<()> {
        if let Some(kind) = self.fail_writes {
            return Err(io::Error::new(kind, "scripted write failure"));
        }
        self.record().writes.push(text.to_string());
        Ok(())
    }

    async fn read(&mut self) -> io::Result<Option<String>> {
        let delay = match self.steps.front() {
            Some(Step::Chunk { delay, .. }) => *delay,
            Some(_) => Duration::ZERO,
            None => std::future::pending().await,
        };

        let arrival = *self.arrival.get_or_insert_with(|| Instant::now() + delay);
        sleep_until(arrival).await;

        // Past the last await: from here on the step is consumed atomically
        self.arrival = None;
        self.record().reads += 1;
        match self.steps.pop_front() {
            Some(Step::Chunk { text, .. }) => Ok(Some(text)),
            Some(Step::Error { kind, message }) => Err(io::Error::new(kind, message)),
            Some(Step::Eof) | None => Ok(None),
        }
    }
}

impl ScriptHandle {
    /// Everything written so far, one entry per `write`
    pub fn writes(&self) -> Vec<String> {
        self.lock().writes.clone()
    }

    /// Number of completed reads
    pub fn reads(&self) -> usize {
        self.lock().reads
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Record> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
