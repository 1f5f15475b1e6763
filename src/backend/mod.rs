//! Bidirectional text channels a session can drive

mod pty;
mod scripted;

pub use pty::PtyBackend;
pub use scripted::{ScriptHandle, ScriptedBackend};

use std::future::Future;
use std::io;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A bidirectional text channel to an interactive program.
///
/// The session only ever has one `read` in flight, but it may drop that
/// future at any await point when a timeout or cancellation wins the race.
/// Implementations must therefore make `read` cancel-safe: output that was
/// not returned yet must stay queued for the next call.
///
/// # Examples
///
/// ```
/// use expectloop::Backend;
/// use std::collections::VecDeque;
/// use std::io;
///
/// struct Canned(VecDeque<String>);
///
/// impl Backend for Canned {
///     async fn write(&mut self, _text: &str) -> io::Result<()> {
///         Ok(())
///     }
///
///     async fn read(&mut self) -> io::Result<Option<String>> {
///         Ok(self.0.pop_front())
///     }
/// }
/// ```
pub trait Backend: Send {
    /// Write text verbatim. No line terminator is added.
    fn write(&mut self, text: &str) -> impl Future<Output = io::Result<()>> + Send;

    /// Next chunk of output.
    ///
    /// Suspends until data is available. `Ok(None)` means the channel has
    /// ended and no further output will arrive.
    fn read(&mut self) -> impl Future<Output = io::Result<Option<String>>> + Send;
}

impl<B: Backend> Backend for &mut B {
    async fn write(&mut self, text: &str) -> io::Result<()> {
        (**self).write(text).await
    }

    async fn read(&mut self) -> io::Result<Option<String>> {
        (**self).read().await
    }
}

/// Shared backend. The lock is held for one read or write at a time.
///
/// This lets a handle be kept outside the session, for writes between
/// calls. It does not coordinate readers: if two sessions share one backend
/// and `expect` concurrently, each call gets an arbitrary subset of the
/// chunks, and which call sees a given match is undefined. To share a
/// session between tasks, wrap the `Session` itself in a mutex instead.
impl<B: Backend> Backend for Arc<Mutex<B>> {
    async fn write(&mut self, text: &str) -> io::Result<()> {
        self.lock().await.write(text).await
    }

    async fn read(&mut self) -> io::Result<Option<String>> {
        self.lock().await.read().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shared_backend_forwards() {
        let scripted = ScriptedBackend::new().chunk("hello");
        let handle = scripted.handle();
        let mut shared = Arc::new(Mutex::new(scripted));

        shared.write("ping\n").await.unwrap();
        assert_eq!(shared.read().await.unwrap().as_deref(), Some("hello"));
        assert_eq!(handle.writes(), vec!["ping\n".to_string()]);
    }

    #[tokio::test]
    async fn test_borrowed_backend_forwards() {
        let mut scripted = ScriptedBackend::new().chunk("a").eof();
        {
            let mut borrowed = &mut scripted;
            let chunk = <&mut ScriptedBackend as Backend>::read(&mut borrowed).await;
            assert_eq!(chunk.unwrap().as_deref(), Some("a"));
        }
        assert_eq!(scripted.read().await.unwrap(), None);
    }
}
