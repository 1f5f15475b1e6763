//! Local process backend on a pseudo-terminal

use super::Backend;
use crate::result::ExpectError;
use bytes::{Buf, Bytes, BytesMut};
use portable_pty::{native_pty_system, Child, CommandBuilder, ExitStatus, MasterPty, PtySize};
use std::io::{self, Read, Write};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, trace};

const READ_CHUNK_SIZE: usize = 4096;

/// `EIO`: Linux reports a hung-up PTY this way once the child exits
#[cfg(unix)]
const EIO: i32 = 5;

/// A spawned program attached to a pseudo-terminal.
///
/// A dedicated reader thread drains the PTY into a channel, so `read` is
/// cancel-safe: output never sits inside a dropped future.
pub struct PtyBackend {
    _master: Box<dyn MasterPty + Send>,
    child: Option<Box<dyn Child + Send>>,
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    output: mpsc::UnboundedReceiver<io::Result<Bytes>>,
    decoder: Utf8Decoder,
}

impl PtyBackend {
    /// Spawn a whitespace-separated command line.
    ///
    /// # Errors
    ///
    /// Returns an error if the command is empty, the PTY cannot be opened,
    /// or the process cannot be spawned.
    pub fn spawn(command: &str, size: PtySize) -> Result<Self, ExpectError> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        let (program, args) = parts
            .split_first()
            .ok_or_else(|| ExpectError::SpawnError("Empty command".to_string()))?;

        let mut cmd = CommandBuilder::new(program);
        cmd.args(args);
        Self::spawn_command(cmd, size)
    }

    /// Spawn a fully prepared command.
    pub fn spawn_command(cmd: CommandBuilder, size: PtySize) -> Result<Self, ExpectError> {
        let pty_pair = native_pty_system()
            .openpty(size)
            .map_err(|e| ExpectError::PtyError(e.to_string()))?;

        let child = pty_pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| ExpectError::SpawnError(e.to_string()))?;
        // Keep only the master so EOF shows up when the child exits
        drop(pty_pair.slave);

        let reader = pty_pair
            .master
            .try_clone_reader()
            .map_err(|e| ExpectError::PtyError(e.to_string()))?;
        let writer = pty_pair
            .master
            .take_writer()
            .map_err(|e| ExpectError::PtyError(e.to_string()))?;

        let (tx, output) = mpsc::unbounded_channel();
        std::thread::Builder::new()
            .name("expectloop-pty-reader".to_string())
            .spawn(move || pump(reader, tx))?;

        debug!(pid = ?child.process_id(), "spawned process on pty");

        Ok(Self {
            _master: pty_pair.master,
            child: Some(child),
            writer: Arc::new(Mutex::new(writer)),
            output,
            decoder: Utf8Decoder::default(),
        })
    }

    /// Check if the process is still alive.
    ///
    /// # Errors
    ///
    /// Returns `ProcessExited` after a previous call to [`wait`](Self::wait).
    pub fn is_alive(&mut self) -> Result<bool, ExpectError> {
        let child = self.child.as_mut().ok_or(ExpectError::ProcessExited)?;
        match child.try_wait() {
            Ok(Some(_)) => Ok(false),
            Ok(None) => Ok(true),
            Err(e) => Err(ExpectError::IoError(e)),
        }
    }

    /// Wait for the process to exit and return its exit status.
    ///
    /// Consumes the child handle; later calls fail with `ProcessExited`.
    pub async fn wait(&mut self) -> Result<ExitStatus, ExpectError> {
        let mut child = self.child.take().ok_or(ExpectError::ProcessExited)?;

        let status = tokio::task::spawn_blocking(move || child.wait())
            .await
            .map_err(|e| ExpectError::IoError(io::Error::other(e)))??;

        Ok(status)
    }
}

impl Backend for PtyBackend {
    async fn write(&mut self, text: &str) -> io::Result<()> {
        let writer = self.writer.clone();
        let data = text.as_bytes().to_vec();

        tokio::task::spawn_blocking(move || {
            let mut writer = writer.blocking_lock();
            writer.write_all(&data)?;
            writer.flush()
        })
        .await
        .map_err(io::Error::other)?
    }

    async fn read(&mut self) -> io::Result<Option<String>> {
        loop {
            match self.output.recv().await {
                Some(Ok(bytes)) => {
                    trace!(len = bytes.len(), "pty bytes");
                    self.decoder.push(&bytes);
                    if let Some(text) = self.decoder.take_text() {
                        return Ok(Some(text));
                    }
                }
                Some(Err(e)) => return Err(e),
                None => return Ok(self.decoder.finish()),
            }
        }
    }
}

/// Reader thread body: forward PTY output until EOF or error.
fn pump(mut reader: Box<dyn Read + Send>, tx: mpsc::UnboundedSender<io::Result<Bytes>>) {
    let mut buf = [0u8; READ_CHUNK_SIZE];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(Ok(Bytes::copy_from_slice(&buf[..n]))).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            #[cfg(unix)]
            Err(e) if e.raw_os_error() == Some(EIO) => break,
            Err(e) => {
                let _ = tx.send(Err(e));
                break;
            }
        }
    }
}

/// Turns a byte stream into text without splitting multi-byte characters.
///
/// An incomplete sequence at the end of a chunk is held back until the next
/// chunk completes it. Invalid bytes become U+FFFD.
#[derive(Debug, Default)]
struct Utf8Decoder {
    pending: BytesMut,
}

impl Utf8Decoder {
    fn push(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Decode as much as possible.
    fn take_text(&mut self) -> Option<String> {
        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.advance(valid + bad);
                        }
                        None => {
                            self.pending.advance(valid);
                            break;
                        }
                    }
                }
            }
        }
        (!out.is_empty()).then_some(out)
    }

    /// Flush at end of stream, replacing a dangling partial sequence.
    fn finish(&mut self) -> Option<String> {
        let mut out = self.take_text().unwrap_or_default();
        if !self.pending.is_empty() {
            out.push_str(&String::from_utf8_lossy(&self.pending));
            self.pending.clear();
        }
        (!out.is_empty()).then_some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_holds_split_character() {
        let bytes = "世界".as_bytes();
        let mut decoder = Utf8Decoder::default();

        decoder.push(&bytes[..4]);
        assert_eq!(decoder.take_text().as_deref(), Some("世"));

        decoder.push(&bytes[4..]);
        assert_eq!(decoder.take_text().as_deref(), Some("界"));
    }

    #[test]
    fn test_decoder_incomplete_only() {
        let mut decoder = Utf8Decoder::default();
        decoder.push(&"é".as_bytes()[..1]);
        assert_eq!(decoder.take_text(), None);
        assert_eq!(decoder.finish().as_deref(), Some("\u{FFFD}"));
    }

    #[test]
    fn test_decoder_replaces_invalid() {
        let mut decoder = Utf8Decoder::default();
        decoder.push(b"ok\xFFok");
        assert_eq!(decoder.take_text().as_deref(), Some("ok\u{FFFD}ok"));
    }

    #[test]
    fn test_spawn_empty_command() {
        let size = PtySize {
            rows: 24,
            cols: 80,
            pixel_width: 0,
            pixel_height: 0,
        };
        assert!(matches!(
            PtyBackend::spawn("   ", size),
            Err(ExpectError::SpawnError(_))
        ));
    }
}
