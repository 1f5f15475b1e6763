//! Text a handler sends back to the program

/// Writes queued by a handler passed to [`Session::expect_reply`].
///
/// The handler runs synchronously while the session is busy reading, so it
/// cannot write directly. Whatever it queues here is sent in order, after
/// the match and before `expect_reply` returns.
///
/// [`Session::expect_reply`]: crate::Session::expect_reply
#[derive(Debug)]
pub struct Reply {
    queued: Vec<String>,
    line_terminator: String,
}

impl Reply {
    pub(crate) fn new(line_terminator: &str) -> Self {
        Self {
            queued: Vec::new(),
            line_terminator: line_terminator.to_string(),
        }
    }

    /// Queue text to send verbatim.
    pub fn send(&mut self, text: impl Into<String>) {
        self.queued.push(text.into());
    }

    /// Queue text followed by the session's line terminator.
    pub fn send_line(&mut self, line: &str) {
        self.queued.push(format!("{line}{}", self.line_terminator));
    }

    /// Whether nothing has been queued.
    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    pub(crate) fn into_queued(self) -> Vec<String> {
        self.queued
    }
}
