//! Per-call output buffer

mod ansi;

pub(crate) use ansi::AnsiStripper;

/// Output accumulated by a single `expect` call.
///
/// Created empty at the start of each call and dropped when the call
/// returns, so nothing leaks from one call into the next. Append-only.
///
/// The ANSI stripper is borrowed from the session: a sequence split across
/// the last read of one call and the first read of the next is still
/// removed whole.
#[derive(Debug)]
pub(crate) struct OutputBuffer<'a> {
    text: String,
    max_size: usize,
    ansi: Option<&'a mut AnsiStripper>,
}

impl<'a> OutputBuffer<'a> {
    pub(crate) fn new(max_size: usize, ansi: Option<&'a mut AnsiStripper>) -> Self {
        Self {
            text: String::new(),
            max_size,
            ansi,
        }
    }

    /// Append one chunk
    pub(crate) fn append(&mut self, chunk: &str) {
        match self.ansi.as_deref_mut() {
            Some(ansi) => self.text.push_str(&ansi.strip(chunk)),
            None => self.text.push_str(chunk),
        }
    }

    /// Whether the accumulated text is past `max_size`
    pub(crate) fn is_over_limit(&self) -> bool {
        self.len() > self.max_size
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.text
    }

    /// Bytes held so far, including an unfinished escape sequence
    pub(crate) fn len(&self) -> usize {
        self.text.len() + self.ansi.as_deref().map_or(0, AnsiStripper::held)
    }

    pub(crate) fn into_string(self) -> String {
        self.text
    }
}
