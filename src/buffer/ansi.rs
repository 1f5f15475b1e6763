//! ANSI escape sequence stripping

use std::iter::Peekable;
use std::str::CharIndices;

/// Removes ANSI escape sequences from a stream of chunks.
///
/// A sequence cut off at the end of a chunk is held back and completed by
/// the next one, so the result does not depend on where reads split.
#[derive(Debug, Default)]
pub(crate) struct AnsiStripper {
    held: String,
}

impl AnsiStripper {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Strip one chunk, continuing any sequence left open by the last one
    pub(crate) fn strip(&mut self, chunk: &str) -> String {
        let mut input = std::mem::take(&mut self.held);
        input.push_str(chunk);

        let mut result = String::with_capacity(input.len());
        let mut chars = input.char_indices().peekable();

        while let Some((start, ch)) = chars.next() {
            if ch != '\x1b' {
                result.push(ch);
                continue;
            }
            if !skip_sequence(&mut chars) {
                self.held = input[start..].to_string();
                break;
            }
        }

        result
    }

    /// Bytes of an unfinished sequence waiting for the next chunk
    pub(crate) fn held(&self) -> usize {
        self.held.len()
    }
}

/// Consume one sequence following ESC. Returns false if the input ran out
/// before the sequence was complete.
fn skip_sequence(chars: &mut Peekable<CharIndices<'_>>) -> bool {
    match chars.next() {
        None => false,
        // CSI: parameters until the final letter
        Some((_, '[')) => chars.any(|(_, c)| c.is_ascii_alphabetic()),
        // OSC: terminated by BEL or ST (ESC \)
        Some((_, ']')) => loop {
            match chars.next() {
                None => return false,
                Some((_, '\x07')) => return true,
                Some((_, '\x1b')) => match chars.peek() {
                    None => return false,
                    Some((_, '\\')) => {
                        chars.next();
                        return true;
                    }
                    Some(_) => {}
                },
                Some(_) => {}
            }
        },
        // Character set selection, one designator follows
        Some((_, '(' | ')')) => chars.next().is_some(),
        Some(_) => true,
    }
}
