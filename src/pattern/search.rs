//! Boyer-Moore-Horspool substring search

/// Precomputed shift table for one needle.
pub(crate) struct Horspool {
    needle: Vec<u8>,
    bad_char_table: [usize; 256],
}

impl Horspool {
    /// Build the bad character table. `needle` must be non-empty.
    pub(crate) fn new(needle: Vec<u8>) -> Self {
        let mut bad_char_table = [needle.len(); 256];
        for (i, &byte) in needle.iter().enumerate().take(needle.len() - 1) {
            bad_char_table[byte as usize] = needle.len() - 1 - i;
        }

        Self {
            needle,
            bad_char_table,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.needle.len()
    }

    /// First occurrence at or after `from`.
    pub(crate) fn find_from(&self, haystack: &[u8], from: usize) -> Option<usize> {
        let n = self.needle.len();
        let mut pos = from;
        while pos + n <= haystack.len() {
            if haystack[pos..pos + n] == self.needle[..] {
                return Some(pos);
            }
            pos += self.bad_char_table[haystack[pos + n - 1] as usize];
        }
        None
    }

    /// Count non-overlapping occurrences.
    pub(crate) fn count(&self, haystack: &[u8]) -> usize {
        let mut count = 0;
        let mut from = 0;
        while let Some(pos) = self.find_from(haystack, from) {
            count += 1;
            from = pos + self.needle.len();
        }
        count
    }
}
