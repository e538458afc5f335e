//! Knuth–Morris–Pratt matching.
//!
//! The failure table is built once per search; `Matches` carries the
//! partial-match state between yielded hits, so a rejected candidate resumes
//! the search from the table instead of restarting it.

/// A pattern with its precomputed failure function
pub struct FailureTable<'p> {
    pattern: &'p [u8],
    /// `lps[i]`: length of the longest proper prefix of `pattern[..=i]`
    /// that is also a suffix of it
    lps: Vec<usize>,
}

impl<'p> FailureTable<'p> {
    /// Build the table. `None` for an empty pattern.
    pub fn new(pattern: &'p [u8]) -> Option<Self> {
        if pattern.is_empty() {
            return None;
        }

        let mut lps = vec![0usize; pattern.len()];
        let mut len = 0;
        let mut i = 1;
        while i < pattern.len() {
            if pattern[i] == pattern[len] {
                len += 1;
                lps[i] = len;
                i += 1;
            } else if len > 0 {
                len = lps[len - 1];
            } else {
                lps[i] = 0;
                i += 1;
            }
        }

        Some(Self { pattern, lps })
    }

    pub fn pattern(&self) -> &[u8] {
        self.pattern
    }

    pub fn len(&self) -> usize {
        self.pattern.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }

    /// Iterate over the start offsets of every match in `haystack`,
    /// overlapping matches included
    pub fn find_iter<'a, 'h>(&'a self, haystack: &'h [u8]) -> Matches<'a, 'p, 'h> {
        Matches {
            table: self,
            haystack,
            i: 0,
            j: 0,
        }
    }
}

/// Streaming match iterator over one haystack
pub struct Matches<'a, 'p, 'h> {
    table: &'a FailureTable<'p>,
    haystack: &'h [u8],
    /// Next haystack index to examine
    i: usize,
    /// Number of pattern bytes currently matched
    j: usize,
}

impl Iterator for Matches<'_, '_, '_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let pattern = self.table.pattern;
        let lps = &self.table.lps;

        while self.i < self.haystack.len() {
            if self.haystack[self.i] == pattern[self.j] {
                self.i += 1;
                self.j += 1;
                if self.j == pattern.len() {
                    let start = self.i - self.j;
                    self.j = lps[self.j - 1];
                    return Some(start);
                }
            } else if self.j > 0 {
                self.j = lps[self.j - 1];
            } else {
                self.i += 1;
            }
        }
        None
    }
}
